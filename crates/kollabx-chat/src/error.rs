use thiserror::Error;

/// Errors surfaced by the chat and notification state machines.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The backend call failed.
    #[error(transparent)]
    Backend(#[from] kollabx_sdk::SdkError),

    /// An operation that needs a selected project ran without one.
    #[error("no project selected")]
    NoProject,
}
