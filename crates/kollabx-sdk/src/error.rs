//! SDK error types.
//!
//! [`SdkError`] is the single error type returned by every fallible
//! operation in the SDK. It wraps underlying transport, serialization
//! and authentication errors into a unified enum; callers check the
//! `Result` explicitly, nothing leaks across the boundary untyped.

/// Error type for all SDK operations.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// Invalid or missing configuration (e.g. bad URL, missing field).
    #[error("configuration error: {0}")]
    Config(String),

    /// Authentication or authorization failure.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// NATS transport error.
    #[error("NATS error: {0}")]
    Nats(String),

    /// HTTP request failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected an operation.
    #[error("backend error (status {status}): {message}")]
    Backend {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Error body, verbatim.
        message: String,
    },

    /// An ownership or membership pre-condition failed locally,
    /// before any remote call was issued.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Client-side validation failed; no remote round-trip was made.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A row the operation depends on does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// JSON serialization / deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<async_nats::ConnectError> for SdkError {
    fn from(e: async_nats::ConnectError) -> Self {
        SdkError::Nats(e.to_string())
    }
}

impl From<async_nats::PublishError> for SdkError {
    fn from(e: async_nats::PublishError) -> Self {
        SdkError::Nats(e.to_string())
    }
}

impl From<async_nats::SubscribeError> for SdkError {
    fn from(e: async_nats::SubscribeError) -> Self {
        SdkError::Nats(e.to_string())
    }
}

impl From<async_nats::UnsubscribeError> for SdkError {
    fn from(e: async_nats::UnsubscribeError) -> Self {
        SdkError::Nats(e.to_string())
    }
}

impl From<kollabx_models::ModelError> for SdkError {
    fn from(e: kollabx_models::ModelError) -> Self {
        SdkError::Validation(e.to_string())
    }
}
