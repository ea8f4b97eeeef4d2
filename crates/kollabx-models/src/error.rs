//! Error types for the `kollabx-models` crate.
//!
//! All fallible constructors and validation helpers in this crate return
//! variants of [`ModelError`].

/// Errors produced when constructing or validating model types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A channel name was empty or normalized to the empty string.
    #[error("invalid channel name \"{value}\": {reason}")]
    InvalidChannelName {
        /// The value that failed validation.
        value: String,
        /// Human-readable explanation.
        reason: String,
    },

    /// A message body was empty after trimming.
    #[error("message content must not be empty")]
    EmptyMessageContent,

    /// A required field was missing during construction.
    #[error("missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_channel_name() {
        let err = ModelError::InvalidChannelName {
            value: "   ".into(),
            reason: "normalizes to the empty string".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid channel name \"   \": normalizes to the empty string"
        );
    }

    #[test]
    fn error_display_empty_content() {
        assert_eq!(
            ModelError::EmptyMessageContent.to_string(),
            "message content must not be empty"
        );
    }

    #[test]
    fn error_display_missing_field() {
        let err = ModelError::MissingField {
            field: "project_id".into(),
        };
        assert_eq!(err.to_string(), "missing required field: project_id");
    }
}
