//! Error types shared by the request pipeline and the workbench

use thiserror::Error;

/// Everything that can go wrong between pressing "Run" and storing a result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("API error: {status} {reason}")]
    HttpError { status: u16, reason: String },
    #[error("Failed to parse response: {0}")]
    ParseError(String),
    #[error("Failed to store audio output: {0}")]
    StorageError(String),
    #[error("A run is already in progress for this model")]
    Busy,
}

/// Rejected edits to a model configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Unknown model configuration: {0}")]
    UnknownModel(String),
    #[error("Unknown input field: {0}")]
    UnknownInput(String),
    #[error("Input '{name}' holds {expected} values")]
    KindMismatch { name: String, expected: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_message_carries_status() {
        let err = RunError::HttpError { status: 500, reason: "Internal Server Error".to_string() };
        assert_eq!(err.to_string(), "API error: 500 Internal Server Error");
    }

    #[test]
    fn test_kind_mismatch_message() {
        let err = EditError::KindMismatch { name: "Prompt".to_string(), expected: "text" };
        assert_eq!(err.to_string(), "Input 'Prompt' holds text values");
    }
}
