//! Error types for session analytics.
//!
//! Degenerate input (missing coordinates, unparseable timestamps, empty
//! sessions) never produces an error; it degrades to empty or default output.
//! Only malformed records that the storage layer is supposed to prevent, and
//! failures of the storage layer itself, surface here.

use thiserror::Error;

/// Main error type for analytics operations.
#[derive(Error, Debug)]
#[cfg_attr(feature = "ffi", derive(uniffi::Error), uniffi(flat_error))]
pub enum AnalysisError {
    /// A session record arrived without its identifier.
    #[error("session record is missing its session_id")]
    MissingSessionId,

    /// The identifier cannot be used as a storage key.
    #[error("invalid session id: {0:?}")]
    InvalidSessionId(String),

    /// No session with this identifier exists in the store.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Session JSON could not be decoded or encoded.
    #[error("session JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Storage I/O failed.
    #[error("session storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for analytics operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            AnalysisError::MissingSessionId.to_string(),
            "session record is missing its session_id"
        );
        assert_eq!(
            AnalysisError::SessionNotFound("abc".into()).to_string(),
            "session not found: abc"
        );
        assert_eq!(
            AnalysisError::InvalidSessionId("../x".into()).to_string(),
            "invalid session id: \"../x\""
        );
    }

    #[test]
    fn test_json_error_converts() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let converted: AnalysisError = err.into();
        assert!(matches!(converted, AnalysisError::Json(_)));
    }
}
