use serde::{Deserialize, Serialize};

/// Stable error codes carried in acknowledgement frames.
pub mod error_codes {
    /// Malformed frame, unknown method, or missing parameter.
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    /// Input failed domain validation (e.g. empty player name).
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    /// The referenced player id is unknown.
    pub const NOT_FOUND: &str = "NOT_FOUND";
}

/// Error payload of a failed acknowledgement.
///
/// Failures never escape the dispatch boundary; they surface only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ErrorShape {
    pub code: String,
    pub message: String,
}

impl ErrorShape {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(error_codes::NOT_FOUND, message)
    }
}
