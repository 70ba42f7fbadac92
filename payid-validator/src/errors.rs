//! Error types for validator operations.

use thiserror::Error;

/// Comprehensive error type for validator operations.
///
/// Only the request layer's connection failures are terminal for a
/// validation session; every other condition is folded into a recorded
/// check instead of propagating.
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// Connection failed.
    #[error("connection to {target} failed: {reason}")]
    ConnectionFailed {
        /// Target endpoint or service
        target: String,
        /// Underlying error message
        reason: String,
    },

    /// Connection timeout.
    #[error("{operation} timed out after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Operation that timed out
        operation: String,
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// Transport/network layer error.
    #[error("transport error: {0}")]
    Transport(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid data provided.
    #[error("invalid {field}: {reason}")]
    InvalidData {
        /// Field or parameter name
        field: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Internal/unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ValidatorError {
    /// Create an invalid data error.
    pub fn invalid_data(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidData {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this is a connection-level failure (the only class
    /// of error that terminates a session).
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::ConnectionTimeout { .. }
        )
    }
}

impl From<serde_json::Error> for ValidatorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Map reqwest errors into the validator's error taxonomy.
pub(crate) fn map_request_error(
    err: reqwest::Error,
    target: &str,
    timeout_ms: u64,
) -> ValidatorError {
    if err.is_timeout() {
        ValidatorError::ConnectionTimeout {
            operation: format!("request to {target}"),
            timeout_ms,
        }
    } else if err.is_connect() {
        ValidatorError::ConnectionFailed {
            target: target.to_string(),
            reason: err.to_string(),
        }
    } else {
        ValidatorError::Transport(format!("request to {target} failed: {err}"))
    }
}
