//! Error types for call handlers.

use thiserror::Error;

/// Failure reported back to the page in a `reply` message.
#[derive(Debug, Error)]
pub enum CallError {
    /// No handler registered under the requested name.
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// Arguments did not match what the handler expects.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// Any other handler-defined failure.
    #[error("{0}")]
    Failed(String),
}

impl CallError {
    /// Create an invalid-arguments error.
    pub fn invalid_arguments(reason: impl Into<String>) -> Self {
        CallError::InvalidArguments(reason.into())
    }

    /// Create a generic failure.
    pub fn failed(reason: impl Into<String>) -> Self {
        CallError::Failed(reason.into())
    }
}

impl From<serde_json::Error> for CallError {
    fn from(e: serde_json::Error) -> Self {
        CallError::InvalidArguments(e.to_string())
    }
}
