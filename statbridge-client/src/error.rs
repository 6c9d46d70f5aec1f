//! Error types for backend calls

use std::fmt;

/// Result type for backend calls
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Errors that can occur while talking to the backend
#[derive(Debug)]
pub enum BackendError {
    /// Connection or transport failure
    Network(String),

    /// Backend answered with a non-2xx status
    Status { status: u16, body: String },

    /// Response body could not be decoded
    Serialization(String),

    /// Client could not be configured
    Config(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Network(e) => write!(f, "Network error: {}", e),
            BackendError::Status { status, body } => {
                write!(f, "HTTP error! status: {}, message: {}", status, body)
            }
            BackendError::Serialization(e) => write!(f, "Serialization error: {}", e),
            BackendError::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            BackendError::Config(err.to_string())
        } else {
            BackendError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Serialization(err.to_string())
    }
}
