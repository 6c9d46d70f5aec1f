use thiserror::Error;

/// Why a tool invocation failed.
///
/// The `Display` form is what the host hands back to the model, so every
/// variant renders as a self-contained sentence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Unknown tool: {name}")]
    NotFound { name: String },

    #[error("Tool {name} is currently unavailable")]
    Unavailable { name: String },

    #[error("Invalid arguments for {tool} at '{path}': {message}")]
    InvalidArguments {
        tool: String,
        /// JSON pointer of the offending field.
        path: String,
        message: String,
    },

    #[error("Error {context}: {message}")]
    Action {
        tool: String,
        context: String,
        message: String,
    },
}

impl DispatchError {
    /// Name of the tool the failed call addressed.
    pub fn tool(&self) -> &str {
        match self {
            DispatchError::NotFound { name } | DispatchError::Unavailable { name } => name,
            DispatchError::InvalidArguments { tool, .. } | DispatchError::Action { tool, .. } => {
                tool
            }
        }
    }
}
