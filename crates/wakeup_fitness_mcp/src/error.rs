//! Error types for the tool and HTTP surfaces.

use thiserror::Error;
use wakeup_fitness_client::Unavailable;

#[derive(Debug, Error)]
pub enum McpError {
    /// The figure could not be produced; callers only ever see the generic message.
    #[error(transparent)]
    Unavailable(#[from] Unavailable),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<McpError> for String {
    fn from(err: McpError) -> Self {
        err.to_string()
    }
}

/// Result type alias for tool and route operations.
pub type McpResult<T> = Result<T, McpError>;
