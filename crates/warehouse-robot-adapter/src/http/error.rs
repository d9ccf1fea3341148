/*
[INPUT]:  Error sources (HTTP transport, engine error bodies, serialization)
[OUTPUT]: Structured error types with kind projection and retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

use crate::types::ErrorResponse;

/// Coarse error classes the lifecycle controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The engine rejected the command batch.
    Validation,
    /// The referenced task no longer exists remotely.
    NotFound,
    /// Network failure or an unusable response.
    Transport,
}

/// Main error type for the warehouse robot adapter
#[derive(Error, Debug)]
pub enum RobotError {
    /// Task creation rejected by the engine
    #[error("Command batch rejected (HTTP {status}, {code}): {message}")]
    Validation {
        status: u16,
        code: String,
        message: String,
    },

    /// Task unknown to the engine
    #[error("Task {task_id} not found: {message}")]
    NotFound { task_id: String, message: String },

    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Engine returned another non-success status
    #[error("API error (HTTP {status}, {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RobotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RobotError::Validation { .. } | RobotError::Config(_) | RobotError::UrlParse(_) => {
                ErrorKind::Validation
            }
            RobotError::NotFound { .. } => ErrorKind::NotFound,
            RobotError::Transport(_)
            | RobotError::Api { .. }
            | RobotError::Serialization(_)
            | RobotError::InvalidResponse(_) => ErrorKind::Transport,
        }
    }

    /// Check if the error is worth another attempt
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Create a validation error from a rejected create call
    pub fn validation(status: StatusCode, body: &ErrorResponse) -> Self {
        RobotError::Validation {
            status: status.as_u16(),
            code: body.code.clone(),
            message: body.message.clone(),
        }
    }

    /// Map a non-success response on a task-scoped call
    pub fn for_task(task_id: &str, status: StatusCode, body: &ErrorResponse) -> Self {
        if status == StatusCode::NOT_FOUND {
            return RobotError::NotFound {
                task_id: task_id.to_string(),
                message: body.message.clone(),
            };
        }
        RobotError::Api {
            status: status.as_u16(),
            code: body.code.clone(),
            message: body.message.clone(),
        }
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, RobotError>;
