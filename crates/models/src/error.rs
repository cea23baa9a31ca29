use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure envelope returned on every error path of the HTTP surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
}

#[derive(Error, Debug)]
pub enum MockError {
    #[error("no prototype for path: {path} and method: {method}")]
    PrototypeNotFound { path: String, method: String },

    #[error("prototype not found: {id}")]
    NotFound { id: String },

    #[error("invalid prototype id: {id}")]
    InvalidId { id: String },

    #[error("{reason}")]
    InvalidInput { reason: String },

    #[error("{message}")]
    ValidationFailure { message: String },

    #[error("internal error: {reason}")]
    Internal { reason: String },

    #[error("context canceled")]
    Canceled,
}

impl MockError {
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            success: false,
            error: self.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MockError::PrototypeNotFound { .. } => "NotFound",
            MockError::NotFound { .. } => "NotFound",
            MockError::InvalidId { .. } => "InvalidInput",
            MockError::InvalidInput { .. } => "InvalidInput",
            MockError::ValidationFailure { .. } => "ValidationFailure",
            MockError::Internal { .. } => "Internal",
            MockError::Canceled => "Canceled",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            MockError::PrototypeNotFound { .. } => 404,
            MockError::NotFound { .. } => 404,
            MockError::InvalidId { .. } => 400,
            MockError::InvalidInput { .. } => 400,
            MockError::ValidationFailure { .. } => 422,
            MockError::Internal { .. } => 500,
            MockError::Canceled => 408,
        }
    }
}
