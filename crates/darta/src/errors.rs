use serde::{Deserialize, Serialize};
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum DartaError {
    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Empty message")]
    EmptyMessage,

    #[error("External call failed: {0}")]
    ExternalCall(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidToolArguments(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type DartaResult<T> = Result<T, DartaError>;
