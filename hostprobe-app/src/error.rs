//! Application layer error type

use hostprobe_toolbox::ToolboxError;
use serde::Serialize;
use thiserror::Error;

/// Application layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum AppError {
    /// Error raised by the toolbox (invalid input before probing)
    #[error("{0}")]
    Toolbox(#[from] ToolboxError),

    /// Required collaborator missing or misconfigured
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Report not found
    #[error("Report not found: {0}")]
    NotFound(String),

    /// serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl AppError {
    /// Whether it is expected behavior (user input, missing report), used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::Toolbox(e) => e.is_expected(),
            Self::ValidationError(_) | Self::NotFound(_) => true,
            Self::SerializationError(_) | Self::StorageError(_) => false,
        }
    }
}

/// Application layer Result type alias
pub type AppResult<T> = std::result::Result<T, AppError>;
