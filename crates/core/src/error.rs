//! Core errors

use thiserror::Error;

/// Errors raised by core collaborators
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Document parsing failed: {0}")]
    Parse(String),

    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid fraud result: {0}")]
    InvalidResult(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;
