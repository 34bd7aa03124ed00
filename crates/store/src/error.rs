//! Store errors

use thiserror::Error;

/// Errors from the record store and blacklist registry
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        StoreError::Poisoned
    }
}
