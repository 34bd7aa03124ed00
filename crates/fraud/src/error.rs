//! Fraud engine errors
//!
//! Signal modules never return these for input defects or unavailable
//! collaborators; those become "not assessed" outcomes instead.

use thiserror::Error;

/// Errors from the fraud engine
#[derive(Debug, Error)]
pub enum FraudError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type for fraud operations
pub type FraudResult<T> = Result<T, FraudError>;
