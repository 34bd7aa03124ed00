//! Compliance errors

use thiserror::Error;

use kycguard_core::CoreError;
use kycguard_fraud::FraudError;
use kycguard_store::StoreError;

/// Errors from the Compliance Engine
#[derive(Debug, Error)]
pub enum ComplianceError {
    /// No document id: nothing downstream can run
    #[error("Failed to store document record: {0}")]
    DocumentInsert(StoreError),

    #[error("Failed to write to audit ledger: {0}")]
    LedgerWriteError(String),

    #[error("Failed to read audit ledger: {0}")]
    LedgerReadError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Alert not found: {0}")]
    AlertNotFound(String),

    #[error("Document parsing failed: {0}")]
    Parse(#[from] CoreError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Fraud engine error: {0}")]
    Fraud(#[from] FraudError),

    #[error("Analysis task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// Result type for compliance operations
pub type ComplianceResult<T> = Result<T, ComplianceError>;
