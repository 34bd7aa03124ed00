//! KycGuard Core - Domain types
//!
//! This crate contains the types shared by every stage of the KYC screening
//! pipeline:
//! - [`ParsedDocument`] / [`PanNumber`]: identity fields handed over by the OCR collaborator
//! - [`UserProfile`] / [`DeviceFingerprint`]: who uploaded, and from where
//! - [`SignalDetails`] / [`FraudAnalysisResult`]: explainable fraud scoring output
//! - [`KycDecision`] / [`AmlFinding`] / [`Alert`] / [`AuditLogEntry`]: decision records
//! - [`DocumentRecord`]: the stored view of one upload

pub mod alert;
pub mod audit;
pub mod decision;
pub mod document;
pub mod error;
pub mod fraud;
pub mod hash;
pub mod identity;
pub mod record;
pub mod signal;

pub use alert::{Alert, AlertId, NewAlert};
pub use audit::AuditLogEntry;
pub use decision::{AmlCheck, AmlFinding, KycDecision};
pub use document::{DocumentParser, DocumentType, PanNumber, ParseOutput, ParsedDocument};
pub use error::{CoreError, CoreResult};
pub use fraud::{FraudAnalysisResult, RiskBand, MAX_SCORE};
pub use hash::content_hash;
pub use identity::{DeviceFingerprint, UserProfile};
pub use record::{DocumentId, DocumentRecord, NewDocument};
pub use signal::{
    AadhaarCheck, AadhaarPath, Assessment, BlurCheck, CropCheck, CrossDocumentCheck, DeviceReport,
    DlCheck, DlFormat, DuplicateField, DuplicateReport, FuzzyBreakdown, ManipulationCheck,
    NameMatchReport, PanCheck, SignalDetails, SignalEntry, SignalName,
};
