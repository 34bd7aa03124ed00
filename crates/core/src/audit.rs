//! Audit snapshot of one screening run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::AlertId;
use crate::decision::KycDecision;
use crate::document::DocumentType;
use crate::fraud::FraudAnalysisResult;
use crate::identity::DeviceFingerprint;
use crate::record::DocumentId;

/// Immutable inputs/outputs of one decision, keyed by document id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub document_id: DocumentId,
    pub user_id: String,
    pub user_email: String,
    pub document_type: DocumentType,
    pub aadhaar: Option<String>,
    pub pan: Option<String>,
    pub dl: Option<String>,
    pub decision: KycDecision,
    pub fraud: FraudAnalysisResult,
    pub aml_reasons: Vec<String>,
    pub alert_ids: Vec<AlertId>,
    pub processing_ms: u64,
    #[serde(default)]
    pub device: Option<DeviceFingerprint>,
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn fraud_score(&self) -> u32 {
        self.fraud.score()
    }
}
