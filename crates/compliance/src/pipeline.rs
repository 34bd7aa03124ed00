//! KYC Pipeline - Orchestrates one screening run
//!
//! ```text
//! Submission
//!        │
//!        ▼
//! ┌─────────────────┐
//! │ ML collaborator │──► manipulation / network probabilities (concurrent)
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │ Record insert   │──► fails? abort (no document id)
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │ Fraud analysis  │──► score, band, reasons (blocking task)
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │ AML screening   │──► blacklist / age / duplicate reasons
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │ Decision        │──► Flagged? raise alert
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │ Audit ledger    │──► snapshot (failure logged only)
//! └─────────────────┘
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use kycguard_core::{
    Alert, AmlFinding, AuditLogEntry, DeviceFingerprint, DocumentId, DocumentParser,
    DuplicateReport, FraudAnalysisResult, KycDecision, NewAlert, NewDocument, ParsedDocument,
    UserProfile,
};
use kycguard_fraud::{
    default_forensics, AnalysisRequest, FraudAnalyzer, Identifiers, ImageForensics,
    MlCollaborator, ModelSignals, NoModels,
};
use kycguard_store::{AlertStore, Blacklist, BlacklistRegistry, DocumentStore, MemoryStore};

use crate::alerts::AlertDesk;
use crate::aml::AmlScreener;
use crate::config::ComplianceConfig;
use crate::decision::DecisionEngine;
use crate::error::{ComplianceError, ComplianceResult};
use crate::event::AuditEvent;
use crate::ledger::{AuditLedger, RiskSummary};

/// A document with its fields already extracted
#[derive(Debug, Clone)]
pub struct Submission {
    pub user: UserProfile,
    pub filename: String,
    pub bytes: Vec<u8>,
    pub parsed: ParsedDocument,
    pub raw_text: Option<String>,
    pub device: Option<DeviceFingerprint>,
    /// Probabilities computed by the caller; `None` asks the ML collaborator
    pub models: Option<ModelSignals>,
}

/// Raw upload, parsed by the OCR collaborator first
#[derive(Debug, Clone)]
pub struct Upload {
    pub user: UserProfile,
    pub filename: String,
    pub bytes: Vec<u8>,
    pub device: Option<DeviceFingerprint>,
    pub models: Option<ModelSignals>,
}

/// Result of one screening run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningOutcome {
    pub document_id: DocumentId,
    pub fraud: FraudAnalysisResult,
    pub aml_reasons: Vec<String>,
    pub decision: KycDecision,
    /// Empty unless flagged
    pub alerts: Vec<Alert>,
    pub processing_ms: u64,
}

/// KYC screening pipeline
///
/// Cheap to clone; every collaborator is shared.
#[derive(Clone)]
pub struct KycPipeline {
    config: ComplianceConfig,
    store: Arc<dyn DocumentStore>,
    analyzer: FraudAnalyzer,
    screener: AmlScreener,
    engine: DecisionEngine,
    alerts: AlertDesk,
    ledger: Arc<AuditLedger>,
    models: Arc<dyn MlCollaborator>,
}

/// Saturates instead of wrapping
fn whole_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

impl KycPipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Screen one document end to end
    ///
    /// Only a failed record insert is an error. Every later failure degrades
    /// to a log line and the decision stands.
    pub async fn screen(&self, submission: Submission) -> ComplianceResult<ScreeningOutcome> {
        let started = Instant::now();
        let Submission {
            user,
            filename,
            bytes,
            mut parsed,
            raw_text,
            device,
            models,
        } = submission;
        parsed.document_type = parsed.effective_type();

        // === Phase 1: Model probabilities ===
        let models = match models {
            Some(signals) => signals.sanitized(),
            None => {
                let features = self.analyzer.graph_features(&user.id, device.as_ref());
                ModelSignals::collect(self.models.as_ref(), &bytes, &features).await
            }
        };

        // === Phase 2: Record insert ===
        let document_id = self
            .store
            .insert(NewDocument {
                user_id: user.id.clone(),
                user_email: user.email.clone(),
                filename,
                document_type: parsed.document_type,
                parsed: parsed.clone(),
                raw_text: raw_text.clone(),
                device: device.clone(),
                created_at: Utc::now(),
            })
            .map_err(ComplianceError::DocumentInsert)?;
        debug!(document_id = %document_id, user_id = %user.id, "Document stored");

        // === Phase 3: Fraud analysis ===
        let analyzer = self.analyzer.clone();
        let request = AnalysisRequest {
            document_id,
            user: user.clone(),
            bytes,
            parsed: parsed.clone(),
            raw_text,
            device: device.clone(),
            models,
        };
        let fraud = tokio::task::spawn_blocking(move || analyzer.analyze(&request))
            .await
            .map_err(|e| ComplianceError::Task(e.to_string()))?;

        let file_hash = fraud.details().file_hash().unwrap_or_default();
        if let Err(e) = self.store.attach_fraud(document_id, file_hash, &fraud) {
            warn!(document_id = %document_id, error = %e, "Failed to attach fraud result");
        }

        // === Phase 4: AML screening ===
        let aml = self
            .screener
            .screen(&parsed, document_id, &user.id, Utc::now().date_naive());
        let aml_reasons = aml.reasons();

        // === Phase 5: Decision ===
        let verdict = self.engine.decide(fraud.score(), &aml_reasons);
        let mut alerts = Vec::new();
        if let Some(escalation) = verdict.escalation {
            let alert = NewAlert {
                document_id,
                aadhaar: parsed.aadhaar_number.clone(),
                pan: parsed.pan_normalized().map(str::to_string),
                dl: parsed.dl_number.clone(),
                user_email: user.email.clone(),
                risk_level: escalation.risk_level,
                reason: escalation.reason,
            };
            match self.alerts.raise(alert) {
                Ok(alert) => alerts.push(alert),
                Err(e) => error!(document_id = %document_id, error = %e, "Failed to raise alert"),
            }
        }

        let processing_ms = whole_millis(started.elapsed());

        // === Phase 6: Audit ===
        let entry = AuditLogEntry {
            document_id,
            user_id: user.id.clone(),
            user_email: user.email.clone(),
            document_type: parsed.document_type,
            aadhaar: parsed.aadhaar_number.clone(),
            pan: parsed.pan_normalized().map(str::to_string),
            dl: parsed.dl_number.clone(),
            decision: verdict.decision,
            fraud: fraud.clone(),
            aml_reasons: aml_reasons.clone(),
            alert_ids: alerts.iter().map(|a| a.id).collect(),
            processing_ms,
            device,
            created_at: Utc::now(),
        };
        if let Err(e) = self.ledger.append(&AuditEvent::ScreeningRecorded(entry)) {
            error!(document_id = %document_id, error = %e, "Failed to write audit entry");
        }

        info!(
            document_id = %document_id,
            user_id = %user.id,
            score = fraud.score(),
            band = %fraud.band(),
            decision = ?verdict.decision,
            aml_reasons = aml_reasons.len(),
            processing_ms,
            "KYC screening complete"
        );

        Ok(ScreeningOutcome {
            document_id,
            fraud,
            aml_reasons,
            decision: verdict.decision,
            alerts,
            processing_ms,
        })
    }

    /// Run the OCR collaborator, then screen
    pub async fn screen_upload(
        &self,
        parser: &dyn DocumentParser,
        upload: Upload,
    ) -> ComplianceResult<ScreeningOutcome> {
        let output = parser.parse(&upload.bytes)?;
        self.screen(Submission {
            user: upload.user,
            filename: upload.filename,
            bytes: upload.bytes,
            parsed: output.parsed,
            raw_text: output.raw_text,
            device: upload.device,
            models: upload.models,
        })
        .await
    }

    /// Standalone Aadhaar blacklist lookup
    pub fn aml_check(&self, aadhaar: &str) -> AmlFinding {
        self.screener.aadhaar_check(aadhaar)
    }

    /// Standalone duplicate lookup against every stored record
    pub fn lookup_duplicates(&self, ids: Identifiers<'_>) -> DuplicateReport {
        self.screener.lookup_duplicates(ids)
    }

    pub fn risk_summary(&self, aadhaar: &str) -> ComplianceResult<RiskSummary> {
        self.ledger.risk_summary(aadhaar)
    }

    /// Most recent screenings, newest first
    pub fn audit_logs(&self, limit: usize) -> ComplianceResult<Vec<AuditLogEntry>> {
        self.ledger.recent(limit)
    }

    pub fn alerts(&self) -> &AlertDesk {
        &self.alerts
    }

    pub fn ledger(&self) -> &Arc<AuditLedger> {
        &self.ledger
    }

    pub fn config(&self) -> &ComplianceConfig {
        &self.config
    }
}

/// Builder for KycPipeline
///
/// Unset collaborators default to in-memory stores, an empty blacklist,
/// no ML models and the compiled-in imaging backend.
pub struct PipelineBuilder {
    config: ComplianceConfig,
    store: Option<Arc<dyn DocumentStore>>,
    alert_store: Option<Arc<dyn AlertStore>>,
    blacklist: Option<Arc<dyn Blacklist>>,
    ledger: Option<Arc<AuditLedger>>,
    forensics: Option<Arc<dyn ImageForensics>>,
    models: Option<Arc<dyn MlCollaborator>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: ComplianceConfig::default(),
            store: None,
            alert_store: None,
            blacklist: None,
            ledger: None,
            forensics: None,
            models: None,
        }
    }

    pub fn with_config(mut self, config: ComplianceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_alert_store(mut self, store: Arc<dyn AlertStore>) -> Self {
        self.alert_store = Some(store);
        self
    }

    /// One backend for both documents and alerts
    pub fn with_records<S>(self, store: Arc<S>) -> Self
    where
        S: DocumentStore + AlertStore + 'static,
    {
        self.with_store(store.clone()).with_alert_store(store)
    }

    pub fn with_blacklist(mut self, blacklist: Arc<dyn Blacklist>) -> Self {
        self.blacklist = Some(blacklist);
        self
    }

    pub fn with_ledger(mut self, ledger: Arc<AuditLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_forensics(mut self, forensics: Arc<dyn ImageForensics>) -> Self {
        self.forensics = Some(forensics);
        self
    }

    pub fn with_models(mut self, models: Arc<dyn MlCollaborator>) -> Self {
        self.models = Some(models);
        self
    }

    /// Build the pipeline; fails only on an invalid configuration
    pub fn build(self) -> ComplianceResult<KycPipeline> {
        self.config.validate()?;

        let memory = Arc::new(MemoryStore::new());
        let store: Arc<dyn DocumentStore> = self.store.unwrap_or_else(|| memory.clone());
        let alert_store: Arc<dyn AlertStore> = self.alert_store.unwrap_or(memory);
        let blacklist = self
            .blacklist
            .unwrap_or_else(|| Arc::new(BlacklistRegistry::in_memory()));
        let ledger = self
            .ledger
            .unwrap_or_else(|| Arc::new(AuditLedger::in_memory()));
        let forensics = self.forensics.unwrap_or_else(default_forensics);
        let models = self.models.unwrap_or_else(|| Arc::new(NoModels));

        let analyzer = FraudAnalyzer::new(&self.config.fraud, store.clone(), forensics);
        let screener = AmlScreener::new(
            blacklist,
            analyzer.duplicates().clone(),
            self.config.minimum_age,
        );

        Ok(KycPipeline {
            engine: DecisionEngine::new(self.config.flag_score, self.config.review_score),
            alerts: AlertDesk::new(alert_store, ledger.clone()),
            config: self.config,
            store,
            analyzer,
            screener,
            ledger,
            models,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kycguard_fraud::{FixedProbabilities, NoImaging};

    fn pipeline() -> KycPipeline {
        KycPipeline::builder()
            .with_forensics(Arc::new(NoImaging))
            .build()
            .unwrap()
    }

    fn submission(parsed: ParsedDocument) -> Submission {
        Submission {
            user: UserProfile::new("u1", "u1@example.in"),
            filename: "doc.jpg".into(),
            bytes: b"scan".to_vec(),
            parsed,
            raw_text: None,
            device: None,
            models: None,
        }
    }

    #[test]
    fn test_processing_time_saturates() {
        assert_eq!(whole_millis(Duration::from_micros(2_500)), 2);
        assert_eq!(whole_millis(Duration::MAX), u64::MAX);
    }

    #[tokio::test]
    async fn test_clean_document_passes() {
        let outcome = pipeline()
            .screen(submission(ParsedDocument::default().with_aadhaar("499118665243")))
            .await
            .unwrap();

        assert_eq!(outcome.fraud.score(), 0);
        assert_eq!(outcome.decision, KycDecision::Pass);
        assert!(outcome.alerts.is_empty());
    }

    #[tokio::test]
    async fn test_document_type_rederived() {
        let pipeline = pipeline();
        let outcome = pipeline
            .screen(submission(ParsedDocument::default().with_pan("ABCDE1234F")))
            .await
            .unwrap();

        let logs = pipeline.audit_logs(10).unwrap();
        assert_eq!(logs[0].document_id, outcome.document_id);
        assert_eq!(logs[0].document_type, kycguard_core::DocumentType::Pan);
    }

    #[tokio::test]
    async fn test_collaborator_probabilities_used_when_absent() {
        let pipeline = KycPipeline::builder()
            .with_forensics(Arc::new(NoImaging))
            .with_models(Arc::new(FixedProbabilities {
                manipulation: Some(0.9),
                network_fraud: None,
            }))
            .build()
            .unwrap();

        let outcome = pipeline
            .screen(submission(ParsedDocument::default()))
            .await
            .unwrap();

        // floor(0.9 * 35)
        assert_eq!(outcome.fraud.score(), 31);
        assert_eq!(outcome.decision, KycDecision::Review);
        assert_eq!(outcome.fraud.model_version(), "heuristic-v2.0+ml");
    }

    #[tokio::test]
    async fn test_supplied_probabilities_skip_collaborator() {
        let pipeline = KycPipeline::builder()
            .with_forensics(Arc::new(NoImaging))
            .with_models(Arc::new(FixedProbabilities {
                manipulation: Some(0.9),
                network_fraud: Some(0.9),
            }))
            .build()
            .unwrap();

        let mut sub = submission(ParsedDocument::default());
        sub.models = Some(ModelSignals::default());
        let outcome = pipeline.screen(sub).await.unwrap();

        assert_eq!(outcome.fraud.score(), 0);
        assert_eq!(outcome.fraud.model_version(), "heuristic-v2.0");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ComplianceConfig {
            review_score: 90,
            ..Default::default()
        };
        assert!(matches!(
            KycPipeline::builder().with_config(config).build(),
            Err(ComplianceError::Config(_))
        ));
    }
}
