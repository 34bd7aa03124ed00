//! Fraud analyzer - runs every signal module and aggregates the result

use std::sync::Arc;

use tracing::{debug, info};

use kycguard_core::{
    content_hash, DeviceFingerprint, DocumentId, FraudAnalysisResult, ParsedDocument,
    SignalEntry, UserProfile,
};
use kycguard_store::DocumentStore;

use crate::aggregator::{RiskAggregator, SignalOutcome};
use crate::config::FraudConfig;
use crate::device::DeviceAnalyzer;
use crate::duplicate::DuplicateDetector;
use crate::forensics::{ForensicsSignals, ImageForensics};
use crate::ml::{GraphFeatures, MlSignalAdapter, ModelSignals};
use crate::name::NameMatcher;
use crate::validators::FieldValidators;

/// Heuristic model tag recorded on every result
pub const MODEL_VERSION: &str = "heuristic-v2.0";

/// Everything the analyzer needs for one document
///
/// The document must already be stored under `document_id`.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub document_id: DocumentId,
    pub user: UserProfile,
    pub bytes: Vec<u8>,
    pub parsed: ParsedDocument,
    pub raw_text: Option<String>,
    pub device: Option<DeviceFingerprint>,
    pub models: ModelSignals,
}

#[derive(Clone)]
pub struct FraudAnalyzer {
    validators: FieldValidators,
    duplicates: DuplicateDetector,
    forensics: ForensicsSignals,
    names: NameMatcher,
    devices: DeviceAnalyzer,
    ml: MlSignalAdapter,
}

impl FraudAnalyzer {
    pub fn new(
        config: &FraudConfig,
        store: Arc<dyn DocumentStore>,
        forensics: Arc<dyn ImageForensics>,
    ) -> Self {
        let w = &config.weights;
        let t = &config.thresholds;
        Self {
            validators: FieldValidators::new(w.clone()),
            duplicates: DuplicateDetector::new(store.clone(), w.duplicate),
            forensics: ForensicsSignals::new(forensics, w.clone(), t.clone()),
            names: NameMatcher::new(store.clone(), t.clone(), w.name_mismatch),
            devices: DeviceAnalyzer::new(store, w.clone(), t.clone()),
            ml: MlSignalAdapter::new(w.clone(), t),
        }
    }

    pub fn duplicates(&self) -> &DuplicateDetector {
        &self.duplicates
    }

    /// Graph summary for the network model; neutral without a device
    pub fn graph_features(&self, user_id: &str, device: Option<&DeviceFingerprint>) -> GraphFeatures {
        let connections = device
            .filter(|d| !d.hash.trim().is_empty())
            .map(|d| self.devices.other_users(user_id, &d.hash))
            .unwrap_or(0);
        GraphFeatures::from_connections(connections)
    }

    /// Score one document. Never fails: degraded signals are recorded as such.
    pub fn analyze(&self, req: &AnalysisRequest) -> FraudAnalysisResult {
        let file_hash = content_hash(&req.bytes);
        let user_id = req.user.id.as_str();

        let outcomes = vec![
            SignalOutcome::new().with_entry(SignalEntry::FileHash {
                hash: file_hash.clone(),
            }),
            self.ml.evaluate(req.models),
            self.validators.evaluate(&req.parsed, req.raw_text.as_deref()),
            self.duplicates
                .evaluate(&file_hash, &req.parsed, user_id, req.document_id),
            self.forensics.evaluate(&req.bytes),
            self.names.evaluate(
                req.user.name.as_deref(),
                req.parsed.name.as_deref(),
                user_id,
                req.document_id,
            ),
            self.devices.evaluate(
                user_id,
                req.document_id,
                req.device.as_ref(),
                req.parsed.state.as_deref(),
            ),
        ];
        debug!(
            document_id = %req.document_id,
            penalties = ?outcomes.iter().map(SignalOutcome::penalty).collect::<Vec<_>>(),
            "Signals evaluated"
        );

        let model_version = if req.models.sanitized().any() {
            format!("{}+ml", MODEL_VERSION)
        } else {
            MODEL_VERSION.to_string()
        };

        let result = RiskAggregator.aggregate(outcomes, &model_version);
        info!(
            document_id = %req.document_id,
            score = result.score(),
            band = %result.band(),
            "Fraud analysis complete"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forensics::NoImaging;
    use chrono::Utc;
    use kycguard_core::{DocumentType, NewDocument, RiskBand, SignalName};
    use kycguard_store::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, FraudAnalyzer) {
        let store = Arc::new(MemoryStore::new());
        let analyzer = FraudAnalyzer::new(&FraudConfig::default(), store.clone(), Arc::new(NoImaging));
        (store, analyzer)
    }

    fn request(store: &MemoryStore, user: UserProfile, parsed: ParsedDocument) -> AnalysisRequest {
        let document_id = store
            .insert(NewDocument {
                user_id: user.id.clone(),
                user_email: user.email.clone(),
                filename: "scan.jpg".into(),
                document_type: parsed.effective_type(),
                parsed: parsed.clone(),
                raw_text: None,
                device: None,
                created_at: Utc::now(),
            })
            .unwrap();
        AnalysisRequest {
            document_id,
            user,
            bytes: b"scan bytes".to_vec(),
            parsed,
            raw_text: None,
            device: None,
            models: ModelSignals::default(),
        }
    }

    #[test]
    fn test_invalid_pan_alone_scores_30() {
        let (store, analyzer) = setup();
        let req = request(
            &store,
            UserProfile::new("u1", "u1@example.in"),
            ParsedDocument::default().with_pan("ABC12345XY"),
        );

        let result = analyzer.analyze(&req);
        assert_eq!(result.score(), 30);
        assert_eq!(result.band(), RiskBand::Low);
        assert_eq!(result.reasons(), &["PAN format invalid".to_string()]);
        assert_eq!(result.model_version(), "heuristic-v2.0");
        assert!(result.details().contains(SignalName::Device));
        assert!(result.details().contains(SignalName::Blur));
    }

    #[test]
    fn test_model_version_tag() {
        let (store, analyzer) = setup();
        let mut req = request(
            &store,
            UserProfile::new("u1", "u1@example.in"),
            ParsedDocument::default().with_type(DocumentType::Aadhaar),
        );
        req.models = ModelSignals {
            manipulation: Some(0.3),
            network_fraud: None,
        };

        let result = analyzer.analyze(&req);
        assert_eq!(result.model_version(), "heuristic-v2.0+ml");
        assert_eq!(result.score(), 0);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let (store, analyzer) = setup();
        let req = request(
            &store,
            UserProfile::new("u1", "u1@example.in").with_name("Ravi Sharma"),
            ParsedDocument::default()
                .with_aadhaar("499118665243")
                .with_name("SHARMA RAVI"),
        );
        assert_eq!(analyzer.analyze(&req), analyzer.analyze(&req));
    }

    #[test]
    fn test_score_is_clamped() {
        let (store, analyzer) = setup();
        let mut req = request(
            &store,
            UserProfile::new("u1", "u1@example.in").with_name("Anjali Mehta"),
            ParsedDocument::default()
                .with_aadhaar("999999999999")
                .with_pan("ABC12345XY")
                .with_dl("MH12")
                .with_name("Bhupinder Singh"),
        );
        req.models = ModelSignals {
            manipulation: Some(0.9),
            network_fraud: Some(0.9),
        };

        let result = analyzer.analyze(&req);
        assert_eq!(result.score(), 100);
        assert_eq!(result.band(), RiskBand::High);
        assert!(result.reasons().len() >= 6);
    }
}
