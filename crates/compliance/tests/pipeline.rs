//! End-to-end screening against file-backed collaborators

use std::path::Path;
use std::sync::Arc;

use chrono::{Months, Utc};

use kycguard_compliance::{
    AuditLedger, ComplianceError, KycPipeline, Submission, SummarySource, Upload,
};
use kycguard_core::{
    CoreError, CoreResult, DocumentId, DocumentParser, DocumentRecord, FraudAnalysisResult,
    KycDecision, NewDocument, ParseOutput, ParsedDocument, RiskBand, UserProfile,
};
use kycguard_fraud::NoImaging;
use kycguard_store::{
    BlacklistRegistry, DocumentFilter, DocumentStore, IdKind, SqliteStore, StoreError,
    StoreResult,
};

struct Env {
    pipeline: KycPipeline,
    registry: Arc<BlacklistRegistry>,
    store: Arc<SqliteStore>,
}

fn env(dir: &Path) -> Env {
    let store = Arc::new(SqliteStore::open(dir.join("kyc.db")).unwrap());
    let registry = Arc::new(BlacklistRegistry::load(dir.join("blacklist.json")).unwrap());
    let ledger = Arc::new(AuditLedger::new(dir.join("audit.jsonl")).unwrap());
    let pipeline = KycPipeline::builder()
        .with_records(store.clone())
        .with_blacklist(registry.clone())
        .with_ledger(ledger)
        .with_forensics(Arc::new(NoImaging))
        .build()
        .unwrap();
    Env {
        pipeline,
        registry,
        store,
    }
}

fn submission(user_id: &str, parsed: ParsedDocument, bytes: &[u8]) -> Submission {
    Submission {
        user: UserProfile::new(user_id, format!("{}@example.in", user_id)),
        filename: "upload.jpg".into(),
        bytes: bytes.to_vec(),
        parsed,
        raw_text: None,
        device: None,
        models: None,
    }
}

#[tokio::test]
async fn test_invalid_pan_alone_passes() {
    let dir = tempfile::tempdir().unwrap();
    let env = env(dir.path());

    let outcome = env
        .pipeline
        .screen(submission("u1", ParsedDocument::default().with_pan("ABCD1234F"), b"pan"))
        .await
        .unwrap();

    // Score 30 is Low and below the review cut-off
    assert_eq!(outcome.fraud.score(), 30);
    assert_eq!(outcome.fraud.band(), RiskBand::Low);
    assert!(outcome.aml_reasons.is_empty());
    assert_eq!(outcome.decision, KycDecision::Pass);
    assert!(outcome.alerts.is_empty());

    let stored = env.store.get(outcome.document_id).unwrap().unwrap();
    assert_eq!(stored.fraud.as_ref().map(FraudAnalysisResult::score), Some(30));
    assert!(stored.file_hash.is_some());
}

#[tokio::test]
async fn test_blacklisted_aadhaar_flagged_medium() {
    let dir = tempfile::tempdir().unwrap();
    let env = env(dir.path());
    env.registry
        .add(IdKind::Aadhaar, "4991 1866 5243", "Fraud ring")
        .unwrap();

    let outcome = env
        .pipeline
        .screen(submission(
            "u1",
            ParsedDocument::default().with_aadhaar("499118665243"),
            b"aadhaar",
        ))
        .await
        .unwrap();

    assert_eq!(outcome.fraud.score(), 0);
    assert_eq!(outcome.decision, KycDecision::Flagged);
    assert_eq!(
        outcome.aml_reasons,
        vec!["Aadhaar in AML blacklist: Fraud ring".to_string()]
    );

    let alert = &outcome.alerts[0];
    assert_eq!(alert.risk_level, RiskBand::Medium);
    assert_eq!(alert.reason, "Aadhaar in AML blacklist: Fraud ring");
    assert_eq!(alert.aadhaar.as_deref(), Some("499118665243"));
    assert!(!alert.seen);

    let unseen = env.pipeline.alerts().unseen().unwrap();
    assert_eq!(unseen.len(), 1);
    assert_eq!(unseen[0].id, alert.id);
}

#[tokio::test]
async fn test_dismissed_alert_stays_in_history() {
    let dir = tempfile::tempdir().unwrap();
    let env = env(dir.path());
    env.registry.add(IdKind::Pan, "ABCDE1234F", "").unwrap();

    let outcome = env
        .pipeline
        .screen(submission("u1", ParsedDocument::default().with_pan("ABCDE1234F"), b"pan"))
        .await
        .unwrap();
    let alert_id = outcome.alerts[0].id;
    assert_eq!(outcome.alerts[0].reason, "PAN in AML blacklist: Generic");

    let desk = env.pipeline.alerts();
    assert!(desk.dismiss(alert_id).unwrap());
    assert!(!desk.dismiss(alert_id).unwrap());

    assert!(desk.unseen().unwrap().is_empty());
    let history = desk.all().unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].seen);

    let events = env.pipeline.ledger().read_all().unwrap();
    let kinds: Vec<&str> = events.iter().map(|e| e.event_type()).collect();
    assert_eq!(kinds, vec!["screening_recorded", "alert_dismissed"]);
}

#[tokio::test]
async fn test_high_score_flagged_high() {
    let dir = tempfile::tempdir().unwrap();
    let env = env(dir.path());

    let parsed = ParsedDocument::default()
        .with_aadhaar("234123412346")
        .with_pan("ABC")
        .with_dl("12345");
    let outcome = env
        .pipeline
        .screen(submission("u1", parsed, b"bad"))
        .await
        .unwrap();

    // 40 + 30 + 25
    assert_eq!(outcome.fraud.score(), 95);
    assert_eq!(outcome.fraud.band(), RiskBand::High);
    assert_eq!(outcome.decision, KycDecision::Flagged);
    assert_eq!(outcome.alerts[0].risk_level, RiskBand::High);
    assert_eq!(outcome.alerts[0].reason, "High fraud score 95");
}

#[tokio::test]
async fn test_underage_applicant_flagged() {
    let dir = tempfile::tempdir().unwrap();
    let env = env(dir.path());

    let born = Utc::now()
        .date_naive()
        .checked_sub_months(Months::new(16 * 12))
        .unwrap();
    let parsed = ParsedDocument::default()
        .with_aadhaar("499118665243")
        .with_dob(born.format("%d-%m-%Y").to_string());

    let outcome = env
        .pipeline
        .screen(submission("u1", parsed, b"minor"))
        .await
        .unwrap();

    assert_eq!(outcome.aml_reasons, vec!["Underage applicant (16 years)".to_string()]);
    assert_eq!(outcome.decision, KycDecision::Flagged);
    assert_eq!(outcome.alerts[0].risk_level, RiskBand::Medium);
}

#[tokio::test]
async fn test_identifier_reused_by_other_user() {
    let dir = tempfile::tempdir().unwrap();
    let env = env(dir.path());
    let parsed = ParsedDocument::default().with_aadhaar("499118665243");

    let first = env
        .pipeline
        .screen(submission("u1", parsed.clone(), b"first"))
        .await
        .unwrap();
    assert_eq!(first.decision, KycDecision::Pass);

    // Same applicant again: no AML duplicate
    let again = env
        .pipeline
        .screen(submission("u1", parsed.clone(), b"again"))
        .await
        .unwrap();
    assert!(again.aml_reasons.is_empty());

    let second = env
        .pipeline
        .screen(submission("u2", parsed, b"second"))
        .await
        .unwrap();
    assert_eq!(second.fraud.score(), 20);
    assert_eq!(second.aml_reasons, vec!["Aadhaar already used".to_string()]);
    assert_eq!(second.decision, KycDecision::Flagged);
}

#[tokio::test]
async fn test_audit_trail_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let env = env(dir.path());
        let aadhaar = ParsedDocument::default().with_aadhaar("499118665243");
        env.pipeline
            .screen(submission("u1", aadhaar.clone(), b"one"))
            .await
            .unwrap();
        env.pipeline
            .screen(submission("u1", aadhaar.with_pan("ABCD1234F"), b"two"))
            .await
            .unwrap();
    }

    let env = env(dir.path());
    let logs = env.pipeline.audit_logs(10).unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].fraud_score(), 30);
    assert_eq!(logs[1].fraud_score(), 0);

    let summary = env.pipeline.risk_summary("499118665243").unwrap();
    assert_eq!(summary.risk_score, 15);
    assert_eq!(summary.risk_label, RiskBand::Low);
    assert_eq!(summary.source, SummarySource::AuditLogs);

    let unknown = env.pipeline.risk_summary("234123412346").unwrap();
    assert_eq!(unknown.source, SummarySource::Default);
}

struct FixedParser(ParsedDocument);

impl DocumentParser for FixedParser {
    fn parse(&self, _bytes: &[u8]) -> CoreResult<ParseOutput> {
        Ok(ParseOutput {
            parsed: self.0.clone(),
            raw_text: None,
        })
    }
}

struct BrokenParser;

impl DocumentParser for BrokenParser {
    fn parse(&self, _bytes: &[u8]) -> CoreResult<ParseOutput> {
        Err(CoreError::Unavailable("ocr offline".into()))
    }
}

fn upload() -> Upload {
    Upload {
        user: UserProfile::new("u1", "u1@example.in"),
        filename: "scan.png".into(),
        bytes: b"scan".to_vec(),
        device: None,
        models: None,
    }
}

#[tokio::test]
async fn test_screen_upload_runs_parser() {
    let dir = tempfile::tempdir().unwrap();
    let env = env(dir.path());

    let parser = FixedParser(ParsedDocument::default().with_dl("MH1220110012345"));
    let outcome = env.pipeline.screen_upload(&parser, upload()).await.unwrap();
    assert_eq!(outcome.decision, KycDecision::Pass);

    let err = env
        .pipeline
        .screen_upload(&BrokenParser, upload())
        .await
        .unwrap_err();
    assert!(matches!(err, ComplianceError::Parse(_)));
    assert_eq!(env.pipeline.audit_logs(10).unwrap().len(), 1);
}

struct ReadOnlyStore;

impl DocumentStore for ReadOnlyStore {
    fn insert(&self, _doc: NewDocument) -> StoreResult<DocumentId> {
        Err(StoreError::InvalidRecord("read-only".into()))
    }

    fn get(&self, _id: DocumentId) -> StoreResult<Option<DocumentRecord>> {
        Ok(None)
    }

    fn find_many(&self, _filter: &DocumentFilter, _limit: usize) -> StoreResult<Vec<DocumentRecord>> {
        Ok(Vec::new())
    }

    fn attach_fraud(
        &self,
        _id: DocumentId,
        _file_hash: &str,
        _fraud: &FraudAnalysisResult,
    ) -> StoreResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_insert_failure_halts_pipeline() {
    let ledger = Arc::new(AuditLedger::in_memory());
    let pipeline = KycPipeline::builder()
        .with_store(Arc::new(ReadOnlyStore))
        .with_ledger(ledger.clone())
        .with_forensics(Arc::new(NoImaging))
        .build()
        .unwrap();

    let err = pipeline
        .screen(submission("u1", ParsedDocument::default(), b"x"))
        .await
        .unwrap_err();

    assert!(matches!(err, ComplianceError::DocumentInsert(_)));
    assert_eq!(ledger.line_count().unwrap(), 0);
}
