//! Fraud analysis over a persistent store

use std::sync::Arc;

use chrono::Utc;

use kycguard_core::{
    DeviceFingerprint, DocumentId, DuplicateField, NewDocument, ParsedDocument, RiskBand,
    UserProfile,
};
use kycguard_fraud::{AnalysisRequest, FraudAnalyzer, FraudConfig, ModelSignals, NoImaging};
use kycguard_store::{DocumentStore, SqliteStore};

fn submit(
    store: &SqliteStore,
    user: &UserProfile,
    parsed: &ParsedDocument,
    device: Option<DeviceFingerprint>,
) -> DocumentId {
    store
        .insert(NewDocument {
            user_id: user.id.clone(),
            user_email: user.email.clone(),
            filename: "upload.jpg".into(),
            document_type: parsed.effective_type(),
            parsed: parsed.clone(),
            raw_text: None,
            device,
            created_at: Utc::now(),
        })
        .unwrap()
}

fn request(
    id: DocumentId,
    user: &UserProfile,
    parsed: &ParsedDocument,
    device: Option<DeviceFingerprint>,
    bytes: &[u8],
) -> AnalysisRequest {
    AnalysisRequest {
        document_id: id,
        user: user.clone(),
        bytes: bytes.to_vec(),
        parsed: parsed.clone(),
        raw_text: None,
        device,
        models: ModelSignals::default(),
    }
}

#[test]
fn test_reused_aadhaar_on_shared_device() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::open(dir.path().join("kyc.db")).unwrap());
    let analyzer = FraudAnalyzer::new(&FraudConfig::default(), store.clone(), Arc::new(NoImaging));
    let device = DeviceFingerprint::new("shared-device");
    let parsed = ParsedDocument::default()
        .with_aadhaar("4991 1866 5243")
        .with_name("Ravi Sharma");

    // First applicant: clean
    let first = UserProfile::new("u1", "u1@example.in").with_name("Ravi Sharma");
    let id = submit(&store, &first, &parsed, Some(device.clone()));
    let result = analyzer.analyze(&request(id, &first, &parsed, Some(device.clone()), b"scan-1"));
    store.attach_fraud(id, "unused", &result).unwrap();
    assert_eq!(result.score(), 0);

    // Second applicant: same Aadhaar, same device
    let second = UserProfile::new("u2", "u2@example.in").with_name("Ravi Sharma");
    let id = submit(&store, &second, &parsed, Some(device.clone()));
    let result = analyzer.analyze(&request(id, &second, &parsed, Some(device), b"scan-2"));

    // duplicate 20 + device shared by 2 users 10
    assert_eq!(result.score(), 30);
    assert_eq!(result.band(), RiskBand::Low);
    let duplicate = result.details().duplicate().unwrap();
    assert_eq!(duplicate.matched, vec![DuplicateField::Aadhaar]);
    assert!(result
        .reasons()
        .contains(&"Device shared by 2 users".to_string()));

    let features = analyzer.graph_features("u2", Some(&DeviceFingerprint::new("shared-device")));
    assert_eq!(features.connections, 1);
    assert_eq!(features.risk_score, 0.5);
}

#[test]
fn test_resubmitted_bytes_match_file_hash() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let analyzer = FraudAnalyzer::new(&FraudConfig::default(), store.clone(), Arc::new(NoImaging));
    let user = UserProfile::new("u1", "u1@example.in");
    let parsed = ParsedDocument::default().with_pan("ABCDE1234F");

    let id = submit(&store, &user, &parsed, None);
    let first = analyzer.analyze(&request(id, &user, &parsed, None, b"same"));
    let hash = first.details().file_hash().unwrap().to_string();
    store.attach_fraud(id, &hash, &first).unwrap();

    let id = submit(&store, &user, &parsed, None);
    let second = analyzer.analyze(&request(id, &user, &parsed, None, b"same"));
    assert_eq!(
        second.details().duplicate().unwrap().matched,
        vec![DuplicateField::FileHash]
    );
    assert_eq!(second.score(), 20);
}
