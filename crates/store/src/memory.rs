//! In-memory store (tests and dry runs)

use std::sync::RwLock;

use chrono::Utc;
use kycguard_core::{
    Alert, AlertId, DocumentId, DocumentRecord, FraudAnalysisResult, NewAlert, NewDocument,
};

use crate::error::{StoreError, StoreResult};
use crate::filter::DocumentFilter;
use crate::traits::{AlertFilter, AlertStore, DocumentStore};

/// Vector-backed store for documents and alerts
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<Vec<DocumentRecord>>,
    alerts: RwLock<Vec<Alert>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document_count(&self) -> StoreResult<usize> {
        Ok(self.documents.read()?.len())
    }
}

impl DocumentStore for MemoryStore {
    fn insert(&self, doc: NewDocument) -> StoreResult<DocumentId> {
        let id = DocumentId::new();
        self.documents
            .write()?
            .push(DocumentRecord::from_new(id, doc));
        Ok(id)
    }

    fn get(&self, id: DocumentId) -> StoreResult<Option<DocumentRecord>> {
        Ok(self.documents.read()?.iter().find(|d| d.id == id).cloned())
    }

    fn find_many(&self, filter: &DocumentFilter, limit: usize) -> StoreResult<Vec<DocumentRecord>> {
        Ok(self
            .documents
            .read()?
            .iter()
            .filter(|d| filter.matches_record(d))
            .take(limit)
            .cloned()
            .collect())
    }

    fn attach_fraud(
        &self,
        id: DocumentId,
        file_hash: &str,
        fraud: &FraudAnalysisResult,
    ) -> StoreResult<()> {
        let mut documents = self.documents.write()?;
        let record = documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.file_hash = Some(file_hash.to_string());
        record.fraud = Some(fraud.clone());
        Ok(())
    }
}

impl AlertStore for MemoryStore {
    fn insert_alert(&self, alert: NewAlert) -> StoreResult<Alert> {
        let alert = Alert::from_new(AlertId::new(), alert, Utc::now());
        self.alerts.write()?.push(alert.clone());
        Ok(alert)
    }

    fn get_alert(&self, id: AlertId) -> StoreResult<Option<Alert>> {
        Ok(self.alerts.read()?.iter().find(|a| a.id == id).cloned())
    }

    fn list_alerts(&self, filter: AlertFilter) -> StoreResult<Vec<Alert>> {
        let mut alerts: Vec<Alert> = self
            .alerts
            .read()?
            .iter()
            .rev()
            .filter(|a| filter == AlertFilter::All || !a.seen)
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(alerts)
    }

    fn mark_seen(&self, id: AlertId) -> StoreResult<bool> {
        let mut alerts = self.alerts.write()?;
        let alert = alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(alert.dismiss())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::DocumentField;
    use kycguard_core::{DocumentType, ParsedDocument, RiskBand, SignalDetails};

    fn new_doc(user: &str, aadhaar: &str) -> NewDocument {
        NewDocument {
            user_id: user.into(),
            user_email: format!("{}@example.in", user),
            filename: "aadhaar.jpg".into(),
            document_type: DocumentType::Aadhaar,
            parsed: ParsedDocument::default().with_aadhaar(aadhaar),
            raw_text: None,
            device: None,
            created_at: Utc::now(),
        }
    }

    fn new_alert(doc: DocumentId) -> NewAlert {
        NewAlert {
            document_id: doc,
            aadhaar: None,
            pan: None,
            dl: None,
            user_email: "u@example.in".into(),
            risk_level: RiskBand::High,
            reason: "High fraud score 80".into(),
        }
    }

    #[test]
    fn test_insert_find_attach() {
        let store = MemoryStore::new();
        let a = store.insert(new_doc("u1", "499118665243")).unwrap();
        let b = store.insert(new_doc("u2", "499118665243")).unwrap();

        let filter = DocumentFilter::new()
            .eq(DocumentField::Aadhaar, "499118665243")
            .ne(DocumentField::Id, a.to_string());
        assert_eq!(store.find_one(&filter).unwrap().unwrap().id, b);
        assert_eq!(
            store
                .find_many(&DocumentFilter::new(), 10)
                .unwrap()
                .iter()
                .map(|d| d.id)
                .collect::<Vec<_>>(),
            vec![a, b]
        );
        assert_eq!(store.find_many(&DocumentFilter::new(), 1).unwrap().len(), 1);

        let fraud = FraudAnalysisResult::from_total(10, vec![], SignalDetails::new(), "t");
        store.attach_fraud(a, "hash-a", &fraud).unwrap();
        let rec = store.get(a).unwrap().unwrap();
        assert_eq!(rec.file_hash.as_deref(), Some("hash-a"));
        assert_eq!(rec.fraud.unwrap().score(), 10);

        let found = store
            .find_one(&DocumentFilter::new().eq(DocumentField::FileHash, "hash-a"))
            .unwrap();
        assert_eq!(found.map(|d| d.id), Some(a));
    }

    #[test]
    fn test_attach_fraud_missing_document() {
        let store = MemoryStore::new();
        let fraud = FraudAnalysisResult::from_total(0, vec![], SignalDetails::new(), "t");
        let err = store.attach_fraud(DocumentId::new(), "h", &fraud).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_alert_lifecycle() {
        let store = MemoryStore::new();
        let first = store.insert_alert(new_alert(DocumentId::new())).unwrap();
        let second = store.insert_alert(new_alert(DocumentId::new())).unwrap();
        assert!(!first.seen);

        let unseen = store.list_alerts(AlertFilter::Unseen).unwrap();
        assert_eq!(unseen.len(), 2);
        assert_eq!(unseen[0].id, second.id);

        assert!(store.mark_seen(first.id).unwrap());
        assert!(!store.mark_seen(first.id).unwrap());

        let unseen = store.list_alerts(AlertFilter::Unseen).unwrap();
        assert_eq!(unseen.len(), 1);
        assert_eq!(unseen[0].id, second.id);

        let all = store.list_alerts(AlertFilter::All).unwrap();
        assert_eq!(all.len(), 2);
        assert!(store.get_alert(first.id).unwrap().unwrap().seen);
    }
}
