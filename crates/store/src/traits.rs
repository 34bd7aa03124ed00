//! Store collaborator traits
//!
//! No transactions are assumed. Implementations must tolerate concurrent readers
//! and writers from other screening runs.

use kycguard_core::{
    Alert, AlertId, DocumentId, DocumentRecord, FraudAnalysisResult, NewAlert, NewDocument,
};
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::filter::DocumentFilter;

/// Uploaded document records
pub trait DocumentStore: Send + Sync {
    /// Insert and return the generated id
    fn insert(&self, doc: NewDocument) -> StoreResult<DocumentId>;

    fn get(&self, id: DocumentId) -> StoreResult<Option<DocumentRecord>>;

    /// Records matching `filter` in insertion order, at most `limit`
    fn find_many(&self, filter: &DocumentFilter, limit: usize) -> StoreResult<Vec<DocumentRecord>>;

    fn find_one(&self, filter: &DocumentFilter) -> StoreResult<Option<DocumentRecord>> {
        Ok(self.find_many(filter, 1)?.into_iter().next())
    }

    /// Update-one by id: store the fraud result and content hash
    fn attach_fraud(
        &self,
        id: DocumentId,
        file_hash: &str,
        fraud: &FraudAnalysisResult,
    ) -> StoreResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertFilter {
    /// Not yet dismissed
    Unseen,
    All,
}

/// Compliance alerts; never deleted
pub trait AlertStore: Send + Sync {
    fn insert_alert(&self, alert: NewAlert) -> StoreResult<Alert>;

    fn get_alert(&self, id: AlertId) -> StoreResult<Option<Alert>>;

    /// Newest first
    fn list_alerts(&self, filter: AlertFilter) -> StoreResult<Vec<Alert>>;

    /// Returns `true` only on the unseen -> seen transition
    fn mark_seen(&self, id: AlertId) -> StoreResult<bool>;
}
