//! Duplicate detection across uploads
//!
//! Content-hash matches count against any other record. Identifier matches
//! (Aadhaar, PAN, DL) only count against records of other users. The record
//! under evaluation never matches itself.

use std::sync::Arc;

use tracing::{debug, warn};

use kycguard_core::{
    DocumentId, DuplicateField, DuplicateReport, PanNumber, ParsedDocument, SignalEntry,
};
use kycguard_store::{Clause, DocumentField, DocumentFilter, DocumentStore, WildcardPattern};

use crate::aggregator::SignalOutcome;

/// Records excluded from a duplicate lookup
#[derive(Debug, Clone, Default)]
pub struct DuplicateScope {
    pub exclude_document: Option<DocumentId>,
    pub exclude_user: Option<String>,
}

impl DuplicateScope {
    /// Every record counts
    pub fn everyone() -> Self {
        Self::default()
    }

    /// Other users' records, never `document`
    pub fn other_users(document: DocumentId, user_id: &str) -> Self {
        Self {
            exclude_document: Some(document),
            exclude_user: Some(user_id.to_string()),
        }
    }

    fn apply(&self, mut filter: DocumentFilter) -> DocumentFilter {
        if let Some(id) = self.exclude_document {
            filter = filter.ne(DocumentField::Id, id.to_string());
        }
        if let Some(user) = &self.exclude_user {
            filter = filter.ne(DocumentField::UserId, user.clone());
        }
        filter
    }
}

/// Identifiers to look up
#[derive(Debug, Clone, Copy, Default)]
pub struct Identifiers<'a> {
    pub aadhaar: Option<&'a str>,
    pub pan: Option<&'a PanNumber>,
    pub dl: Option<&'a str>,
}

impl<'a> Identifiers<'a> {
    pub fn of(doc: &'a ParsedDocument) -> Self {
        Self {
            aadhaar: doc.aadhaar_number.as_deref(),
            pan: doc.pan.as_ref(),
            dl: doc.dl_number.as_deref(),
        }
    }
}

/// PAN predicate: wildcard match when masked, exact otherwise
pub fn pan_clause(pan: &PanNumber) -> Option<Clause> {
    if pan.is_masked() {
        match WildcardPattern::new(pan.normalized()) {
            Ok(pattern) => Some(Clause::Matches(DocumentField::Pan, pattern)),
            Err(e) => {
                warn!(error = %e, "Masked PAN could not be compiled, skipping PAN lookup");
                None
            }
        }
    } else {
        Some(Clause::Eq(DocumentField::Pan, pan.normalized().to_string()))
    }
}

#[derive(Clone)]
pub struct DuplicateDetector {
    store: Arc<dyn DocumentStore>,
    weight: u32,
}

impl DuplicateDetector {
    pub fn new(store: Arc<dyn DocumentStore>, weight: u32) -> Self {
        Self { store, weight }
    }

    /// Lookup errors are logged and treated as "not found"
    fn exists(&self, filter: &DocumentFilter) -> bool {
        match self.store.find_one(filter) {
            Ok(found) => found.is_some(),
            Err(e) => {
                warn!(error = %e, "Duplicate lookup failed, treating as not found");
                false
            }
        }
    }

    /// Match identifiers against stored records within `scope`
    pub fn lookup(&self, ids: Identifiers<'_>, scope: &DuplicateScope) -> DuplicateReport {
        let mut matched = Vec::new();

        if let Some(aadhaar) = ids.aadhaar {
            let filter = scope.apply(DocumentFilter::new().eq(DocumentField::Aadhaar, aadhaar));
            if self.exists(&filter) {
                matched.push(DuplicateField::Aadhaar);
            }
        }

        if let Some(clause) = ids.pan.and_then(pan_clause) {
            let filter = scope.apply(DocumentFilter::new().any_of(vec![clause]));
            if self.exists(&filter) {
                matched.push(DuplicateField::Pan);
            }
        }

        if let Some(dl) = ids.dl {
            let filter =
                scope.apply(DocumentFilter::new().eq(DocumentField::DrivingLicence, dl));
            if self.exists(&filter) {
                matched.push(DuplicateField::DrivingLicence);
            }
        }

        DuplicateReport { matched }
    }

    /// Full check for the document being screened
    pub fn detect(
        &self,
        file_hash: &str,
        doc: &ParsedDocument,
        user_id: &str,
        current: DocumentId,
    ) -> DuplicateReport {
        let hash_filter = DocumentFilter::new()
            .eq(DocumentField::FileHash, file_hash)
            .ne(DocumentField::Id, current.to_string());
        let hash_match = self.exists(&hash_filter);

        let mut report = self.lookup(
            Identifiers::of(doc),
            &DuplicateScope::other_users(current, user_id),
        );
        if hash_match {
            report.matched.insert(0, DuplicateField::FileHash);
        }
        report
    }

    pub fn evaluate(
        &self,
        file_hash: &str,
        doc: &ParsedDocument,
        user_id: &str,
        current: DocumentId,
    ) -> SignalOutcome {
        let report = self.detect(file_hash, doc, user_id, current);
        debug!(document_id = %current, matched = ?report.matched, "Duplicate check done");

        let mut outcome = SignalOutcome::new();
        if report.is_duplicate() {
            outcome.penalize(self.weight, "Duplicate Aadhaar/PAN/DL or file hash");
        }
        outcome.with_entry(SignalEntry::Duplicate(report))
    }
}
