//! Identity name matching
//!
//! Combines four signals into one match percentage:
//! fuzzy similarity, Soundex agreement, best match across generated name
//! variants, and consistency with the user's other documents.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use kycguard_core::{
    CrossDocumentCheck, DocumentId, FuzzyBreakdown, NameMatchReport, SignalEntry,
};
use kycguard_store::{DocumentField, DocumentFilter, DocumentStore};

use crate::aggregator::SignalOutcome;
use crate::config::Thresholds;
use crate::fuzz;

/// Honorifics dropped when generating variants
const TITLES: &[&str] = &[
    "MR", "MRS", "MS", "DR", "SHRI", "SMT", "KUM", "KUMAR", "KUMARI", "PROF", "LATE",
];

/// Uppercase, letters only, single spaces
pub fn normalize_name(name: &str) -> String {
    name.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Common renderings of an Indian name (initials, surname first, no titles, ...)
pub fn name_variations(name: &str) -> BTreeSet<String> {
    let normalized = normalize_name(name);
    let mut variations = BTreeSet::new();
    if normalized.is_empty() {
        return variations;
    }
    let parts: Vec<&str> = normalized.split(' ').collect();
    variations.insert(normalized.clone());

    if parts.len() >= 3 {
        variations.insert(format!("{} {}", parts[0], parts[parts.len() - 1]));
    }

    if parts.len() >= 2 {
        let initials: Vec<String> = parts[1..]
            .iter()
            .filter_map(|p| p.chars().next())
            .map(String::from)
            .collect();
        variations.insert(format!("{} {}", parts[0], initials.join(" ")));
        variations.insert(format!(
            "{} {}",
            parts[parts.len() - 1],
            parts[..parts.len() - 1].join(" ")
        ));
    }

    let without_titles: Vec<&str> = parts
        .iter()
        .copied()
        .filter(|p| !TITLES.contains(p))
        .collect();
    if !without_titles.is_empty() {
        variations.insert(without_titles.join(" "));
    }

    variations.insert(parts[0].to_string());
    variations
}

fn fuzzy_breakdown(a: &str, b: &str) -> FuzzyBreakdown {
    FuzzyBreakdown {
        ratio: fuzz::ratio(a, b),
        partial_ratio: fuzz::partial_ratio(a, b),
        token_set_ratio: fuzz::token_set_ratio(a, b),
        token_sort_ratio: fuzz::token_sort_ratio(a, b),
    }
}

/// Percentage of word positions whose Soundex codes agree
fn phonetic_score(a: &str, b: &str) -> Option<u32> {
    let a: Vec<&str> = a.split(' ').collect();
    let b: Vec<&str> = b.split(' ').collect();
    let total = a.len().min(b.len());
    if total == 0 {
        return None;
    }
    let matches = a
        .iter()
        .zip(b.iter())
        .filter(|(x, y)| fuzz::soundex(x) == fuzz::soundex(y))
        .count();
    Some((matches * 100 / total) as u32)
}

fn best_variation(a: &str, b: &str) -> f64 {
    let va = name_variations(a);
    let vb = name_variations(b);
    let mut best: f64 = 0.0;
    for x in &va {
        for y in &vb {
            best = best.max(fuzz::token_set_ratio(x, y));
        }
    }
    best
}

fn match_reason(overall: f64, user_name: &str, document_name: &str) -> String {
    if overall >= 90.0 {
        "Strong name match verified".to_string()
    } else if overall >= 80.0 {
        "Good name match with minor variations".to_string()
    } else if overall >= 70.0 {
        format!("Possible name variation: '{}' vs '{}'", user_name, document_name)
    } else if overall >= 50.0 {
        "Weak name match - review required".to_string()
    } else {
        format!("Name mismatch: '{}' different from '{}'", user_name, document_name)
    }
}

#[derive(Clone)]
pub struct NameMatcher {
    store: Arc<dyn DocumentStore>,
    thresholds: Thresholds,
    weight: u32,
}

impl NameMatcher {
    pub fn new(store: Arc<dyn DocumentStore>, thresholds: Thresholds, weight: u32) -> Self {
        Self {
            store,
            thresholds,
            weight,
        }
    }

    /// Compare against names on the user's other documents
    pub fn cross_document(
        &self,
        user_id: &str,
        current: DocumentId,
        normalized_name: &str,
    ) -> CrossDocumentCheck {
        let filter = DocumentFilter::new()
            .eq(DocumentField::UserId, user_id)
            .ne(DocumentField::Id, current.to_string());

        let others = match self
            .store
            .find_many(&filter, self.thresholds.cross_document_sample)
        {
            Ok(docs) => docs,
            Err(e) => {
                warn!(error = %e, "Cross-document lookup failed, treating as no history");
                return CrossDocumentCheck::empty();
            }
        };

        let similarities: Vec<f64> = others
            .iter()
            .filter_map(|d| d.name())
            .map(|other| fuzz::token_set_ratio(normalized_name, &normalize_name(other)))
            .collect();

        if similarities.is_empty() {
            return CrossDocumentCheck::empty();
        }

        let low_matches = similarities
            .iter()
            .filter(|&&s| s < self.thresholds.consistency_low)
            .count();
        CrossDocumentCheck {
            compared: similarities.len(),
            high_matches: similarities
                .iter()
                .filter(|&&s| s >= self.thresholds.consistency_high)
                .count(),
            low_matches,
            average_similarity: similarities.iter().sum::<f64>() / similarities.len() as f64,
            consistent: low_matches == 0,
        }
    }

    /// Match the declared name against the document name
    ///
    /// A missing name on either side is neutral (100%), never a mismatch.
    pub fn compare(
        &self,
        user_name: Option<&str>,
        document_name: Option<&str>,
        user_id: &str,
        current: DocumentId,
    ) -> NameMatchReport {
        let (Some(user_name), Some(document_name)) = (user_name, document_name) else {
            return NameMatchReport::skipped("Name comparison skipped (missing data)");
        };

        let user_norm = normalize_name(user_name);
        let doc_norm = normalize_name(document_name);
        if user_norm.is_empty() || doc_norm.is_empty() {
            return NameMatchReport::skipped("Name comparison skipped (empty after normalization)");
        }

        let fuzzy = fuzzy_breakdown(&user_norm, &doc_norm);
        let phonetic = phonetic_score(&user_norm, &doc_norm);
        let phonetic_match = phonetic.map_or(true, |p| p >= 50);
        let variation = best_variation(user_name, document_name);
        let cross = self.cross_document(user_id, current, &doc_norm);

        let phonetic_part = if phonetic_match { 100.0 } else { 60.0 };
        let consistency_part = if cross.consistent { 100.0 } else { 50.0 };
        let overall = fuzzy.best() * 0.40
            + variation * 0.35
            + phonetic_part * 0.15
            + consistency_part * 0.10;

        NameMatchReport {
            percentage: overall as u32,
            reason: match_reason(overall, user_name, document_name),
            fuzzy: Some(fuzzy),
            phonetic_score: phonetic,
            phonetic_match,
            variation_score: Some(variation),
            cross_document: Some(cross),
        }
    }

    pub fn evaluate(
        &self,
        user_name: Option<&str>,
        document_name: Option<&str>,
        user_id: &str,
        current: DocumentId,
    ) -> SignalOutcome {
        let report = self.compare(user_name, document_name, user_id, current);
        debug!(percentage = report.percentage, reason = %report.reason, "Name match");

        let mut outcome = SignalOutcome::new();
        if report.percentage < self.thresholds.name_mismatch_below {
            outcome.penalize(
                self.weight,
                format!("Name mismatch ({}%): {}", report.percentage, report.reason),
            );
        } else if report.percentage < self.thresholds.name_partial_below {
            outcome.penalize(
                self.weight / 2,
                format!("Name partial match ({}%): {}", report.percentage, report.reason),
            );
        }
        outcome.with_entry(SignalEntry::NameMatch(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kycguard_core::{NewDocument, ParsedDocument};
    use kycguard_store::MemoryStore;

    fn matcher(store: Arc<MemoryStore>) -> NameMatcher {
        NameMatcher::new(store, Thresholds::default(), 15)
    }

    fn insert_named(store: &MemoryStore, user: &str, name: &str) -> DocumentId {
        store
            .insert(NewDocument {
                user_id: user.into(),
                user_email: format!("{}@example.in", user),
                filename: "doc.jpg".into(),
                document_type: kycguard_core::DocumentType::Pan,
                parsed: ParsedDocument::default().with_name(name),
                raw_text: None,
                device: None,
                created_at: Utc::now(),
            })
            .unwrap()
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Dr. Ravi   K. sharma-3 "), "DR RAVI K SHARMA");
        assert_eq!(normalize_name("123"), "");
    }

    #[test]
    fn test_variations() {
        let v = name_variations("Shri Ravi Kumar Sharma");
        assert!(v.contains("SHRI SHARMA"));
        assert!(v.contains("SHRI R K S"));
        assert!(v.contains("SHARMA SHRI RAVI KUMAR"));
        assert!(v.contains("RAVI SHARMA"));
        assert!(v.contains("SHRI"));
    }

    #[test]
    fn test_surname_first_is_strong_match() {
        let store = Arc::new(MemoryStore::new());
        let report = matcher(store).compare(Some("Y Teja"), Some("TEJA Y"), "u1", DocumentId::new());

        assert!(!report.phonetic_match);
        assert_eq!(report.variation_score, Some(100.0));
        assert_eq!(report.percentage, 94);
        assert!(report.percentage >= 85);
        assert_eq!(report.reason, "Strong name match verified");
    }

    #[test]
    fn test_missing_name_is_neutral() {
        let store = Arc::new(MemoryStore::new());
        let m = matcher(store);
        let outcome = m.evaluate(None, Some("TEJA Y"), "u1", DocumentId::new());
        assert_eq!(outcome.penalty(), 0);

        let report = m.compare(Some("Y Teja"), Some("1234"), "u1", DocumentId::new());
        assert_eq!(report.percentage, 100);
        assert!(report.is_skipped());
    }

    #[test]
    fn test_mismatch_penalty() {
        let store = Arc::new(MemoryStore::new());
        let outcome = matcher(store).evaluate(
            Some("Anjali Mehta"),
            Some("Bhupinder Singh"),
            "u1",
            DocumentId::new(),
        );
        assert_eq!(outcome.penalty(), 15);
        assert!(outcome.reasons()[0].starts_with("Name mismatch ("));
    }

    #[test]
    fn test_cross_document_inconsistency() {
        let store = Arc::new(MemoryStore::new());
        insert_named(&store, "u1", "Ravi Sharma");
        insert_named(&store, "u1", "Zubair Qureshi");
        let current = insert_named(&store, "u1", "Ravi Sharma");

        let check = matcher(store).cross_document("u1", current, "RAVI SHARMA");
        assert_eq!(check.compared, 2);
        assert_eq!(check.high_matches, 1);
        assert_eq!(check.low_matches, 1);
        assert!(!check.consistent);
    }

    #[test]
    fn test_compare_is_deterministic() {
        let store = Arc::new(MemoryStore::new());
        let m = matcher(store);
        let id = DocumentId::new();
        assert_eq!(
            m.compare(Some("Ravi Kumar"), Some("Ravi Verma"), "u1", id),
            m.compare(Some("Ravi Kumar"), Some("Ravi Verma"), "u1", id)
        );
    }
}
