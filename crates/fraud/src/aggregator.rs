//! Risk aggregation
//!
//! Each signal module yields a [`SignalOutcome`]. The aggregator sums the
//! penalties (no normalization by count), keeps the reasons in evaluation order
//! and records every entry in the append-only details map.

use kycguard_core::{FraudAnalysisResult, SignalDetails, SignalEntry};

/// Contribution of one signal module
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalOutcome {
    penalty: u32,
    reasons: Vec<String>,
    entries: Vec<SignalEntry>,
}

impl SignalOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a details entry
    pub fn with_entry(mut self, entry: SignalEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn record(&mut self, entry: SignalEntry) {
        self.entries.push(entry);
    }

    /// Add points and the human-readable reason for them
    pub fn penalize(&mut self, points: u32, reason: impl Into<String>) {
        self.penalty = self.penalty.saturating_add(points);
        self.reasons.push(reason.into());
    }

    pub fn penalty(&self) -> u32 {
        self.penalty
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    pub fn entries(&self) -> &[SignalEntry] {
        &self.entries
    }

    /// Fold `other` into this outcome
    pub fn absorb(&mut self, other: SignalOutcome) {
        self.penalty = self.penalty.saturating_add(other.penalty);
        self.reasons.extend(other.reasons);
        self.entries.extend(other.entries);
    }
}

/// Weighted sum of all signal outcomes
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskAggregator;

impl RiskAggregator {
    /// Clamp the penalty total to the score range and derive the band
    pub fn aggregate(
        &self,
        outcomes: impl IntoIterator<Item = SignalOutcome>,
        model_version: &str,
    ) -> FraudAnalysisResult {
        let mut total: u32 = 0;
        let mut reasons = Vec::new();
        let mut details = SignalDetails::new();

        for outcome in outcomes {
            total = total.saturating_add(outcome.penalty);
            reasons.extend(outcome.reasons);
            for entry in outcome.entries {
                if !details.record(entry) {
                    tracing::warn!("Signal recorded twice, keeping the first entry");
                }
            }
        }

        FraudAnalysisResult::from_total(total, reasons, details, model_version)
    }
}
