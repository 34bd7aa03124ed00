//! Fraud analysis result

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::signal::SignalDetails;

/// Highest possible fraud score
pub const MAX_SCORE: u32 = 100;

/// Qualitative risk band derived from the fraud score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    /// `<= 30` Low, `<= 70` Medium, otherwise High
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=30 => RiskBand::Low,
            31..=70 => RiskBand::Medium,
            _ => RiskBand::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Low => "Low",
            RiskBand::Medium => "Medium",
            RiskBand::High => "High",
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scored, explainable outcome of the signal pipeline
///
/// Immutable once built: the score is clamped and the band derived in
/// [`FraudAnalysisResult::from_total`], and there are no setters. Stored
/// copies are checked against the same rules when read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredResult")]
pub struct FraudAnalysisResult {
    score: u32,
    band: RiskBand,
    reasons: Vec<String>,
    details: SignalDetails,
    model_version: String,
}

#[derive(Deserialize)]
struct StoredResult {
    score: u32,
    band: RiskBand,
    reasons: Vec<String>,
    details: SignalDetails,
    model_version: String,
}

impl TryFrom<StoredResult> for FraudAnalysisResult {
    type Error = CoreError;

    fn try_from(stored: StoredResult) -> Result<Self, Self::Error> {
        if stored.score > MAX_SCORE {
            return Err(CoreError::InvalidResult(format!(
                "score {} above {}",
                stored.score, MAX_SCORE
            )));
        }
        let expected = RiskBand::from_score(stored.score);
        if stored.band != expected {
            return Err(CoreError::InvalidResult(format!(
                "band {} does not match score {} ({})",
                stored.band, stored.score, expected
            )));
        }
        Ok(Self::from_total(
            stored.score,
            stored.reasons,
            stored.details,
            stored.model_version,
        ))
    }
}

impl FraudAnalysisResult {
    /// Build from the raw (unclamped) penalty total
    pub fn from_total(
        total: u32,
        reasons: Vec<String>,
        details: SignalDetails,
        model_version: impl Into<String>,
    ) -> Self {
        let score = total.min(MAX_SCORE);
        Self {
            score,
            band: RiskBand::from_score(score),
            reasons,
            details,
            model_version: model_version.into(),
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn band(&self) -> RiskBand {
        self.band
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    pub fn details(&self) -> &SignalDetails {
        &self.details
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        assert_eq!(RiskBand::from_score(0), RiskBand::Low);
        assert_eq!(RiskBand::from_score(30), RiskBand::Low);
        assert_eq!(RiskBand::from_score(31), RiskBand::Medium);
        assert_eq!(RiskBand::from_score(70), RiskBand::Medium);
        assert_eq!(RiskBand::from_score(71), RiskBand::High);
        assert_eq!(RiskBand::from_score(100), RiskBand::High);
    }

    #[test]
    fn test_score_is_clamped() {
        let result = FraudAnalysisResult::from_total(245, vec![], SignalDetails::new(), "heuristic-v2.0");
        assert_eq!(result.score(), 100);
        assert_eq!(result.band(), RiskBand::High);
    }

    #[test]
    fn test_stored_result_is_checked() {
        let result = FraudAnalysisResult::from_total(42, vec!["x".into()], SignalDetails::new(), "t");
        let json = serde_json::to_value(&result).unwrap();
        let back: FraudAnalysisResult = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, result);

        let mut over = json.clone();
        over["score"] = 250.into();
        over["band"] = "High".into();
        assert!(serde_json::from_value::<FraudAnalysisResult>(over).is_err());

        let mut mismatched = json;
        mismatched["band"] = "Low".into();
        assert!(serde_json::from_value::<FraudAnalysisResult>(mismatched).is_err());
    }

    #[test]
    fn test_every_score_has_consistent_band() {
        for total in 0..=150 {
            let result = FraudAnalysisResult::from_total(total, vec![], SignalDetails::new(), "t");
            assert!(result.score() <= MAX_SCORE);
            assert_eq!(result.band(), RiskBand::from_score(result.score()));
        }
    }
}
