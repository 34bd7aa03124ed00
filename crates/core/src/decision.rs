//! KYC decision types

use serde::{Deserialize, Serialize};

/// Final outcome of one screening run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KycDecision {
    Pass,
    Review,
    Flagged,
}

impl KycDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            KycDecision::Pass => "Pass",
            KycDecision::Review => "Review",
            KycDecision::Flagged => "Flagged",
        }
    }
}

impl std::fmt::Display for KycDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// AML check kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmlCheck {
    AadhaarBlacklist,
    PanBlacklist,
    DlBlacklist,
    Age,
    Duplicate,
}

/// Result of one AML check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmlFinding {
    pub check: AmlCheck,
    pub flagged: bool,
    pub reason: Option<String>,
}

impl AmlFinding {
    pub fn clear(check: AmlCheck) -> Self {
        Self {
            check,
            flagged: false,
            reason: None,
        }
    }

    pub fn flagged(check: AmlCheck, reason: impl Into<String>) -> Self {
        Self {
            check,
            flagged: true,
            reason: Some(reason.into()),
        }
    }

    /// Reason strings of the flagged findings, in order
    pub fn reasons(findings: &[AmlFinding]) -> Vec<String> {
        findings
            .iter()
            .filter(|f| f.flagged)
            .filter_map(|f| f.reason.clone())
            .collect()
    }
}
