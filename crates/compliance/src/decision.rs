//! Decision engine
//!
//! ```text
//! AML reason OR score >= flag  -> Flagged (+ alert)
//! score >= review              -> Review
//! otherwise                    -> Pass
//! ```
//!
//! Every run ends in exactly one terminal decision.

use serde::{Deserialize, Serialize};

use kycguard_core::{KycDecision, RiskBand};

/// Alert to raise for a flagged document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escalation {
    pub risk_level: RiskBand,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub decision: KycDecision,
    /// Present only for `Flagged`
    pub escalation: Option<Escalation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionEngine {
    flag_score: u32,
    review_score: u32,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(71, 31)
    }
}

impl DecisionEngine {
    pub fn new(flag_score: u32, review_score: u32) -> Self {
        Self {
            flag_score,
            review_score,
        }
    }

    pub fn decide(&self, score: u32, aml_reasons: &[String]) -> Verdict {
        let high_score = score >= self.flag_score;

        if !aml_reasons.is_empty() || high_score {
            let reason = if aml_reasons.is_empty() {
                format!("High fraud score {}", score)
            } else {
                aml_reasons.join("; ")
            };
            return Verdict {
                decision: KycDecision::Flagged,
                escalation: Some(Escalation {
                    risk_level: if high_score { RiskBand::High } else { RiskBand::Medium },
                    reason,
                }),
            };
        }

        let decision = if score >= self.review_score {
            KycDecision::Review
        } else {
            KycDecision::Pass
        };
        Verdict {
            decision,
            escalation: None,
        }
    }
}
