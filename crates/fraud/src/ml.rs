//! Model probability signals
//!
//! Probabilities come from an external collaborator. A missing probability is
//! "no signal", never zero risk.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use kycguard_core::SignalEntry;

use crate::aggregator::SignalOutcome;
use crate::config::{Thresholds, Weights};
use crate::error::FraudResult;

/// Summary of the device graph handed to the network model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphFeatures {
    /// Distinct other users seen on the same device
    pub connections: usize,
    pub risk_score: f64,
}

impl GraphFeatures {
    pub fn from_connections(connections: usize) -> Self {
        Self {
            connections,
            risk_score: if connections > 0 { 0.5 } else { 0.1 },
        }
    }
}

/// External model host
#[async_trait]
pub trait MlCollaborator: Send + Sync {
    /// Probability that the image was manipulated
    async fn manipulation_probability(&self, bytes: &[u8]) -> FraudResult<Option<f64>>;

    /// Probability that the device network is fraudulent
    async fn network_fraud_probability(&self, features: &GraphFeatures)
        -> FraudResult<Option<f64>>;
}

/// No models deployed
#[derive(Debug, Clone, Copy, Default)]
pub struct NoModels;

#[async_trait]
impl MlCollaborator for NoModels {
    async fn manipulation_probability(&self, _bytes: &[u8]) -> FraudResult<Option<f64>> {
        Ok(None)
    }

    async fn network_fraud_probability(
        &self,
        _features: &GraphFeatures,
    ) -> FraudResult<Option<f64>> {
        Ok(None)
    }
}

/// Returns preset probabilities, for replays and tests
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedProbabilities {
    pub manipulation: Option<f64>,
    pub network_fraud: Option<f64>,
}

#[async_trait]
impl MlCollaborator for FixedProbabilities {
    async fn manipulation_probability(&self, _bytes: &[u8]) -> FraudResult<Option<f64>> {
        Ok(self.manipulation)
    }

    async fn network_fraud_probability(
        &self,
        _features: &GraphFeatures,
    ) -> FraudResult<Option<f64>> {
        Ok(self.network_fraud)
    }
}

fn in_range(p: Option<f64>, label: &str) -> Option<f64> {
    match p {
        Some(v) if v.is_finite() && (0.0..=1.0).contains(&v) => Some(v),
        Some(v) => {
            warn!(probability = v, model = label, "Discarding out-of-range model probability");
            None
        }
        None => None,
    }
}

/// Probabilities supplied for one screening run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSignals {
    #[serde(default)]
    pub manipulation: Option<f64>,
    #[serde(default)]
    pub network_fraud: Option<f64>,
}

impl ModelSignals {
    /// Drop values that are not finite probabilities
    pub fn sanitized(self) -> Self {
        Self {
            manipulation: in_range(self.manipulation, "manipulation"),
            network_fraud: in_range(self.network_fraud, "network_fraud"),
        }
    }

    pub fn any(&self) -> bool {
        self.manipulation.is_some() || self.network_fraud.is_some()
    }

    /// Ask the collaborator for both probabilities concurrently
    ///
    /// Errors are logged and become "no signal".
    pub async fn collect(
        models: &dyn MlCollaborator,
        bytes: &[u8],
        features: &GraphFeatures,
    ) -> Self {
        let (manipulation, network_fraud) = tokio::join!(
            models.manipulation_probability(bytes),
            models.network_fraud_probability(features),
        );

        let manipulation = manipulation.unwrap_or_else(|e| {
            warn!(error = %e, "Manipulation model unavailable");
            None
        });
        let network_fraud = network_fraud.unwrap_or_else(|e| {
            warn!(error = %e, "Network fraud model unavailable");
            None
        });

        Self {
            manipulation,
            network_fraud,
        }
        .sanitized()
    }
}

/// Scales model probabilities into penalties
#[derive(Debug, Clone)]
pub struct MlSignalAdapter {
    weights: Weights,
    trigger: f64,
}

impl MlSignalAdapter {
    pub fn new(weights: Weights, thresholds: &Thresholds) -> Self {
        Self {
            weights,
            trigger: thresholds.ml_trigger,
        }
    }

    fn penalty(&self, probability: f64, weight: u32) -> u32 {
        if probability > self.trigger {
            (probability * weight as f64).floor() as u32
        } else {
            0
        }
    }

    pub fn evaluate(&self, signals: ModelSignals) -> SignalOutcome {
        let signals = signals.sanitized();
        let mut outcome = SignalOutcome::new();

        if let Some(p) = signals.manipulation {
            let penalty = self.penalty(p, self.weights.ml_manipulation);
            if penalty > 0 {
                outcome.penalize(
                    penalty,
                    format!(
                        "AI detected potential image manipulation ({}%)",
                        (p * 100.0) as u32
                    ),
                );
            }
            outcome.record(SignalEntry::MlManipulation {
                probability: p,
                penalty,
            });
        }

        if let Some(p) = signals.network_fraud {
            let penalty = self.penalty(p, self.weights.ml_network_fraud);
            if penalty > 0 {
                outcome.penalize(
                    penalty,
                    format!(
                        "GNN detected suspicious network activity ({}%)",
                        (p * 100.0) as u32
                    ),
                );
            }
            outcome.record(SignalEntry::MlNetworkFraud {
                probability: p,
                penalty,
            });
        }

        debug!(penalty = outcome.penalty(), "Model signals applied");
        outcome
    }
}
