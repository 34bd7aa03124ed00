//! Fraud scoring policy: weights and thresholds
//!
//! Every value is configurable; the defaults are the current production policy.
//! Partial JSON overrides only the fields it names.

use serde::{Deserialize, Serialize};

use crate::error::{FraudError, FraudResult};

/// Points added to the fraud score per failed signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weights {
    #[serde(default = "default_aadhaar_invalid")]
    pub aadhaar_invalid: u32,
    #[serde(default = "default_pan_invalid")]
    pub pan_invalid: u32,
    #[serde(default = "default_dl_invalid")]
    pub dl_invalid: u32,
    #[serde(default = "default_duplicate")]
    pub duplicate: u32,
    #[serde(default = "default_manipulation")]
    pub manipulation: u32,
    /// Full weight below the mismatch threshold, half below the partial threshold
    #[serde(default = "default_name_mismatch")]
    pub name_mismatch: u32,
    #[serde(default = "default_blur")]
    pub blur: u32,
    #[serde(default = "default_cropped")]
    pub cropped: u32,
    #[serde(default = "default_new_device")]
    pub new_device: u32,
    /// Full weight for two or more other users, half for exactly one
    #[serde(default = "default_device_multi_user")]
    pub device_multi_user: u32,
    #[serde(default = "default_timezone_mismatch")]
    pub timezone_mismatch: u32,
    #[serde(default = "default_suspicious_device")]
    pub suspicious_device: u32,
    #[serde(default = "default_unusual_platform")]
    pub unusual_platform: u32,
    /// Scaled by the model probability
    #[serde(default = "default_ml_manipulation")]
    pub ml_manipulation: u32,
    /// Scaled by the model probability
    #[serde(default = "default_ml_network_fraud")]
    pub ml_network_fraud: u32,
}

fn default_aadhaar_invalid() -> u32 {
    40
}

fn default_pan_invalid() -> u32 {
    30
}

fn default_dl_invalid() -> u32 {
    25
}

fn default_duplicate() -> u32 {
    20
}

fn default_manipulation() -> u32 {
    10
}

fn default_name_mismatch() -> u32 {
    15
}

fn default_blur() -> u32 {
    20
}

fn default_cropped() -> u32 {
    15
}

fn default_new_device() -> u32 {
    5
}

fn default_device_multi_user() -> u32 {
    20
}

fn default_timezone_mismatch() -> u32 {
    10
}

fn default_suspicious_device() -> u32 {
    8
}

fn default_unusual_platform() -> u32 {
    2
}

fn default_ml_manipulation() -> u32 {
    35
}

fn default_ml_network_fraud() -> u32 {
    30
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            aadhaar_invalid: default_aadhaar_invalid(),
            pan_invalid: default_pan_invalid(),
            dl_invalid: default_dl_invalid(),
            duplicate: default_duplicate(),
            manipulation: default_manipulation(),
            name_mismatch: default_name_mismatch(),
            blur: default_blur(),
            cropped: default_cropped(),
            new_device: default_new_device(),
            device_multi_user: default_device_multi_user(),
            timezone_mismatch: default_timezone_mismatch(),
            suspicious_device: default_suspicious_device(),
            unusual_platform: default_unusual_platform(),
            ml_manipulation: default_ml_manipulation(),
            ml_network_fraud: default_ml_network_fraud(),
        }
    }
}

/// Cut-offs for the individual signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Laplacian variance below this is blurry
    #[serde(default = "default_blur_variance")]
    pub blur_variance: f64,

    /// Bounding-box fill ratio below this is cropped
    #[serde(default = "default_crop_ratio")]
    pub crop_ratio: f64,

    /// Name match percentage below this is a mismatch
    #[serde(default = "default_name_mismatch_below")]
    pub name_mismatch_below: u32,

    /// Name match percentage below this is a partial match
    #[serde(default = "default_name_partial_below")]
    pub name_partial_below: u32,

    /// Other documents of the same user compared for name consistency
    #[serde(default = "default_cross_document_sample")]
    pub cross_document_sample: usize,

    #[serde(default = "default_consistency_high")]
    pub consistency_high: f64,

    /// Any cross-document similarity below this is inconsistent
    #[serde(default = "default_consistency_low")]
    pub consistency_low: f64,

    /// Model probabilities must exceed this to count
    #[serde(default = "default_ml_trigger")]
    pub ml_trigger: f64,

    /// Prior documents scanned for the user's known devices
    #[serde(default = "default_device_history_sample")]
    pub device_history_sample: usize,

    /// Documents scanned for other users on the same device
    #[serde(default = "default_device_user_sample")]
    pub device_user_sample: usize,
}

fn default_blur_variance() -> f64 {
    100.0
}

fn default_crop_ratio() -> f64 {
    0.65
}

fn default_name_mismatch_below() -> u32 {
    70
}

fn default_name_partial_below() -> u32 {
    85
}

fn default_cross_document_sample() -> usize {
    10
}

fn default_consistency_high() -> f64 {
    80.0
}

fn default_consistency_low() -> f64 {
    60.0
}

fn default_ml_trigger() -> f64 {
    0.5
}

fn default_device_history_sample() -> usize {
    50
}

fn default_device_user_sample() -> usize {
    100
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            blur_variance: default_blur_variance(),
            crop_ratio: default_crop_ratio(),
            name_mismatch_below: default_name_mismatch_below(),
            name_partial_below: default_name_partial_below(),
            cross_document_sample: default_cross_document_sample(),
            consistency_high: default_consistency_high(),
            consistency_low: default_consistency_low(),
            ml_trigger: default_ml_trigger(),
            device_history_sample: default_device_history_sample(),
            device_user_sample: default_device_user_sample(),
        }
    }
}

/// Fraud engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FraudConfig {
    #[serde(default)]
    pub weights: Weights,
    #[serde(default)]
    pub thresholds: Thresholds,
}

impl FraudConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &std::path::Path) -> FraudResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject thresholds outside their domain
    pub fn validate(&self) -> FraudResult<()> {
        let t = &self.thresholds;

        if !(0.0..=1.0).contains(&t.crop_ratio) {
            return Err(FraudError::Config(format!(
                "crop_ratio must be within [0, 1], got {}",
                t.crop_ratio
            )));
        }
        if !(0.0..=1.0).contains(&t.ml_trigger) {
            return Err(FraudError::Config(format!(
                "ml_trigger must be within [0, 1], got {}",
                t.ml_trigger
            )));
        }
        if !t.blur_variance.is_finite() || t.blur_variance < 0.0 {
            return Err(FraudError::Config(format!(
                "blur_variance must be a non-negative number, got {}",
                t.blur_variance
            )));
        }
        if t.name_mismatch_below > t.name_partial_below || t.name_partial_below > 100 {
            return Err(FraudError::Config(format!(
                "name thresholds must satisfy mismatch <= partial <= 100, got {} / {}",
                t.name_mismatch_below, t.name_partial_below
            )));
        }
        if t.consistency_low > t.consistency_high {
            return Err(FraudError::Config(format!(
                "consistency_low ({}) exceeds consistency_high ({})",
                t.consistency_low, t.consistency_high
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let config = FraudConfig::default();

        assert_eq!(config.weights.aadhaar_invalid, 40);
        assert_eq!(config.weights.pan_invalid, 30);
        assert_eq!(config.weights.dl_invalid, 25);
        assert_eq!(config.weights.ml_manipulation, 35);
        assert_eq!(config.weights.ml_network_fraud, 30);
        assert_eq!(config.thresholds.blur_variance, 100.0);
        assert_eq!(config.thresholds.crop_ratio, 0.65);
        assert_eq!(config.thresholds.cross_document_sample, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{ "weights": { "duplicate": 35 }, "thresholds": { "blur_variance": 60.0 } }"#;
        let config: FraudConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.weights.duplicate, 35);
        assert_eq!(config.weights.aadhaar_invalid, 40); // default
        assert_eq!(config.thresholds.blur_variance, 60.0);
        assert_eq!(config.thresholds.crop_ratio, 0.65); // default
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = FraudConfig::default();
        config.thresholds.crop_ratio = 1.5;
        assert!(matches!(config.validate(), Err(FraudError::Config(_))));

        let mut config = FraudConfig::default();
        config.thresholds.name_mismatch_below = 90;
        assert!(config.validate().is_err());

        let mut config = FraudConfig::default();
        config.thresholds.consistency_low = 95.0;
        assert!(config.validate().is_err());
    }
}
