//! Compliance configuration
//!
//! Decision cut-offs and file locations, plus the fraud policy.
//! Every field has a default; a partial JSON file overrides only what it names.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use kycguard_fraud::FraudConfig;

use crate::error::{ComplianceError, ComplianceResult};

/// Configuration for the Compliance Engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceConfig {
    /// Fraud weights and thresholds
    #[serde(default)]
    pub fraud: FraudConfig,

    // === Decision ===
    /// Fraud score at or above which a document is flagged
    #[serde(default = "default_flag_score")]
    pub flag_score: u32,

    /// Fraud score at or above which a document goes to review
    #[serde(default = "default_review_score")]
    pub review_score: u32,

    /// Applicants younger than this are flagged
    #[serde(default = "default_minimum_age")]
    pub minimum_age: u32,

    // === Files (relative to the data directory) ===
    #[serde(default = "default_database_file")]
    pub database_file: PathBuf,

    #[serde(default = "default_audit_file")]
    pub audit_file: PathBuf,

    #[serde(default = "default_registry_file")]
    pub registry_file: PathBuf,
}

fn default_flag_score() -> u32 {
    71
}

fn default_review_score() -> u32 {
    31
}

fn default_minimum_age() -> u32 {
    18
}

fn default_database_file() -> PathBuf {
    PathBuf::from("kyc.db")
}

fn default_audit_file() -> PathBuf {
    PathBuf::from("audit.jsonl")
}

fn default_registry_file() -> PathBuf {
    PathBuf::from("blacklist.json")
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            fraud: FraudConfig::default(),
            flag_score: default_flag_score(),
            review_score: default_review_score(),
            minimum_age: default_minimum_age(),
            database_file: default_database_file(),
            audit_file: default_audit_file(),
            registry_file: default_registry_file(),
        }
    }
}

impl ComplianceConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &Path) -> ComplianceResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ComplianceResult<()> {
        if self.review_score >= self.flag_score {
            return Err(ComplianceError::Config(format!(
                "review_score ({}) must be below flag_score ({})",
                self.review_score, self.flag_score
            )));
        }
        if self.flag_score > kycguard_core::MAX_SCORE {
            return Err(ComplianceError::Config(format!(
                "flag_score ({}) exceeds the maximum score",
                self.flag_score
            )));
        }
        self.fraud
            .validate()
            .map_err(|e| ComplianceError::Config(e.to_string()))
    }

    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.database_file)
    }

    pub fn audit_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.audit_file)
    }

    pub fn registry_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.registry_file)
    }
}
