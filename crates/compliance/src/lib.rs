//! KycGuard Compliance Engine
//!
//! AML screening, decisions, alerts and the audit trail around the fraud score.
//!
//! ## Architecture
//!
//! ```text
//! Record store (SQLite)          Audit Ledger (JSONL)
//! ├── Documents                  ├── ScreeningRecorded
//! ├── Fraud results              ├── AlertDismissed
//! └── Alerts ◄───────────────────┴── BlacklistUpdated
//!         │                              │
//!         └──────────┬───────────────────┘
//!                    ▼
//!               KycPipeline
//! ```
//!
//! ## Key Components
//!
//! - [`config::ComplianceConfig`] - Decision cut-offs and fraud policy (not hardcoded)
//! - [`aml::AmlScreener`] - Blacklist, age and duplicate checks
//! - [`decision::DecisionEngine`] - Pass / Review / Flagged
//! - [`alerts::AlertDesk`] - Alerts for flagged documents
//! - [`ledger::AuditLedger`] - Append-only JSONL ledger
//! - [`pipeline::KycPipeline`] - Main orchestrator

pub mod alerts;
pub mod aml;
pub mod config;
pub mod decision;
pub mod error;
pub mod event;
pub mod ledger;
pub mod pipeline;

pub use alerts::AlertDesk;
pub use aml::{age_on, parse_dob, AmlReport, AmlScreener};
pub use config::ComplianceConfig;
pub use decision::{DecisionEngine, Escalation, Verdict};
pub use error::{ComplianceError, ComplianceResult};
pub use event::AuditEvent;
pub use ledger::{AuditLedger, RiskSummary, SummarySource};
pub use pipeline::{KycPipeline, PipelineBuilder, ScreeningOutcome, Submission, Upload};
