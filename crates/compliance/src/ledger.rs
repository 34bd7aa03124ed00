//! Audit Ledger - Append-only JSONL storage
//!
//! One JSON-serialized [`AuditEvent`] per line. Lines are never rewritten;
//! dismissals and blacklist changes are appended as their own events.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use kycguard_core::{AuditLogEntry, RiskBand};

use crate::error::{ComplianceError, ComplianceResult};
use crate::event::AuditEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    AuditLogs,
    /// No screening history for the identifier
    Default,
}

/// Average fraud score across the recorded screenings of one Aadhaar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub aadhaar: String,
    pub risk_score: u32,
    pub risk_label: RiskBand,
    pub source: SummarySource,
    pub entries: usize,
}

impl RiskSummary {
    fn neutral(aadhaar: &str) -> Self {
        Self {
            aadhaar: aadhaar.to_string(),
            risk_score: 0,
            risk_label: RiskBand::Low,
            source: SummarySource::Default,
            entries: 0,
        }
    }

    /// Label comes from the unrounded average; the score is truncated
    fn from_scores(aadhaar: &str, scores: &[u32]) -> Self {
        if scores.is_empty() {
            return Self::neutral(aadhaar);
        }
        let avg = scores.iter().map(|s| *s as f64).sum::<f64>() / scores.len() as f64;
        let risk_label = if avg <= 30.0 {
            RiskBand::Low
        } else if avg <= 70.0 {
            RiskBand::Medium
        } else {
            RiskBand::High
        };
        Self {
            aadhaar: aadhaar.to_string(),
            risk_score: avg as u32,
            risk_label,
            source: SummarySource::AuditLogs,
            entries: scores.len(),
        }
    }
}

/// Append-only JSONL ledger for audit events
///
/// Safe to share behind an `Arc`: appends are serialized by a mutex.
pub struct AuditLedger {
    path: PathBuf,
    file: Option<Mutex<File>>,
    /// Events appended while in-memory
    memory: Mutex<Vec<AuditEvent>>,
}

impl AuditLedger {
    /// Create a new ledger at the given path
    pub fn new(path: impl AsRef<Path>) -> ComplianceResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            file: Some(Mutex::new(file)),
            memory: Mutex::new(Vec::new()),
        })
    }

    /// Create an in-memory ledger (for testing)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            file: None,
            memory: Mutex::new(Vec::new()),
        }
    }

    /// Append an event to the ledger
    pub fn append(&self, event: &AuditEvent) -> ComplianceResult<()> {
        let json = serde_json::to_string(event)?;

        match &self.file {
            Some(file) => {
                let mut file = file
                    .lock()
                    .map_err(|_| ComplianceError::LedgerWriteError("ledger lock poisoned".into()))?;
                writeln!(file, "{}", json)?;
                file.flush()?;
            }
            None => {
                self.memory
                    .lock()
                    .map_err(|_| ComplianceError::LedgerWriteError("ledger lock poisoned".into()))?
                    .push(event.clone());
            }
        }
        Ok(())
    }

    /// Read all events, oldest first
    pub fn read_all(&self) -> ComplianceResult<Vec<AuditEvent>> {
        if self.file.is_none() {
            return self
                .memory
                .lock()
                .map(|events| events.clone())
                .map_err(|_| ComplianceError::LedgerReadError("ledger lock poisoned".into()));
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut events = Vec::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event: AuditEvent = serde_json::from_str(&line).map_err(|e| {
                ComplianceError::LedgerReadError(format!("line {}: {}", i + 1, e))
            })?;
            events.push(event);
        }

        Ok(events)
    }

    /// Screening snapshots, oldest first
    pub fn screenings(&self) -> ComplianceResult<Vec<AuditLogEntry>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter_map(|event| match event {
                AuditEvent::ScreeningRecorded(entry) => Some(entry),
                _ => None,
            })
            .collect())
    }

    /// Most recent screenings, newest first
    pub fn recent(&self, limit: usize) -> ComplianceResult<Vec<AuditLogEntry>> {
        let mut entries = self.screenings()?;
        // Stable sort; equal timestamps keep append order reversed
        entries.reverse();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit);
        Ok(entries)
    }

    pub fn risk_summary(&self, aadhaar: &str) -> ComplianceResult<RiskSummary> {
        let scores: Vec<u32> = self
            .screenings()?
            .iter()
            .filter(|entry| entry.aadhaar.as_deref() == Some(aadhaar))
            .map(AuditLogEntry::fraud_score)
            .collect();
        Ok(RiskSummary::from_scores(aadhaar, &scores))
    }

    /// Get the current line count
    pub fn line_count(&self) -> ComplianceResult<usize> {
        if self.file.is_none() {
            return self
                .memory
                .lock()
                .map(|events| events.len())
                .map_err(|_| ComplianceError::LedgerReadError("ledger lock poisoned".into()));
        }

        let reader = BufReader::new(File::open(&self.path)?);
        Ok(reader.lines().count())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_in_memory(&self) -> bool {
        self.file.is_none()
    }
}
