//! Audit events (written to the audit ledger)
//!
//! Append-only and immutable. A screening snapshot is never updated; later
//! actions on it (alert dismissal) are recorded as new events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kycguard_core::{AlertId, AuditLogEntry};
use kycguard_store::IdKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// One completed screening run
    ScreeningRecorded(AuditLogEntry),

    /// An operator dismissed an alert
    AlertDismissed {
        alert_id: AlertId,
        timestamp: DateTime<Utc>,
    },

    /// An identifier was added to the blacklist
    BlacklistUpdated {
        kind: IdKind,
        value: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl AuditEvent {
    pub fn alert_dismissed(alert_id: AlertId) -> Self {
        AuditEvent::AlertDismissed {
            alert_id,
            timestamp: Utc::now(),
        }
    }

    pub fn blacklist_updated(kind: IdKind, value: impl Into<String>, reason: impl Into<String>) -> Self {
        AuditEvent::BlacklistUpdated {
            kind,
            value: value.into(),
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            AuditEvent::ScreeningRecorded(entry) => entry.created_at,
            AuditEvent::AlertDismissed { timestamp, .. } => *timestamp,
            AuditEvent::BlacklistUpdated { timestamp, .. } => *timestamp,
        }
    }

    pub fn as_screening(&self) -> Option<&AuditLogEntry> {
        match self {
            AuditEvent::ScreeningRecorded(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            AuditEvent::ScreeningRecorded(_) => "screening_recorded",
            AuditEvent::AlertDismissed { .. } => "alert_dismissed",
            AuditEvent::BlacklistUpdated { .. } => "blacklist_updated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_serialization() {
        let event = AuditEvent::blacklist_updated(IdKind::Pan, "ABCDE1234F", "Fraud ring");
        let json = serde_json::to_string(&event).unwrap();

        assert!(json.contains(r#""event_type":"blacklist_updated""#));
        assert!(json.contains(r#""kind":"pan""#));

        let back: AuditEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.event_type(), "blacklist_updated");
    }
}
