//! Compliance alerts
//!
//! Raised only on a `Flagged` decision. `seen` goes from false to true once, on
//! dismissal; alerts are never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fraud::RiskBand;
use crate::record::DocumentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(Uuid);

impl AlertId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AlertId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Alert content before the store assigns an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    pub document_id: DocumentId,
    pub aadhaar: Option<String>,
    pub pan: Option<String>,
    pub dl: Option<String>,
    pub user_email: String,
    pub risk_level: RiskBand,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: AlertId,
    pub document_id: DocumentId,
    pub aadhaar: Option<String>,
    pub pan: Option<String>,
    pub dl: Option<String>,
    pub user_email: String,
    pub risk_level: RiskBand,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
    pub seen: bool,
}

impl Alert {
    pub fn from_new(id: AlertId, alert: NewAlert, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            document_id: alert.document_id,
            aadhaar: alert.aadhaar,
            pan: alert.pan,
            dl: alert.dl,
            user_email: alert.user_email,
            risk_level: alert.risk_level,
            reason: alert.reason,
            timestamp,
            seen: false,
        }
    }

    /// Mark as seen; `true` only on the unseen -> seen transition
    pub fn dismiss(&mut self) -> bool {
        if self.seen {
            return false;
        }
        self.seen = true;
        true
    }
}
