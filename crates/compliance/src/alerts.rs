//! Alert desk - raise, list and dismiss compliance alerts
//!
//! Alerts are never deleted. Dismissal flips `seen` once and is recorded in
//! the audit ledger; dismissing again is a no-op.

use std::sync::Arc;

use tracing::{info, warn};

use kycguard_core::{Alert, AlertId, NewAlert};
use kycguard_store::{AlertFilter, AlertStore};

use crate::error::{ComplianceError, ComplianceResult};
use crate::event::AuditEvent;
use crate::ledger::AuditLedger;

#[derive(Clone)]
pub struct AlertDesk {
    store: Arc<dyn AlertStore>,
    ledger: Arc<AuditLedger>,
}

impl AlertDesk {
    pub fn new(store: Arc<dyn AlertStore>, ledger: Arc<AuditLedger>) -> Self {
        Self { store, ledger }
    }

    pub fn raise(&self, alert: NewAlert) -> ComplianceResult<Alert> {
        let alert = self.store.insert_alert(alert)?;
        info!(
            alert_id = %alert.id,
            document_id = %alert.document_id,
            risk_level = %alert.risk_level,
            "Compliance alert raised"
        );
        Ok(alert)
    }

    pub fn get(&self, id: AlertId) -> ComplianceResult<Option<Alert>> {
        Ok(self.store.get_alert(id)?)
    }

    /// Not yet dismissed, newest first
    pub fn unseen(&self) -> ComplianceResult<Vec<Alert>> {
        Ok(self.store.list_alerts(AlertFilter::Unseen)?)
    }

    /// Full history, newest first
    pub fn all(&self) -> ComplianceResult<Vec<Alert>> {
        Ok(self.store.list_alerts(AlertFilter::All)?)
    }

    /// Mark an alert seen; `true` only when this call dismissed it
    pub fn dismiss(&self, id: AlertId) -> ComplianceResult<bool> {
        if self.store.get_alert(id)?.is_none() {
            return Err(ComplianceError::AlertNotFound(id.to_string()));
        }

        let dismissed = self.store.mark_seen(id)?;
        if dismissed {
            if let Err(e) = self.ledger.append(&AuditEvent::alert_dismissed(id)) {
                warn!(alert_id = %id, error = %e, "Failed to record alert dismissal");
            }
            info!(alert_id = %id, "Alert dismissed");
        }
        Ok(dismissed)
    }
}
