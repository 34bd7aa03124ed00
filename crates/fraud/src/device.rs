//! Device fingerprint risk
//!
//! Looks for new devices, devices shared across users, foreign timezones on
//! Indian documents, automation user agents and desktop Linux uploads.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use kycguard_core::{Assessment, DeviceFingerprint, DeviceReport, DocumentId, SignalEntry};
use kycguard_store::{DocumentField, DocumentFilter, DocumentStore};

use crate::aggregator::SignalOutcome;
use crate::config::{Thresholds, Weights};

const INDIAN_TIMEZONES: &[&str] = &["Asia/Kolkata", "Asia/Calcutta", "+05:30", "+0530", "IST"];
const FOREIGN_TIMEZONES: &[&str] = &["America", "Europe"];
/// States where a non-IST device clock is not unusual
const BORDER_STATES: &[&str] = &["JAMMU", "KASHMIR", "LADAKH"];
const AUTOMATION_MARKERS: &[&str] = &["headless", "phantom", "selenium", "puppeteer", "bot", "crawler"];

/// Device clock set to a European or American zone on an Indian document
pub fn timezone_mismatch(timezone: Option<&str>, state: Option<&str>) -> bool {
    let (Some(tz), Some(state)) = (timezone, state) else {
        return false;
    };
    if tz.is_empty() || state.is_empty() {
        return false;
    }
    if BORDER_STATES.contains(&state.to_uppercase().as_str()) {
        return false;
    }
    if INDIAN_TIMEZONES.iter().any(|m| tz.contains(m)) {
        return false;
    }
    FOREIGN_TIMEZONES.iter().any(|m| tz.contains(m))
}

pub fn automation_suspected(user_agent: Option<&str>) -> bool {
    let ua = user_agent.unwrap_or_default().to_lowercase();
    AUTOMATION_MARKERS.iter().any(|m| ua.contains(m))
}

/// Linux desktop (not Android, not mobile)
pub fn unusual_platform(platform: Option<&str>, user_agent: Option<&str>) -> bool {
    let platform = platform.unwrap_or_default().to_lowercase();
    let ua = user_agent.unwrap_or_default().to_lowercase();
    platform.contains("linux") && !ua.contains("android") && !ua.contains("mobile")
}

#[derive(Clone)]
pub struct DeviceAnalyzer {
    store: Arc<dyn DocumentStore>,
    weights: Weights,
    thresholds: Thresholds,
}

impl DeviceAnalyzer {
    pub fn new(store: Arc<dyn DocumentStore>, weights: Weights, thresholds: Thresholds) -> Self {
        Self {
            store,
            weights,
            thresholds,
        }
    }

    /// Device hashes the user submitted from before, excluding `current`
    fn known_devices(&self, user_id: &str, current: DocumentId) -> BTreeSet<String> {
        let filter = DocumentFilter::new()
            .eq(DocumentField::UserId, user_id)
            .ne(DocumentField::Id, current.to_string())
            .present(DocumentField::DeviceHash);

        match self.store.find_many(&filter, self.thresholds.device_history_sample) {
            Ok(docs) => docs
                .iter()
                .filter_map(|d| d.device_hash())
                .map(str::to_string)
                .collect(),
            Err(e) => {
                warn!(error = %e, "Device history lookup failed");
                BTreeSet::new()
            }
        }
    }

    /// Distinct users other than `user_id` seen on `device_hash`
    pub fn other_users(&self, user_id: &str, device_hash: &str) -> usize {
        let filter = DocumentFilter::new()
            .eq(DocumentField::DeviceHash, device_hash)
            .ne(DocumentField::UserId, user_id);

        match self.store.find_many(&filter, self.thresholds.device_user_sample) {
            Ok(docs) => docs
                .iter()
                .map(|d| d.user_id.as_str())
                .collect::<BTreeSet<_>>()
                .len(),
            Err(e) => {
                warn!(error = %e, "Device sharing lookup failed");
                0
            }
        }
    }

    /// Score one fingerprint. `state` comes from the parsed document.
    pub fn analyze(
        &self,
        user_id: &str,
        current: DocumentId,
        device: &DeviceFingerprint,
        state: Option<&str>,
    ) -> (DeviceReport, SignalOutcome) {
        let mut outcome = SignalOutcome::new();

        let known = self.known_devices(user_id, current);
        let new_device = !known.is_empty() && !known.contains(&device.hash);
        if new_device {
            outcome.penalize(self.weights.new_device, "First time seeing this device for user");
        }

        let other_users = self.other_users(user_id, &device.hash);
        let multi_user_device = other_users >= 2;
        if multi_user_device {
            outcome.penalize(
                self.weights.device_multi_user,
                format!(
                    "Device used by {} different users (possible fraud farm)",
                    other_users + 1
                ),
            );
        } else if other_users == 1 {
            outcome.penalize(self.weights.device_multi_user / 2, "Device shared by 2 users");
        }

        let tz_mismatch = timezone_mismatch(device.timezone.as_deref(), state);
        if tz_mismatch {
            outcome.penalize(
                self.weights.timezone_mismatch,
                format!(
                    "Device timezone ({}) doesn't match document location ({})",
                    device.timezone.as_deref().unwrap_or_default(),
                    state.unwrap_or_default()
                ),
            );
        }

        let automation = automation_suspected(device.user_agent.as_deref());
        if automation {
            outcome.penalize(
                self.weights.suspicious_device,
                "Possible automated/bot browser detected",
            );
        }

        let linux_desktop = unusual_platform(device.platform.as_deref(), device.user_agent.as_deref());
        if linux_desktop {
            outcome.penalize(
                self.weights.unusual_platform,
                "Unusual platform for KYC (Linux desktop)",
            );
        }

        let report = DeviceReport {
            device_hash: device.hash.clone(),
            new_device,
            other_users,
            multi_user_device,
            timezone_mismatch: tz_mismatch,
            automation_suspected: automation,
            unusual_platform: linux_desktop,
            penalty: outcome.penalty(),
        };
        debug!(
            new_device,
            other_users,
            penalty = report.penalty,
            "Device analysis done"
        );
        (report, outcome)
    }

    pub fn evaluate(
        &self,
        user_id: &str,
        current: DocumentId,
        device: Option<&DeviceFingerprint>,
        state: Option<&str>,
    ) -> SignalOutcome {
        let device = match device {
            Some(d) if !d.hash.trim().is_empty() => d,
            Some(_) => {
                return SignalOutcome::new().with_entry(SignalEntry::Device {
                    result: Assessment::Invalid("Device fingerprint has no hash".to_string()),
                })
            }
            None => {
                return SignalOutcome::new().with_entry(SignalEntry::Device {
                    result: Assessment::Invalid("No device fingerprint provided".to_string()),
                })
            }
        };

        let (report, outcome) = self.analyze(user_id, current, device, state);
        outcome.with_entry(SignalEntry::Device {
            result: Assessment::Assessed(report),
        })
    }
}
