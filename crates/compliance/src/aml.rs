//! AML screening
//!
//! Runs independently of the fraud score:
//! - Aadhaar / PAN / DL blacklist lookups
//! - minimum-age check on the date of birth
//! - duplicate identifiers used by other applicants
//!
//! Lookup failures and unparseable dates skip the check; they never flag.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use kycguard_core::{AmlCheck, AmlFinding, DocumentId, DuplicateField, DuplicateReport, ParsedDocument};
use kycguard_fraud::{DuplicateDetector, DuplicateScope, Identifiers};
use kycguard_store::{Blacklist, IdKind};

const DOB_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d"];

/// Parse a date of birth; anything after the first whitespace is ignored
pub fn parse_dob(dob: &str) -> Option<NaiveDate> {
    let date = dob.split_whitespace().next()?;
    DOB_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
}

/// Completed years on `today`
pub fn age_on(born: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        age -= 1;
    }
    age
}

fn duplicate_reason(field: DuplicateField) -> Option<&'static str> {
    match field {
        DuplicateField::Aadhaar => Some("Aadhaar already used"),
        DuplicateField::Pan => Some("PAN already used"),
        DuplicateField::DrivingLicence => Some("DL already used"),
        DuplicateField::FileHash => None,
    }
}

/// Reasons for the identifier matches in `report`
pub fn duplicate_reasons(report: &DuplicateReport) -> Vec<String> {
    report
        .matched
        .iter()
        .filter_map(|f| duplicate_reason(*f))
        .map(str::to_string)
        .collect()
}

/// All AML findings for one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmlReport {
    pub findings: Vec<AmlFinding>,
}

impl AmlReport {
    pub fn reasons(&self) -> Vec<String> {
        AmlFinding::reasons(&self.findings)
    }

    pub fn is_flagged(&self) -> bool {
        self.findings.iter().any(|f| f.flagged)
    }
}

#[derive(Clone)]
pub struct AmlScreener {
    blacklist: Arc<dyn Blacklist>,
    duplicates: DuplicateDetector,
    minimum_age: u32,
}

impl AmlScreener {
    pub fn new(blacklist: Arc<dyn Blacklist>, duplicates: DuplicateDetector, minimum_age: u32) -> Self {
        Self {
            blacklist,
            duplicates,
            minimum_age,
        }
    }

    fn check_blacklist(&self, kind: IdKind, value: Option<&str>) -> AmlFinding {
        let check = match kind {
            IdKind::Aadhaar => AmlCheck::AadhaarBlacklist,
            IdKind::Pan => AmlCheck::PanBlacklist,
            IdKind::Dl => AmlCheck::DlBlacklist,
        };
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            return AmlFinding::clear(check);
        };

        match self.blacklist.lookup(kind, value) {
            Ok(Some(hit)) => AmlFinding::flagged(
                check,
                format!(
                    "{} in AML blacklist: {}",
                    kind.label(),
                    hit.reason.as_deref().unwrap_or("Generic")
                ),
            ),
            Ok(None) => AmlFinding::clear(check),
            Err(e) => {
                warn!(error = %e, kind = kind.label(), "Blacklist lookup failed, treating as not listed");
                AmlFinding::clear(check)
            }
        }
    }

    /// Standalone Aadhaar blacklist lookup
    pub fn aadhaar_check(&self, aadhaar: &str) -> AmlFinding {
        self.check_blacklist(IdKind::Aadhaar, Some(aadhaar))
    }

    pub fn check_age(&self, dob: Option<&str>, today: NaiveDate) -> AmlFinding {
        let Some(born) = dob.and_then(parse_dob) else {
            if dob.is_some() {
                debug!(dob = ?dob, "Unparseable date of birth, skipping age check");
            }
            return AmlFinding::clear(AmlCheck::Age);
        };

        let age = age_on(born, today);
        if age < self.minimum_age as i32 {
            AmlFinding::flagged(AmlCheck::Age, format!("Underage applicant ({} years)", age))
        } else {
            AmlFinding::clear(AmlCheck::Age)
        }
    }

    /// One finding per identifier already used by another applicant
    pub fn check_duplicates(
        &self,
        parsed: &ParsedDocument,
        document_id: DocumentId,
        user_id: &str,
    ) -> Vec<AmlFinding> {
        let report = self.duplicates.lookup(
            Identifiers::of(parsed),
            &DuplicateScope::other_users(document_id, user_id),
        );
        let reasons = duplicate_reasons(&report);
        if reasons.is_empty() {
            return vec![AmlFinding::clear(AmlCheck::Duplicate)];
        }
        reasons
            .into_iter()
            .map(|r| AmlFinding::flagged(AmlCheck::Duplicate, r))
            .collect()
    }

    /// Standalone duplicate lookup against every stored record
    pub fn lookup_duplicates(&self, ids: Identifiers<'_>) -> DuplicateReport {
        self.duplicates.lookup(ids, &DuplicateScope::everyone())
    }

    pub fn screen(
        &self,
        parsed: &ParsedDocument,
        document_id: DocumentId,
        user_id: &str,
        today: NaiveDate,
    ) -> AmlReport {
        let mut findings = vec![
            self.check_blacklist(IdKind::Aadhaar, parsed.aadhaar_number.as_deref()),
            self.check_blacklist(IdKind::Pan, parsed.pan_normalized()),
            self.check_blacklist(IdKind::Dl, parsed.dl_number.as_deref()),
            self.check_age(parsed.dob.as_deref(), today),
        ];
        findings.extend(self.check_duplicates(parsed, document_id, user_id));

        let report = AmlReport { findings };
        debug!(
            document_id = %document_id,
            flagged = report.is_flagged(),
            "AML screening done"
        );
        report
    }
}
