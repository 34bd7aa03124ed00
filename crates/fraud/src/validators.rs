//! Field validators for Aadhaar, PAN and DL numbers
//!
//! A failed validator adds its weight and a reason; it never aborts the run.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use kycguard_core::{
    AadhaarCheck, AadhaarPath, DlCheck, DlFormat, DocumentType, PanCheck, PanNumber,
    ParsedDocument, SignalEntry,
};

use crate::aggregator::SignalOutcome;
use crate::config::Weights;

static DL_STATE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2}[0-9A-Z]{11,16}$").expect("static DL regex"));
static DL_LEGACY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,4}/\d{3,6}/\d{2,4}$").expect("static DL regex"));

/// Verhoeff multiplication table
const D: [[u8; 10]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 2, 3, 4, 0, 6, 7, 8, 9, 5],
    [2, 3, 4, 0, 1, 7, 8, 9, 5, 6],
    [3, 4, 0, 1, 2, 8, 9, 5, 6, 7],
    [4, 0, 1, 2, 3, 9, 5, 6, 7, 8],
    [5, 9, 8, 7, 6, 0, 4, 3, 2, 1],
    [6, 5, 9, 8, 7, 1, 0, 4, 3, 2],
    [7, 6, 5, 9, 8, 2, 1, 0, 4, 3],
    [8, 7, 6, 5, 9, 3, 2, 1, 0, 4],
    [9, 8, 7, 6, 5, 4, 3, 2, 1, 0],
];

/// Permutation table, cycled by position
const P: [[u8; 10]; 8] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 5, 9, 8, 7, 6, 0, 4, 3, 2],
    [5, 8, 4, 7, 6, 9, 1, 3, 2, 0],
    [8, 9, 7, 6, 5, 3, 2, 1, 0, 4],
    [9, 4, 6, 5, 3, 2, 1, 0, 7, 8],
    [4, 6, 3, 2, 1, 0, 7, 8, 9, 5],
    [6, 3, 2, 1, 0, 7, 8, 9, 5, 4],
    [3, 2, 1, 0, 7, 8, 9, 5, 4, 6],
];

/// Verhoeff check with the permutation rows shifted by `offset`
fn verhoeff_passes(digits: &[u8], offset: usize) -> bool {
    let mut c = 0usize;
    for (i, &digit) in digits.iter().rev().enumerate() {
        let p = P[(i + offset) % 8][digit as usize] as usize;
        c = D[c][p] as usize;
    }
    c == 0
}

/// First permutation offset under which the checksum passes
pub fn verhoeff_offset(digits: &[u8]) -> Option<u8> {
    (0..8u8).find(|&offset| verhoeff_passes(digits, offset as usize))
}

/// Twelve digits that are neither all identical nor three copies of one block
fn plausible(digits: &[u8]) -> bool {
    if digits.len() != 12 {
        return false;
    }
    let all_same = digits.iter().all(|&d| d == digits[0]);
    let repeated_block = digits[0..4] == digits[4..8] && digits[4..8] == digits[8..12];
    !all_same && !repeated_block
}

/// Validate a normalized Aadhaar number
///
/// Accepted when the checksum passes under any offset OR the number is plausible.
pub fn verify_aadhaar(number: &str) -> AadhaarCheck {
    let digits: Vec<u8> = number
        .chars()
        .filter_map(|c| c.to_digit(10).map(|d| d as u8))
        .collect();

    let path = if digits.len() != 12 || digits.len() != number.chars().count() {
        AadhaarPath::Malformed
    } else if let Some(offset) = verhoeff_offset(&digits) {
        AadhaarPath::Checksum { offset }
    } else if plausible(&digits) {
        AadhaarPath::Plausibility
    } else {
        AadhaarPath::Rejected
    };

    AadhaarCheck {
        number: number.to_string(),
        valid: matches!(path, AadhaarPath::Checksum { .. } | AadhaarPath::Plausibility),
        path,
    }
}

pub fn check_pan(pan: &PanNumber) -> PanCheck {
    PanCheck {
        raw: pan.raw().to_string(),
        normalized: pan.normalized().to_string(),
        masked: pan.is_masked(),
        format_valid: pan.is_format_valid(),
    }
}

/// Validate a DL number against the state-code and legacy slash forms
pub fn verify_dl(number: &str) -> DlCheck {
    let normalized: String = number
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_uppercase();

    let format = if DL_STATE_CODE.is_match(&normalized) {
        Some(DlFormat::StateCode)
    } else if DL_LEGACY.is_match(&normalized) {
        Some(DlFormat::LegacySlash)
    } else {
        None
    };

    DlCheck {
        number: normalized,
        valid: format.is_some(),
        format,
    }
}

/// Runs the three field validators over a parsed document
#[derive(Debug, Clone)]
pub struct FieldValidators {
    weights: Weights,
}

impl FieldValidators {
    pub fn new(weights: Weights) -> Self {
        Self { weights }
    }

    /// `raw_text` is only consulted for PAN documents without a parsed PAN
    pub fn evaluate(&self, doc: &ParsedDocument, raw_text: Option<&str>) -> SignalOutcome {
        let mut outcome = SignalOutcome::new();

        if let Some(aadhaar) = doc.aadhaar_number.as_deref() {
            let check = verify_aadhaar(aadhaar);
            debug!(valid = check.valid, path = ?check.path, "Aadhaar validated");
            if !check.valid {
                outcome.penalize(self.weights.aadhaar_invalid, "Invalid Aadhaar format/checksum");
            }
            outcome.record(SignalEntry::Aadhaar(check));
        }

        let ocr_pan = match (&doc.pan, raw_text) {
            (None, Some(text)) if doc.effective_type() == DocumentType::Pan => {
                PanNumber::candidate_from_text(text)
            }
            _ => None,
        };
        if let Some(candidate) = &ocr_pan {
            outcome.record(SignalEntry::PanFromOcr {
                candidate: candidate.normalized().to_string(),
            });
        }

        if let Some(pan) = doc.pan.as_ref().or(ocr_pan.as_ref()) {
            let check = check_pan(pan);
            debug!(masked = check.masked, format_valid = check.format_valid, "PAN validated");
            if !check.format_valid {
                outcome.penalize(self.weights.pan_invalid, "PAN format invalid");
            }
            outcome.record(SignalEntry::Pan(check));
        }

        if let Some(dl) = doc.dl_number.as_deref() {
            let check = verify_dl(dl);
            debug!(valid = check.valid, format = ?check.format, "DL validated");
            if !check.valid {
                outcome.penalize(self.weights.dl_invalid, "Invalid DL format");
            }
            outcome.record(SignalEntry::DrivingLicence(check));
        }

        outcome
    }
}
