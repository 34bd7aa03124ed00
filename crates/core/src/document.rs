//! Parsed identity documents
//!
//! A [`ParsedDocument`] is produced once by the OCR collaborator and is consumed
//! read-only by every signal module. Identifier fields are normalized on the way in
//! so that downstream checks and store lookups compare like with like.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreResult;

/// Tokens that may be a PAN when the parser could not isolate one
static PAN_CANDIDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z0-9]{3,10}").expect("static PAN candidate regex"));

/// Kind of identity document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DocumentType {
    Aadhaar,
    #[serde(rename = "PAN")]
    Pan,
    DrivingLicence,
    #[default]
    Unknown,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Aadhaar => "Aadhaar",
            DocumentType::Pan => "PAN",
            DocumentType::DrivingLicence => "DrivingLicence",
            DocumentType::Unknown => "Unknown",
        }
    }

    /// Infer the type from whichever identifier was parsed (Aadhaar, then PAN, then DL)
    pub fn infer(doc: &ParsedDocument) -> Self {
        if doc.aadhaar_number.is_some() {
            DocumentType::Aadhaar
        } else if doc.pan.is_some() {
            DocumentType::Pan
        } else if doc.dl_number.is_some() {
            DocumentType::DrivingLicence
        } else {
            DocumentType::Unknown
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A PAN as read from the document, plus its normalized form
///
/// Normalization uppercases, strips whitespace and hyphens, and keeps only
/// alphanumerics and the mask wildcard `*`. Masked values are format-valid by
/// definition since they cannot be checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanNumber {
    raw: String,
    normalized: String,
    masked: bool,
    format_valid: bool,
}

impl PanNumber {
    /// Normalize a raw PAN string; `None` if nothing usable remains
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .to_uppercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '*')
            .collect();

        if normalized.is_empty() {
            return None;
        }

        let masked = normalized.contains('*');
        let format_valid = masked || has_pan_shape(&normalized);

        Some(Self {
            raw: raw.to_string(),
            normalized,
            masked,
            format_valid,
        })
    }

    /// Pick a PAN candidate out of raw OCR text: the longest `[A-Z0-9]{3,10}` token
    pub fn candidate_from_text(text: &str) -> Option<Self> {
        let upper = text.to_uppercase();
        let mut best: Option<&str> = None;
        for m in PAN_CANDIDATE.find_iter(&upper) {
            if best.map_or(true, |b| m.as_str().len() > b.len()) {
                best = Some(m.as_str());
            }
        }
        best.and_then(Self::parse)
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn is_masked(&self) -> bool {
        self.masked
    }

    pub fn is_format_valid(&self) -> bool {
        self.format_valid
    }
}

/// 5 letters + 4 digits + 1 letter
fn has_pan_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes[..5].iter().all(u8::is_ascii_uppercase)
        && bytes[5..9].iter().all(u8::is_ascii_digit)
        && bytes[9].is_ascii_uppercase()
}

/// Strip the separators OCR and users put into Aadhaar/DL numbers
fn normalize_identifier(value: &str) -> Option<String> {
    let cleaned: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_uppercase();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Identity fields extracted upstream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDocument {
    #[serde(default, deserialize_with = "de_identifier")]
    pub aadhaar_number: Option<String>,

    #[serde(default, rename = "panNumber", with = "pan_serde")]
    pub pan: Option<PanNumber>,

    #[serde(default, deserialize_with = "de_identifier")]
    pub dl_number: Option<String>,

    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub father_name: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub pin_code: Option<String>,

    #[serde(default)]
    pub document_type: DocumentType,
}

impl ParsedDocument {
    /// Set the Aadhaar number (normalized)
    pub fn with_aadhaar(mut self, number: &str) -> Self {
        self.aadhaar_number = normalize_identifier(number);
        self
    }

    /// Set the PAN (normalized)
    pub fn with_pan(mut self, raw: &str) -> Self {
        self.pan = PanNumber::parse(raw);
        self
    }

    /// Set the driving licence number (normalized)
    pub fn with_dl(mut self, number: &str) -> Self {
        self.dl_number = normalize_identifier(number);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_dob(mut self, dob: impl Into<String>) -> Self {
        self.dob = Some(dob.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_type(mut self, document_type: DocumentType) -> Self {
        self.document_type = document_type;
        self
    }

    /// Declared type, or the inferred one when the parser reported `Unknown`
    pub fn effective_type(&self) -> DocumentType {
        match self.document_type {
            DocumentType::Unknown => DocumentType::infer(self),
            declared => declared,
        }
    }

    /// Normalized PAN value, if any
    pub fn pan_normalized(&self) -> Option<&str> {
        self.pan.as_ref().map(PanNumber::normalized)
    }
}

fn de_identifier<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(normalize_identifier))
}

/// PANs travel as their raw string and are re-normalized on read
mod pan_serde {
    use super::*;

    pub fn serialize<S>(pan: &Option<PanNumber>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match pan {
            Some(pan) => serializer.serialize_some(pan.raw()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<PanNumber>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(PanNumber::parse))
    }
}

/// Output of the OCR/parsing collaborator
#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    pub parsed: ParsedDocument,
    pub raw_text: Option<String>,
}

/// OCR/parsing collaborator: raw bytes in, parsed fields out
///
/// Text extraction itself lives outside this workspace.
pub trait DocumentParser: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> CoreResult<ParseOutput>;
}
