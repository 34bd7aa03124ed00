//! Explainable signal details
//!
//! Every signal module reports a [`SignalEntry`] under a fixed [`SignalName`].
//! [`SignalDetails`] is append-only: an entry, once recorded, is never replaced.
//!
//! Checks that depend on an optional collaborator or on well-formed input report an
//! [`Assessment`], so "could not assess" is a distinct value instead of a default.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Outcome of a check that may be infeasible
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Assessment<T> {
    /// The check ran
    Assessed(T),
    /// A collaborator (imaging, model, registry) is not available
    Unavailable,
    /// The input could not be assessed
    Invalid(String),
}

impl<T> Assessment<T> {
    pub fn assessed(&self) -> Option<&T> {
        match self {
            Assessment::Assessed(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_assessed(&self) -> bool {
        matches!(self, Assessment::Assessed(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Assessment<U> {
        match self {
            Assessment::Assessed(value) => Assessment::Assessed(f(value)),
            Assessment::Unavailable => Assessment::Unavailable,
            Assessment::Invalid(reason) => Assessment::Invalid(reason),
        }
    }
}

/// Key of a signal in [`SignalDetails`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalName {
    FileHash,
    MlManipulation,
    MlNetworkFraud,
    Aadhaar,
    PanFromOcr,
    Pan,
    DrivingLicence,
    Duplicate,
    Manipulation,
    Blur,
    Crop,
    NameMatch,
    Device,
}

/// Which Verhoeff path accepted (or rejected) an Aadhaar number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum AadhaarPath {
    /// Checksum passed under this table offset
    Checksum { offset: u8 },
    /// Checksum failed under every offset but the number looks plausible
    Plausibility,
    /// Not twelve digits
    Malformed,
    /// Checksum and plausibility both failed
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AadhaarCheck {
    pub number: String,
    pub valid: bool,
    #[serde(flatten)]
    pub path: AadhaarPath,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanCheck {
    pub raw: String,
    pub normalized: String,
    pub masked: bool,
    pub format_valid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DlFormat {
    /// Two-letter state code followed by 11-16 alphanumerics
    StateCode,
    /// `d{1,4}/d{3,6}/d{2,4}`
    LegacySlash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DlCheck {
    pub number: String,
    pub valid: bool,
    pub format: Option<DlFormat>,
}

/// Field that matched another record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateField {
    FileHash,
    Aadhaar,
    Pan,
    DrivingLicence,
}

impl DuplicateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicateField::FileHash => "file hash",
            DuplicateField::Aadhaar => "Aadhaar",
            DuplicateField::Pan => "PAN",
            DuplicateField::DrivingLicence => "DL",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub matched: Vec<DuplicateField>,
}

impl DuplicateReport {
    pub fn is_duplicate(&self) -> bool {
        !self.matched.is_empty()
    }

    pub fn contains(&self, field: DuplicateField) -> bool {
        self.matched.contains(&field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManipulationCheck {
    pub decodable: bool,
    pub exif_present: bool,
    pub suspected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlurCheck {
    pub variance: f64,
    pub threshold: f64,
    pub blurry: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropCheck {
    pub ratio: f64,
    pub threshold: f64,
    pub cropped: bool,
}

/// Individual fuzzy scores, 0-100
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuzzyBreakdown {
    pub ratio: f64,
    pub partial_ratio: f64,
    pub token_set_ratio: f64,
    pub token_sort_ratio: f64,
}

impl FuzzyBreakdown {
    pub fn best(&self) -> f64 {
        self.ratio
            .max(self.partial_ratio)
            .max(self.token_set_ratio)
            .max(self.token_sort_ratio)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossDocumentCheck {
    /// Other documents of the same user that carried a name
    pub compared: usize,
    /// Comparisons at or above the high-similarity mark
    pub high_matches: usize,
    /// Comparisons below the low-similarity mark
    pub low_matches: usize,
    pub average_similarity: f64,
    pub consistent: bool,
}

impl CrossDocumentCheck {
    /// Nothing to compare against
    pub fn empty() -> Self {
        Self {
            compared: 0,
            high_matches: 0,
            low_matches: 0,
            average_similarity: 100.0,
            consistent: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameMatchReport {
    pub percentage: u32,
    pub reason: String,
    /// `None` when matching was skipped
    pub fuzzy: Option<FuzzyBreakdown>,
    pub phonetic_score: Option<u32>,
    pub phonetic_match: bool,
    pub variation_score: Option<f64>,
    pub cross_document: Option<CrossDocumentCheck>,
}

impl NameMatchReport {
    /// Neutral result when a name is missing
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            percentage: 100,
            reason: reason.into(),
            fuzzy: None,
            phonetic_score: None,
            phonetic_match: true,
            variation_score: None,
            cross_document: None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.fuzzy.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceReport {
    pub device_hash: String,
    pub new_device: bool,
    /// Distinct other users seen on this device
    pub other_users: usize,
    pub multi_user_device: bool,
    pub timezone_mismatch: bool,
    pub automation_suspected: bool,
    pub unusual_platform: bool,
    pub penalty: u32,
}

/// One signal's structured result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalEntry {
    FileHash { hash: String },
    MlManipulation { probability: f64, penalty: u32 },
    MlNetworkFraud { probability: f64, penalty: u32 },
    Aadhaar(AadhaarCheck),
    PanFromOcr { candidate: String },
    Pan(PanCheck),
    DrivingLicence(DlCheck),
    Duplicate(DuplicateReport),
    Manipulation { result: Assessment<ManipulationCheck> },
    Blur { result: Assessment<BlurCheck> },
    Crop { result: Assessment<CropCheck> },
    NameMatch(NameMatchReport),
    Device { result: Assessment<DeviceReport> },
}

impl SignalEntry {
    pub fn name(&self) -> SignalName {
        match self {
            SignalEntry::FileHash { .. } => SignalName::FileHash,
            SignalEntry::MlManipulation { .. } => SignalName::MlManipulation,
            SignalEntry::MlNetworkFraud { .. } => SignalName::MlNetworkFraud,
            SignalEntry::Aadhaar(_) => SignalName::Aadhaar,
            SignalEntry::PanFromOcr { .. } => SignalName::PanFromOcr,
            SignalEntry::Pan(_) => SignalName::Pan,
            SignalEntry::DrivingLicence(_) => SignalName::DrivingLicence,
            SignalEntry::Duplicate(_) => SignalName::Duplicate,
            SignalEntry::Manipulation { .. } => SignalName::Manipulation,
            SignalEntry::Blur { .. } => SignalName::Blur,
            SignalEntry::Crop { .. } => SignalName::Crop,
            SignalEntry::NameMatch(_) => SignalName::NameMatch,
            SignalEntry::Device { .. } => SignalName::Device,
        }
    }
}

/// Append-only map of signal results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalDetails(BTreeMap<SignalName, SignalEntry>);

impl SignalDetails {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry; returns `false` (and keeps the first entry) if the signal
    /// was already recorded
    pub fn record(&mut self, entry: SignalEntry) -> bool {
        let name = entry.name();
        if self.0.contains_key(&name) {
            return false;
        }
        self.0.insert(name, entry);
        true
    }

    /// Append every entry of `other` that is not already present
    pub fn merge(&mut self, other: SignalDetails) {
        for (_, entry) in other.0 {
            self.record(entry);
        }
    }

    pub fn get(&self, name: SignalName) -> Option<&SignalEntry> {
        self.0.get(&name)
    }

    pub fn contains(&self, name: SignalName) -> bool {
        self.0.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SignalName, &SignalEntry)> {
        self.0.iter()
    }

    pub fn file_hash(&self) -> Option<&str> {
        match self.get(SignalName::FileHash) {
            Some(SignalEntry::FileHash { hash }) => Some(hash),
            _ => None,
        }
    }

    pub fn duplicate(&self) -> Option<&DuplicateReport> {
        match self.get(SignalName::Duplicate) {
            Some(SignalEntry::Duplicate(report)) => Some(report),
            _ => None,
        }
    }

    pub fn name_match(&self) -> Option<&NameMatchReport> {
        match self.get(SignalName::NameMatch) {
            Some(SignalEntry::NameMatch(report)) => Some(report),
            _ => None,
        }
    }
}
