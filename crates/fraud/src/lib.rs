//! KycGuard Fraud - Multi-signal fraud scoring
//!
//! ## Signals
//!
//! ```text
//! bytes + parsed fields + user + device + model probabilities
//!   ├── FieldValidators    (Aadhaar Verhoeff, PAN, DL)
//!   ├── DuplicateDetector  (file hash, identifiers of other users)
//!   ├── ForensicsSignals   (EXIF, blur, crop)
//!   ├── NameMatcher        (fuzzy, phonetic, variants, cross-document)
//!   ├── DeviceAnalyzer     (new device, farms, timezone, automation)
//!   └── MlSignalAdapter    (manipulation / network probabilities)
//!            │
//!            ▼
//!      RiskAggregator -> FraudAnalysisResult
//! ```
//!
//! Every weight and cut-off lives in [`FraudConfig`].

pub mod aggregator;
pub mod analyzer;
pub mod config;
pub mod device;
pub mod duplicate;
pub mod error;
pub mod forensics;
pub mod fuzz;
pub mod ml;
pub mod name;
#[cfg(feature = "imaging")]
pub mod raster;
pub mod validators;

pub use aggregator::{RiskAggregator, SignalOutcome};
pub use analyzer::{AnalysisRequest, FraudAnalyzer, MODEL_VERSION};
pub use config::{FraudConfig, Thresholds, Weights};
pub use device::DeviceAnalyzer;
pub use duplicate::{DuplicateDetector, DuplicateScope, Identifiers};
pub use error::{FraudError, FraudResult};
pub use forensics::{default_forensics, ForensicReport, ForensicsSignals, ImageForensics, NoImaging};
pub use ml::{FixedProbabilities, GraphFeatures, MlCollaborator, MlSignalAdapter, ModelSignals, NoModels};
pub use name::NameMatcher;
#[cfg(feature = "imaging")]
pub use raster::RasterForensics;
pub use validators::{verify_aadhaar, verify_dl, FieldValidators};
