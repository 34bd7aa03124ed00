//! Image forensics signals
//!
//! The raster backend is optional. When it is compiled out every image check
//! reports [`Assessment::Unavailable`] and adds no penalty.

use std::sync::Arc;

use tracing::debug;

use kycguard_core::{Assessment, BlurCheck, CropCheck, ManipulationCheck, SignalEntry};

use crate::aggregator::SignalOutcome;
use crate::config::{Thresholds, Weights};

/// Raw measurements for one image
#[derive(Debug, Clone, PartialEq)]
pub struct ForensicReport {
    pub manipulation: Assessment<ManipulationCheck>,
    pub blur_variance: Assessment<f64>,
    pub crop_ratio: Assessment<f64>,
}

impl ForensicReport {
    pub fn unavailable() -> Self {
        Self {
            manipulation: Assessment::Unavailable,
            blur_variance: Assessment::Unavailable,
            crop_ratio: Assessment::Unavailable,
        }
    }

    /// Bytes that no decoder accepts count as suspected manipulation
    pub fn undecodable() -> Self {
        let reason = "image could not be decoded".to_string();
        Self {
            manipulation: Assessment::Assessed(ManipulationCheck {
                decodable: false,
                exif_present: false,
                suspected: true,
            }),
            blur_variance: Assessment::Invalid(reason.clone()),
            crop_ratio: Assessment::Invalid(reason),
        }
    }
}

/// Image decoding and measurement backend
pub trait ImageForensics: Send + Sync {
    fn inspect(&self, bytes: &[u8]) -> ForensicReport;
}

/// Backend used when raster support is not compiled in
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImaging;

impl ImageForensics for NoImaging {
    fn inspect(&self, _bytes: &[u8]) -> ForensicReport {
        ForensicReport::unavailable()
    }
}

/// The best backend this build supports
pub fn default_forensics() -> Arc<dyn ImageForensics> {
    #[cfg(feature = "imaging")]
    {
        Arc::new(crate::raster::RasterForensics::new())
    }
    #[cfg(not(feature = "imaging"))]
    {
        Arc::new(NoImaging)
    }
}

/// Turns forensic measurements into penalties
#[derive(Clone)]
pub struct ForensicsSignals {
    backend: Arc<dyn ImageForensics>,
    weights: Weights,
    thresholds: Thresholds,
}

impl ForensicsSignals {
    pub fn new(backend: Arc<dyn ImageForensics>, weights: Weights, thresholds: Thresholds) -> Self {
        Self {
            backend,
            weights,
            thresholds,
        }
    }

    pub fn evaluate(&self, bytes: &[u8]) -> SignalOutcome {
        let report = self.backend.inspect(bytes);
        let mut outcome = SignalOutcome::new();

        if let Assessment::Assessed(check) = &report.manipulation {
            if check.suspected {
                outcome.penalize(
                    self.weights.manipulation,
                    "Image metadata missing or manipulation suspected",
                );
            }
        }
        outcome.record(SignalEntry::Manipulation {
            result: report.manipulation,
        });

        let threshold = self.thresholds.blur_variance;
        let blur = report.blur_variance.map(|variance| BlurCheck {
            variance,
            threshold,
            blurry: variance < threshold,
        });
        if let Some(check) = blur.assessed().filter(|c| c.blurry) {
            outcome.penalize(
                self.weights.blur,
                format!("Image appears blurry (laplacian variance={:.1})", check.variance),
            );
        }
        outcome.record(SignalEntry::Blur { result: blur });

        let threshold = self.thresholds.crop_ratio;
        let crop = report.crop_ratio.map(|ratio| CropCheck {
            ratio,
            threshold,
            cropped: ratio < threshold,
        });
        if let Some(check) = crop.assessed().filter(|c| c.cropped) {
            outcome.penalize(
                self.weights.cropped,
                format!(
                    "Image appears cropped or has large margins (bbox_ratio={:.2})",
                    check.ratio
                ),
            );
        }
        outcome.record(SignalEntry::Crop { result: crop });

        debug!(penalty = outcome.penalty(), "Image forensics done");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(ForensicReport);

    impl ImageForensics for Fixed {
        fn inspect(&self, _bytes: &[u8]) -> ForensicReport {
            self.0.clone()
        }
    }

    fn signals(report: ForensicReport) -> ForensicsSignals {
        ForensicsSignals::new(
            Arc::new(Fixed(report)),
            Weights::default(),
            Thresholds::default(),
        )
    }

    #[test]
    fn test_unavailable_adds_nothing() {
        let outcome = ForensicsSignals::new(
            Arc::new(NoImaging),
            Weights::default(),
            Thresholds::default(),
        )
        .evaluate(b"bytes");

        assert_eq!(outcome.penalty(), 0);
        assert!(outcome.reasons().is_empty());
        assert_eq!(outcome.entries().len(), 3);
        assert!(matches!(
            &outcome.entries()[1],
            SignalEntry::Blur { result: Assessment::Unavailable }
        ));
    }

    #[test]
    fn test_undecodable_is_manipulation_only() {
        let outcome = signals(ForensicReport::undecodable()).evaluate(b"junk");
        assert_eq!(outcome.penalty(), 10);
        assert_eq!(
            outcome.reasons(),
            &["Image metadata missing or manipulation suspected".to_string()]
        );
    }

    #[test]
    fn test_blurry_and_cropped() {
        let outcome = signals(ForensicReport {
            manipulation: Assessment::Assessed(ManipulationCheck {
                decodable: true,
                exif_present: true,
                suspected: false,
            }),
            blur_variance: Assessment::Assessed(42.31),
            crop_ratio: Assessment::Assessed(0.5),
        })
        .evaluate(b"img");

        assert_eq!(outcome.penalty(), 20 + 15);
        assert_eq!(
            outcome.reasons(),
            &[
                "Image appears blurry (laplacian variance=42.3)".to_string(),
                "Image appears cropped or has large margins (bbox_ratio=0.50)".to_string(),
            ]
        );
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let outcome = signals(ForensicReport {
            manipulation: Assessment::Unavailable,
            blur_variance: Assessment::Assessed(100.0),
            crop_ratio: Assessment::Assessed(0.65),
        })
        .evaluate(b"img");
        assert_eq!(outcome.penalty(), 0);
    }
}
