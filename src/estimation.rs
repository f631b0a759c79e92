use crate::config::EstimationConfig;
use crate::error::LowConfidenceWarning;
use crate::models::{BoundingBox, CalibrationResult, EstimationResult};

/// Estimate plus the warning raised when it should be reviewed by a person
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub result: EstimationResult,
    pub warning: Option<LowConfidenceWarning>,
}

#[derive(Debug, Clone, Default)]
pub struct DimensionEstimator {
    pub config: EstimationConfig,
}

impl DimensionEstimator {
    pub fn new(config: EstimationConfig) -> Self {
        Self { config }
    }

    /// Scale the target box to real-world units.
    ///
    /// The combined confidence is the weaker of the two detections: if either one
    /// is wrong, so is the estimate.
    pub fn estimate(
        &self,
        target_box: &BoundingBox,
        calibration: &CalibrationResult,
        ref_confidence: f64,
        target_confidence: f64,
    ) -> Estimate {
        let confidence = ref_confidence.min(target_confidence);
        let result = EstimationResult {
            width: target_box.width as f64 * calibration.scale_x,
            height: target_box.height as f64 * calibration.scale_y,
            unit: calibration.unit,
            confidence,
        };

        let threshold = self.config.low_confidence_threshold;
        let warning = (confidence < threshold).then_some(LowConfidenceWarning {
            confidence,
            threshold,
        });

        Estimate { result, warning }
    }
}
