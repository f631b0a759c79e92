use crate::config::CalibrationConfig;
use crate::error::CalibrationError;
use crate::models::{BoundingBox, CalibrationResult, ReferenceSpec};

/// Turns a detected reference box into a units-per-pixel scale
#[derive(Debug, Clone, Default)]
pub struct ScaleCalibrator {
    pub config: CalibrationConfig,
}

impl ScaleCalibrator {
    pub fn new(config: CalibrationConfig) -> Self {
        Self { config }
    }

    /// The reference may lie rotated by 90°: its physical width is paired with whichever
    /// side of the box has the same orientation.
    pub fn calibrate(
        &self,
        ref_box: &BoundingBox,
        spec: &ReferenceSpec,
    ) -> Result<CalibrationResult, CalibrationError> {
        if ref_box.is_degenerate() {
            return Err(CalibrationError::Degenerate {
                width: ref_box.width,
                height: ref_box.height,
            });
        }

        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(spec.real_width) || !valid(spec.real_height) {
            return Err(CalibrationError::InvalidReference {
                real_width: spec.real_width,
                real_height: spec.real_height,
            });
        }

        let expected = spec.elongation();
        let observed = ref_box.elongation();
        if (observed - expected).abs() / expected > self.config.aspect_tolerance {
            return Err(CalibrationError::AspectMismatch {
                observed,
                expected,
                tolerance: self.config.aspect_tolerance,
            });
        }

        let (real_width, real_height) = if ref_box.is_landscape() == spec.is_landscape() {
            (spec.real_width, spec.real_height)
        } else {
            (spec.real_height, spec.real_width)
        };

        Ok(CalibrationResult {
            scale_x: real_width / ref_box.width as f64,
            scale_y: real_height / ref_box.height as f64,
            unit: spec.unit,
        })
    }
}
