use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Tuning for [`crate::detection::reference::BrightRegionDetector`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceDetectorConfig {
    /// Regions with fewer pixels are treated as noise
    pub min_area_px: u32,
    pub min_fill_ratio: f32,
    /// Relative deviation from the expected long/short ratio that still scores above 0
    pub aspect_tolerance: f64,
    pub acceptance_threshold: f64,
}

impl Default for ReferenceDetectorConfig {
    fn default() -> Self {
        Self {
            min_area_px: 64,
            min_fill_ratio: 0.6,
            aspect_tolerance: 0.15,
            acceptance_threshold: 0.5,
        }
    }
}

/// Tuning for [`crate::detection::target::RectangleOutlineDetector`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetDetectorConfig {
    pub canny_low: f32,
    pub canny_high: f32,
    pub border_band_px: u32,
    /// Minimum candidate area as a share of the whole image
    pub min_area_fraction: f64,
    /// Minimum gap between the frame opening and the sash, as a share of the opening's short side
    pub nesting_margin_fraction: f64,
    pub acceptance_threshold: f64,
}

impl Default for TargetDetectorConfig {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 100.0,
            border_band_px: 3,
            min_area_fraction: 0.05,
            nesting_margin_fraction: 0.03,
            acceptance_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub aspect_tolerance: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            aspect_tolerance: 0.15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationConfig {
    pub low_confidence_threshold: f64,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            low_confidence_threshold: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub reference: ReferenceDetectorConfig,
    pub target: TargetDetectorConfig,
    pub calibration: CalibrationConfig,
    pub estimation: EstimationConfig,
    /// Per-stage budget; `None` disables the bound
    pub timeout_ms: Option<u64>,
    pub concurrent_detection: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reference: ReferenceDetectorConfig::default(),
            target: TargetDetectorConfig::default(),
            calibration: CalibrationConfig::default(),
            estimation: EstimationConfig::default(),
            timeout_ms: Some(30_000),
            concurrent_detection: true,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file; missing fields keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
