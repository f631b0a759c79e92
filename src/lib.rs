pub mod calibration;
pub mod config;
pub mod core;
pub mod detection;
pub mod error;
pub mod estimation;
pub mod loader;
pub mod measurement;
pub mod models;
pub mod overlay;
pub mod pipeline;

pub use calibration::ScaleCalibrator;
pub use config::PipelineConfig;
pub use detection::{ReferenceDetector, TargetDetector};
pub use error::{CalibrationError, ErrorKind, LowConfidenceWarning, PipelineError, PipelineState};
pub use estimation::{DimensionEstimator, Estimate};
pub use loader::{Image, ImageLoader};
pub use models::{
    BoundingBox, CalibrationResult, Contour, Detection, DetectionResult, EstimationResult,
    LocationType, ReferenceSpec, ReferenceTable, ReferenceType, Unit,
};
pub use pipeline::{Analysis, DebugConfig, EstimationPipeline, PipelineContext};
