#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from winmeasure for tests
pub use winmeasure::core::db::{
    Dimensions, ImageRepository, NewImage, NewRequest, ReferenceSpecRepository, RequestDb,
    RequestRepository, RequestStatus, RequestUpdate, WindowImage, WindowRequest,
};
pub use winmeasure::{
    BoundingBox, DetectionResult, EstimationPipeline, LocationType, PipelineConfig,
    PipelineError, PipelineState, ReferenceSpec, ReferenceType, Unit,
};
