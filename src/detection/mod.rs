pub mod preprocessing;
pub mod contours;
pub mod reference;
pub mod target;
pub mod fixed;

use crate::loader::Image;
use crate::models::{DetectionResult, LocationType, ReferenceSpec};

pub use fixed::{CenterCropDetector, FixedDetector};
pub use reference::BrightRegionDetector;
pub use target::RectangleOutlineDetector;

/// Locates the reference object of a known size.
///
/// Implementations must be deterministic and free of side effects: the pipeline may run
/// them concurrently with a [`TargetDetector`] on the same image.
pub trait ReferenceDetector: Send + Sync {
    /// `reference` carries both the type tag and the expected physical size.
    /// Returns [`DetectionResult::NotFound`] when no candidate is good enough.
    fn detect(&self, image: &Image, reference: &ReferenceSpec) -> DetectionResult;

    /// Human-readable name (used in logs)
    fn name(&self) -> &str;
}

/// Locates the window region to be measured. Same contract as [`ReferenceDetector`].
pub trait TargetDetector: Send + Sync {
    fn detect(&self, image: &Image, location: LocationType) -> DetectionResult;

    fn name(&self) -> &str;
}
