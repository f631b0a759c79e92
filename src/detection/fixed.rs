use crate::detection::{ReferenceDetector, TargetDetector};
use crate::loader::Image;
use crate::models::{BoundingBox, DetectionResult, LocationType, ReferenceSpec};

/// Placeholder strategy: a box one fifth of the image in each dimension, centred.
///
/// Useful when the photo was taken with the reference held at the centre of the frame,
/// and as a baseline when comparing real detectors.
#[derive(Debug, Clone, Copy)]
pub struct CenterCropDetector {
    pub confidence: f64,
}

impl CenterCropDetector {
    pub fn new(confidence: f64) -> Self {
        Self { confidence }
    }

    pub fn center_box(width: u32, height: u32) -> BoundingBox {
        let (center_x, center_y) = (width / 2, height / 2);
        let (box_w, box_h) = (width / 5, height / 5);
        BoundingBox::new(center_x - box_w / 2, center_y - box_h / 2, box_w, box_h)
    }

    fn detect_center(&self, image: &Image) -> DetectionResult {
        let bbox = Self::center_box(image.width(), image.height());
        if bbox.is_degenerate() {
            return DetectionResult::NotFound;
        }
        DetectionResult::found(bbox, self.confidence)
    }
}

impl Default for CenterCropDetector {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl ReferenceDetector for CenterCropDetector {
    fn detect(&self, image: &Image, _reference: &ReferenceSpec) -> DetectionResult {
        self.detect_center(image)
    }

    fn name(&self) -> &str {
        "Center Crop"
    }
}

impl TargetDetector for CenterCropDetector {
    fn detect(&self, image: &Image, _location: LocationType) -> DetectionResult {
        self.detect_center(image)
    }

    fn name(&self) -> &str {
        "Center Crop"
    }
}

/// Always reports the same result, e.g. a box an operator drew by hand.
#[derive(Debug, Clone, Copy)]
pub struct FixedDetector {
    pub result: DetectionResult,
}

impl FixedDetector {
    pub fn found(bbox: BoundingBox, confidence: f64) -> Self {
        Self {
            result: DetectionResult::found(bbox, confidence),
        }
    }

    pub fn not_found() -> Self {
        Self {
            result: DetectionResult::NotFound,
        }
    }

    /// The fixed box is only reported if it lies inside the image
    fn detect_within(&self, image: &Image) -> DetectionResult {
        match self.result {
            DetectionResult::Found(d) if !d.bbox.fits_within(image.width(), image.height()) => {
                DetectionResult::NotFound
            }
            other => other,
        }
    }
}

impl ReferenceDetector for FixedDetector {
    fn detect(&self, image: &Image, _reference: &ReferenceSpec) -> DetectionResult {
        self.detect_within(image)
    }

    fn name(&self) -> &str {
        "Fixed"
    }
}

impl TargetDetector for FixedDetector {
    fn detect(&self, image: &Image, _location: LocationType) -> DetectionResult {
        self.detect_within(image)
    }

    fn name(&self) -> &str {
        "Fixed"
    }
}
