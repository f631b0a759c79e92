use crate::config::ReferenceDetectorConfig;
use crate::detection::{contours, preprocessing, ReferenceDetector};
use crate::loader::Image;
use crate::models::{Contour, DetectionResult, ReferenceSpec};

/// Finds the reference object as a bright, solid rectangle.
///
/// Paper sheets and cards show up as uniformly bright blobs once the photo is
/// binarised at its Otsu level. Each blob is scored by how completely it fills
/// its bounding box and by how close its long/short ratio is to the reference's.
/// Orientation does not matter, so a sheet lying rotated by 90° still matches.
#[derive(Debug, Clone, Default)]
pub struct BrightRegionDetector {
    pub config: ReferenceDetectorConfig,
}

impl BrightRegionDetector {
    pub fn new(config: ReferenceDetectorConfig) -> Self {
        Self { config }
    }

    /// Score in [0, 1]; 0 when the region cannot be the reference
    pub fn score(&self, contour: &Contour, reference: &ReferenceSpec) -> f64 {
        let fill = contour.fill_ratio();
        if fill < self.config.min_fill_ratio {
            return 0.0;
        }

        let expected = reference.elongation();
        let observed = contour.bbox().elongation();
        let rel_err = (observed - expected).abs() / expected;
        let aspect_score = if self.config.aspect_tolerance > 0.0 {
            (1.0 - rel_err / self.config.aspect_tolerance).max(0.0)
        } else if rel_err == 0.0 {
            1.0
        } else {
            0.0
        };

        fill as f64 * aspect_score
    }
}

impl ReferenceDetector for BrightRegionDetector {
    fn detect(&self, image: &Image, reference: &ReferenceSpec) -> DetectionResult {
        let gray = preprocessing::to_grayscale(image.pixels());
        let binary = preprocessing::binarize(&gray);
        let candidates = contours::find_contours(&binary, self.config.min_area_px, 0);

        tracing::debug!(
            reference = %reference.reference_type,
            candidates = candidates.len(),
            "scoring reference candidates"
        );

        // Best score, then larger area, then top-most/left-most
        let best = candidates
            .iter()
            .map(|c| (self.score(c, reference), c))
            .filter(|(score, _)| *score > 0.0 && *score >= self.config.acceptance_threshold)
            .max_by(|(sa, a), (sb, b)| {
                sa.total_cmp(sb)
                    .then(a.pixel_count.cmp(&b.pixel_count))
                    .then((b.min_y, b.min_x).cmp(&(a.min_y, a.min_x)))
            });

        match best {
            Some((score, contour)) => DetectionResult::found(contour.bbox(), score),
            None => DetectionResult::NotFound,
        }
    }

    fn name(&self) -> &str {
        "Bright Region"
    }
}
