use crate::config::TargetDetectorConfig;
use crate::detection::{contours, preprocessing, TargetDetector};
use crate::loader::Image;
use crate::models::{BoundingBox, Contour, DetectionResult, LocationType};

/// Dilation applied to the edge map before labelling
const GAP_RADIUS: u8 = 1;
/// Widest stroke a single dilated edge leaves; thicker loops hold both sides of a bar
const SINGLE_EDGE_WIDTH: f32 = (2 * GAP_RADIUS as u32 + 2) as f32;

/// Finds window outlines as rectangular edge loops.
///
/// A window frame or sash shows up in the edge map as a closed loop whose pixels
/// all sit on its own bounding box. Textured areas also produce edges, but those
/// fill the inside of their box and score poorly.
#[derive(Debug, Clone, Default)]
pub struct RectangleOutlineDetector {
    pub config: TargetDetectorConfig,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    bbox: BoundingBox,
    confidence: f64,
    stroke_width: f32,
}

impl RectangleOutlineDetector {
    pub fn new(config: TargetDetectorConfig) -> Self {
        Self { config }
    }

    fn candidates(&self, image: &Image) -> Vec<Candidate> {
        let gray = preprocessing::to_grayscale(image.pixels());
        let edges = preprocessing::detect_edges(&gray, self.config.canny_low, self.config.canny_high);
        let closed = preprocessing::close_gaps(&edges, GAP_RADIUS);

        let image_area = image.width() as f64 * image.height() as f64;
        let min_area = image_area * self.config.min_area_fraction;
        let band = self.config.border_band_px + GAP_RADIUS as u32;

        contours::find_contours(&closed, 1, band)
            .iter()
            .filter_map(|c| {
                let bbox = undo_dilation(c, image.width(), image.height());
                let confidence = c.border_fraction() as f64 * c.perimeter_coverage() as f64;
                (confidence > 0.0
                    && confidence >= self.config.acceptance_threshold
                    && bbox.area() as f64 >= min_area)
                    .then_some(Candidate {
                        bbox,
                        confidence,
                        stroke_width: c.stroke_width(),
                    })
            })
            .collect()
    }

    fn pick_frame(candidates: &[Candidate]) -> Option<Candidate> {
        candidates.iter().copied().max_by(|a, b| {
            a.bbox.area()
                .cmp(&b.bbox.area())
                .then(a.confidence.total_cmp(&b.confidence))
                .then((b.bbox.y, b.bbox.x).cmp(&(a.bbox.y, a.bbox.x)))
        })
    }

    /// The frame bar has two edges: its outer edge is the frame loop and its inner edge
    /// is the largest loop directly inside it. The sash is the largest loop inside that
    /// inner edge. If the frame loop is thick enough to hold both edges, there is no
    /// separate inner edge to skip.
    fn pick_sash(&self, candidates: &[Candidate], frame: &Candidate) -> Option<Candidate> {
        let nested_in = |outer: &BoundingBox, margin: u32| -> Vec<Candidate> {
            candidates
                .iter()
                .copied()
                .filter(|c| outer.contains_with_margin(&c.bbox, margin))
                .collect()
        };

        let opening = if frame.stroke_width > SINGLE_EDGE_WIDTH {
            frame.bbox
        } else {
            Self::pick_frame(&nested_in(&frame.bbox, 1))?.bbox
        };

        let short_side = opening.width.min(opening.height) as f64;
        let margin = (short_side * self.config.nesting_margin_fraction).ceil() as u32;
        Self::pick_frame(&nested_in(&opening, margin))
    }
}

/// Shrink a dilated region's box back to the edge it came from
fn undo_dilation(contour: &Contour, width: u32, height: u32) -> BoundingBox {
    let r = GAP_RADIUS as u32;
    // Dilation is clipped at the image border, so only shrink sides that could grow
    let left = if contour.min_x > 0 { r } else { 0 };
    let top = if contour.min_y > 0 { r } else { 0 };
    let right = if contour.max_x + 1 < width { r } else { 0 };
    let bottom = if contour.max_y + 1 < height { r } else { 0 };

    let bbox = contour.bbox();
    BoundingBox::new(
        bbox.x + left,
        bbox.y + top,
        bbox.width.saturating_sub(left + right),
        bbox.height.saturating_sub(top + bottom),
    )
}

impl TargetDetector for RectangleOutlineDetector {
    fn detect(&self, image: &Image, location: LocationType) -> DetectionResult {
        let candidates = self.candidates(image);
        tracing::debug!(%location, candidates = candidates.len(), "scoring outline candidates");

        let Some(frame) = Self::pick_frame(&candidates) else {
            return DetectionResult::NotFound;
        };

        let picked = match location {
            LocationType::Frame => Some(frame),
            LocationType::Sash => self.pick_sash(&candidates, &frame),
        };

        match picked {
            Some(c) => DetectionResult::found(c.bbox, c.confidence),
            None => DetectionResult::NotFound,
        }
    }

    fn name(&self) -> &str {
        "Rectangle Outline"
    }
}
