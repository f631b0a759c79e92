use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use tempfile::NamedTempFile;
use winmeasure::BoundingBox;
use winmeasure::core::db::{NewImage, NewRequest, RequestDb};

pub const SCENE_WIDTH: u32 = 1000;
pub const SCENE_HEIGHT: u32 = 800;

pub const BACKGROUND: Rgb<u8> = Rgb([60, 60, 60]);
pub const FRAME_COLOR: Rgb<u8> = Rgb([220, 220, 220]);
pub const SASH_COLOR: Rgb<u8> = Rgb([200, 200, 200]);
pub const PAPER_COLOR: Rgb<u8> = Rgb([245, 245, 245]);

/// Outer edge of the window frame
pub const FRAME_BOX: BoundingBox = BoundingBox { x: 100, y: 80, width: 800, height: 600 };
/// Outer edge of the sash, nested inside the frame
pub const SASH_BOX: BoundingBox = BoundingBox { x: 160, y: 140, width: 680, height: 480 };
/// An A4 sheet at 1.5 mm per pixel
pub const A4_BOX: BoundingBox = BoundingBox { x: 300, y: 300, width: 198, height: 140 };

/// Width of the frame profile in the default scene
pub const FRAME_BAR: u32 = 8;

/// Millimetres per pixel in the default scene
pub const SCENE_SCALE: f64 = 1.5;

/// Photo-like test scene: what to draw on a dark wall
#[derive(Debug, Clone, Copy)]
pub struct Scene {
    pub frame: Option<BoundingBox>,
    pub frame_bar: u32,
    pub sash: Option<BoundingBox>,
    pub reference: Option<BoundingBox>,
}

impl Scene {
    /// Frame, sash and an A4 sheet lying flat
    pub fn window_with_a4() -> Self {
        Self {
            frame: Some(FRAME_BOX),
            frame_bar: FRAME_BAR,
            sash: Some(SASH_BOX),
            reference: Some(A4_BOX),
        }
    }

    pub fn render(&self) -> RgbImage {
        let mut img = RgbImage::from_pixel(SCENE_WIDTH, SCENE_HEIGHT, BACKGROUND);
        if let Some(frame) = self.frame {
            draw_outline(&mut img, &frame, self.frame_bar, FRAME_COLOR);
        }
        if let Some(sash) = self.sash {
            draw_outline(&mut img, &sash, 6, SASH_COLOR);
        }
        if let Some(reference) = self.reference {
            draw_filled_rect_mut(&mut img, rect(&reference), PAPER_COLOR);
        }
        img
    }
}

fn rect(bbox: &BoundingBox) -> Rect {
    Rect::at(bbox.x as i32, bbox.y as i32).of_size(bbox.width, bbox.height)
}

/// Hollow rectangle whose outer edge is exactly `bbox`
pub fn draw_outline(img: &mut RgbImage, bbox: &BoundingBox, thickness: u32, color: Rgb<u8>) {
    for inset in 0..thickness {
        let inner = BoundingBox::new(
            bbox.x + inset,
            bbox.y + inset,
            bbox.width - 2 * inset,
            bbox.height - 2 * inset,
        );
        draw_hollow_rect_mut(img, rect(&inner), color);
    }
}

/// Saves the image as a temporary PNG.
/// The file will be automatically cleaned up when dropped.
pub fn save_temp_png(img: &RgbImage) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    img.save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}

/// Renders the standard window scene to a temporary PNG
pub fn create_window_photo() -> NamedTempFile {
    save_temp_png(&Scene::window_with_a4().render())
}

/// Creates a RequestDb in a temporary directory.
/// Returns both the store and the temp directory (which must be kept alive).
pub async fn create_test_store() -> (RequestDb, tempfile::TempDir) {
    let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let store = RequestDb::open(dir.path().join("store"))
        .await
        .expect("Failed to create test store");
    (store, dir)
}

pub fn make_new_request(name: &str) -> NewRequest {
    NewRequest {
        customer_name: name.to_string(),
        phone: "010-1234-5678".to_string(),
        memo: None,
    }
}

/// Creates a NewImage for the given photo.
pub fn make_new_image(photo: &NamedTempFile, location_type: &str, reference_type: &str) -> NewImage {
    NewImage {
        source_path: photo.path().to_path_buf(),
        location_type: location_type.to_string(),
        reference_type: reference_type.to_string(),
    }
}

/// True if `actual` is within `tolerance` (relative) of `expected`
pub fn approx_eq(actual: f64, expected: f64, tolerance: f64) -> bool {
    (actual - expected).abs() <= expected.abs() * tolerance
}
