use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::morphology::dilate;

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Detect edges using Canny edge detector
pub fn detect_edges(img: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    canny(img, low_threshold, high_threshold)
}

/// Split into foreground (255) and background (0) at the Otsu level
pub fn binarize(img: &GrayImage) -> GrayImage {
    let level = otsu_level(img);
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        if img.get_pixel(x, y)[0] > level {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Thicken edges by `radius` pixels so small gaps at corners close up
pub fn close_gaps(edges: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return edges.clone();
    }
    dilate(edges, Norm::LInf, radius)
}
