use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::loader::Image;
use crate::models::BoundingBox;

pub const REFERENCE_COLOR: Rgb<u8> = Rgb([0, 200, 0]);
pub const TARGET_COLOR: Rgb<u8> = Rgb([230, 30, 30]);
const LINE_WIDTH: u32 = 3;

/// Copy of the photo with the reference box in green and the target box in red
pub fn render_overlay(image: &Image, reference: &BoundingBox, target: &BoundingBox) -> RgbImage {
    let mut canvas = image.pixels().to_rgb8();
    draw_box(&mut canvas, reference, REFERENCE_COLOR);
    draw_box(&mut canvas, target, TARGET_COLOR);
    canvas
}

fn draw_box(canvas: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    // Nested outlines give a thick line; stop before the box collapses
    for inset in 0..LINE_WIDTH {
        let width = bbox.width.saturating_sub(2 * inset);
        let height = bbox.height.saturating_sub(2 * inset);
        if width == 0 || height == 0 {
            break;
        }
        let rect = Rect::at((bbox.x + inset) as i32, (bbox.y + inset) as i32).of_size(width, height);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}
