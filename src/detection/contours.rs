use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use std::collections::BTreeMap;
use crate::models::Contour;

/// Find regions of foreground pixels in a binary image using connected components.
///
/// Regions come back ordered by label, so the result is deterministic for a given image.
/// `border_band` is the width of the strip along each region's bounding box that counts
/// towards [`Contour::border_pixels`].
pub fn find_contours(binary: &GrayImage, min_area: u32, border_band: u32) -> Vec<Contour> {
    // Label connected components (white pixels = foreground)
    let labeled = connected_components(binary, Connectivity::Eight, Luma([0]));

    let mut regions: BTreeMap<u32, Contour> = BTreeMap::new();

    for (x, y, label) in labeled.enumerate_pixels() {
        let label_val = label[0];
        if label_val == 0 {
            continue; // Skip background
        }

        regions.entry(label_val)
            .and_modify(|c| {
                c.min_x = c.min_x.min(x);
                c.min_y = c.min_y.min(y);
                c.max_x = c.max_x.max(x);
                c.max_y = c.max_y.max(y);
                c.pixel_count += 1;
            })
            .or_insert(Contour {
                label: label_val,
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
                pixel_count: 1,
                border_pixels: 0,
            });
    }

    regions.retain(|_, c| c.pixel_count >= min_area);

    // Second pass now that every bounding box is final
    if border_band > 0 {
        for (x, y, label) in labeled.enumerate_pixels() {
            if let Some(c) = regions.get_mut(&label[0]) {
                let near_x = x < c.min_x + border_band || x + border_band > c.max_x;
                let near_y = y < c.min_y + border_band || y + border_band > c.max_y;
                if near_x || near_y {
                    c.border_pixels += 1;
                }
            }
        }
    }

    regions.into_values().collect()
}
