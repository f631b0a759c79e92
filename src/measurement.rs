//! Manual measurements taken by an operator on a calibrated photo.
//!
//! An operator draws a line across the window; its length is converted with the
//! same calibration the pipeline uses. Up to three readings per axis are kept and
//! averaged.

use serde::Serialize;

use crate::models::{CalibrationResult, Unit};

/// Number of readings kept per axis
pub const SAMPLES_PER_AXIS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Point in image pixel coordinates; sub-pixel positions are allowed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurement {
    pub axis: Axis,
    pub length: f64,
    pub unit: Unit,
}

/// Real-world length of the segment `from`–`to`.
///
/// Segments that are wider than tall count as width readings, all others as height.
pub fn measure_segment(from: PixelPoint, to: PixelPoint, calibration: &CalibrationResult) -> Measurement {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let axis = if dx.abs() > dy.abs() {
        Axis::Horizontal
    } else {
        Axis::Vertical
    };

    let real_dx = dx * calibration.scale_x;
    let real_dy = dy * calibration.scale_y;

    Measurement {
        axis,
        length: (real_dx * real_dx + real_dy * real_dy).sqrt(),
        unit: calibration.unit,
    }
}

/// Width and height readings for one photo
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementSheet {
    widths: [Option<f64>; SAMPLES_PER_AXIS],
    heights: [Option<f64>; SAMPLES_PER_AXIS],
}

impl MeasurementSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a reading, rounded to a whole unit, in the first free slot of its axis;
    /// once all are used the last slot is overwritten.
    pub fn record(&mut self, measurement: &Measurement) {
        let slots = match measurement.axis {
            Axis::Horizontal => &mut self.widths,
            Axis::Vertical => &mut self.heights,
        };
        let idx = slots
            .iter()
            .position(Option::is_none)
            .unwrap_or(SAMPLES_PER_AXIS - 1);
        slots[idx] = Some(measurement.length.round());
    }

    pub fn widths(&self) -> impl Iterator<Item = f64> + '_ {
        self.widths.iter().flatten().copied()
    }

    pub fn heights(&self) -> impl Iterator<Item = f64> + '_ {
        self.heights.iter().flatten().copied()
    }

    /// Rounded mean of the positive readings per axis, `(width, height)`; 0 for an empty axis
    pub fn averages(&self) -> (f64, f64) {
        (rounded_mean(self.widths()), rounded_mean(self.heights()))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn rounded_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|v| v.is_finite() && *v > 0.0)
        .fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return 0.0;
    }
    (sum / count as f64).round()
}
