use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Axis-aligned box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x as u64 + self.width as u64 <= width as u64
            && self.y as u64 + self.height as u64 <= height as u64
    }

    /// Long side over short side, independent of orientation
    pub fn elongation(&self) -> f64 {
        let long = self.width.max(self.height) as f64;
        let short = self.width.min(self.height) as f64;
        if short == 0.0 {
            return f64::INFINITY;
        }
        long / short
    }

    pub fn is_landscape(&self) -> bool {
        self.width >= self.height
    }

    /// True if `inner` lies inside this box with at least `margin` pixels on every side
    pub fn contains_with_margin(&self, inner: &BoundingBox, margin: u32) -> bool {
        inner.x >= self.x + margin
            && inner.y >= self.y + margin
            && inner.right() + margin <= self.right()
            && inner.bottom() + margin <= self.bottom()
    }
}

/// Connected region found in a binary image
#[derive(Debug, Clone)]
pub struct Contour {
    pub label: u32,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    pub pixel_count: u32,
    /// Pixels lying within the border band of the region's own bounding box
    pub border_pixels: u32,
}

impl Contour {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    pub fn area(&self) -> u32 {
        self.pixel_count
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.min_x, self.min_y, self.width(), self.height())
    }

    pub fn perimeter(&self) -> f32 {
        2.0 * (self.width() as f32 + self.height() as f32)
    }

    /// Share of the bounding box covered by the region
    pub fn fill_ratio(&self) -> f32 {
        let box_area = self.width() as f32 * self.height() as f32;
        if box_area == 0.0 {
            return 0.0;
        }
        self.pixel_count as f32 / box_area
    }

    /// Share of the region's pixels that sit on its bounding box outline
    pub fn border_fraction(&self) -> f32 {
        if self.pixel_count == 0 {
            return 0.0;
        }
        self.border_pixels as f32 / self.pixel_count as f32
    }

    /// How much of the outline is actually traced, capped at 1
    pub fn perimeter_coverage(&self) -> f32 {
        let perimeter = self.perimeter();
        if perimeter == 0.0 {
            return 0.0;
        }
        (self.pixel_count as f32 / perimeter).min(1.0)
    }

    /// Average width of the region's stroke, for ring-shaped regions
    pub fn stroke_width(&self) -> f32 {
        let perimeter = self.perimeter();
        if perimeter == 0.0 {
            return 0.0;
        }
        self.pixel_count as f32 / perimeter
    }

    pub fn aspect_ratio(&self) -> f32 {
        let w = self.width() as f32;
        let h = self.height() as f32;
        if h == 0.0 {
            return 0.0;
        }
        w / h
    }
}

/// A located region with the detector's certainty
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f64,
}

impl Detection {
    /// Confidence is clamped into [0, 1]; NaN counts as 0.
    pub fn new(bbox: BoundingBox, confidence: f64) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self { bbox, confidence }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectionResult {
    Found(Detection),
    NotFound,
}

impl DetectionResult {
    /// A detection with no confidence at all is reported as `NotFound`
    pub fn found(bbox: BoundingBox, confidence: f64) -> Self {
        let detection = Detection::new(bbox, confidence);
        if detection.confidence > 0.0 {
            DetectionResult::Found(detection)
        } else {
            DetectionResult::NotFound
        }
    }

    pub fn detection(&self) -> Option<&Detection> {
        match self {
            DetectionResult::Found(d) => Some(d),
            DetectionResult::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, DetectionResult::Found(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReferenceType {
    #[serde(rename = "A4")]
    A4,
    #[serde(rename = "CREDIT_CARD")]
    CreditCard,
}

impl ReferenceType {
    pub const ALL: [ReferenceType; 2] = [ReferenceType::A4, ReferenceType::CreditCard];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::A4 => "A4",
            ReferenceType::CreditCard => "CREDIT_CARD",
        }
    }
}

impl FromStr for ReferenceType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
            "A4" => Ok(ReferenceType::A4),
            "CREDIT_CARD" | "CREDITCARD" | "CARD" => Ok(ReferenceType::CreditCard),
            _ => Err(anyhow::anyhow!("Invalid reference type: {}", s)),
        }
    }
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which part of the window the measurement is taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    /// Outer window frame
    Frame,
    /// Inner panel, nested inside the frame
    Sash,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Frame => "frame",
            LocationType::Sash => "sash",
        }
    }
}

impl FromStr for LocationType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "frame" => Ok(LocationType::Frame),
            "sash" => Ok(LocationType::Sash),
            _ => Err(anyhow::anyhow!("Invalid location type: {}", s)),
        }
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "mm")]
    Millimeter,
    #[serde(rename = "cm")]
    Centimeter,
    #[serde(rename = "m")]
    Meter,
    #[serde(rename = "in")]
    Inch,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Millimeter => "mm",
            Unit::Centimeter => "cm",
            Unit::Meter => "m",
            Unit::Inch => "in",
        }
    }

    pub fn millimeters_per_unit(&self) -> f64 {
        match self {
            Unit::Millimeter => 1.0,
            Unit::Centimeter => 10.0,
            Unit::Meter => 1000.0,
            Unit::Inch => 25.4,
        }
    }

    pub fn convert(&self, value: f64, to: Unit) -> f64 {
        value * self.millimeters_per_unit() / to.millimeters_per_unit()
    }
}

impl FromStr for Unit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mm" => Ok(Unit::Millimeter),
            "cm" => Ok(Unit::Centimeter),
            "m" => Ok(Unit::Meter),
            "in" | "inch" => Ok(Unit::Inch),
            _ => Err(anyhow::anyhow!("Invalid unit: {}", s)),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical size of a reference object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSpec {
    pub reference_type: ReferenceType,
    pub real_width: f64,
    pub real_height: f64,
    pub unit: Unit,
}

impl ReferenceSpec {
    pub fn standard(reference_type: ReferenceType) -> Self {
        match reference_type {
            ReferenceType::A4 => Self {
                reference_type,
                real_width: 297.0,
                real_height: 210.0,
                unit: Unit::Millimeter,
            },
            // ISO/IEC 7810 ID-1
            ReferenceType::CreditCard => Self {
                reference_type,
                real_width: 85.6,
                real_height: 53.98,
                unit: Unit::Millimeter,
            },
        }
    }

    pub fn elongation(&self) -> f64 {
        let long = self.real_width.max(self.real_height);
        let short = self.real_width.min(self.real_height);
        long / short
    }

    pub fn is_landscape(&self) -> bool {
        self.real_width >= self.real_height
    }
}

/// Reference sizes keyed by type
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    specs: BTreeMap<ReferenceType, ReferenceSpec>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        ReferenceType::ALL
            .into_iter()
            .map(ReferenceSpec::standard)
            .collect()
    }

    pub fn insert(&mut self, spec: ReferenceSpec) {
        self.specs.insert(spec.reference_type, spec);
    }

    pub fn get(&self, reference_type: ReferenceType) -> Option<&ReferenceSpec> {
        self.specs.get(&reference_type)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl FromIterator<ReferenceSpec> for ReferenceTable {
    fn from_iter<I: IntoIterator<Item = ReferenceSpec>>(iter: I) -> Self {
        let mut table = ReferenceTable::new();
        for spec in iter {
            table.insert(spec);
        }
        table
    }
}

/// Real-world units per pixel
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationResult {
    pub scale_x: f64,
    pub scale_y: f64,
    pub unit: Unit,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EstimationResult {
    pub width: f64,
    pub height: f64,
    pub unit: Unit,
    pub confidence: f64,
}

impl EstimationResult {
    pub fn in_unit(&self, unit: Unit) -> Self {
        Self {
            width: self.unit.convert(self.width, unit),
            height: self.unit.convert(self.height, unit),
            unit,
            confidence: self.confidence,
        }
    }
}
