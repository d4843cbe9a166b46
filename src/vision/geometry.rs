//! Geometry helpers for OCR regions
//!
//! Text size is estimated from the axis-aligned bounding box of the detected
//! quadrilateral. Rotation is ignored; the size tolerance is tuned against
//! this definition, so it must not be replaced by the true polygon area.

use serde::{Deserialize, Serialize};

/// A point in image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Point {
    fn from(p: [f64; 2]) -> Self {
        Self { x: p[0], y: p[1] }
    }
}

/// Four corners of a detected text region, in OCR order
pub type Quad = [Point; 4];

/// Size of a text region
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxMetrics {
    /// `width * height` of the bounding box
    pub area: f64,
    /// Horizontal extent (max x - min x)
    pub width: f64,
    /// Vertical extent (max y - min y)
    pub height: f64,
}

/// Measure the axis-aligned bounding box of a quadrilateral
pub fn measure(region: &Quad) -> BoxMetrics {
    let min_x = region.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let min_y = region.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_x = region.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let max_y = region.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

    let width = max_x - min_x;
    let height = max_y - min_y;

    BoxMetrics {
        area: width * height,
        width,
        height,
    }
}

/// Build an upright rectangle quad from (x, y, width, height)
pub fn rect_quad(x: f64, y: f64, width: f64, height: f64) -> Quad {
    [
        Point::new(x, y),
        Point::new(x + width, y),
        Point::new(x + width, y + height),
        Point::new(x, y + height),
    ]
}
