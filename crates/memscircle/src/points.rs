//! Foreground point extraction.

use image::GrayImage;

use crate::threshold::FOREGROUND;

/// Integer pixel coordinate; origin top-left, x right, y down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub fn to_f64(self) -> [f64; 2] {
        [self.x as f64, self.y as f64]
    }
}

/// Foreground pixels in raster order (row-major, top-to-bottom, left-to-right).
pub type PointSet = Vec<Point>;

/// Collect every [`FOREGROUND`] pixel of a binary image in raster order.
///
/// Total: an image without foreground (or with zero area) yields an empty set.
pub fn extract_points(binary: &GrayImage) -> PointSet {
    binary
        .enumerate_pixels()
        .filter(|(_, _, p)| p[0] == FOREGROUND)
        .map(|(x, y, _)| Point::new(x, y))
        .collect()
}

/// Continuous coordinates for the fitting stage.
pub fn to_f64(points: &[Point]) -> Vec<[f64; 2]> {
    points.iter().map(|p| p.to_f64()).collect()
}
