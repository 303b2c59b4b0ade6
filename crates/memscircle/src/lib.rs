//! memscircle: circle center and radius estimation for MEMS inspection images.
//!
//! A single grayscale image is reduced to a circle through a fixed chain of
//! stages:
//!
//! 1. **Filter** – Gaussian, mean or median smoothing (clamp-to-edge borders).
//! 2. **Threshold** – Otsu (cluster) or p-tile binarization.
//! 3. **Edges** – Sobel, Prewitt or Scharr gradient magnitude.
//! 4. **Threshold** – the edge map is binarized with the same method.
//! 5. **Points** – foreground pixel coordinates in raster order.
//! 6. **Fit** – algebraic (Kåsa) or geometric least-squares circle.
//!
//! # Public API
//! - [`CircleFinder`] as the primary entry point
//! - [`Configuration`] and the method enums for tuning
//! - free stage functions for callers that want a single stage

mod api;
mod config;
pub mod edges;
mod error;
pub mod filter;
pub mod fit;
pub mod pipeline;
pub mod points;
pub mod threshold;

#[cfg(test)]
pub(crate) mod test_utils;

use image::GrayImage;

pub use api::CircleFinder;
pub use config::{
    CircleFitMethod, Configuration, EdgeDetectionMethod, FilterMethod, ThresholdingMethod,
    CIRCLE_FIT_METHOD_KEY, EDGE_DETECTION_METHOD_KEY, FILTER_METHOD_KEY, FILTER_RADIUS_KEY,
    GAUSSIAN_SIGMA_KEY, P_TILE_VALUE_KEY, THRESHOLDING_METHOD_KEY,
};
pub use error::{Error, Result};
pub use fit::CircleResult;
pub use pipeline::{PipelineOutput, StageImages};
pub use points::{Point, PointSet};
pub use threshold::{BACKGROUND, FOREGROUND};

/// Reject images with a zero-sized axis.
pub(crate) fn ensure_non_empty(image: &GrayImage) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::EmptyImage);
    }
    Ok(())
}

/// Stage outputs must keep the dimensions of their input.
pub(crate) fn ensure_same_dimensions(expected: (u32, u32), actual: (u32, u32)) -> Result<()> {
    if expected != actual {
        return Err(Error::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        });
    }
    Ok(())
}
