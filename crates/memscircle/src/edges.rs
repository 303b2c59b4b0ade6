//! Edge detection stage: 3×3 gradient magnitude maps.
//!
//! Horizontal and vertical responses come from `imageproc::gradients`, which
//! pads by continuity (clamp-to-edge). The two responses are combined by
//! Euclidean magnitude `sqrt(gx² + gy²)`, rounded and saturated to `[0, 255]`.
//!
//! The output is a graded map. Turning it into an active set is a separate
//! thresholding step owned by the pipeline.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::definitions::Image;

use crate::config::EdgeDetectionMethod;
use crate::error::Result;

type Gradients = (Image<Luma<i16>>, Image<Luma<i16>>);

/// Strategy signature: `image -> (gx, gy)`.
pub type EdgeFn = fn(&GrayImage) -> Gradients;

/// Method-to-strategy table.
pub(crate) fn strategy(method: EdgeDetectionMethod) -> EdgeFn {
    match method {
        EdgeDetectionMethod::Sobel => sobel,
        EdgeDetectionMethod::Prewitt => prewitt,
        EdgeDetectionMethod::Scharr => scharr,
    }
}

/// Gradient-magnitude map of `image`, same dimensions as the input.
pub fn detect_edges(image: &GrayImage, method: EdgeDetectionMethod) -> Result<GrayImage> {
    crate::ensure_non_empty(image)?;
    let (gx, gy) = strategy(method)(image);
    for g in [&gx, &gy] {
        crate::ensure_same_dimensions(image.dimensions(), g.dimensions())?;
    }
    Ok(magnitude(&gx, &gy))
}

fn sobel(image: &GrayImage) -> Gradients {
    (
        imageproc::gradients::horizontal_sobel(image),
        imageproc::gradients::vertical_sobel(image),
    )
}

fn prewitt(image: &GrayImage) -> Gradients {
    (
        imageproc::gradients::horizontal_prewitt(image),
        imageproc::gradients::vertical_prewitt(image),
    )
}

fn scharr(image: &GrayImage) -> Gradients {
    (
        imageproc::gradients::horizontal_scharr(image),
        imageproc::gradients::vertical_scharr(image),
    )
}

fn magnitude(gx: &Image<Luma<i16>>, gy: &Image<Luma<i16>>) -> GrayImage {
    let (w, h) = gx.dimensions();
    ImageBuffer::from_fn(w, h, |x, y| {
        let dx = gx.get_pixel(x, y)[0] as f32;
        let dy = gy.get_pixel(x, y)[0] as f32;
        let mag = (dx * dx + dy * dy).sqrt();
        Luma([mag.round().min(255.0) as u8])
    })
}
