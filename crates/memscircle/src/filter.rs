//! Filter stage: smoothing before thresholding.
//!
//! All variants keep the input dimensions and extend borders by clamping.
//! A radius of zero is the identity for every method.

use image::{GrayImage, ImageBuffer, Luma};

use crate::config::{FilterMethod, GAUSSIAN_SIGMA_KEY};
use crate::error::{Error, Result};

/// Strategy signature: `(image, radius, sigma) -> smoothed image`.
pub type FilterFn = fn(&GrayImage, u32, f64) -> Result<GrayImage>;

/// Method-to-strategy table.
pub(crate) fn strategy(method: FilterMethod) -> FilterFn {
    match method {
        FilterMethod::Gaussian => gaussian,
        FilterMethod::Mean => mean,
        FilterMethod::Median => median,
    }
}

/// Smooth `image` with the selected method.
///
/// `sigma` is only read by [`FilterMethod::Gaussian`]. Radii beyond the larger
/// image side are capped there: every extra tap would read a clamped border
/// sample.
pub fn filter(image: &GrayImage, method: FilterMethod, radius: u32, sigma: f64) -> Result<GrayImage> {
    crate::ensure_non_empty(image)?;
    if radius == 0 {
        return Ok(image.clone());
    }
    let max_radius = image.width().max(image.height());
    if radius > max_radius {
        tracing::debug!("filter radius {} capped to {}", radius, max_radius);
    }
    strategy(method)(image, radius.min(max_radius), sigma)
}

/// Normalized 1D Gaussian of half-width `radius`.
///
/// The truncated kernel is renormalized so its coefficients sum to 1. A sigma
/// so small that no tap besides the center survives yields the delta kernel.
pub fn gaussian_kernel(radius: u32, sigma: f64) -> Vec<f32> {
    let r = radius as i64;
    let raw: Vec<f64> = (-r..=r)
        .map(|x| (-(x as f64 / sigma).powi(2) / 2.0).exp())
        .collect();
    let sum: f64 = raw.iter().sum();
    if !(sum.is_finite() && sum > 0.0) {
        return (-r..=r).map(|x| if x == 0 { 1.0 } else { 0.0 }).collect();
    }
    raw.iter().map(|&v| (v / sum) as f32).collect()
}

fn gaussian(image: &GrayImage, radius: u32, sigma: f64) -> Result<GrayImage> {
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(Error::InvalidConfiguration {
            field: GAUSSIAN_SIGMA_KEY,
            reason: format!("must be finite and > 0, got {}", sigma),
        });
    }

    let kernel = gaussian_kernel(radius, sigma);
    // Filter in f32 so both passes keep full precision; round once at the end.
    let src: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
            Luma([image.get_pixel(x, y)[0] as f32])
        });
    let smoothed = imageproc::filter::separable_filter_equal(&src, &kernel);
    Ok(GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([smoothed.get_pixel(x, y)[0].round().clamp(0.0, 255.0) as u8])
    }))
}

fn mean(image: &GrayImage, radius: u32, _sigma: f64) -> Result<GrayImage> {
    Ok(imageproc::filter::box_filter(image, radius, radius))
}

fn median(image: &GrayImage, radius: u32, _sigma: f64) -> Result<GrayImage> {
    Ok(imageproc::filter::median_filter(image, radius, radius))
}
