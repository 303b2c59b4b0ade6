//! High-level circle-finding API.
//!
//! [`CircleFinder`] owns a validated [`Configuration`] and runs the full
//! pipeline on any number of images.

use image::{DynamicImage, GrayImage};

use crate::config::Configuration;
use crate::error::Result;
use crate::fit::CircleResult;
use crate::pipeline::{self, PipelineOutput};

/// Primary circle-finding interface.
///
/// Create once, run on many images.
///
/// # Examples
///
/// ```
/// use image::{GrayImage, Luma};
/// use memscircle::{CircleFinder, Configuration};
///
/// let image = GrayImage::from_fn(80, 80, |x, y| {
///     let (dx, dy) = (x as f64 - 40.0, y as f64 - 40.0);
///     Luma([if dx * dx + dy * dy <= 400.0 { 255 } else { 0 }])
/// });
/// let finder = CircleFinder::with_config(Configuration::default()).unwrap();
/// let circle = finder.find(&image).unwrap();
/// assert!((circle.radius - 20.0).abs() < 2.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CircleFinder {
    config: Configuration,
}

impl CircleFinder {
    /// Create a finder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a finder from an explicit configuration.
    ///
    /// Fails with `InvalidConfiguration` when the configuration would be
    /// rejected by the pipeline anyway.
    pub fn with_config(config: Configuration) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Mutable access for tuning between runs.
    ///
    /// The pipeline revalidates on every run.
    pub fn config_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }

    /// Fit a circle to one grayscale image.
    pub fn find(&self, image: &GrayImage) -> Result<CircleResult> {
        pipeline::run(image, &self.config)
    }

    /// Fit a circle and keep every intermediate stage image.
    pub fn find_with_stages(&self, image: &GrayImage) -> Result<PipelineOutput> {
        pipeline::run_with_stages(image, &self.config)
    }

    /// Fit a circle to an image of any pixel format.
    pub fn find_dynamic(&self, image: &DynamicImage) -> Result<PipelineOutput> {
        pipeline::run_dynamic(image, &self.config)
    }

    /// Fit one circle per image in parallel.
    pub fn find_batch(&self, images: &[GrayImage]) -> Vec<Result<CircleResult>> {
        pipeline::run_batch(images, &self.config)
    }
}
