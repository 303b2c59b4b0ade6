//! Pipeline orchestration.
//!
//! Wires the stages together in a fixed order and stops at the first failing
//! stage, returning its error unchanged:
//!
//! raw image → filter → threshold → edge detection → threshold (edge map)
//! → foreground points → circle fit.
//!
//! The edge map is binarized with the same thresholding method and p-tile as
//! the intensity image.
//!
//! Entry points:
//! - `run`: circle only
//! - `run_with_stages`: circle plus every intermediate image
//! - `run_dynamic`: color or high-bit-depth input, converted to 8-bit luma
//! - `run_batch`: many images in parallel, one independent run per image

mod result;
mod run;

use image::{DynamicImage, GrayImage};
use rayon::prelude::*;

use crate::config::Configuration;
use crate::error::Result;
use crate::fit::CircleResult;

pub use result::{PipelineOutput, StageImages};

/// Run the full pipeline and return the fitted circle.
pub fn run(image: &GrayImage, config: &Configuration) -> Result<CircleResult> {
    run_with_stages(image, config).map(|out| out.circle)
}

/// Run the full pipeline and keep every intermediate image.
pub fn run_with_stages(image: &GrayImage, config: &Configuration) -> Result<PipelineOutput> {
    let out = run::run(image, config);
    if let Err(e) = &out {
        tracing::warn!("pipeline failed: {}", e);
    }
    out
}

/// Convert to 8-bit luma, then run the full pipeline.
pub fn run_dynamic(image: &DynamicImage, config: &Configuration) -> Result<PipelineOutput> {
    run_with_stages(&image.to_luma8(), config)
}

/// Run every image independently in parallel. Results keep input order.
pub fn run_batch(images: &[GrayImage], config: &Configuration) -> Vec<Result<CircleResult>> {
    images.par_iter().map(|img| run(img, config)).collect()
}
