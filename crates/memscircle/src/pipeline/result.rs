use image::GrayImage;

use crate::fit::CircleResult;
use crate::points::PointSet;

/// Intermediate products of one pipeline run, in stage order.
#[derive(Debug, Clone)]
pub struct StageImages {
    /// Filter stage output.
    pub filtered: GrayImage,
    /// Threshold stage output (binary).
    pub binary: GrayImage,
    /// Gradient-magnitude map of `binary`.
    pub edges: GrayImage,
    /// `edges` binarized with the configured thresholding method.
    pub edge_mask: GrayImage,
    /// Foreground pixels of `edge_mask`, raster order.
    pub points: PointSet,
}

/// Fitted circle plus everything that led to it.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub circle: CircleResult,
    pub stages: StageImages,
}

impl PipelineOutput {
    /// Image dimensions [width, height].
    pub fn image_size(&self) -> [u32; 2] {
        self.stages.filtered.dimensions().into()
    }

    /// RMS orthogonal distance of the extracted points to the fitted circle.
    pub fn rms_residual(&self) -> f64 {
        crate::fit::rms_radial_residual(&self.circle, &crate::points::to_f64(&self.stages.points))
    }
}
