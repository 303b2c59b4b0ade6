//! Stage orchestration: filter → threshold → edges → threshold → points → fit.

use image::GrayImage;

use super::{PipelineOutput, StageImages};
use crate::config::Configuration;
use crate::error::Result;
use crate::{edges, filter, fit, points, threshold};

fn check_same_size(input: &GrayImage, output: &GrayImage) -> Result<()> {
    crate::ensure_same_dimensions(input.dimensions(), output.dimensions())
}

pub(super) fn run(image: &GrayImage, config: &Configuration) -> Result<PipelineOutput> {
    config.validate()?;
    crate::ensure_non_empty(image)?;
    let (w, h) = image.dimensions();
    tracing::debug!("pipeline start: {}x{}, {}", w, h, config);

    let filtered = filter::filter(
        image,
        config.filter_method(),
        config.filter_radius(),
        config.gaussian_sigma(),
    )?;
    check_same_size(image, &filtered)?;

    let level = threshold::threshold_level(
        &filtered,
        config.thresholding_method(),
        config.p_tile_value(),
    )?;
    let binary = threshold::binarize(&filtered, level);
    check_same_size(image, &binary)?;
    tracing::debug!("intensity threshold level {}", level);

    let edge_map = edges::detect_edges(&binary, config.edge_detection_method())?;
    check_same_size(image, &edge_map)?;

    let edge_level = threshold::threshold_level(
        &edge_map,
        config.thresholding_method(),
        config.p_tile_value(),
    )?;
    let edge_mask = threshold::binarize(&edge_map, edge_level);
    check_same_size(image, &edge_mask)?;
    tracing::debug!("edge threshold level {}", edge_level);

    let pts = points::extract_points(&edge_mask);
    tracing::debug!("{} boundary points extracted", pts.len());

    let circle = fit::fit_circle(&pts, config.circle_fit_method())?;
    tracing::info!(
        "circle center=({:.2}, {:.2}) radius={:.2} from {} points",
        circle.center[0],
        circle.center[1],
        circle.radius,
        pts.len()
    );

    Ok(PipelineOutput {
        circle,
        stages: StageImages {
            filtered,
            binary,
            edges: edge_map,
            edge_mask,
            points: pts,
        },
    })
}
