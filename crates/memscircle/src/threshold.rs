//! Threshold stage: histogram-based binarization.
//!
//! A level `t` is chosen from the image histogram, then every pixel with
//! value `> t` becomes [`FOREGROUND`] and everything else [`BACKGROUND`].

use image::GrayImage;

use crate::config::{ThresholdingMethod, P_TILE_VALUE_KEY};
use crate::error::{Error, Result};

/// Value of foreground pixels in binary images.
pub const FOREGROUND: u8 = 255;
/// Value of background pixels in binary images.
pub const BACKGROUND: u8 = 0;

/// Intensity histogram of an 8-bit image.
pub type Histogram = [u64; 256];

/// Strategy signature: `(histogram, p_tile) -> level`.
pub type ThresholdFn = fn(&Histogram, f64) -> u8;

/// Method-to-strategy table.
pub(crate) fn strategy(method: ThresholdingMethod) -> ThresholdFn {
    match method {
        ThresholdingMethod::Cluster => cluster_level,
        ThresholdingMethod::PTile => p_tile_level,
    }
}

/// Per-intensity pixel counts.
pub fn histogram(image: &GrayImage) -> Histogram {
    let mut hist = [0u64; 256];
    for &v in image.as_raw() {
        hist[v as usize] += 1;
    }
    hist
}

/// Separating level for `image` under `method`.
///
/// `p_tile` is only read by [`ThresholdingMethod::PTile`].
pub fn threshold_level(image: &GrayImage, method: ThresholdingMethod, p_tile: f64) -> Result<u8> {
    crate::ensure_non_empty(image)?;
    if method == ThresholdingMethod::PTile && !(0.0..=1.0).contains(&p_tile) {
        return Err(Error::InvalidConfiguration {
            field: P_TILE_VALUE_KEY,
            reason: format!("must lie in [0, 1], got {}", p_tile),
        });
    }
    Ok(strategy(method)(&histogram(image), p_tile))
}

/// Binarize `image`: values above the selected level become [`FOREGROUND`].
pub fn threshold(image: &GrayImage, method: ThresholdingMethod, p_tile: f64) -> Result<GrayImage> {
    let level = threshold_level(image, method, p_tile)?;
    Ok(binarize(image, level))
}

/// Apply a fixed level.
pub fn binarize(image: &GrayImage, level: u8) -> GrayImage {
    let mut out = image.clone();
    for p in out.pixels_mut() {
        p[0] = if p[0] > level { FOREGROUND } else { BACKGROUND };
    }
    out
}

/// Otsu clustering: maximize between-class variance, which is the same as
/// minimizing the within-class variance. Ties resolve to the lowest level.
///
/// An image with a single intensity returns that intensity, so nothing is
/// classified as foreground.
fn cluster_level(hist: &Histogram, _p_tile: f64) -> u8 {
    let total: u64 = hist.iter().sum();
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut w0 = 0u64;
    let mut sum0 = 0.0f64;
    let mut best: Option<(u8, f64)> = None;

    for (t, &count) in hist.iter().enumerate() {
        w0 += count;
        sum0 += t as f64 * count as f64;
        let w1 = total - w0;
        if w0 == 0 || w1 == 0 {
            continue;
        }
        let mu0 = sum0 / w0 as f64;
        let mu1 = (sum_total - sum0) / w1 as f64;
        let between = w0 as f64 * w1 as f64 * (mu0 - mu1) * (mu0 - mu1);
        if best.map_or(true, |(_, b)| between > b) {
            best = Some((t as u8, between));
        }
    }

    match best {
        Some((t, _)) => t,
        // Zero or one populated bin: the level is the only intensity present.
        None => hist.iter().position(|&c| c > 0).unwrap_or(0) as u8,
    }
}

/// Smallest level `t` such that the fraction of pixels `<= t` reaches `p_tile`.
fn p_tile_level(hist: &Histogram, p_tile: f64) -> u8 {
    let total: u64 = hist.iter().sum();
    let target = p_tile * total as f64;
    let mut cum = 0u64;
    for (t, &count) in hist.iter().enumerate() {
        cum += count;
        if cum > 0 && cum as f64 >= target {
            return t as u8;
        }
    }
    u8::MAX
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{draw_disk_image, noise_image};
    use image::{ImageBuffer, Luma};

    fn two_level_image(w: u32, h: u32, split_x: u32, lo: u8, hi: u8) -> GrayImage {
        ImageBuffer::from_fn(w, h, |x, _| Luma([if x < split_x { lo } else { hi }]))
    }

    #[test]
    fn histogram_counts_every_pixel_once() {
        let img = GrayImage::from_fn(5, 4, |x, _| Luma([if x < 2 { 10 } else { 200 }]));
        let hist = histogram(&img);
        assert_eq!(hist[10], 8);
        assert_eq!(hist[200], 12);
        assert_eq!(hist.iter().sum::<u64>(), 20);
    }

    #[test]
    fn output_contains_only_two_classes() {
        let img = noise_image(40, 30, 11);
        for method in [ThresholdingMethod::Cluster, ThresholdingMethod::PTile] {
            let out = threshold(&img, method, 0.3).expect("threshold succeeds");
            assert_eq!(out.dimensions(), img.dimensions());
            assert!(out
                .pixels()
                .all(|p| p[0] == FOREGROUND || p[0] == BACKGROUND));
        }
    }

    #[test]
    fn cluster_ties_pick_lowest_level() {
        // Every level in [20, 199] separates the two modes equally well.
        let img = two_level_image(10, 4, 5, 20, 200);
        let level = threshold_level(&img, ThresholdingMethod::Cluster, 0.5).expect("level");
        assert_eq!(level, 20);

        let out = threshold(&img, ThresholdingMethod::Cluster, 0.5).expect("threshold");
        assert_eq!(out.get_pixel(4, 0)[0], BACKGROUND);
        assert_eq!(out.get_pixel(5, 0)[0], FOREGROUND);
    }

    #[test]
    fn cluster_separates_bright_disk_from_dark_background() {
        let img = draw_disk_image(60, 60, [30.0, 30.0], 12.0, 220, 30);
        let level = threshold_level(&img, ThresholdingMethod::Cluster, 0.5).expect("level");
        assert!((30..220).contains(&level), "level {}", level);

        let out = threshold(&img, ThresholdingMethod::Cluster, 0.5).expect("threshold");
        assert_eq!(out.get_pixel(30, 30)[0], FOREGROUND);
        assert_eq!(out.get_pixel(2, 2)[0], BACKGROUND);
    }

    #[test]
    fn cluster_level_sits_between_noisy_modes() {
        let mut hist = [0u64; 256];
        for v in 40..=60 {
            hist[v] = 10;
        }
        for v in 170..=190 {
            hist[v] = 10;
        }
        let level = cluster_level(&hist, 0.0);
        assert!((60..170).contains(&level), "level {}", level);
    }

    #[test]
    fn constant_image_yields_its_intensity_and_no_foreground() {
        let img = GrayImage::from_pixel(8, 8, Luma([77]));
        for method in [ThresholdingMethod::Cluster, ThresholdingMethod::PTile] {
            let level = threshold_level(&img, method, 0.5).expect("level");
            assert_eq!(level, 77, "{:?}", method);
            let out = threshold(&img, method, 0.5).expect("threshold");
            assert!(out.pixels().all(|p| p[0] == BACKGROUND));
        }
    }

    #[test]
    fn p_tile_follows_cumulative_fraction() {
        // Columns 0..10 carry intensities 0, 10, ..., 90.
        let img = ImageBuffer::from_fn(10, 3, |x, _| Luma([(x * 10) as u8]));
        let level = |p| threshold_level(&img, ThresholdingMethod::PTile, p).expect("level");

        assert_eq!(level(0.0), 0);
        assert_eq!(level(0.05), 0);
        assert_eq!(level(0.25), 20);
        assert_eq!(level(0.5), 40);
        assert_eq!(level(1.0), 90);

        let out = threshold(&img, ThresholdingMethod::PTile, 0.5).expect("threshold");
        let fg = out.pixels().filter(|p| p[0] == FOREGROUND).count();
        assert_eq!(fg, 15);
    }

    #[test]
    fn p_tile_is_ignored_by_cluster() {
        let img = two_level_image(10, 4, 5, 20, 200);
        let a = threshold(&img, ThresholdingMethod::Cluster, 0.0).expect("threshold");
        let b = threshold(&img, ThresholdingMethod::Cluster, 42.0).expect("threshold");
        assert_eq!(a, b);
    }

    #[test]
    fn p_tile_outside_unit_interval_is_rejected() {
        let img = two_level_image(4, 4, 2, 0, 255);
        for p in [-0.5, 1.5, f64::NAN] {
            assert!(matches!(
                threshold(&img, ThresholdingMethod::PTile, p),
                Err(Error::InvalidConfiguration { .. })
            ));
        }
    }
}
