//! Shared synthetic inputs for unit tests.

use image::{GrayImage, Luma};
use rand::prelude::*;

/// Render a filled disk.
///
/// Pixels at distance `d <= radius` from `center` get `disk_pix`, all others
/// `bg_pix`.
pub(crate) fn draw_disk_image(
    w: u32,
    h: u32,
    center: [f32; 2],
    radius: f32,
    disk_pix: u8,
    bg_pix: u8,
) -> GrayImage {
    let mut img = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let dx = x as f32 - center[0];
            let dy = y as f32 - center[1];
            let d = (dx * dx + dy * dy).sqrt();
            let pix = if d <= radius { disk_pix } else { bg_pix };
            img.put_pixel(x, y, Luma([pix]));
        }
    }
    img
}

/// Uniform random intensities, reproducible from `seed`.
pub(crate) fn noise_image(w: u32, h: u32, seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut img = GrayImage::new(w, h);
    for p in img.pixels_mut() {
        p[0] = rng.gen();
    }
    img
}

/// `n` points evenly spaced on a circle, starting at angle 0.
pub(crate) fn sample_circle(center: [f64; 2], radius: f64, n: usize) -> Vec<[f64; 2]> {
    (0..n)
        .map(|i| {
            let t = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
            [center[0] + radius * t.cos(), center[1] + radius * t.sin()]
        })
        .collect()
}
