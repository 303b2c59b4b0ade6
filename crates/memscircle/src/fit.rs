//! Circle fitting: algebraic least squares (Kåsa) and geometric refinement.
//!
//! The algebraic fit linearizes the circle equation as
//! `x² + y² = 2a·x + 2b·y + c` and solves the 3×3 normal equations for
//! `(a, b, c)`. The center is `(a, b)` and the radius `sqrt(c + a² + b²)`.
//!
//! Points are shifted to their centroid and scaled to unit mean distance
//! before the normal matrix is built; the result is mapped back afterwards.

use nalgebra::{Matrix3, Vector3};

use crate::config::CircleFitMethod;
use crate::error::{Error, Result};
use crate::points::{self, Point};

/// A circle needs at least three non-collinear points.
pub const MIN_POINTS: usize = 3;

/// Reciprocal condition number below which the normal matrix is treated as
/// singular (collinear or coincident points).
const MIN_RCOND: f64 = 1e-10;

const GEOMETRIC_MAX_ITERS: usize = 50;

/// Fitted circle in continuous pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CircleResult {
    /// Center (x, y).
    pub center: [f64; 2],
    /// Radius, always finite and `>= 0`.
    pub radius: f64,
}

/// Strategy signature over continuous coordinates.
pub type FitFn = fn(&[[f64; 2]]) -> Result<CircleResult>;

/// Method-to-strategy table.
pub(crate) fn strategy(method: CircleFitMethod) -> FitFn {
    match method {
        CircleFitMethod::SimpleAlgebraic => fit_circle_algebraic,
        CircleFitMethod::Geometric => fit_circle_geometric,
    }
}

/// Fit a circle to extracted pixel positions.
pub fn fit_circle(points: &[Point], method: CircleFitMethod) -> Result<CircleResult> {
    fit_circle_f64(&points::to_f64(points), method)
}

/// Fit a circle to continuous coordinates.
///
/// Fails with [`Error::InsufficientData`] for fewer than [`MIN_POINTS`]
/// points and with [`Error::DegenerateFit`] when the points are
/// (near-)collinear, coincident or not finite.
pub fn fit_circle_f64(points: &[[f64; 2]], method: CircleFitMethod) -> Result<CircleResult> {
    if points.len() < MIN_POINTS {
        return Err(Error::InsufficientData {
            needed: MIN_POINTS,
            got: points.len(),
        });
    }
    if !points.iter().all(|p| p[0].is_finite() && p[1].is_finite()) {
        return Err(Error::DegenerateFit { rcond: 0.0 });
    }
    strategy(method)(points)
}

/// Closed-form Kåsa fit.
fn fit_circle_algebraic(points: &[[f64; 2]]) -> Result<CircleResult> {
    let (mean_x, mean_y, scale, inv_scale) = normalization_params(points);

    // Normal equations for rows [u, v, 1] · [2a, 2b, c]ᵀ = u² + v².
    let mut m = Matrix3::<f64>::zeros();
    let mut rhs = Vector3::<f64>::zeros();
    for &[px, py] in points {
        let u = (px - mean_x) * scale;
        let v = (py - mean_y) * scale;
        let row = Vector3::new(u, v, 1.0);
        m += row * row.transpose();
        rhs += row * (u * u + v * v);
    }

    let rcond = reciprocal_condition(&m);
    if !(rcond >= MIN_RCOND) {
        return Err(Error::DegenerateFit { rcond });
    }
    let sol = m.lu().solve(&rhs).ok_or(Error::DegenerateFit { rcond })?;

    let a = 0.5 * sol[0];
    let b = 0.5 * sol[1];
    // Rounding can push c + a² + b² slightly below zero for tiny circles.
    let radius_sq = (sol[2] + a * a + b * b).max(0.0);

    Ok(CircleResult {
        center: [mean_x + a * inv_scale, mean_y + b * inv_scale],
        radius: radius_sq.sqrt() * inv_scale,
    })
}

/// Kåsa initialization refined by Gauss-Newton on orthogonal distances
/// `‖pᵢ − c‖ − r`. Steps that do not reduce the cost end the iteration, so
/// the result is never worse than the algebraic estimate.
fn fit_circle_geometric(points: &[[f64; 2]]) -> Result<CircleResult> {
    let init = fit_circle_algebraic(points)?;
    let (mean_x, mean_y, scale, inv_scale) = normalization_params(points);

    let pts: Vec<[f64; 2]> = points
        .iter()
        .map(|&[x, y]| [(x - mean_x) * scale, (y - mean_y) * scale])
        .collect();
    let mut center = [
        (init.center[0] - mean_x) * scale,
        (init.center[1] - mean_y) * scale,
    ];
    let mut radius = init.radius * scale;
    let mut cost = radial_cost(&pts, center, radius);

    for _ in 0..GEOMETRIC_MAX_ITERS {
        let mut h = Matrix3::<f64>::zeros();
        let mut g = Vector3::<f64>::zeros();
        for p in &pts {
            let dx = p[0] - center[0];
            let dy = p[1] - center[1];
            let dist = (dx * dx + dy * dy).sqrt();
            if dist <= 1e-12 {
                continue;
            }
            let r = dist - radius;
            let j = Vector3::new(-dx / dist, -dy / dist, -1.0);
            h += j * j.transpose();
            g += j * r;
        }

        // Light damping for near-degenerate arcs.
        h += Matrix3::<f64>::identity() * 1e-12;

        let Some(step) = h.lu().solve(&(-g)) else {
            break;
        };
        if !step.iter().all(|s| s.is_finite()) {
            break;
        }

        let cand_center = [center[0] + step[0], center[1] + step[1]];
        let cand_radius = (radius + step[2]).abs();
        let cand_cost = radial_cost(&pts, cand_center, cand_radius);
        if cand_cost > cost {
            tracing::trace!("geometric fit: step rejected (cost {} -> {})", cost, cand_cost);
            break;
        }
        center = cand_center;
        radius = cand_radius;
        cost = cand_cost;

        if step.norm() < 1e-12 {
            break;
        }
    }

    Ok(CircleResult {
        center: [mean_x + center[0] * inv_scale, mean_y + center[1] * inv_scale],
        radius: radius.max(0.0) * inv_scale,
    })
}

fn radial_cost(points: &[[f64; 2]], center: [f64; 2], radius: f64) -> f64 {
    points
        .iter()
        .map(|p| {
            let d = (p[0] - center[0]).hypot(p[1] - center[1]) - radius;
            d * d
        })
        .sum()
}

/// RMS of the orthogonal point-to-circle distances.
pub fn rms_radial_residual(circle: &CircleResult, points: &[[f64; 2]]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    (radial_cost(points, circle.center, circle.radius) / points.len() as f64).sqrt()
}

/// Ratio of smallest to largest absolute eigenvalue of a symmetric matrix.
fn reciprocal_condition(m: &Matrix3<f64>) -> f64 {
    let eig = m.symmetric_eigenvalues();
    let (lo, hi) = eig
        .iter()
        .fold((f64::INFINITY, 0.0f64), |(lo, hi), &l| (lo.min(l.abs()), hi.max(l.abs())));
    if hi > 0.0 && hi.is_finite() {
        lo / hi
    } else {
        0.0
    }
}

/// Compute normalization parameters for a point set.
/// Returns (mean_x, mean_y, scale, inv_scale).
fn normalization_params(points: &[[f64; 2]]) -> (f64, f64, f64, f64) {
    let n = points.len() as f64;
    let mean_x: f64 = points.iter().map(|p| p[0]).sum::<f64>() / n;
    let mean_y: f64 = points.iter().map(|p| p[1]).sum::<f64>() / n;

    let mean_dist: f64 = points
        .iter()
        .map(|p| ((p[0] - mean_x).powi(2) + (p[1] - mean_y).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    let scale = if mean_dist > 1e-15 { 1.0 / mean_dist } else { 1.0 };

    (mean_x, mean_y, scale, 1.0 / scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_circle;
    use approx::assert_relative_eq;
    use rand::prelude::*;

    const METHODS: [CircleFitMethod; 2] =
        [CircleFitMethod::SimpleAlgebraic, CircleFitMethod::Geometric];

    fn noisy_circle(center: [f64; 2], radius: f64, n: usize, sigma: f64, seed: u64) -> Vec<[f64; 2]> {
        let mut rng = StdRng::seed_from_u64(seed);
        sample_circle(center, radius, n)
            .into_iter()
            .map(|[x, y]| {
                [
                    x + (rng.gen::<f64>() - 0.5) * 2.0 * sigma,
                    y + (rng.gen::<f64>() - 0.5) * 2.0 * sigma,
                ]
            })
            .collect()
    }

    #[test]
    fn recovers_exact_synthetic_circle() {
        let cases = [
            ([50.0, 50.0], 30.0, 8),
            ([120.5, -40.25], 33.0, 16),
            ([1.0e4, 2.0e4], 2.5, 64),
        ];
        for method in METHODS {
            for &(center, radius, n) in &cases {
                let pts = sample_circle(center, radius, n);
                let c = fit_circle_f64(&pts, method).expect("fit succeeds");
                assert_relative_eq!(c.center[0], center[0], max_relative = 1e-6);
                assert_relative_eq!(c.center[1], center[1], max_relative = 1e-6);
                assert_relative_eq!(c.radius, radius, max_relative = 1e-6);
                assert!(rms_radial_residual(&c, &pts) < 1e-6);
            }
        }
    }

    #[test]
    fn three_points_give_circumscribed_circle() {
        let pts = [[0.0, 0.0], [2.0, 0.0], [0.0, 2.0]];
        let c = fit_circle_f64(&pts, CircleFitMethod::SimpleAlgebraic).expect("fit succeeds");
        assert_relative_eq!(c.center[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(c.center[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(c.radius, 2.0f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn translation_covariance() {
        let pts = noisy_circle([40.0, 60.0], 25.0, 120, 0.8, 7);
        let t = [1234.5, -987.25];
        let shifted: Vec<[f64; 2]> = pts.iter().map(|p| [p[0] + t[0], p[1] + t[1]]).collect();
        for method in METHODS {
            let a = fit_circle_f64(&pts, method).expect("fit succeeds");
            let b = fit_circle_f64(&shifted, method).expect("fit succeeds");
            assert_relative_eq!(b.center[0], a.center[0] + t[0], epsilon = 1e-6);
            assert_relative_eq!(b.center[1], a.center[1] + t[1], epsilon = 1e-6);
            assert_relative_eq!(b.radius, a.radius, epsilon = 1e-6);
        }
    }

    #[test]
    fn rotation_covariance() {
        let pts = noisy_circle([70.0, -15.0], 18.0, 90, 0.5, 99);
        let theta: f64 = 0.7;
        let (s, c) = theta.sin_cos();
        let rot = |p: [f64; 2]| [c * p[0] - s * p[1], s * p[0] + c * p[1]];
        let rotated: Vec<[f64; 2]> = pts.iter().map(|&p| rot(p)).collect();
        for method in METHODS {
            let a = fit_circle_f64(&pts, method).expect("fit succeeds");
            let b = fit_circle_f64(&rotated, method).expect("fit succeeds");
            let expected = rot(a.center);
            assert_relative_eq!(b.center[0], expected[0], epsilon = 1e-6);
            assert_relative_eq!(b.center[1], expected[1], epsilon = 1e-6);
            assert_relative_eq!(b.radius, a.radius, epsilon = 1e-6);
        }
    }

    #[test]
    fn fewer_than_three_points_is_insufficient() {
        for method in METHODS {
            for n in 0..3 {
                let pts: Vec<[f64; 2]> = (0..n).map(|i| [i as f64, 2.0 * i as f64 + 1.0]).collect();
                assert_eq!(
                    fit_circle_f64(&pts, method),
                    Err(Error::InsufficientData { needed: 3, got: n })
                );
            }
            assert_eq!(
                fit_circle(&[Point::new(1, 1), Point::new(5, 9)], method),
                Err(Error::InsufficientData { needed: 3, got: 2 })
            );
        }
    }

    #[test]
    fn collinear_points_are_degenerate() {
        let lines: [Vec<[f64; 2]>; 3] = [
            (0..5).map(|i| [i as f64 * 10.0, 0.0]).collect(),
            (0..5).map(|i| [3.0, i as f64]).collect(),
            (0..5).map(|i| [i as f64, 0.3 * i as f64 + 7.0]).collect(),
        ];
        for method in METHODS {
            for line in &lines {
                assert!(
                    matches!(fit_circle_f64(line, method), Err(Error::DegenerateFit { .. })),
                    "{:?} on {:?}",
                    method,
                    line
                );
            }
        }
    }

    #[test]
    fn coincident_and_non_finite_points_are_degenerate() {
        let same = vec![[4.0, 4.0]; 10];
        let with_nan = vec![[0.0, 0.0], [1.0, 0.0], [0.0, f64::NAN]];
        for method in METHODS {
            assert!(matches!(
                fit_circle_f64(&same, method),
                Err(Error::DegenerateFit { .. })
            ));
            assert!(matches!(
                fit_circle_f64(&with_nan, method),
                Err(Error::DegenerateFit { .. })
            ));
        }
    }

    #[test]
    fn pixel_points_fit_digital_circle() {
        let pts: Vec<Point> = sample_circle([30.0, 20.0], 12.0, 200)
            .into_iter()
            .map(|[x, y]| Point::new(x.round() as u32, y.round() as u32))
            .collect();
        let c = fit_circle(&pts, CircleFitMethod::SimpleAlgebraic).expect("fit succeeds");
        assert_relative_eq!(c.center[0], 30.0, epsilon = 0.2);
        assert_relative_eq!(c.center[1], 20.0, epsilon = 0.2);
        assert_relative_eq!(c.radius, 12.0, epsilon = 0.3);
    }

    #[test]
    fn geometric_never_worse_than_algebraic() {
        let all = noisy_circle([0.0, 0.0], 40.0, 400, 1.5, 2024);
        // Quarter arc: the algebraic fit is biased there.
        let arc: Vec<[f64; 2]> = all.into_iter().filter(|p| p[0] > 0.0 && p[1] > 0.0).collect();
        assert!(arc.len() > 50);

        let alg = fit_circle_f64(&arc, CircleFitMethod::SimpleAlgebraic).expect("fit succeeds");
        let geo = fit_circle_f64(&arc, CircleFitMethod::Geometric).expect("fit succeeds");
        assert!(rms_radial_residual(&geo, &arc) <= rms_radial_residual(&alg, &arc) + 1e-12);
        assert!(geo.radius.is_finite() && geo.radius >= 0.0);
    }

    #[test]
    fn tiny_triangle_never_yields_nan() {
        let pts = [[5.0, 5.0], [5.0 + 1e-6, 5.0], [5.0, 5.0 + 1e-6]];
        for method in METHODS {
            let c = fit_circle_f64(&pts, method).expect("fit succeeds");
            assert!(c.radius.is_finite() && c.radius >= 0.0);
        }
    }

    #[test]
    fn residual_of_empty_set_is_zero() {
        let c = CircleResult {
            center: [0.0, 0.0],
            radius: 1.0,
        };
        assert_eq!(rms_radial_residual(&c, &[]), 0.0);
    }
}
