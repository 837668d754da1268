use nalgebra::{Matrix2, Matrix3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{GeometryError, Point};

/// Smallest scatter eigenvalue (in normalized units) accepted before the
/// point set is treated as collinear.
const COLLINEAR_EPS: f64 = 1e-10;

/// Circle in the XY plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CircleFit {
    /// Fitted center. `z` is the mean `z` of the input points.
    pub center: Point,
    pub radius: f64,
}

impl CircleFit {
    /// Root-mean-square of the radial residuals `|p - c| - r`.
    pub fn rms_residual(&self, points: &[Point]) -> f64 {
        if points.is_empty() {
            return 0.0;
        }
        let sum: f64 = points
            .iter()
            .map(|p| {
                let d = p.distance_planar(&self.center) - self.radius;
                d * d
            })
            .sum();
        (sum / points.len() as f64).sqrt()
    }
}

/// Centroid and mean distance to it; the data is mapped to
/// `(p - c) / mean_dist` before solving.
fn normalization(points: &[Point]) -> (Vector2<f64>, f64, f64) {
    let n = points.len() as f64;
    let mut c = Vector2::zeros();
    let mut z = 0.0;
    for p in points {
        c += p.xy();
        z += p.z;
    }
    c /= n;
    z /= n;

    let mean_dist = points.iter().map(|p| (p.xy() - c).norm()).sum::<f64>() / n;
    (c, mean_dist, z)
}

/// Algebraic least-squares (Kåsa) circle fit.
///
/// Minimizes `Σ (x² + y² + D·x + E·y + F)²` over `D, E, F` and recovers
/// `center = (-D/2, -E/2)`, `r² = (D² + E²)/4 - F`. Points are centered and
/// scaled before the solve, so exact circles are recovered to machine precision
/// regardless of their offset from the origin.
///
/// Fails with [`GeometryError::DegenerateGeometry`] for fewer than 3 points,
/// coincident or (near-)collinear points, or a singular normal system.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(points), fields(n = points.len()))
)]
pub fn fit_circle(points: &[Point]) -> Result<CircleFit, GeometryError> {
    if points.len() < 3 {
        return Err(GeometryError::degenerate("circle fit needs at least 3 points"));
    }
    if points.iter().any(|p| !p.is_finite()) {
        return Err(GeometryError::degenerate("non-finite point"));
    }

    let (c, scale, mean_z) = normalization(points);
    if scale < 1e-12 {
        return Err(GeometryError::degenerate("points coincide"));
    }

    let mut scatter = Matrix2::<f64>::zeros();
    let mut m = Matrix3::<f64>::zeros();
    let mut rhs = Vector3::<f64>::zeros();

    for p in points {
        let u = (p.xy() - c) / scale;
        scatter += u * u.transpose();

        // Row [u, v, 1] · [D, E, F]ᵀ = -(u² + v²)
        let a = Vector3::new(u.x, u.y, 1.0);
        m += a * a.transpose();
        rhs += a * -u.norm_squared();
    }

    scatter /= points.len() as f64;
    let eig = scatter.symmetric_eigenvalues();
    if eig.min() < COLLINEAR_EPS {
        return Err(GeometryError::degenerate("points are collinear"));
    }

    let sol = m
        .lu()
        .solve(&rhs)
        .ok_or_else(|| GeometryError::degenerate("singular circle system"))?;

    let center_n = Vector2::new(-0.5 * sol[0], -0.5 * sol[1]);
    let r2 = center_n.norm_squared() - sol[2];
    if !r2.is_finite() || r2 <= 0.0 {
        return Err(GeometryError::degenerate("non-positive squared radius"));
    }

    let center = c + center_n * scale;
    Ok(CircleFit {
        center: Point::new(center.x, center.y, mean_z),
        radius: r2.sqrt() * scale,
    })
}
