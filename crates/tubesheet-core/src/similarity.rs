use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{GeometryError, Point};

/// Minimum number of correspondences for a similarity fit.
pub const MIN_SIMILARITY_PAIRS: usize = 2;

/// Planar similarity `dst = scale · R(rotation) · src + translation`.
///
/// `z` passes through unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignmentTransform {
    /// Counter-clockwise rotation in radians.
    pub rotation: f64,
    pub scale: f64,
    pub translation: Vector2<f64>,
}

impl Default for AlignmentTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AlignmentTransform {
    pub fn identity() -> Self {
        Self {
            rotation: 0.0,
            scale: 1.0,
            translation: Vector2::zeros(),
        }
    }

    #[inline]
    pub fn apply(&self, p: &Point) -> Point {
        let r = Rotation2::new(self.rotation);
        p.with_xy(r * p.xy() * self.scale + self.translation)
    }

    /// Root-mean-square planar residual over `(source, target)` pairs.
    pub fn rms_residual(&self, pairs: &[(Point, Point)]) -> f64 {
        if pairs.is_empty() {
            return 0.0;
        }
        let sum: f64 = pairs
            .iter()
            .map(|(s, t)| (self.apply(s).xy() - t.xy()).norm_squared())
            .sum();
        (sum / pairs.len() as f64).sqrt()
    }
}

/// Least-squares similarity (rotation, uniform scale, translation) mapping
/// each `source` onto its `target`.
///
/// Closed form (Umeyama restricted to 2D similarities): after removing
/// centroids, with `a = Σ s·t` and `b = Σ s×t`, the optimum is
/// `θ = atan2(b, a)` and `scale = √(a² + b²) / Σ|s|²`.
/// Reflections are never produced.
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip(pairs), fields(n = pairs.len())))]
pub fn fit_similarity_transform(
    pairs: &[(Point, Point)],
) -> Result<AlignmentTransform, GeometryError> {
    if pairs.len() < MIN_SIMILARITY_PAIRS {
        return Err(GeometryError::InsufficientCalibrationPoints {
            required: MIN_SIMILARITY_PAIRS,
            got: pairs.len(),
        });
    }

    let n = pairs.len() as f64;
    let mut src_c = Vector2::zeros();
    let mut dst_c = Vector2::zeros();
    for (s, t) in pairs {
        src_c += s.xy();
        dst_c += t.xy();
    }
    src_c /= n;
    dst_c /= n;

    let mut dot = 0.0;
    let mut cross = 0.0;
    let mut src_var = 0.0;
    for (s, t) in pairs {
        let ds = s.xy() - src_c;
        let dt = t.xy() - dst_c;
        dot += ds.dot(&dt);
        cross += ds.perp(&dt);
        src_var += ds.norm_squared();
    }

    if src_var < 1e-18 {
        return Err(GeometryError::degenerate("calibration sources coincide"));
    }
    let norm = dot.hypot(cross);
    if norm < 1e-18 {
        return Err(GeometryError::degenerate("calibration targets coincide"));
    }

    let rotation = cross.atan2(dot);
    let scale = norm / src_var;
    let translation = dst_c - Rotation2::new(rotation) * src_c * scale;

    Ok(AlignmentTransform {
        rotation,
        scale,
        translation,
    })
}
