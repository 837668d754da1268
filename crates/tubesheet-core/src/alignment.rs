use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    fit_similarity_transform, AlignmentTransform, CalibrationPoints, GeometryError, Point, Tube,
    TubeId,
};

/// Tube layout mapped into the manipulator frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TubeAlignment {
    pub transform: AlignmentTransform,
    /// RMS distance between transformed ideal and determined coordinates.
    pub rms_residual: f64,
    /// Number of measured calibration points that entered the fit.
    pub used_points: usize,
    pub aligned: BTreeMap<TubeId, Point>,
}

/// Fit the nominal-to-physical similarity from the measured calibration points
/// and apply it to every tube.
///
/// Calibration points without a determined coordinate are ignored. The
/// function is pure; call it again whenever calibration points change.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(calibration = calibration.len()))
)]
pub fn align_tubes<'a>(
    tubes: impl IntoIterator<Item = &'a Tube>,
    calibration: &CalibrationPoints,
) -> Result<TubeAlignment, GeometryError> {
    let pairs = calibration.pairs();
    let transform = fit_similarity_transform(&pairs)?;
    let rms_residual = transform.rms_residual(&pairs);

    log::debug!(
        "alignment from {} points: rotation={:.6} rad, scale={:.6}, rms={:.6}",
        pairs.len(),
        transform.rotation,
        transform.scale,
        rms_residual
    );

    let aligned = tubes
        .into_iter()
        .map(|t| (t.id, transform.apply(&t.nominal)))
        .collect();

    Ok(TubeAlignment {
        transform,
        rms_residual,
        used_points: pairs.len(),
        aligned,
    })
}
