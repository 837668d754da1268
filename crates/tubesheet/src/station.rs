//! Request-facing context: one session, one manipulator, one measurement at a time.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::instrument;

use tubesheet_core::{
    align_tubes, CalibrationPoint, GeometryError, InspectionSession, Point, SessionError,
    TubeAlignment, TubeId,
};
use tubesheet_probe::{
    probe_target, HardwareLink, LocateError, LocatorParams, TelemetrySnapshot, TubeCenterLocator,
    TubeLocation,
};

/// Errors surfaced to the request layer.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StationError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Locate(#[from] LocateError),
    #[error("alignment failed: {0}")]
    Alignment(#[from] GeometryError),
}

/// Owns the inspection session and the tube-center locator.
///
/// Every method may be called concurrently from request workers. Session
/// reads never wait on a running measurement; only the measurement itself is
/// single-flight.
pub struct ProbeStation {
    session: Arc<RwLock<InspectionSession>>,
    locator: TubeCenterLocator,
}

impl ProbeStation {
    pub fn new(
        session: InspectionSession,
        link: Arc<dyn HardwareLink>,
        params: LocatorParams,
    ) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
            locator: TubeCenterLocator::new(link, params),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, InspectionSession> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, InspectionSession> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current session.
    pub fn session(&self) -> InspectionSession {
        self.read().clone()
    }

    pub fn locator(&self) -> &TubeCenterLocator {
        &self.locator
    }

    /// Latest manipulator telemetry.
    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.locator.telemetry()
    }

    /// Long-poll status: wait for telemetry newer than sequence number `seen`.
    pub fn wait_telemetry(
        &self,
        seen: u64,
        timeout: Duration,
    ) -> Option<(u64, TelemetrySnapshot)> {
        self.locator.wait_telemetry(seen, timeout)
    }

    /// Whether a measurement is running.
    pub fn is_busy(&self) -> bool {
        self.locator.is_busy()
    }

    /// Ask the running measurement to stop. Returns whether one was running.
    pub fn request_cancel(&self) -> bool {
        self.locator.request_cancel()
    }

    /// Measure the center of `tube`, cancelling any measurement in progress.
    pub fn locate_tube_center(&self, tube: TubeId) -> Result<TubeLocation, StationError> {
        // The session lock is not held while the manipulator moves.
        let target = probe_target(&self.read(), tube)?;
        Ok(self.locator.locate(tube, target)?)
    }

    /// Align every tube of the session using the measured calibration points.
    pub fn align_tubes(&self) -> Result<TubeAlignment, StationError> {
        let session = self.read();
        Ok(align_tubes(session.tubes.values(), &session.calibration)?)
    }

    pub fn calibration_points(&self) -> Vec<CalibrationPoint> {
        self.read().calibration.iter().cloned().collect()
    }

    /// Register `tube` as a calibration point, copying its nominal coordinate.
    pub fn add_calibration_point(&self, tube: TubeId) -> Result<CalibrationPoint, StationError> {
        Ok(self.write().add_calibration_point(tube)?.clone())
    }

    /// Record a measured coordinate for an existing calibration point.
    pub fn set_calibration_point(
        &self,
        tube: TubeId,
        determined: Point,
    ) -> Result<(), StationError> {
        Ok(self.write().calibration.set_determined(tube, determined)?)
    }

    pub fn remove_calibration_point(&self, tube: TubeId) -> Result<CalibrationPoint, StationError> {
        self.write()
            .calibration
            .remove(tube)
            .ok_or(StationError::Session(SessionError::UnknownCalibrationPoint(tube)))
    }

    /// Locate `tube` and store the fitted center as its calibration point's
    /// determined coordinate.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all, fields(tube = %tube)))]
    pub fn determine_calibration_point(&self, tube: TubeId) -> Result<TubeLocation, StationError> {
        if self.read().calibration.get(tube).is_none() {
            return Err(SessionError::UnknownCalibrationPoint(tube).into());
        }
        let location = self.locate_tube_center(tube)?;
        // The point may have been removed while the manipulator was moving.
        self.write()
            .calibration
            .set_determined(tube, location.center)?;
        log::info!("calibration point {tube} determined at {}", location.center);
        Ok(location)
    }
}
