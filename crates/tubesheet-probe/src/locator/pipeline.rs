use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::instrument;

use tubesheet_core::{checked_div, fit_circle, GeometryError, InspectionSession, Point, TubeId};

use super::{LocateError, LocatorParams, OperationGate, ProbeTarget, TubeLocation};
use crate::cancel::CancelToken;
use crate::link::HardwareLink;
use crate::planner::{plan_probe_waypoints, Waypoint};
use crate::sequencer::MotionSequencer;
use crate::telemetry::{TelemetryHub, TelemetrySnapshot};

/// Minimum number of boundary contacts for a circle fit.
pub const MIN_BOUNDARY_POINTS: usize = 3;

/// Probe target for `tube` in manipulator units.
///
/// The nominal center and the probe radius (half the outer diameter) are
/// divided by the session unit scale.
pub fn probe_target(session: &InspectionSession, tube: TubeId) -> Result<ProbeTarget, LocateError> {
    let nominal = session
        .tube(tube)
        .map_err(|_| LocateError::UnknownTube(tube))?
        .nominal;
    let scale = session.unit.scale();
    let center = nominal.checked_div(scale).map_err(LocateError::Scale)?;
    let radius = checked_div(session.tube_od / 2.0, scale).map_err(LocateError::Scale)?;
    Ok(ProbeTarget { center, radius })
}

/// Single-flight tube-center measurement against one manipulator.
pub struct TubeCenterLocator {
    link: Arc<dyn HardwareLink>,
    telemetry: Arc<TelemetryHub>,
    gate: OperationGate,
    params: LocatorParams,
}

impl TubeCenterLocator {
    pub fn new(link: Arc<dyn HardwareLink>, params: LocatorParams) -> Self {
        Self {
            link,
            telemetry: Arc::new(TelemetryHub::new()),
            gate: OperationGate::new(),
            params,
        }
    }

    pub fn params(&self) -> &LocatorParams {
        &self.params
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.telemetry.latest()
    }

    /// Block until telemetry newer than `seen` arrives, or `timeout` passes.
    /// Returns the new sequence number with the snapshot.
    pub fn wait_telemetry(
        &self,
        seen: u64,
        timeout: Duration,
    ) -> Option<(u64, TelemetrySnapshot)> {
        self.telemetry.wait_newer(seen, timeout)
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    /// Ask the running measurement to stop. Returns whether one was running.
    pub fn request_cancel(&self) -> bool {
        self.gate.request_cancel()
    }

    /// Resolve the probe target from `session` and measure the tube.
    pub fn locate_tube_center(
        &self,
        session: &InspectionSession,
        tube: TubeId,
    ) -> Result<TubeLocation, LocateError> {
        let target = probe_target(session, tube)?;
        self.locate(tube, target)
    }

    /// Measure the tube at `target`.
    ///
    /// Any measurement already running is cancelled and waited for first.
    /// The gate is held for the whole run and released on every return path.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all, fields(tube = %tube)))]
    pub fn locate(&self, tube: TubeId, target: ProbeTarget) -> Result<TubeLocation, LocateError> {
        let guard = self.gate.acquire();
        let cancel = guard.cancel_token();
        log::info!(
            "locating {tube}: nominal {} probe radius {:.4}",
            target.center,
            target.radius
        );

        let waypoints =
            plan_probe_waypoints(target.center, target.radius, self.params.probe_count)?;
        let result = self.sequencer().run(&waypoints, cancel)?;
        let cancelled = result.cancelled;
        let boundary_points = result.contacts;

        if boundary_points.len() < MIN_BOUNDARY_POINTS {
            return Err(LocateError::Degenerate {
                cancelled,
                source: GeometryError::degenerate(if cancelled {
                    "cancelled before enough contacts"
                } else {
                    "fewer than three probe contacts"
                }),
                boundary_points,
            });
        }

        let fit = match fit_circle(&boundary_points) {
            Ok(fit) => fit,
            Err(source) => {
                return Err(LocateError::Degenerate {
                    boundary_points,
                    cancelled,
                    source,
                })
            }
        };
        log::info!(
            "{tube}: center {} radius {:.4} from {} contacts",
            fit.center,
            fit.radius,
            boundary_points.len()
        );

        let recentered = self.params.recenter && !cancelled && self.recenter(fit.center, cancel);

        Ok(TubeLocation {
            tube,
            boundary_points,
            center: fit.center,
            radius: fit.radius,
            cancelled,
            recentered,
        })
    }

    fn sequencer(&self) -> MotionSequencer<'_> {
        MotionSequencer::new(
            self.link.as_ref(),
            self.telemetry.as_ref(),
            &self.params.sequencer,
        )
    }

    fn recenter(&self, center: Point, cancel: &CancelToken) -> bool {
        match self.sequencer().run(&[Waypoint::xy(center)], cancel) {
            Ok(result) if result.is_empty() => !result.cancelled,
            Ok(_) => {
                log::warn!("recenter on {center} touched the bore wall");
                false
            }
            Err(err) => {
                log::warn!("recenter on {center} failed: {err}");
                false
            }
        }
    }
}
