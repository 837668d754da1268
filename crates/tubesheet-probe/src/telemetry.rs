//! Manipulator telemetry: wire frames, the shared snapshot and its ingestion.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tubesheet_core::Point;

use crate::link::{AxisPair, HardwareLink, LinkError};

/// Limit switches and the probe contact input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    /// Probe touching a wall.
    pub probe: bool,
}

/// Closed-loop "on target" flags per axis pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnCondition {
    pub x_y: bool,
    pub x_z: bool,
    pub y_z: bool,
}

/// One telemetry message. Sections absent from the message leave the
/// snapshot's previous values untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryFrame {
    pub coords: Option<Point>,
    pub limits: Option<Limits>,
    pub on_condition: Option<OnCondition>,
}

/// Latest known manipulator state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub coords: Point,
    pub limits: Limits,
    pub on_condition: OnCondition,
}

impl TelemetrySnapshot {
    pub fn fold(&mut self, frame: &TelemetryFrame) {
        if let Some(coords) = frame.coords {
            self.coords = coords;
        }
        if let Some(limits) = frame.limits {
            self.limits = limits;
        }
        if let Some(on) = frame.on_condition {
            self.on_condition = on;
        }
    }
}

#[derive(Default)]
struct HubState {
    snapshot: TelemetrySnapshot,
    /// Number of frames folded so far.
    sequence: u64,
}

/// Process-wide telemetry snapshot.
///
/// Frames are folded in receive order by the single active ingestion loop;
/// any number of status readers may observe it or wait for the next frame.
#[derive(Default)]
pub struct TelemetryHub {
    state: Mutex<HubState>,
    updated: Condvar,
}

impl TelemetryHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn ingest(&self, frame: &TelemetryFrame) -> TelemetrySnapshot {
        let snapshot = {
            let mut state = self.lock();
            state.snapshot.fold(frame);
            state.sequence += 1;
            state.snapshot
        };
        self.updated.notify_all();
        snapshot
    }

    /// Forget the contact flag and the completion flag of `axes` before a new
    /// move, so only frames received for that move can set them again.
    pub(crate) fn arm(&self, axes: AxisPair) {
        let mut state = self.lock();
        state.snapshot.limits.probe = false;
        match axes {
            AxisPair::XY => state.snapshot.on_condition.x_y = false,
            AxisPair::XZ => state.snapshot.on_condition.x_z = false,
            AxisPair::YZ => state.snapshot.on_condition.y_z = false,
        }
    }

    pub fn latest(&self) -> TelemetrySnapshot {
        self.lock().snapshot
    }

    /// Block until a frame newer than `seen` has been folded, or `timeout` passes.
    pub fn wait_newer(&self, seen: u64, timeout: Duration) -> Option<(u64, TelemetrySnapshot)> {
        let state = self.lock();
        let (state, _) = self
            .updated
            .wait_timeout_while(state, timeout, |s| s.sequence <= seen)
            .unwrap_or_else(PoisonError::into_inner);
        (state.sequence > seen).then_some((state.sequence, state.snapshot))
    }
}

/// Receives frames from the link and folds them into the hub.
///
/// Transient failures (timeouts, undecodable frames) are logged here and
/// reported as "no new frame", so callers only see fatal link errors.
pub(crate) struct TelemetryPump<'a> {
    link: &'a dyn HardwareLink,
    hub: &'a TelemetryHub,
}

impl<'a> TelemetryPump<'a> {
    pub(crate) fn new(link: &'a dyn HardwareLink, hub: &'a TelemetryHub) -> Self {
        Self { link, hub }
    }

    pub(crate) fn next(&self, timeout: Duration) -> Result<Option<TelemetrySnapshot>, LinkError> {
        match self.link.receive_telemetry(timeout) {
            Ok(frame) => Ok(Some(self.hub.ingest(&frame))),
            Err(err) if err.is_transient() => {
                log::warn!("telemetry: {err}");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
