use std::thread;

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::{SequenceError, SequenceResult, SequencerParams};
use crate::cancel::CancelToken;
use crate::link::{Command, HardwareLink};
use crate::planner::Waypoint;
use crate::telemetry::{TelemetryHub, TelemetryPump};

/// How the wait on a single waypoint ended.
enum WaypointOutcome {
    Contact,
    Reached,
    Cancelled,
}

/// Drives waypoints through the hardware link one move at a time and
/// records where the probe touches.
pub struct MotionSequencer<'a> {
    link: &'a dyn HardwareLink,
    telemetry: &'a TelemetryHub,
    params: &'a SequencerParams,
}

impl<'a> MotionSequencer<'a> {
    pub fn new(
        link: &'a dyn HardwareLink,
        telemetry: &'a TelemetryHub,
        params: &'a SequencerParams,
    ) -> Self {
        Self {
            link,
            telemetry,
            params,
        }
    }

    fn send(&self, command: &Command) -> Result<(), SequenceError> {
        self.link
            .send_command(command, self.params.command_timeout)
            .map_err(|source| SequenceError::Send {
                command: command.name(),
                source,
            })
    }

    /// Run `waypoints` in order.
    ///
    /// A global stop is sent first. Each move is followed by the settle delay
    /// and then telemetry is folded into the shared snapshot until the probe
    /// reports contact (recorded), the axis pair reports on-target (not
    /// recorded), or `cancel` is set. Contact and on-target flags left over
    /// from the previous move are cleared once the next move is sent.
    /// Cancellation discards the current waypoint, stops the axes and returns
    /// the contacts collected so far.
    ///
    /// Send failures and non-transient telemetry failures abort the sequence;
    /// nothing is retried.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(waypoints = waypoints.len()))
    )]
    pub fn run(
        &self,
        waypoints: &[Waypoint],
        cancel: &CancelToken,
    ) -> Result<SequenceResult, SequenceError> {
        let mut result = SequenceResult::default();

        self.send(&Command::StopAll)?;

        for (index, waypoint) in waypoints.iter().enumerate() {
            if cancel.is_cancelled() {
                result.cancelled = true;
                break;
            }

            self.send(&waypoint.command())?;
            self.telemetry.arm(waypoint.axes);
            result.waypoints_issued += 1;
            log::debug!(
                "waypoint {}/{} -> {}",
                index + 1,
                waypoints.len(),
                waypoint.target
            );

            thread::sleep(self.params.settle_delay);

            match self.await_waypoint(index, waypoint, cancel, &mut result)? {
                WaypointOutcome::Contact | WaypointOutcome::Reached => {}
                WaypointOutcome::Cancelled => {
                    result.cancelled = true;
                    break;
                }
            }
        }

        if result.cancelled {
            log::info!(
                "sequence cancelled after {} of {} waypoints ({} contacts)",
                result.waypoints_issued,
                waypoints.len(),
                result.contacts.len()
            );
            if let Err(err) = self.send(&Command::StopAll) {
                log::warn!("stop after cancellation failed: {err}");
            }
        }

        Ok(result)
    }

    fn await_waypoint(
        &self,
        index: usize,
        waypoint: &Waypoint,
        cancel: &CancelToken,
        result: &mut SequenceResult,
    ) -> Result<WaypointOutcome, SequenceError> {
        let pump = TelemetryPump::new(self.link, self.telemetry);
        loop {
            let snapshot = pump
                .next(self.params.receive_timeout)
                .map_err(|source| SequenceError::Telemetry {
                    waypoint: index,
                    source,
                })?;

            if cancel.is_cancelled() {
                return Ok(WaypointOutcome::Cancelled);
            }

            let Some(snapshot) = snapshot else {
                continue;
            };

            if snapshot.limits.probe {
                log::debug!("contact at {}", snapshot.coords);
                result.contacts.push(snapshot.coords);
                return Ok(WaypointOutcome::Contact);
            }
            if waypoint.axes.is_complete(&snapshot.on_condition) {
                log::debug!("waypoint {} reached without contact", index + 1);
                return Ok(WaypointOutcome::Reached);
            }
        }
    }
}
