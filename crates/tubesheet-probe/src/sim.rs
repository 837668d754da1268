//! In-process manipulator with a circular bore, for tests and dry runs.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use nalgebra::Vector2;
use tubesheet_core::Point;

use crate::link::{AxisPair, Command, HardwareLink, LinkError, TelemetryParseError};
use crate::telemetry::{Limits, OnCondition, TelemetryFrame};

/// Relative tolerance for "the probe is on the wall".
const WALL_EPS: f64 = 1e-9;

#[derive(Debug)]
struct PendingMove {
    ready_at: Instant,
    end: Point,
    contact: bool,
    axes: AxisPair,
}

#[derive(Debug)]
struct SimState {
    position: Point,
    pending: Option<PendingMove>,
    commands: Vec<Command>,
    disconnected: bool,
    corrupt_frames: usize,
}

/// Simulated two-axis manipulator probing a circular bore.
///
/// A closed-loop XY move travels in a straight line; if the path leaves the
/// bore the probe stops at the wall and reports contact, otherwise the move
/// completes at the setpoint. XZ/YZ moves always complete. Each move takes
/// `move_duration`; while it is in flight every receive returns an
/// in-motion frame after at most `frame_interval`.
#[derive(Debug)]
pub struct SimulatedManipulator {
    bore_center: Point,
    bore_radius: f64,
    move_duration: Duration,
    frame_interval: Duration,
    state: Mutex<SimState>,
}

impl SimulatedManipulator {
    /// Bore of `bore_radius` around `bore_center`; the probe starts at the
    /// bore center.
    pub fn new(bore_center: Point, bore_radius: f64) -> Self {
        Self {
            bore_center,
            bore_radius,
            move_duration: Duration::from_millis(20),
            frame_interval: Duration::from_millis(5),
            state: Mutex::new(SimState {
                position: bore_center,
                pending: None,
                commands: Vec::new(),
                disconnected: false,
                corrupt_frames: 0,
            }),
        }
    }

    pub fn with_start(self, position: Point) -> Self {
        self.lock().position = position;
        self
    }

    pub fn with_timing(mut self, move_duration: Duration, frame_interval: Duration) -> Self {
        self.move_duration = move_duration;
        self.frame_interval = frame_interval;
        self
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn bore_center(&self) -> Point {
        self.bore_center
    }

    pub fn bore_radius(&self) -> f64 {
        self.bore_radius
    }

    pub fn position(&self) -> Point {
        self.lock().position
    }

    /// Every command received so far, in order.
    pub fn commands(&self) -> Vec<Command> {
        self.lock().commands.clone()
    }

    /// Number of closed-loop moves received so far.
    pub fn move_count(&self) -> usize {
        self.lock()
            .commands
            .iter()
            .filter(|c| matches!(c, Command::MoveClosedLoop { .. }))
            .count()
    }

    /// Drop the link; every later call fails with [`LinkError::Disconnected`].
    pub fn disconnect(&self) {
        self.lock().disconnected = true;
    }

    /// Make the next `count` receives fail as undecodable frames.
    pub fn corrupt_next_frames(&self, count: usize) {
        self.lock().corrupt_frames = count;
    }

    /// Where a straight XY move from `from` to `to` ends, and whether it ends
    /// on the bore wall.
    fn trace(&self, from: Point, to: Point) -> (Point, bool) {
        let f = from.xy() - self.bore_center.xy();
        let d = to.xy() - from.xy();
        let a = d.dot(&d);
        if a == 0.0 {
            return (to, false);
        }
        let r2 = self.bore_radius * self.bore_radius;
        let c = f.dot(&f) - r2;
        if c > WALL_EPS * r2 {
            // Started outside the bore: nothing to hit.
            return (to, false);
        }
        let b = 2.0 * f.dot(&d);
        let disc = (b * b - 4.0 * a * c).max(0.0);
        let t_exit = (-b + disc.sqrt()) / (2.0 * a);
        if t_exit <= 1.0 {
            let t = t_exit.max(0.0);
            let hit: Vector2<f64> = from.xy() + d * t;
            (from.with_xy(hit), true)
        } else {
            (to, false)
        }
    }

    fn plan_move(&self, from: Point, axes: AxisPair, first: f64, second: f64) -> (Point, bool) {
        match axes {
            AxisPair::XY => self.trace(from, Point::new(first, second, from.z)),
            AxisPair::XZ => (Point::new(first, from.y, second), false),
            AxisPair::YZ => (Point::new(from.x, first, second), false),
        }
    }
}

fn frame(position: Point, probe: bool, on_condition: OnCondition) -> TelemetryFrame {
    TelemetryFrame {
        coords: Some(position),
        limits: Some(Limits {
            probe,
            ..Limits::default()
        }),
        on_condition: Some(on_condition),
    }
}

fn settled(axes: AxisPair) -> OnCondition {
    OnCondition {
        x_y: axes == AxisPair::XY,
        x_z: axes == AxisPair::XZ,
        y_z: axes == AxisPair::YZ,
    }
}

impl HardwareLink for SimulatedManipulator {
    fn send_command(&self, command: &Command, _timeout: Duration) -> Result<(), LinkError> {
        let mut state = self.lock();
        if state.disconnected {
            return Err(LinkError::Disconnected("simulated link closed".into()));
        }
        state.commands.push(command.clone());
        match *command {
            Command::StopAll => {
                state.pending = None;
            }
            Command::MoveClosedLoop {
                axes,
                first_axis_setpoint,
                second_axis_setpoint,
            } => {
                let (end, contact) =
                    self.plan_move(state.position, axes, first_axis_setpoint, second_axis_setpoint);
                state.pending = Some(PendingMove {
                    ready_at: Instant::now() + self.move_duration,
                    end,
                    contact,
                    axes,
                });
            }
        }
        Ok(())
    }

    fn receive_telemetry(&self, timeout: Duration) -> Result<TelemetryFrame, LinkError> {
        let wait = {
            let mut state = self.lock();
            if state.disconnected {
                return Err(LinkError::Disconnected("simulated link closed".into()));
            }
            if state.corrupt_frames > 0 {
                state.corrupt_frames -= 1;
                return Err(TelemetryParseError::new("simulated corrupt frame").into());
            }
            let now = Instant::now();
            match state.pending.take() {
                Some(pending) if pending.ready_at <= now => {
                    state.position = pending.end;
                    let on = if pending.contact {
                        OnCondition::default()
                    } else {
                        settled(pending.axes)
                    };
                    return Ok(frame(pending.end, pending.contact, on));
                }
                Some(pending) => {
                    let until_ready = pending.ready_at - now;
                    state.pending = Some(pending);
                    until_ready.min(self.frame_interval)
                }
                None => self.frame_interval,
            }
        };

        if wait > timeout {
            thread::sleep(timeout);
            return Err(LinkError::Timeout(timeout));
        }
        thread::sleep(wait);

        let state = self.lock();
        let on = if state.pending.is_some() {
            OnCondition::default()
        } else {
            OnCondition {
                x_y: true,
                x_z: true,
                y_z: true,
            }
        };
        Ok(frame(state.position, false, on))
    }
}
