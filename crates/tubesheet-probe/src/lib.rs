//! Probing side of the tubesheet system.
//!
//! A measurement runs as
//! [`plan_probe_waypoints`] → [`MotionSequencer`] → [`tubesheet_core::fit_circle`],
//! orchestrated by [`TubeCenterLocator`], which also enforces that at most one
//! measurement drives the manipulator at a time.
//!
//! The manipulator is reached through the [`HardwareLink`] trait.
//! [`JsonLink`] adapts any [`ByteTransport`] to the controller's JSON protocol
//! and [`SimulatedManipulator`] stands in for hardware.
//!
//! ## Quickstart
//!
//! ```no_run
//! use std::sync::Arc;
//! use tubesheet_core::{InspectionSession, LengthUnit, Point, Tube, TubeId};
//! use tubesheet_probe::{LocatorParams, SimulatedManipulator, TubeCenterLocator};
//!
//! let session = InspectionSession::new(
//!     "demo",
//!     LengthUnit::Inch,
//!     0.75,
//!     [Tube::new(TubeId(1), Point::planar(2.0, 3.0))],
//! );
//! let link = Arc::new(SimulatedManipulator::new(Point::planar(2.01, 3.0), 0.3));
//! let locator = TubeCenterLocator::new(link, LocatorParams::default());
//! let location = locator.locate_tube_center(&session, TubeId(1)).unwrap();
//! println!("center {} radius {:.4}", location.center, location.radius);
//! ```

mod cancel;
mod codec;
mod link;
mod locator;
mod planner;
mod sequencer;
mod sim;
mod telemetry;

pub use cancel::CancelToken;
pub use codec::{decode_telemetry, encode_command};
pub use link::{
    AxisPair, ByteTransport, Command, HardwareLink, JsonLink, LinkError, TelemetryParseError,
};
pub use locator::{
    probe_target, LocateError, LocatorParams, OperationGate, OperationGuard, ProbeTarget,
    TubeCenterLocator, TubeLocation, MIN_BOUNDARY_POINTS,
};
pub use planner::{contact_diversity_order, plan_probe_waypoints, PlanError, Waypoint};
pub use sequencer::{MotionSequencer, SequenceError, SequenceResult, SequencerParams};
pub use sim::SimulatedManipulator;
pub use telemetry::{Limits, OnCondition, TelemetryFrame, TelemetryHub, TelemetrySnapshot};
