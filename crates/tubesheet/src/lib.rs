//! High-level facade crate for the `tubesheet-*` workspace.
//!
//! This crate provides:
//! - stable re-exports of the geometry/data-model crate and the probing crate,
//! - [`ProbeStation`], the context object a request layer holds: one
//!   inspection session, one manipulator link, one measurement at a time.
//!
//! ## Quickstart
//!
//! ```no_run
//! use std::sync::Arc;
//! use tubesheet::core::{InspectionSession, LengthUnit, Point, Tube, TubeId};
//! use tubesheet::probe::{LocatorParams, SimulatedManipulator};
//! use tubesheet::ProbeStation;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = InspectionSession::new(
//!     "hx-12",
//!     LengthUnit::Inch,
//!     0.75,
//!     [
//!         Tube::new(TubeId(1), Point::planar(0.0, 0.0)),
//!         Tube::new(TubeId(2), Point::planar(1.0, 0.0)),
//!     ],
//! );
//! let link = Arc::new(SimulatedManipulator::new(Point::planar(0.01, 0.0), 0.3));
//! let station = ProbeStation::new(session, link, LocatorParams::default());
//!
//! station.add_calibration_point(TubeId(1))?;
//! let location = station.determine_calibration_point(TubeId(1))?;
//! println!("tube_1 at {}", location.center);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `tubesheet::core`: points, circle and similarity fits, alignment, session model.
//! - `tubesheet::probe`: waypoint planner, hardware link, sequencer, locator, simulator.
//! - [`ProbeStation`]: the operations exposed to a request layer.

pub use tubesheet_core as core;
pub use tubesheet_probe as probe;

pub use tubesheet_core::{
    align_tubes, InspectionSession, LengthUnit, Point, Tube, TubeAlignment, TubeId,
};
pub use tubesheet_probe::{LocateError, LocatorParams, TubeLocation};

mod station;

pub use station::{ProbeStation, StationError};
