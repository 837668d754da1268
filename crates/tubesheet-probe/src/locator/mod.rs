//! Tube-center locator: plan, probe, fit and recenter as one cancellable,
//! single-flight operation.

mod error;
mod gate;
mod params;
mod pipeline;
mod result;

pub use error::LocateError;
pub use gate::{OperationGate, OperationGuard};
pub use params::LocatorParams;
pub use pipeline::{probe_target, TubeCenterLocator, MIN_BOUNDARY_POINTS};
pub use result::{ProbeTarget, TubeLocation};
