//! Motion sequencer.
//!
//! One move command in flight at a time; the per-waypoint telemetry wait is
//! the only suspension point and the only place cancellation is polled.

mod error;
mod params;
mod pipeline;
mod result;

pub use error::SequenceError;
pub use params::SequencerParams;
pub use pipeline::MotionSequencer;
pub use result::SequenceResult;
