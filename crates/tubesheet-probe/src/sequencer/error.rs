use crate::link::LinkError;

/// Errors that abort a probe sequence.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SequenceError {
    #[error("sending {command} failed: {source}")]
    Send {
        command: &'static str,
        #[source]
        source: LinkError,
    },
    #[error("telemetry lost while waiting on waypoint {waypoint}: {source}")]
    Telemetry {
        waypoint: usize,
        #[source]
        source: LinkError,
    },
}
