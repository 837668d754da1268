//! Seam between the probing core and the manipulator transport.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec::{decode_telemetry, encode_command};
use crate::telemetry::{OnCondition, TelemetryFrame};

/// Axis pair driven by a closed-loop move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisPair {
    #[default]
    XY,
    XZ,
    YZ,
}

impl AxisPair {
    /// Whether the on-condition flags report this pair as settled on target.
    pub fn is_complete(self, on: &OnCondition) -> bool {
        match self {
            AxisPair::XY => on.x_y,
            AxisPair::XZ => on.x_z,
            AxisPair::YZ => on.y_z,
        }
    }
}

/// Command understood by the manipulator controller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "pars")]
pub enum Command {
    /// Decelerate and stop every axis.
    #[serde(rename = "AXES_SOFT_STOP_ALL")]
    StopAll,
    /// Closed-loop move of an axis pair to the given setpoints.
    #[serde(rename = "MOVE_CLOSED_LOOP")]
    MoveClosedLoop {
        axes: AxisPair,
        first_axis_setpoint: f64,
        second_axis_setpoint: f64,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::StopAll => "AXES_SOFT_STOP_ALL",
            Command::MoveClosedLoop { .. } => "MOVE_CLOSED_LOOP",
        }
    }
}

/// A telemetry payload that could not be decoded.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed telemetry frame: {message}")]
pub struct TelemetryParseError {
    pub message: String,
}

impl TelemetryParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for TelemetryParseError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Errors reported by a [`HardwareLink`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LinkError {
    #[error("link timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Parse(#[from] TelemetryParseError),
    #[error("link disconnected: {0}")]
    Disconnected(String),
    #[error("send failed: {0}")]
    Send(String),
}

impl LinkError {
    /// Timeouts and undecodable frames are worth another receive; everything
    /// else ends the current operation.
    pub fn is_transient(&self) -> bool {
        matches!(self, LinkError::Timeout(_) | LinkError::Parse(_))
    }
}

/// Command/telemetry channel pair to the manipulator.
///
/// Both calls block for at most `timeout`. Implementations must be safe to
/// share between request workers; the command channel carries one
/// outstanding command at a time.
pub trait HardwareLink: Send + Sync {
    fn send_command(&self, command: &Command, timeout: Duration) -> Result<(), LinkError>;

    fn receive_telemetry(&self, timeout: Duration) -> Result<TelemetryFrame, LinkError>;
}

/// Raw message transport (e.g. the controller's TCP command and telemetry sockets).
pub trait ByteTransport: Send + Sync {
    fn send_bytes(&self, payload: &[u8], timeout: Duration) -> Result<(), LinkError>;

    fn receive_bytes(&self, timeout: Duration) -> Result<Vec<u8>, LinkError>;
}

/// [`HardwareLink`] speaking the controller's JSON protocol over a byte transport.
#[derive(Debug)]
pub struct JsonLink<T> {
    transport: T,
}

impl<T: ByteTransport> JsonLink<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: ByteTransport> HardwareLink for JsonLink<T> {
    fn send_command(&self, command: &Command, timeout: Duration) -> Result<(), LinkError> {
        let payload =
            encode_command(command).map_err(|err| LinkError::Send(err.to_string()))?;
        log::trace!("-> {payload}");
        self.transport.send_bytes(payload.as_bytes(), timeout)
    }

    fn receive_telemetry(&self, timeout: Duration) -> Result<TelemetryFrame, LinkError> {
        let bytes = self.transport.receive_bytes(timeout)?;
        Ok(decode_telemetry(&bytes)?)
    }
}
