//! JSON wire format of the manipulator controller.
//!
//! Commands travel as `{"commands": [ {"command": NAME, "pars": {..}} ]}`;
//! telemetry arrives as a JSON object with optional `coords`, `limits` and
//! `on_condition` sections.

use serde::Serialize;

use crate::link::{Command, TelemetryParseError};
use crate::telemetry::TelemetryFrame;

#[derive(Serialize)]
struct CommandBatch<'a> {
    commands: [&'a Command; 1],
}

/// Encode a single command as a one-element command batch.
pub fn encode_command(command: &Command) -> Result<String, serde_json::Error> {
    serde_json::to_string(&CommandBatch {
        commands: [command],
    })
}

/// Decode one telemetry frame.
pub fn decode_telemetry(bytes: &[u8]) -> Result<TelemetryFrame, TelemetryParseError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::AxisPair;
    use tubesheet_core::Point;

    #[test]
    fn move_command_wire_shape() {
        let cmd = Command::MoveClosedLoop {
            axes: AxisPair::XY,
            first_axis_setpoint: 1.5,
            second_axis_setpoint: -0.25,
        };
        let json = encode_command(&cmd).expect("encode");
        let v: serde_json::Value = serde_json::from_str(&json).expect("json");
        let c = &v["commands"][0];
        assert_eq!(c["command"], "MOVE_CLOSED_LOOP");
        assert_eq!(c["pars"]["axes"], "XY");
        assert_eq!(c["pars"]["first_axis_setpoint"], 1.5);
        assert_eq!(c["pars"]["second_axis_setpoint"], -0.25);
    }

    #[test]
    fn full_telemetry_frame() {
        let frame = decode_telemetry(
            br#"{
                "coords": {"x": 1.0, "y": 2.0, "z": 0.5},
                "limits": {
                    "left": false, "right": false, "up": false, "down": false, "probe": true
                },
                "on_condition": {"x_y": false, "x_z": false, "y_z": false}
            }"#,
        )
        .expect("frame");
        assert_eq!(frame.coords, Some(Point::new(1.0, 2.0, 0.5)));
        assert!(frame.limits.expect("limits").probe);
        assert!(!frame.on_condition.expect("on_condition").x_y);
    }

    #[test]
    fn partial_and_unknown_sections_are_accepted() {
        let frame = decode_telemetry(br#"{"on_condition": {"x_y": true}, "stall": {"x": 0}}"#)
            .expect("frame");
        assert!(frame.coords.is_none());
        assert!(frame.limits.is_none());
        assert!(frame.on_condition.expect("on_condition").x_y);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(decode_telemetry(b"\x00\x01").is_err());
    }
}
