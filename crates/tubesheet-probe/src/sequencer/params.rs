use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing of the motion sequencer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerParams {
    /// Pause after each move command before telemetry is sampled, so the
    /// controller has started reporting the new move.
    pub settle_delay: Duration,
    /// Upper bound on each telemetry receive. Cancellation is observed at
    /// least this often.
    pub receive_timeout: Duration,
    /// Upper bound on each command send.
    pub command_timeout: Duration,
}

impl Default for SequencerParams {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(100),
            receive_timeout: Duration::from_secs(1),
            command_timeout: Duration::from_secs(1),
        }
    }
}
