use serde::{Deserialize, Serialize};

use crate::sequencer::SequencerParams;

/// Parameters for [`crate::TubeCenterLocator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorParams {
    /// Number of probe waypoints around the nominal center; must be odd.
    pub probe_count: usize,
    /// Move back to the fitted center after a successful fit.
    pub recenter: bool,
    pub sequencer: SequencerParams,
}

impl Default for LocatorParams {
    fn default() -> Self {
        Self {
            probe_count: 5,
            recenter: true,
            sequencer: SequencerParams::default(),
        }
    }
}
