use serde::{Deserialize, Serialize};
use tubesheet_core::Point;

/// Outcome of one probe sequence.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceResult {
    /// Coordinates at which probe contact was reported, in waypoint order.
    pub contacts: Vec<Point>,
    /// Move commands actually sent.
    pub waypoints_issued: usize,
    /// The sequence stopped early on a cancellation request.
    pub cancelled: bool,
}

impl SequenceResult {
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}
