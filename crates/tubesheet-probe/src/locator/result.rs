use serde::{Deserialize, Serialize};
use tubesheet_core::{Point, TubeId};

/// Measured tube center, in manipulator units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TubeLocation {
    pub tube: TubeId,
    pub boundary_points: Vec<Point>,
    pub center: Point,
    pub radius: f64,
    /// The sequence was cancelled but had already gathered enough contacts.
    pub cancelled: bool,
    /// The manipulator was moved back onto `center`.
    pub recentered: bool,
}

/// Nominal center and probe radius of a tube, in manipulator units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProbeTarget {
    pub center: Point,
    pub radius: f64,
}
