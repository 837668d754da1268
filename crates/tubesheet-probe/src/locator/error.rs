use tubesheet_core::{GeometryError, Point, TubeId};

use crate::planner::PlanError;
use crate::sequencer::SequenceError;

/// Errors returned by [`crate::TubeCenterLocator::locate_tube_center`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LocateError {
    #[error("{0} is not part of the session")]
    UnknownTube(TubeId),
    /// Scaling the nominal center or outer diameter failed.
    #[error("cannot scale probe target: {0}")]
    Scale(#[source] GeometryError),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    /// The collected boundary points do not define a circle. The points that
    /// were collected are kept for the caller.
    #[error("no circle from {} boundary points: {source}", .boundary_points.len())]
    Degenerate {
        boundary_points: Vec<Point>,
        cancelled: bool,
        #[source]
        source: GeometryError,
    },
}

impl LocateError {
    /// Boundary points gathered before the failure, if any.
    pub fn boundary_points(&self) -> &[Point] {
        match self {
            LocateError::Degenerate {
                boundary_points, ..
            } => boundary_points,
            _ => &[],
        }
    }
}
