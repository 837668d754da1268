/// Errors returned by the geometry kernel.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("degenerate geometry: {reason}")]
    DegenerateGeometry { reason: &'static str },
    #[error("insufficient calibration points (need {required}, got {got})")]
    InsufficientCalibrationPoints { required: usize, got: usize },
    #[error("division by zero")]
    DivisionByZero,
}

impl GeometryError {
    pub fn degenerate(reason: &'static str) -> Self {
        Self::DegenerateGeometry { reason }
    }
}
