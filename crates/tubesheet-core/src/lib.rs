//! Core geometry and data model for tubesheet probing.
//!
//! This crate is purely computational: it knows nothing about the
//! manipulator link. It provides
//! - [`Point`] arithmetic and distances,
//! - the algebraic [`fit_circle`] used to recover a tube center from probe contacts,
//! - the closed-form [`fit_similarity_transform`] and [`align_tubes`], which map
//!   the nominal tube layout into the manipulator frame,
//! - the tubesheet / calibration-point / session types shared by the other crates.

mod alignment;
mod circle_fit;
mod error;
mod logger;
mod point;
mod similarity;
mod tubesheet;

pub use alignment::{align_tubes, TubeAlignment};
pub use circle_fit::{fit_circle, CircleFit};
pub use error::GeometryError;
pub use point::{checked_div, Point};
pub use similarity::{fit_similarity_transform, AlignmentTransform, MIN_SIMILARITY_PAIRS};
pub use tubesheet::{
    CalibrationPoint, CalibrationPoints, InspectionSession, LengthUnit, SessionError, Tube,
    TubeId, MM_PER_INCH,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
