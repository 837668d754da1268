use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::GeometryError;

/// Cartesian coordinate in the manipulator or tubesheet frame.
///
/// Value type: equality is by coordinates only. Probing and alignment work
/// in the XY plane; `z` is carried through untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Point {
    pub const ORIGIN: Point = Point {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Point in the XY plane (`z = 0`).
    #[inline]
    pub const fn planar(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Euclidean distance in 3D.
    #[inline]
    pub fn distance(&self, other: &Point) -> f64 {
        (self.to_vector() - other.to_vector()).norm()
    }

    /// Euclidean distance ignoring `z`.
    #[inline]
    pub fn distance_planar(&self, other: &Point) -> f64 {
        (self.xy() - other.xy()).norm()
    }

    /// Divide every coordinate by `divisor`.
    ///
    /// A zero (or non-finite) divisor is reported as
    /// [`GeometryError::DivisionByZero`]; there is no silent fallback.
    pub fn checked_div(&self, divisor: f64) -> Result<Point, GeometryError> {
        Ok(Point::new(
            checked_div(self.x, divisor)?,
            checked_div(self.y, divisor)?,
            checked_div(self.z, divisor)?,
        ))
    }

    #[inline]
    pub fn xy(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    #[inline]
    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Replace the planar part, keeping `z`.
    #[inline]
    pub fn with_xy(&self, xy: Vector2<f64>) -> Point {
        Point::new(xy.x, xy.y, self.z)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Scalar division that reports a zero (or non-finite) divisor as
/// [`GeometryError::DivisionByZero`].
#[inline]
pub fn checked_div(value: f64, divisor: f64) -> Result<f64, GeometryError> {
    if divisor == 0.0 || !divisor.is_finite() {
        return Err(GeometryError::DivisionByZero);
    }
    Ok(value / divisor)
}

impl From<Vector2<f64>> for Point {
    fn from(v: Vector2<f64>) -> Self {
        Point::planar(v.x, v.y)
    }
}

impl From<Vector3<f64>> for Point {
    fn from(v: Vector3<f64>) -> Self {
        Point::new(v.x, v.y, v.z)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, s: f64) -> Point {
        Point::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y, -self.z)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        *self = *self + rhs;
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) {
        *self = *self - rhs;
    }
}
