//! Tubesheet layout, calibration points and the in-memory inspection session.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Point;

/// Millimeters per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Stable tube identifier.
///
/// Tubesheet files label tubes as `tube_<n>`; both that form and the bare
/// number parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "TubeIdRepr", into = "String")]
pub struct TubeId(pub u32);

const TUBE_PREFIX: &str = "tube_";

impl fmt::Display for TubeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TUBE_PREFIX}{}", self.0)
    }
}

impl FromStr for TubeId {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix(TUBE_PREFIX).unwrap_or(trimmed);
        digits
            .parse()
            .map(TubeId)
            .map_err(|_| SessionError::InvalidTubeId(s.to_string()))
    }
}

impl From<TubeId> for String {
    fn from(id: TubeId) -> Self {
        id.to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TubeIdRepr {
    Number(u32),
    Text(String),
}

impl TryFrom<TubeIdRepr> for TubeId {
    type Error = SessionError;

    fn try_from(repr: TubeIdRepr) -> Result<Self, Self::Error> {
        match repr {
            TubeIdRepr::Number(n) => Ok(TubeId(n)),
            TubeIdRepr::Text(s) => s.parse(),
        }
    }
}

/// Length unit a session's tubesheet is drawn in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthUnit {
    #[default]
    #[serde(rename = "inch")]
    Inch,
    #[serde(rename = "mm")]
    Millimeter,
}

impl LengthUnit {
    /// Divisor converting session units into manipulator units (inches).
    pub fn scale(self) -> f64 {
        match self {
            LengthUnit::Inch => 1.0,
            LengthUnit::Millimeter => MM_PER_INCH,
        }
    }
}

/// One tube opening of the tubesheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tube {
    pub id: TubeId,
    /// Design position in session units.
    pub nominal: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<String>,
}

impl Tube {
    pub fn new(id: TubeId, nominal: Point) -> Self {
        Self {
            id,
            nominal,
            row: None,
            col: None,
        }
    }
}

/// A tube whose physical position is (or will be) measured to align the layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub tube: TubeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<String>,
    /// Nominal coordinate copied from the tube when the point was created.
    pub ideal: Point,
    /// Measured coordinate in the manipulator frame, once determined.
    #[serde(default)]
    pub determined: Option<Point>,
}

/// Errors raised by session and calibration bookkeeping.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid tube id `{0}`")]
    InvalidTubeId(String),
    #[error("unknown tube {0}")]
    UnknownTube(TubeId),
    #[error("calibration point for {0} already exists")]
    DuplicateCalibrationPoint(TubeId),
    #[error("no calibration point for {0}")]
    UnknownCalibrationPoint(TubeId),
}

/// Calibration points keyed by tube; at most one per tube.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CalibrationPoint>", into = "Vec<CalibrationPoint>")]
pub struct CalibrationPoints {
    points: BTreeMap<TubeId, CalibrationPoint>,
}

impl CalibrationPoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        tube: TubeId,
        row: Option<String>,
        col: Option<String>,
        ideal: Point,
    ) -> Result<&CalibrationPoint, SessionError> {
        use std::collections::btree_map::Entry;

        match self.points.entry(tube) {
            Entry::Occupied(_) => Err(SessionError::DuplicateCalibrationPoint(tube)),
            Entry::Vacant(slot) => Ok(slot.insert(CalibrationPoint {
                tube,
                row,
                col,
                ideal,
                determined: None,
            })),
        }
    }

    pub fn set_determined(&mut self, tube: TubeId, determined: Point) -> Result<(), SessionError> {
        let point = self
            .points
            .get_mut(&tube)
            .ok_or(SessionError::UnknownCalibrationPoint(tube))?;
        point.determined = Some(determined);
        Ok(())
    }

    pub fn remove(&mut self, tube: TubeId) -> Option<CalibrationPoint> {
        self.points.remove(&tube)
    }

    pub fn get(&self, tube: TubeId) -> Option<&CalibrationPoint> {
        self.points.get(&tube)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CalibrationPoint> {
        self.points.values()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(ideal, determined)` for every point that has been measured.
    pub fn pairs(&self) -> Vec<(Point, Point)> {
        self.points
            .values()
            .filter_map(|p| p.determined.map(|d| (p.ideal, d)))
            .collect()
    }
}

impl From<Vec<CalibrationPoint>> for CalibrationPoints {
    fn from(points: Vec<CalibrationPoint>) -> Self {
        points.into_iter().collect()
    }
}

impl From<CalibrationPoints> for Vec<CalibrationPoint> {
    fn from(points: CalibrationPoints) -> Self {
        points.points.into_values().collect()
    }
}

impl FromIterator<CalibrationPoint> for CalibrationPoints {
    fn from_iter<I: IntoIterator<Item = CalibrationPoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().map(|p| (p.tube, p)).collect(),
        }
    }
}

/// Tubesheet plus calibration state for one inspection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InspectionSession {
    pub name: String,
    #[serde(default)]
    pub unit: LengthUnit,
    /// Tube outer diameter in session units.
    pub tube_od: f64,
    #[serde(with = "tube_list")]
    pub tubes: BTreeMap<TubeId, Tube>,
    #[serde(default)]
    pub calibration: CalibrationPoints,
}

impl InspectionSession {
    pub fn new(
        name: impl Into<String>,
        unit: LengthUnit,
        tube_od: f64,
        tubes: impl IntoIterator<Item = Tube>,
    ) -> Self {
        Self {
            name: name.into(),
            unit,
            tube_od,
            tubes: tubes.into_iter().map(|t| (t.id, t)).collect(),
            calibration: CalibrationPoints::new(),
        }
    }

    pub fn tube(&self, id: TubeId) -> Result<&Tube, SessionError> {
        self.tubes.get(&id).ok_or(SessionError::UnknownTube(id))
    }

    /// Register `tube` as a calibration point, copying its nominal position.
    pub fn add_calibration_point(&mut self, id: TubeId) -> Result<&CalibrationPoint, SessionError> {
        let tube = self.tubes.get(&id).ok_or(SessionError::UnknownTube(id))?;
        self.calibration
            .add(id, tube.row.clone(), tube.col.clone(), tube.nominal)
    }
}

/// Tubes are stored on disk as a plain list; the id is part of each entry.
mod tube_list {
    use super::{Tube, TubeId};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        tubes: &BTreeMap<TubeId, Tube>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(tubes.values())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<TubeId, Tube>, D::Error> {
        let list = Vec::<Tube>::deserialize(deserializer)?;
        Ok(list.into_iter().map(|t| (t.id, t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tube(id: u32, x: f64, y: f64) -> Tube {
        Tube {
            id: TubeId(id),
            nominal: Point::planar(x, y),
            row: Some(format!("R{id}")),
            col: None,
        }
    }

    #[test]
    fn tube_id_parses_prefixed_and_bare() {
        assert_eq!("tube_17".parse::<TubeId>(), Ok(TubeId(17)));
        assert_eq!("17".parse::<TubeId>(), Ok(TubeId(17)));
        assert!("tube_x".parse::<TubeId>().is_err());
        assert_eq!(TubeId(3).to_string(), "tube_3");
    }

    #[test]
    fn tube_id_serde_accepts_number_or_string() {
        let a: TubeId = serde_json::from_str("4").expect("number");
        let b: TubeId = serde_json::from_str("\"tube_4\"").expect("string");
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).expect("ser"), "\"tube_4\"");
    }

    #[test]
    fn unit_scale() {
        assert_eq!(LengthUnit::Inch.scale(), 1.0);
        assert_eq!(LengthUnit::Millimeter.scale(), 25.4);
        let u: LengthUnit = serde_json::from_str("\"mm\"").expect("unit");
        assert_eq!(u, LengthUnit::Millimeter);
    }

    #[test]
    fn calibration_point_lifecycle() {
        let mut session = InspectionSession::new(
            "s",
            LengthUnit::Inch,
            0.75,
            [tube(1, 0.0, 0.0), tube(2, 1.0, 0.0)],
        );

        let cp = session.add_calibration_point(TubeId(1)).expect("add");
        assert_eq!(cp.ideal, Point::planar(0.0, 0.0));
        assert_eq!(cp.row.as_deref(), Some("R1"));
        assert!(cp.determined.is_none());

        assert_eq!(
            session.add_calibration_point(TubeId(1)).map(|_| ()),
            Err(SessionError::DuplicateCalibrationPoint(TubeId(1)))
        );
        assert_eq!(
            session.add_calibration_point(TubeId(9)).map(|_| ()),
            Err(SessionError::UnknownTube(TubeId(9)))
        );

        session.add_calibration_point(TubeId(2)).expect("add");
        assert!(session.calibration.pairs().is_empty());

        session
            .calibration
            .set_determined(TubeId(2), Point::planar(1.1, 0.1))
            .expect("set");
        assert_eq!(
            session.calibration.pairs(),
            vec![(Point::planar(1.0, 0.0), Point::planar(1.1, 0.1))]
        );

        assert!(session.calibration.remove(TubeId(2)).is_some());
        assert!(session.calibration.remove(TubeId(2)).is_none());
        assert_eq!(
            session
                .calibration
                .set_determined(TubeId(2), Point::ORIGIN),
            Err(SessionError::UnknownCalibrationPoint(TubeId(2)))
        );
    }

    #[test]
    fn session_json_uses_tube_list() {
        let session =
            InspectionSession::new("hx", LengthUnit::Millimeter, 19.05, [tube(5, 2.0, 3.0)]);
        let json = serde_json::to_value(&session).expect("ser");
        assert!(json["tubes"].is_array());
        assert_eq!(json["tubes"][0]["id"], "tube_5");

        let back: InspectionSession = serde_json::from_value(json).expect("de");
        assert_eq!(back, session);
    }
}
