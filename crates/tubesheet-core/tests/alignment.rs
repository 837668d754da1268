use approx::assert_relative_eq;
use nalgebra::{Rotation2, Vector2};
use tubesheet_core::{
    align_tubes, fit_circle, GeometryError, InspectionSession, LengthUnit, Point, Tube, TubeId,
    MM_PER_INCH,
};

fn grid_session() -> InspectionSession {
    let tubes = (0..4).flat_map(|row| {
        (0..5).map(move |col| {
            Tube::new(
                TubeId(row * 5 + col + 1),
                Point::planar(col as f64 * 25.4, row as f64 * 22.0),
            )
        })
    });
    InspectionSession::new("grid", LengthUnit::Millimeter, 19.05, tubes)
}

/// Nominal millimeters to manipulator inches: rotate, convert, shift.
fn physical(p: &Point) -> Point {
    let rot = Rotation2::new(0.05);
    let v = rot * (p.xy() / MM_PER_INCH) + Vector2::new(12.0, -3.5);
    Point::planar(v.x, v.y)
}

#[test]
fn millimeter_layout_aligns_into_inches() {
    let mut session = grid_session();
    for id in [1, 5, 16, 20] {
        let id = TubeId(id);
        let ideal = session.add_calibration_point(id).expect("add").ideal;
        session
            .calibration
            .set_determined(id, physical(&ideal))
            .expect("set");
    }
    // An unmeasured point does not enter the fit.
    session.add_calibration_point(TubeId(8)).expect("add");

    let alignment = align_tubes(session.tubes.values(), &session.calibration).expect("align");
    assert_eq!(alignment.used_points, 4);
    assert_eq!(alignment.aligned.len(), 20);
    assert_relative_eq!(alignment.transform.scale, 1.0 / MM_PER_INCH, epsilon = 1e-12);
    assert_relative_eq!(alignment.transform.rotation, 0.05, epsilon = 1e-12);
    assert!(alignment.rms_residual < 1e-9);

    for tube in session.tubes.values() {
        let expected = physical(&tube.nominal);
        let got = alignment.aligned[&tube.id];
        assert_relative_eq!(got.x, expected.x, epsilon = 1e-9);
        assert_relative_eq!(got.y, expected.y, epsilon = 1e-9);
    }
}

#[test]
fn alignment_needs_measured_points() {
    let mut session = grid_session();
    session.add_calibration_point(TubeId(1)).expect("add");
    let err = align_tubes(session.tubes.values(), &session.calibration).unwrap_err();
    assert_eq!(
        err,
        GeometryError::InsufficientCalibrationPoints {
            required: 2,
            got: 0
        }
    );
}

#[test]
fn session_json_round_trip_keeps_calibration_state() {
    let mut session = grid_session();
    session.add_calibration_point(TubeId(3)).expect("add");
    session
        .calibration
        .set_determined(TubeId(3), Point::new(1.0, 2.0, 0.5))
        .expect("set");

    let json = serde_json::to_string(&session).expect("serialize");
    assert!(json.contains("\"tube_3\""));
    let back: InspectionSession = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back.unit, LengthUnit::Millimeter);
    assert_eq!(back.tubes.len(), 20);
    assert_eq!(back.calibration, session.calibration);
}

#[test]
fn fitted_circle_of_probe_contacts() {
    // Contacts on a 0.3" bore, gathered in the probe visiting order.
    let center = Point::planar(2.01, -0.4);
    let contacts: Vec<Point> = [0usize, 2, 4, 1, 3]
        .iter()
        .map(|&i| {
            let a = std::f64::consts::TAU * i as f64 / 5.0;
            Point::planar(center.x + 0.3 * a.cos(), center.y + 0.3 * a.sin())
        })
        .collect();
    let fit = fit_circle(&contacts).expect("fit");
    assert_relative_eq!(fit.center.x, center.x, epsilon = 1e-9);
    assert_relative_eq!(fit.center.y, center.y, epsilon = 1e-9);
    assert_relative_eq!(fit.radius, 0.3, epsilon = 1e-9);
}
