use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

fn write_json(dir: &Path, name: &str, value: &Value) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

fn session_json() -> Value {
    json!({
        "name": "hx-12",
        "unit": "inch",
        "tube_od": 0.75,
        "tubes": [
            { "id": "tube_1", "nominal": { "x": 0.0, "y": 0.0 } },
            { "id": "tube_2", "nominal": { "x": 2.0, "y": 0.0 } },
            { "id": 3, "nominal": { "x": 0.0, "y": 2.0 }, "row": "B", "col": "1" }
        ],
        "calibration": [
            {
                "tube": "tube_1",
                "ideal": { "x": 0.0, "y": 0.0 },
                "determined": { "x": 10.0, "y": 5.0 }
            },
            {
                "tube": "tube_2",
                "ideal": { "x": 2.0, "y": 0.0 },
                "determined": { "x": 10.0, "y": 7.0 }
            }
        ]
    })
}

#[test]
fn align_prints_rotated_layout() {
    let dir = TempDir::new().unwrap();
    let session = write_json(dir.path(), "session.json", &session_json());

    let output = Command::cargo_bin("tubesheet")
        .unwrap()
        .arg("align")
        .arg(&session)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["used_points"], 2);
    let tube3 = &report["aligned"]["tube_3"];
    assert!((tube3["x"].as_f64().unwrap() - 8.0).abs() < 1e-9);
    assert!((tube3["y"].as_f64().unwrap() - 5.0).abs() < 1e-9);
    let rotation = report["transform"]["rotation"].as_f64().unwrap();
    assert!((rotation - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
}

#[test]
fn align_without_measurements_fails() {
    let dir = TempDir::new().unwrap();
    let mut session = session_json();
    session["calibration"] = json!([]);
    let session = write_json(dir.path(), "session.json", &session);

    Command::cargo_bin("tubesheet")
        .unwrap()
        .arg("align")
        .arg(&session)
        .assert()
        .failure()
        .stderr(predicate::str::contains("calibration points"));
}

#[test]
fn simulate_recovers_offset_bore() {
    let dir = TempDir::new().unwrap();
    let session = write_json(dir.path(), "session.json", &session_json());
    let config = write_json(
        dir.path(),
        "locator.json",
        &json!({
            "probe_count": 7,
            "sequencer": { "settle_delay": { "secs": 0, "nanos": 1000000 } }
        }),
    );

    let output = Command::cargo_bin("tubesheet")
        .unwrap()
        .args(["simulate", "--tube", "tube_2", "--offset-x", "-0.02", "--offset-y", "0.01"])
        .arg(&session)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["tube"], "tube_2");
    assert_eq!(report["location"]["boundary_points"].as_array().unwrap().len(), 7);
    assert!(report["center_error"].as_f64().unwrap() < 1e-9);
    assert!((report["location"]["center"]["x"].as_f64().unwrap() - 1.98).abs() < 1e-9);
    assert!((report["location"]["radius"].as_f64().unwrap() - 0.3).abs() < 1e-9);
}

#[test]
fn simulate_rejects_unknown_tube() {
    let dir = TempDir::new().unwrap();
    let session = write_json(dir.path(), "session.json", &session_json());

    Command::cargo_bin("tubesheet")
        .unwrap()
        .args(["simulate", "--tube", "42"])
        .arg(&session)
        .assert()
        .failure()
        .stderr(predicate::str::contains("tube_42"));
}

#[test]
fn missing_session_file_is_reported() {
    Command::cargo_bin("tubesheet")
        .unwrap()
        .args(["align", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}
