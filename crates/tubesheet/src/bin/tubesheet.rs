use std::{error::Error, fs, path::Path, path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tubesheet::core::{InspectionSession, Point, TubeId};
use tubesheet::probe::{probe_target, LocatorParams, SimulatedManipulator};
use tubesheet::ProbeStation;

#[cfg(not(feature = "tracing"))]
use log::LevelFilter;
#[cfg(not(feature = "tracing"))]
use std::str::FromStr;

#[cfg(feature = "tracing")]
use tubesheet::core::init_tracing;
#[cfg(not(feature = "tracing"))]
use tubesheet::core::init_with_level;

/// Tubesheet alignment and tube-center probing.
#[derive(Debug, Parser)]
#[command(author, version, about = "Tubesheet alignment and tube-center probing")]
struct Cli {
    /// Log level written to stderr (error, warn, info, debug, trace).
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Emit JSON log lines (tracing builds only).
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Fit the calibration points of a session and print the aligned tube map.
    Align {
        /// Session JSON file.
        session: PathBuf,
    },
    /// Locate one tube against a simulated manipulator and print the result.
    Simulate {
        /// Session JSON file.
        session: PathBuf,
        /// Tube to locate (`7` or `tube_7`).
        #[arg(long)]
        tube: TubeId,
        /// Offset of the simulated bore from the nominal center, in inches.
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        offset_x: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        offset_y: f64,
        /// Radius of the simulated bore in inches. Defaults to 80% of the probe radius.
        #[arg(long)]
        bore_radius: Option<f64>,
        /// Optional JSON `LocatorParams`. Defaults are used if omitted.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    tube: TubeId,
    bore_center: Point,
    bore_radius: f64,
    location: tubesheet::TubeLocation,
    center_error: f64,
}

fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn Error>> {
    let data = fs::read_to_string(path)
        .map_err(|err| format!("cannot read {}: {err}", path.display()))?;
    let value = serde_json::from_str(&data)?;
    Ok(value)
}

fn init_logging(cli: &Cli) -> Result<(), Box<dyn Error>> {
    #[cfg(not(feature = "tracing"))]
    {
        let level = LevelFilter::from_str(&cli.log_level).unwrap_or(LevelFilter::Warn);
        init_with_level(level)?;
        if cli.json_logs {
            log::warn!("--json-logs needs a build with the `tracing` feature");
        }
    }
    #[cfg(feature = "tracing")]
    {
        init_tracing(cli.json_logs);
        log::debug!("filtering by RUST_LOG; --log-level {} ignored", cli.log_level);
    }
    Ok(())
}

fn run_align(session_path: &Path) -> Result<String, Box<dyn Error>> {
    let session: InspectionSession = load_json_file(session_path)?;
    let alignment =
        tubesheet::align_tubes(session.tubes.values(), &session.calibration)?;
    log::info!(
        "aligned {} tubes from {} calibration points (rms {:.6})",
        alignment.aligned.len(),
        alignment.used_points,
        alignment.rms_residual
    );
    Ok(serde_json::to_string_pretty(&alignment)?)
}

fn run_simulate(
    session_path: &Path,
    tube: TubeId,
    offset: (f64, f64),
    bore_radius: Option<f64>,
    config_path: Option<&Path>,
) -> Result<String, Box<dyn Error>> {
    let session: InspectionSession = load_json_file(session_path)?;
    let params = match config_path {
        Some(path) => load_json_file::<LocatorParams>(path)?,
        None => LocatorParams::default(),
    };

    let target = probe_target(&session, tube)?;
    let bore_center = target.center + Point::planar(offset.0, offset.1);
    let bore_radius = bore_radius.unwrap_or(0.8 * target.radius);
    let sim = SimulatedManipulator::new(bore_center, bore_radius).with_start(target.center);

    let station = ProbeStation::new(session, Arc::new(sim), params);
    let location = station.locate_tube_center(tube)?;
    let report = SimulationReport {
        tube,
        bore_center,
        bore_radius,
        center_error: location.center.distance_planar(&bore_center),
        location,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let json = match &cli.command {
        Cmd::Align { session } => run_align(session)?,
        Cmd::Simulate {
            session,
            tube,
            offset_x,
            offset_y,
            bore_radius,
            config,
        } => run_simulate(
            session,
            *tube,
            (*offset_x, *offset_y),
            *bore_radius,
            config.as_deref(),
        )?,
    };
    println!("{json}");
    Ok(())
}
