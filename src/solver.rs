//! Shelling out to a StochKit-compatible solver and collecting its output.
//!
//! The solver is an external, separately-installed binary. This module
//! serializes a model into a scratch directory, assembles the StochKit
//! command line, waits for the process, and loads the trajectory tables it
//! leaves behind. Nothing here samples trajectories itself.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, warn};
use ndarray::Array2;
use tempfile::TempDir;

use crate::errors::SimulationError;
use crate::model::Model;

/// One solver run's worth of knobs.
///
/// `algorithm` doubles as the executable's file name (`ssa`,
/// `tau_leaping`, ...). The number of output points is `end_time /
/// increment`, truncated.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    /// Simulated end time, passed as `-t`.
    pub end_time: f64,
    /// Number of realizations to generate.
    pub trajectories: u32,
    /// Output time increment; `None` falls back to a tenth of the end time.
    pub increment: Option<f64>,
    /// Seed for the solver's generator; `None` means 0.
    pub seed: Option<u64>,
    /// Solver executable name.
    pub algorithm: String,
    /// Directory holding the solver binaries, overriding discovery.
    pub stochkit_home: Option<PathBuf>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            end_time: 20.0,
            trajectories: 10,
            increment: Some(0.05),
            seed: None,
            algorithm: "ssa".to_string(),
            stochkit_home: None,
        }
    }
}

/// Serialize `model`, run the solver on it and collect the trajectories.
///
/// Each trajectory is a row-per-time-point table: column 0 is time, the
/// remaining columns are species counts in the model's species insertion
/// order. All scratch files live in a temp directory that is removed once
/// the tables are in memory.
pub fn simulate(
    model: &mut Model,
    settings: &SimulationSettings,
) -> Result<Vec<Array2<f64>>, SimulationError> {
    let scratch = TempDir::new()?;
    let model_path = scratch.path().join("temp_input.xml");
    fs::write(&model_path, model.serialize()?)?;
    run_in(&model_path, settings, scratch.path())
}

/// Run the solver on a pre-existing StochML file, passed through unchanged.
pub fn simulate_file(
    model_xml: impl AsRef<Path>,
    settings: &SimulationSettings,
) -> Result<Vec<Array2<f64>>, SimulationError> {
    let scratch = TempDir::new()?;
    run_in(model_xml.as_ref(), settings, scratch.path())
}

fn run_in(
    model_xml: &Path,
    settings: &SimulationSettings,
    scratch: &Path,
) -> Result<Vec<Array2<f64>>, SimulationError> {
    let executable = find_executable(settings)?;
    let output_base = scratch.join("output");
    fs::create_dir_all(&output_base)?;
    let outdir = output_base.join("ensemble");

    let end_time = settings.end_time;
    let increment = settings.increment.unwrap_or(end_time / 10.0);
    let points = (end_time / increment) as i64;
    let seed = settings.seed.unwrap_or(0);

    let mut command = Command::new(&executable);
    command
        .arg("--model")
        .arg(model_xml)
        .arg("--out-dir")
        .arg(&outdir)
        .arg("-t")
        .arg(end_time.to_string())
        .arg("-i")
        .arg(points.to_string())
        .arg("--realizations")
        .arg(settings.trajectories.to_string());
    if outdir.exists() {
        command.arg("--force");
    }
    command
        .arg("-p")
        .arg("1")
        .arg("--keep-trajectories")
        .arg("--seed")
        .arg(seed.to_string());

    debug!("invoking solver: {command:?}");
    let output = command.output().map_err(|err| SimulationError::SolverFailed {
        command: format!("{command:?}"),
        details: err.to_string(),
    })?;
    if !output.status.success() {
        return Err(SimulationError::SolverFailed {
            command: format!("{command:?}"),
            details: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    collect_trajectories(&outdir.join("trajectories"))
}

/// Locate the solver binary: an explicit home must contain it; otherwise try
/// `STOCHKIT_HOME`, then every `PATH` entry.
fn find_executable(settings: &SimulationSettings) -> Result<PathBuf, SimulationError> {
    if let Some(home) = &settings.stochkit_home {
        let candidate = home.join(&settings.algorithm);
        if candidate.is_file() {
            return Ok(candidate);
        }
        return Err(SimulationError::ExecutableNotFound(
            settings.algorithm.clone(),
        ));
    }
    if let Some(home) = env::var_os("STOCHKIT_HOME") {
        let candidate = Path::new(&home).join(&settings.algorithm);
        if candidate.is_file() {
            return Ok(candidate);
        }
        warn!(
            "STOCHKIT_HOME is set but does not contain '{}', falling back to PATH",
            settings.algorithm
        );
    }
    if let Some(path) = env::var_os("PATH") {
        for dir in env::split_paths(&path) {
            let candidate = dir.join(&settings.algorithm);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
    }
    Err(SimulationError::ExecutableNotFound(
        settings.algorithm.clone(),
    ))
}

/// Load every trajectory table under `dir`, in sorted filename order.
fn collect_trajectories(dir: &Path) -> Result<Vec<Array2<f64>>, SimulationError> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()?;
    paths.sort();

    let mut trajectories = Vec::with_capacity(paths.len());
    for path in paths {
        let recognized = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.contains("trajectory"));
        if !recognized {
            return Err(SimulationError::UnexpectedOutputFile(path));
        }
        trajectories.push(parse_trajectory_table(&path)?);
    }
    Ok(trajectories)
}

/// Parse a whitespace-delimited numeric table into a dense 2-D array.
fn parse_trajectory_table(path: &Path) -> Result<Array2<f64>, SimulationError> {
    let text = fs::read_to_string(path)?;
    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row: Vec<f64> = line
            .split_whitespace()
            .map(str::parse)
            .collect::<Result<_, _>>()
            .map_err(|err| SimulationError::MalformedTrajectory {
                path: path.to_path_buf(),
                details: format!("line {}: {err}", index + 1),
            })?;
        rows.push(row);
    }
    if rows.is_empty() {
        return Err(SimulationError::MalformedTrajectory {
            path: path.to_path_buf(),
            details: "empty table".to_string(),
        });
    }
    let columns = rows[0].len();
    if let Some(bad) = rows.iter().position(|row| row.len() != columns) {
        return Err(SimulationError::MalformedTrajectory {
            path: path.to_path_buf(),
            details: format!(
                "ragged table: row {} has {} columns, expected {columns}",
                bad + 1,
                rows[bad].len()
            ),
        });
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    let table = Array2::from_shape_vec((flat.len() / columns, columns), flat)
        .map_err(|err| SimulationError::MalformedTrajectory {
            path: path.to_path_buf(),
            details: err.to_string(),
        })?;
    Ok(table)
}
