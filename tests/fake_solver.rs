//! Solver-invocation tests using a shell-script stand-in for StochKit.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use stochml::errors::SimulationError;
use stochml::{
    simulate, simulate_file, Model, Parameter, Reaction, SimulationSettings, Species,
    StochMLDocument,
};
use tempfile::TempDir;

/// Writes two fixed trajectories into the requested output directory.
const WRITING_SOLVER: &str = r#"#!/bin/sh
out=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "--out-dir" ]; then
    out="$arg"
  fi
  prev="$arg"
done
mkdir -p "$out/trajectories"
printf '0 100\n0.5 90\n1 81\n' > "$out/trajectories/trajectory0.txt"
printf '0 100\n0.5 95\n1 88\n' > "$out/trajectories/trajectory1.txt"
"#;

/// Records its arguments next to itself, then behaves like WRITING_SOLVER.
const ARG_RECORDING_SOLVER: &str = r#"#!/bin/sh
printf '%s\n' "$@" > "$(dirname "$0")/args.txt"
out=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "--out-dir" ]; then
    out="$arg"
  fi
  prev="$arg"
done
mkdir -p "$out/trajectories"
printf '0 100\n' > "$out/trajectories/trajectory0.txt"
"#;

const FAILING_SOLVER: &str = "#!/bin/sh\necho 'model rejected' >&2\nexit 2\n";

const MESSY_SOLVER: &str = r#"#!/bin/sh
out=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "--out-dir" ]; then
    out="$arg"
  fi
  prev="$arg"
done
mkdir -p "$out/trajectories"
printf '0 100\n' > "$out/trajectories/trajectory0.txt"
printf 'leftover\n' > "$out/trajectories/notes.txt"
"#;

fn install_fake_solver(home: &Path, body: &str) {
    let path = home.join("ssa");
    fs::write(&path, body).unwrap();
    let mut permissions = fs::metadata(&path).unwrap().permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&path, permissions).unwrap();
}

fn settings_for(home: &Path) -> SimulationSettings {
    SimulationSettings {
        trajectories: 2,
        stochkit_home: Some(home.to_path_buf()),
        ..SimulationSettings::default()
    }
}

fn decay_model() -> Model {
    let mut model = Model::new("decay");
    model
        .add_species(Species::new("S", 100.0).unwrap())
        .unwrap();
    let k = Parameter::new("k", "0.1").unwrap();
    model.add_parameter(k.clone()).unwrap();
    model
        .add_reaction(Reaction::mass_action("decay", &[("S", 1)], &[], &k).unwrap())
        .unwrap();
    model
}

#[test]
fn collects_trajectories_from_a_solver_run() {
    let home = TempDir::new().unwrap();
    install_fake_solver(home.path(), WRITING_SOLVER);

    let trajectories = simulate(&mut decay_model(), &settings_for(home.path())).unwrap();

    assert_eq!(trajectories.len(), 2);
    assert_eq!(trajectories[0].shape(), &[3, 2]);
    assert_eq!(trajectories[0][[2, 1]], 81.0);
    assert_eq!(trajectories[1][[1, 1]], 95.0);
}

#[test]
fn assembles_the_stochkit_command_line() {
    let home = TempDir::new().unwrap();
    install_fake_solver(home.path(), ARG_RECORDING_SOLVER);

    simulate(&mut decay_model(), &settings_for(home.path())).unwrap();

    let recorded = fs::read_to_string(home.path().join("args.txt")).unwrap();
    let args: Vec<&str> = recorded.lines().collect();
    assert_eq!(args[0], "--model");
    assert!(args[1].ends_with("temp_input.xml"));
    assert_eq!(args[2], "--out-dir");
    assert_eq!(
        args[4..],
        [
            "-t",
            "20",
            "-i",
            "400",
            "--realizations",
            "2",
            "-p",
            "1",
            "--keep-trajectories",
            "--seed",
            "0"
        ]
    );
}

#[test]
fn seed_and_increment_settings_reach_the_solver() {
    let home = TempDir::new().unwrap();
    install_fake_solver(home.path(), ARG_RECORDING_SOLVER);

    let settings = SimulationSettings {
        end_time: 10.0,
        increment: None,
        seed: Some(42),
        ..settings_for(home.path())
    };
    simulate(&mut decay_model(), &settings).unwrap();

    let recorded = fs::read_to_string(home.path().join("args.txt")).unwrap();
    let args: Vec<&str> = recorded.lines().collect();
    // increment of None falls back to end_time / 10, so 10 output points
    assert_eq!(args[4..8], ["-t", "10", "-i", "10"]);
    assert_eq!(args[args.len() - 2..], ["--seed", "42"]);
}

#[test]
fn failing_solver_surfaces_its_stderr() {
    let home = TempDir::new().unwrap();
    install_fake_solver(home.path(), FAILING_SOLVER);

    let err = simulate(&mut decay_model(), &settings_for(home.path())).unwrap_err();
    match err {
        SimulationError::SolverFailed { details, .. } => {
            assert!(details.contains("model rejected"));
        }
        other => panic!("expected SolverFailed, got {other:?}"),
    }
}

#[test]
fn stray_output_file_fails_collection() {
    let home = TempDir::new().unwrap();
    install_fake_solver(home.path(), MESSY_SOLVER);

    let err = simulate(&mut decay_model(), &settings_for(home.path())).unwrap_err();
    assert!(matches!(
        err,
        SimulationError::UnexpectedOutputFile(path) if path.ends_with("notes.txt")
    ));
}

#[test]
fn pre_serialized_files_are_passed_through() {
    let home = TempDir::new().unwrap();
    install_fake_solver(home.path(), WRITING_SOLVER);

    let scratch = TempDir::new().unwrap();
    let xml_path = scratch.path().join("model.xml");
    StochMLDocument::from_string(decay_model().serialize().unwrap())
        .unwrap()
        .write_to_file(&xml_path)
        .unwrap();

    let trajectories = simulate_file(&xml_path, &settings_for(home.path())).unwrap();
    assert_eq!(trajectories.len(), 2);
}

#[test]
fn missing_executable_is_reported() {
    let home = TempDir::new().unwrap();
    let err = simulate(&mut decay_model(), &settings_for(home.path())).unwrap_err();
    assert!(matches!(
        err,
        SimulationError::ExecutableNotFound(name) if name == "ssa"
    ));
}
