use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn statescriber_cmd(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("statescriber").expect("binary exists");
    cmd.env("XDG_CONFIG_HOME", config_home);
    cmd
}

/// A->B, a free-ended edge into A, and one edge pointing at a missing state.
fn write_diagram(dir: &Path) -> PathBuf {
    let document = serde_json::json!({
        "id": 9,
        "name": "Turnstile",
        "width": 300.0,
        "height": 200.0,
        "transitionSearchRadius": 6.0,
        "states": [
            {"id": 1, "x": 80.0, "y": 100.0, "radius": 30.0, "text": "locked"},
            {"id": 2, "x": 220.0, "y": 100.0, "radius": 30.0, "isFinal": true},
            {"id": 3, "x": 20.0, "y": 20.0, "drawable": false}
        ],
        "transitions": [
            {"id": 1, "fromState": 1, "toState": 2, "text": "coin", "perpendicularAxis": -0.2},
            {"id": 2, "fromState": 3, "toState": 1},
            {"id": 3, "fromState": 2, "toState": 42}
        ]
    });
    let path = dir.join("turnstile.json");
    std::fs::write(&path, serde_json::to_vec_pretty(&document).unwrap()).unwrap();
    path
}

#[test]
fn help_prints_usage() {
    let temp = TempDir::new().unwrap();
    statescriber_cmd(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Finite-state-machine diagram engine",
        ));
}

#[test]
fn info_summarises_diagram() {
    let temp = TempDir::new().unwrap();
    let file = write_diagram(temp.path());

    statescriber_cmd(temp.path())
        .arg("info")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Name: Turnstile"))
        .stdout(predicate::str::contains("States: 2"))
        .stdout(predicate::str::contains("Transitions: 2"))
        .stdout(predicate::str::contains("Initial states: s1"))
        .stdout(predicate::str::contains("Final states: s2"))
        .stdout(predicate::str::contains("Dropped transitions: 1"));
}

#[test]
fn export_png_writes_image() {
    let temp = TempDir::new().unwrap();
    let file = write_diagram(temp.path());
    let output = temp.path().join("out.png");

    statescriber_cmd(temp.path())
        .args(["export", "--format", "png", "--scale", "2"])
        .arg(&file)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported"));

    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(&bytes[1..4], b"PNG");
}

#[test]
fn export_svg_defaults_to_input_name() {
    let temp = TempDir::new().unwrap();
    let file = write_diagram(temp.path());

    statescriber_cmd(temp.path())
        .args(["export", "--format", "svg"])
        .arg(&file)
        .assert()
        .success();

    let svg = std::fs::read_to_string(temp.path().join("turnstile.svg")).unwrap();
    assert!(svg.contains("<svg"));
}

#[test]
fn export_json_drops_dangling_edges() {
    let temp = TempDir::new().unwrap();
    let file = write_diagram(temp.path());
    let output = temp.path().join("clean.json");

    statescriber_cmd(temp.path())
        .args(["export", "-f", "json", "-o"])
        .arg(&output)
        .arg(&file)
        .assert()
        .success();

    let value: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
    assert_eq!(value["transitions"].as_array().unwrap().len(), 2);
    assert_eq!(value["name"], "Turnstile");
}

#[test]
fn export_refuses_to_overwrite_input() {
    let temp = TempDir::new().unwrap();
    let file = write_diagram(temp.path());

    statescriber_cmd(temp.path())
        .args(["export", "--format", "json"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("refusing to overwrite"));
}

#[test]
fn invalid_scale_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file = write_diagram(temp.path());

    statescriber_cmd(temp.path())
        .args(["export", "--scale", "0"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--scale must be a positive number"));
}

#[test]
fn missing_file_fails() {
    let temp = TempDir::new().unwrap();
    statescriber_cmd(temp.path())
        .arg("info")
        .arg(temp.path().join("nope.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to stat"));
}

#[test]
fn init_config_writes_example_once() {
    let temp = TempDir::new().unwrap();

    statescriber_cmd(temp.path())
        .arg("init-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default config"));
    assert!(temp.path().join("statescriber/config.toml").exists());

    statescriber_cmd(temp.path())
        .arg("init-config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}
