//! CLI end-to-end tests
//!
//! Run the `grasp-snap` binary against the built-in tabletop simulator and
//! check the files and report it produces.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn grasp_snap() -> Command {
    Command::cargo_bin("grasp-snap").expect("Binary not built")
}

fn sorted_file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("Failed to read output directory")
        .map(|entry| {
            entry
                .expect("Failed to read directory entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}

/// Split `{tag}_{ms}_{viewpoint}[_step].png` into (tag, viewpoint and suffix)
fn strip_timestamp<'a>(name: &'a str, tag: &str) -> Option<&'a str> {
    let rest = name.strip_prefix(tag)?.strip_prefix('_')?;
    let (millis, tail) = rest.split_once('_')?;
    if millis.is_empty() || !millis.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    tail.strip_suffix(".png")
}

#[test]
fn test_single_step_writes_six_frames() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let out = temp_dir.path().join("x");

    grasp_snap()
        .args(["--task", "PickAndLift", "--steps", "1", "--variation", "0"])
        .arg("--out")
        .arg(&out)
        .args(["--width", "64", "--height", "48"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "Saved snapshots to: {}",
            out.display()
        )))
        .stdout(predicate::str::contains(
            "Available grasp tasks in this install: LiftNumberedBlock, PickAndLift, PickUpCup, \
             lift_numbered_block, pick_and_lift, pick_up_cup",
        ));

    let names = sorted_file_names(&out);
    assert_eq!(names.len(), 6, "unexpected files: {names:?}");

    let mut kinds: Vec<&str> = names
        .iter()
        .map(|name| strip_timestamp(name, "PickAndLift_var0").expect("Unexpected file name"))
        .collect();
    kinds.sort_unstable();
    assert_eq!(
        kinds,
        vec![
            "front",
            "front_step",
            "left_shoulder",
            "left_shoulder_step",
            "wrist",
            "wrist_step",
        ]
    );

    for name in &names {
        let image = image::open(out.join(name)).expect("Failed to decode PNG");
        assert_eq!((image.width(), image.height()), (64, 48));
    }
}

#[test]
fn test_alias_task_is_tagged_with_alias() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    grasp_snap()
        .args(["--task", "pick_up_cup", "--width", "32", "--height", "24", "--seed", "5"])
        .arg("--out")
        .arg(temp_dir.path())
        .assert()
        .success();

    let names = sorted_file_names(temp_dir.path());
    assert_eq!(names.len(), 6);
    assert!(names
        .iter()
        .all(|name| strip_timestamp(name, "pick_up_cup_random").is_some()));
}

#[test]
fn test_out_expands_environment_variables() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    grasp_snap()
        .env("GRASP_SNAP_TEST_ROOT", temp_dir.path())
        .args(["--task", "LiftNumberedBlock", "--variation", "2"])
        .args(["--out", "${GRASP_SNAP_TEST_ROOT}/nested/run"])
        .args(["--width", "16", "--height", "16"])
        .assert()
        .success();

    let names = sorted_file_names(&temp_dir.path().join("nested").join("run"));
    assert_eq!(names.len(), 6);
    assert!(names
        .iter()
        .all(|name| name.starts_with("LiftNumberedBlock_var2_")));
}

#[test]
fn test_list_tasks() {
    grasp_snap()
        .arg("--list-tasks")
        .assert()
        .success()
        .stdout("LiftNumberedBlock\nPickAndLift\nPickUpCup\nlift_numbered_block\npick_and_lift\npick_up_cup\n");
}

#[test]
fn test_unlisted_task_is_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    grasp_snap()
        .args(["--task", "ReachTarget"])
        .arg("--out")
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));

    assert!(sorted_file_names(temp_dir.path()).is_empty());
}

#[test]
fn test_variation_out_of_range_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    grasp_snap()
        .args(["--task", "LiftNumberedBlock", "--variation", "7"])
        .args(["--width", "16", "--height", "16"])
        .arg("--out")
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("variation"));
}

#[test]
fn test_oversized_resolution_fails_cleanly() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    grasp_snap()
        .args(["--task", "PickAndLift", "--variation", "0"])
        .args(["--width", "4000000000", "--height", "4000000000"])
        .arg("--out")
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("exceeds"))
        .stderr(predicate::str::contains("panicked").not());
    assert!(sorted_file_names(temp_dir.path()).is_empty());
}

#[test]
fn test_json_summary() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    let output = grasp_snap()
        .args(["--task", "PickAndLift", "--steps", "3", "--seed", "11", "--json"])
        .args(["--width", "16", "--height", "16"])
        .arg("--out")
        .arg(temp_dir.path())
        .output()
        .expect("Failed to run binary");
    assert!(output.status.success());

    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is not JSON");
    assert_eq!(summary["task"], "PickAndLift");
    assert_eq!(summary["steps"], 3);
    assert_eq!(summary["before"]["written"].as_array().map(Vec::len), Some(3));
    assert_eq!(summary["after"]["written"].as_array().map(Vec::len), Some(3));
}
