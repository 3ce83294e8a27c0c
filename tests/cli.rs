#[path = "common/mod.rs"]
mod common;

use common::*;
use std::process::Command;

fn linedup() -> Command {
    Command::new(env!("CARGO_BIN_EXE_linedup"))
}

/// Missing `-i` prints usage and exits non-zero before any I/O.
#[test]
fn missing_input_flag_fails_with_usage() {
    let out = linedup().output().unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Usage"), "{stderr}");
}

#[test]
fn unknown_flag_fails() {
    let input = make_input(&["a"]);
    let out = linedup().arg("-i").arg(&input).arg("-z").output().unwrap();
    assert!(!out.status.success());
    assert!(!input.parent().unwrap().join("temp").exists());
}

#[test]
fn non_numeric_group_count_fails() {
    let input = make_input(&["a"]);
    let out = linedup().arg("-i").arg(&input).args(["-g", "many"]).output().unwrap();
    assert!(!out.status.success());
    assert!(!input.parent().unwrap().join("out.txt").exists());
}

#[test]
fn zero_group_count_fails() {
    let input = make_input(&["a"]);
    let out = linedup()
        .arg("-i")
        .arg(&input)
        .args(["-g", "0", "--no-progress"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(!input.parent().unwrap().join("temp").exists());
}

/// End to end through the binary, with a JSON report on stdout.
#[test]
fn dedups_file_and_prints_json_report() {
    let input = make_input(&["a", "b", "a", "c", "b", "a"]);
    let output = input.with_file_name("result.txt");

    let out = linedup()
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["-b", "2", "-g", "2", "--no-progress", "--skip-space-check", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["stats"]["total_lines"], 6);
    assert_eq!(report["stats"]["duplicate_lines"], 3);
    assert_eq!(report["batch_limit"], 2);
    assert_eq!(line_set(&read_lines(&output)).len(), 3);
}
