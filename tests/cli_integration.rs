//! Integration tests for the autochain CLI

use assert_cmd::cargo;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Stdio;
use tempfile::TempDir;

/// Get a Command for the autochain binary
fn autochain() -> Command {
    Command::new(cargo::cargo_bin!("autochain"))
}

/// Create a planning project with the given `auto_mode`.
fn planning_project(auto_mode: bool) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join(".planning/phases")).unwrap();
    fs::write(
        temp.path().join(".planning/config.json"),
        format!(r#"{{"mode": "interactive", "auto_mode": {auto_mode}}}"#),
    )
    .unwrap();
    temp
}

fn write_signal(project: &Path, content: &str) {
    fs::write(project.join(".planning/.auto-next"), content).unwrap();
}

fn signal_exists(project: &Path) -> bool {
    project.join(".planning/.auto-next").exists()
}

fn add_gap_plans(project: &Path, phase: u32, count: usize) {
    let dir = project.join(format!(".planning/phases/{phase:02}-api"));
    fs::create_dir_all(&dir).unwrap();
    for i in 0..count {
        fs::write(
            dir.join(format!("{phase:02}-{:02}-PLAN.md", i + 1)),
            "---\ngap_closure: true\n---\n",
        )
        .unwrap();
    }
}

fn stop(project: &Path) -> Command {
    let mut cmd = autochain();
    cmd.arg("--project").arg(project).arg("stop");
    cmd
}

#[test]
fn test_help() {
    autochain()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("phase chaining"));
}

#[test]
fn test_version() {
    autochain()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

// ============================================================================
// Stop hook
// ============================================================================

#[test]
fn test_stop_continues_from_signal() {
    let temp = planning_project(true);
    write_signal(temp.path(), "execute-phase 3\n");

    stop(temp.path())
        .write_stdin(r#"{"stop_hook_active": false}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""decision":"block""#))
        .stdout(predicate::str::contains("/gsd:execute-phase 3"));

    assert!(!signal_exists(temp.path()));
}

#[test]
fn test_stop_second_run_is_silent() {
    let temp = planning_project(true);
    write_signal(temp.path(), "plan-phase 4\n");

    stop(temp.path())
        .write_stdin("{}")
        .assert()
        .success()
        .stdout(predicate::str::contains("/gsd:plan-phase 4"));

    stop(temp.path())
        .write_stdin("{}")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_stop_uses_cwd_from_hook_input() {
    let temp = planning_project(true);
    write_signal(temp.path(), "execute-phase 2\n");

    let input = serde_json::json!({
        "stop_hook_active": false,
        "cwd": temp.path(),
    });

    autochain()
        .env_remove("AUTOCHAIN_PROJECT_DIR")
        .arg("stop")
        .write_stdin(input.to_string())
        .assert()
        .success()
        .stdout(predicate::str::contains("/gsd:execute-phase 2"));
}

#[test]
fn test_stop_auto_mode_off_discards_signal() {
    let temp = planning_project(false);
    write_signal(temp.path(), "execute-phase 3\n");

    stop(temp.path())
        .write_stdin("{}")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert!(!signal_exists(temp.path()));
}

#[test]
fn test_stop_without_planning_dir() {
    let temp = TempDir::new().unwrap();

    stop(temp.path())
        .write_stdin("{}")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_stop_reentrant_discards_signal() {
    let temp = planning_project(true);
    write_signal(temp.path(), "execute-phase 3\n");

    stop(temp.path())
        .write_stdin(r#"{"stop_hook_active": true}"#)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert!(!signal_exists(temp.path()));

    // The next ordinary stop has nothing left to replay.
    stop(temp.path())
        .write_stdin("{}")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_stop_allow_reentry() {
    let temp = planning_project(true);
    write_signal(temp.path(), "execute-phase 3\n");

    stop(temp.path())
        .arg("--allow-reentry")
        .write_stdin(r#"{"stop_hook_active": true}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("/gsd:execute-phase 3"));
}

#[test]
fn test_stop_gap_guardrail() {
    let temp = planning_project(true);
    write_signal(temp.path(), "plan-phase 2 --gaps\n");
    add_gap_plans(temp.path(), 2, 3);

    stop(temp.path())
        .write_stdin("{}")
        .assert()
        .success()
        .stdout(predicate::str::contains("systemMessage"))
        .stdout(predicate::str::contains("manual review"))
        .stdout(predicate::str::contains("block").not());

    assert!(!signal_exists(temp.path()));
}

#[test]
fn test_stop_gap_limit_option() {
    let temp = planning_project(true);
    write_signal(temp.path(), "plan-phase 2 --gaps\n");
    add_gap_plans(temp.path(), 2, 3);

    stop(temp.path())
        .args(["--gap-limit", "5"])
        .write_stdin("{}")
        .assert()
        .success()
        .stdout(predicate::str::contains("/gsd:plan-phase 2 --gaps"));
}

#[test]
fn test_stop_malformed_input_is_silent() {
    let temp = planning_project(true);
    write_signal(temp.path(), "execute-phase 3\n");

    stop(temp.path())
        .write_stdin("{not json")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert!(signal_exists(temp.path()));
}

#[test]
fn test_stop_input_never_closed_exits_cleanly() {
    let temp = planning_project(true);
    write_signal(temp.path(), "execute-phase 3\n");

    let mut child = std::process::Command::new(cargo::cargo_bin!("autochain"))
        .arg("--project")
        .arg(temp.path())
        .args(["stop", "--input-timeout-ms", "100"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    // Keep our end of stdin open so the hook never sees EOF.
    let _stdin = child.stdin.take();
    let output = child.wait_with_output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
    assert!(signal_exists(temp.path()));
}

#[test]
fn test_stop_empty_input_is_silent() {
    let temp = planning_project(true);

    stop(temp.path())
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

// ============================================================================
// Transcript mode
// ============================================================================

fn transcript_input(temp: &TempDir, content: &str) -> String {
    let transcript = temp.path().join("session.jsonl");
    fs::write(&transcript, content).unwrap();
    serde_json::json!({
        "stop_hook_active": false,
        "transcript_path": transcript,
    })
    .to_string()
}

#[test]
fn test_transcript_planned_banner() {
    let temp = planning_project(true);
    let input = transcript_input(&temp, "working...\nGSD \u{25ba} PHASE 1 PLANNED \u{2713}\n");

    stop(temp.path())
        .args(["--mode", "transcript"])
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("/gsd:execute-phase 1"));
}

#[test]
fn test_transcript_error_banner_stops() {
    let temp = planning_project(true);
    let input = transcript_input(
        &temp,
        "PHASE 1 PLANNED\n\u{2554}\u{2550}\u{2550}\u{2550}\n\u{2551}  ERROR\n",
    );

    stop(temp.path())
        .args(["--mode", "transcript"])
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_transcript_mode_from_env() {
    let temp = planning_project(true);
    let input = transcript_input(&temp, "PHASE 5 COMPLETE\n");

    stop(temp.path())
        .env("AUTOCHAIN_MODE", "transcript")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("/gsd:plan-phase 6"));
}

#[test]
fn test_auto_mode_falls_back_to_transcript() {
    let temp = planning_project(true);
    let input = transcript_input(&temp, "PHASE 2 GAPS FOUND\n");

    stop(temp.path())
        .args(["--mode", "auto"])
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("/gsd:plan-phase 2 --gaps"));
}

// ============================================================================
// Management commands
// ============================================================================

#[test]
fn test_signal_writes_file() {
    let temp = planning_project(true);

    autochain()
        .arg("--project")
        .arg(temp.path())
        .args(["signal", "plan-phase", "4", "--gaps"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/gsd:plan-phase 4 --gaps"));

    let content = fs::read_to_string(temp.path().join(".planning/.auto-next")).unwrap();
    assert_eq!(content, "plan-phase 4 --gaps\n");
}

#[test]
fn test_signal_blank_fails() {
    let temp = planning_project(true);

    autochain()
        .arg("--project")
        .arg(temp.path())
        .args(["signal", " "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_auto_on_preserves_other_keys() {
    let temp = planning_project(false);

    autochain()
        .arg("--project")
        .arg(temp.path())
        .args(["auto", "on"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Auto mode enabled"));

    let raw = fs::read_to_string(temp.path().join(".planning/config.json")).unwrap();
    let config: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(config["auto_mode"], true);
    assert_eq!(config["mode"], "interactive");
}

#[test]
fn test_auto_off() {
    let temp = planning_project(true);

    autochain()
        .arg("--project")
        .arg(temp.path())
        .args(["auto", "off"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Auto mode disabled"));

    let raw = fs::read_to_string(temp.path().join(".planning/config.json")).unwrap();
    assert!(raw.contains("false"));
}

#[test]
fn test_status_json() {
    let temp = planning_project(true);
    write_signal(temp.path(), "execute-phase 2\n");
    add_gap_plans(temp.path(), 2, 1);

    let output = autochain()
        .arg("--project")
        .arg(temp.path())
        .args(["status", "--phase", "2", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let status: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["auto_mode"], true);
    assert_eq!(status["pending_signal"], "/gsd:execute-phase 2");
    assert_eq!(status["artifacts"]["gap_closure_plans"], 1);

    // Status never consumes the signal.
    assert!(signal_exists(temp.path()));
}

#[test]
fn test_status_text() {
    let temp = planning_project(false);

    autochain()
        .arg("--project")
        .arg(temp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Auto-Mode Status"))
        .stdout(predicate::str::contains("Next signal"));
}

#[test]
fn test_invalid_project_dir() {
    autochain()
        .arg("--project")
        .arg("/nonexistent/path/that/does/not/exist")
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}
