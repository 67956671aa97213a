//! End-to-end tests driving the `camlog` binary.
//!
//! Tests the full pipeline: discovery → per-session merge → second pass.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn camlog_binary() -> String {
    env!("CARGO_BIN_EXE_camlog").to_string()
}

/// Runs camlog with a scratch HOME so no user config leaks in.
fn camlog(home: &Path, args: &[&str]) -> Output {
    Command::new(camlog_binary())
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run camlog")
}

fn write_capture(dir: &Path) {
    fs::write(
        dir.join("Camx_OfflineLog_Tid7_Session1_Segment0.txt"),
        "01-01 00:00:01.000000000 hello\n",
    )
    .unwrap();
    fs::write(
        dir.join("Camx_OfflineLog_Tid7_Session1_Segment1.txt"),
        "01-01 00:00:02.000000000 world\n",
    )
    .unwrap();
    fs::write(dir.join("other.log"), "01-01 00:00:00.000001 start\n").unwrap();
}

const EXPECTED: &str = "01-01 00:00:00.000001000 start\n\
                        01-01 00:00:01.000000000 hello\n\
                        01-01 00:00:02.000000000 world\n";

#[test]
fn test_merge_capture_directory() {
    let home = TempDir::new().unwrap();
    let capture = TempDir::new().unwrap();
    write_capture(capture.path());
    let out = capture.path().join("out.txt");

    let output = camlog(
        home.path(),
        &["merge", capture.path().to_str().unwrap()],
    );

    assert!(
        output.status.success(),
        "camlog merge should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(fs::read_to_string(&out).unwrap(), EXPECTED);
    assert!(!capture.path().join("~out.txt").exists());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Found 2 files from 1 sessions"), "stderr: {stderr}");
    assert!(stderr.contains("Merging session 1 with in_memory merge"));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Merged 3 lines"), "stdout: {stdout}");
}

#[test]
fn test_merge_twice_is_identical() {
    let home = TempDir::new().unwrap();
    let capture = TempDir::new().unwrap();
    write_capture(capture.path());
    let dir = capture.path().to_str().unwrap();

    assert!(camlog(home.path(), &["merge", dir, "-q"]).status.success());
    let first = fs::read(capture.path().join("out.txt")).unwrap();
    assert!(camlog(home.path(), &["merge", dir, "-q"]).status.success());
    let second = fs::read(capture.path().join("out.txt")).unwrap();

    assert_eq!(first, second);
    assert_eq!(String::from_utf8(first).unwrap(), EXPECTED);
}

#[test]
fn test_merge_explicit_output_and_quiet() {
    let home = TempDir::new().unwrap();
    let capture = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    write_capture(capture.path());
    let out = dest.path().join("merged.txt");

    let output = camlog(
        home.path(),
        &[
            "merge",
            capture.path().to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
            "--quiet",
        ],
    );

    assert!(output.status.success());
    assert!(output.stderr.is_empty(), "quiet run should not print progress");
    assert_eq!(fs::read_to_string(&out).unwrap(), EXPECTED);
    assert!(!capture.path().join("out.txt").exists());
}

#[test]
fn test_merge_invalid_directory_fails() {
    let home = TempDir::new().unwrap();
    let missing = home.path().join("missing");

    let output = camlog(home.path(), &["merge", missing.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid input directory"), "stderr: {stderr}");
    assert!(!missing.join("out.txt").exists());
}

#[test]
fn test_config_file_selects_streaming_merge() {
    let home = TempDir::new().unwrap();
    let capture = TempDir::new().unwrap();
    write_capture(capture.path());
    let config = home.path().join("camlog.toml");
    fs::write(&config, "size_threshold = 1\n").unwrap();

    let output = camlog(
        home.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "merge",
            capture.path().to_str().unwrap(),
        ],
    );

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Merging session 1 with streaming merge"), "stderr: {stderr}");
    assert_eq!(
        fs::read_to_string(capture.path().join("out.txt")).unwrap(),
        EXPECTED
    );
}

#[test]
fn test_scan_json() {
    let home = TempDir::new().unwrap();
    let capture = TempDir::new().unwrap();
    write_capture(capture.path());

    let output = camlog(
        home.path(),
        &["scan", capture.path().to_str().unwrap(), "--json"],
    );

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["sessions"].as_array().unwrap().len(), 1);
    assert_eq!(report["sessions"][0]["threads"][0]["thread_id"], "7");
    assert_eq!(report["others"][0]["name"], "other.log");
}

#[test]
fn test_no_subcommand_prints_help() {
    let home = TempDir::new().unwrap();

    let output = camlog(home.path(), &[]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Usage:"));
}
