//! Exit codes and artifacts of the three binaries.

mod common;

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;

use common::{click_wav, corrupt_last_sample, read, Workspace};

fn compare(bin: &str, expected: &Path, actual: &Path, output: &Path) -> Output {
    Command::new(bin)
        .arg("--expected")
        .arg(expected)
        .arg("--actual")
        .arg(actual)
        .arg("--output")
        .arg(output)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn compare_json(expected: &Path, actual: &Path, output: &Path) -> Output {
    compare(env!("CARGO_BIN_EXE_compare_json"), expected, actual, output)
}

fn compare_wav(expected: &Path, actual: &Path, output: &Path) -> Output {
    compare(env!("CARGO_BIN_EXE_compare_wav"), expected, actual, output)
}

fn run_conformance(ws: &Workspace, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_run_conformance"))
        .arg("--build-dir")
        .arg(ws.build_dir())
        .arg("--fixtures")
        .arg(ws.fixtures())
        .arg("--output")
        .arg(ws.output_dir())
        .arg("--diff")
        .arg(ws.diff_dir())
        .args(extra)
        .env_remove("ORPHEUS_MINHOST")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn code(output: &Output) -> i32 {
    output.status.code().unwrap_or(-1)
}

#[test]
fn compare_json_exit_codes() {
    let dir = tempfile::tempdir().unwrap();
    let expected = dir.path().join("expected.json");
    let actual = dir.path().join("actual.json");
    let out = dir.path().join("out");
    fs::write(&expected, r#"{"a": 1, "b": [1, 2]}"#).unwrap();
    fs::write(&actual, "{\"b\": [1, 2],\n \"a\": 1}").unwrap();

    let output = compare_json(&expected, &actual, &out);
    assert_eq!(code(&output), 0);
    assert!(!out.join("diff.patch").exists());

    fs::write(&actual, r#"{"a": 2, "b": [1, 2]}"#).unwrap();
    let output = compare_json(&expected, &actual, &out);
    assert_eq!(code(&output), 1);
    assert!(read(&out.join("diff.patch")).contains("+  \"a\": 2,"));

    let output = compare_json(&dir.path().join("missing.json"), &actual, &out);
    assert_eq!(code(&output), 2);
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.json"));
}

#[test]
fn compare_wav_exit_codes() {
    let dir = tempfile::tempdir().unwrap();
    let expected = dir.path().join("expected.wav");
    let actual = dir.path().join("actual.wav");
    let out = dir.path().join("out");
    fs::write(&expected, click_wav()).unwrap();
    fs::write(&actual, click_wav()).unwrap();

    assert_eq!(code(&compare_wav(&expected, &actual, &out)), 0);
    assert!(!out.join("diff.txt").exists());

    fs::write(&actual, corrupt_last_sample(&click_wav())).unwrap();
    let output = compare_wav(&expected, &actual, &out);
    assert_eq!(code(&output), 1);
    assert_eq!(
        read(&out.join("diff.txt")),
        "audio payload differs\n  first mismatch at byte 15\n"
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("FAIL"));

    fs::write(&actual, b"RIFF but not really").unwrap();
    assert_eq!(code(&compare_wav(&expected, &actual, &out)), 2);
}

#[test]
fn run_conformance_without_subject_is_config_error() {
    let ws = Workspace::new();
    let output = run_conformance(&ws, &[]);

    assert_eq!(code(&output), 2);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unable to locate orpheus_minhost"));
    assert!(!ws.output_dir().exists());
}

#[cfg(unix)]
#[test]
fn run_conformance_pass_and_fail() {
    let ws = Workspace::new();
    ws.install_subject();
    ws.write_manifest(&["click_a", "click_b"]);

    let output = run_conformance(&ws, &[]);
    assert_eq!(
        code(&output),
        0,
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(!ws.diff_dir().exists());
    assert!(ws.output_dir().join("click_b").join("actual.wav").exists());

    ws.set_subject_output(common::RENDER_JSON, &corrupt_last_sample(&click_wav()));
    let output = run_conformance(&ws, &[]);
    assert_eq!(code(&output), 1);

    let summary: serde_json::Value =
        serde_json::from_str(&read(&ws.diff_dir().join("summary.json"))).unwrap();
    assert_eq!(
        summary,
        serde_json::json!({"failed": ["click_a", "click_b"], "total": 2})
    );
}

#[cfg(unix)]
#[test]
fn run_conformance_json_report() {
    let ws = Workspace::new();
    let subject = ws.install_subject();
    ws.write_manifest(&["click"]);

    let output = run_conformance(
        &ws,
        &["--json", "--minhost", subject.to_str().unwrap()],
    );
    assert_eq!(code(&output), 0);

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["summary"], serde_json::json!({"failed": [], "total": 1}));
    assert_eq!(report["cases"][0]["name"], "click");
    assert_eq!(report["cases"][0]["status"], "passed");
}
