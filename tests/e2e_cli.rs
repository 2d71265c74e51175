//! CLI end-to-end tests
//!
//! Tests for the initseg command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

const SPS_1080P_HEX: &str = "6742c028d900780227e584000003000400000300f03c60c920";

/// Get a command for the initseg binary
#[allow(deprecated)]
fn initseg_cmd() -> Command {
    Command::cargo_bin("initseg").unwrap()
}

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("crates/initseg-fmp4/tests/fixtures")
}

fn write_config(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("initseg.toml");
    fs::write(&path, body).unwrap();
    path
}

fn video_audio_config() -> String {
    format!(
        r#"
[logging]
filter = "initseg=debug"

[[tracks]]
codec = "h264"
id = 1
sps = "{}"
pps = "08"

[[tracks]]
codec = "mpeg4-audio"
id = 2
sample_rate = 44100
channels = 2
"#,
        SPS_1080P_HEX
    )
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = initseg_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = initseg_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("initseg"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_flag() {
    let mut cmd = initseg_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("initseg"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = initseg_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_inspect_help() {
    let mut cmd = initseg_cmd();
    cmd.args(["inspect", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Inspect an init segment"));
}

#[test]
fn test_cli_inspect_fixture() {
    let mut cmd = initseg_cmd();
    cmd.arg("inspect")
        .arg(fixtures_dir().join("video_audio.mp4"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Tracks: 2"))
        .stdout(predicate::str::contains("[1] video avc1.42c028 1920x1080"))
        .stdout(predicate::str::contains("[2] audio mp4a.40.2 44100 Hz 2ch"));
}

#[test]
fn test_cli_inspect_json() {
    let mut cmd = initseg_cmd();
    let output = cmd
        .args(["inspect", "--json"])
        .arg(fixtures_dir().join("captured_audio.mp4"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let tracks = json.as_array().unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0]["id"], 257);
    assert_eq!(tracks[0]["timescale"], 10_000_000);
    assert_eq!(tracks[0]["sample_rate"], 48000);
    assert_eq!(tracks[0]["config"], "1190");
}

#[test]
fn test_cli_inspect_nonexistent_file() {
    let mut cmd = initseg_cmd();
    cmd.args(["inspect", "/nonexistent/path/init.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not exist"));
}

#[test]
fn test_cli_inspect_rejects_garbage() {
    let temp = tempdir().unwrap();
    let file = temp.path().join("garbage.mp4");
    fs::write(&file, b"not an mp4 at all").unwrap();

    let mut cmd = initseg_cmd();
    cmd.arg("inspect")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to decode init segment"));
}

#[test]
fn test_cli_build_matches_golden_segment() {
    let temp = tempdir().unwrap();
    let config_file = write_config(temp.path(), &video_audio_config());
    let output = temp.path().join("init.mp4");

    let mut cmd = initseg_cmd();
    cmd.arg("--config")
        .arg(&config_file)
        .arg("build")
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 tracks"));

    let built = fs::read(&output).unwrap();
    let golden = fs::read(fixtures_dir().join("video_audio.mp4")).unwrap();
    assert_eq!(built, golden);
}

#[test]
fn test_cli_build_then_inspect() {
    let temp = tempdir().unwrap();
    let config_file = write_config(
        temp.path(),
        r#"
[[tracks]]
codec = "mpeg4-audio"
id = 7
timescale = 48000
sample_rate = 48000
channels = 6
"#,
    );
    let output = temp.path().join("audio.mp4");

    initseg_cmd()
        .args(["build", "-c"])
        .arg(&config_file)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    initseg_cmd()
        .arg("inspect")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("[7] audio mp4a.40.2 48000 Hz 6ch, timescale 48000"));
}

#[test]
fn test_cli_validate_config() {
    let temp = tempdir().unwrap();
    let config_file = write_config(temp.path(), &video_audio_config());

    let mut cmd = initseg_cmd();
    cmd.arg("validate")
        .arg(&config_file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Tracks: 2"));
}

#[test]
fn test_cli_validate_rejects_duplicate_ids() {
    let temp = tempdir().unwrap();
    let config_file = write_config(
        temp.path(),
        r#"
[[tracks]]
codec = "mpeg4-audio"
id = 1
sample_rate = 48000
channels = 2

[[tracks]]
codec = "mpeg4-audio"
id = 1
sample_rate = 44100
channels = 2
"#,
    );

    let mut cmd = initseg_cmd();
    cmd.arg("validate")
        .arg(&config_file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("more than once"));
}

#[test]
fn test_cli_validate_rejects_bad_hex() {
    let temp = tempdir().unwrap();
    let config_file = write_config(
        temp.path(),
        r#"
[[tracks]]
codec = "h264"
id = 1
sps = "zz"
pps = "08"
"#,
    );

    let mut cmd = initseg_cmd();
    cmd.arg("validate")
        .arg(&config_file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid hex"));
}

#[test]
fn test_cli_validate_without_config() {
    let mut cmd = initseg_cmd();
    cmd.arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("using defaults"));
}
