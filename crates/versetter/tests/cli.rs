//! End-to-end CLI integration tests
//!
//! These tests invoke the compiled binary as a subprocess to verify
//! that the CLI behaves correctly from a user's perspective.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
///
/// Note: `cargo_bin` is marked deprecated for edge cases involving custom
/// cargo build directories, but works correctly for standard project layouts.
#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

/// A command running in `dir`, isolated from the user's config and log env.
fn cmd_in(dir: &Path) -> Command {
    let mut cmd = cmd();
    cmd.current_dir(dir)
        .env("XDG_CONFIG_HOME", dir.join(".xdg"))
        .env_remove("RUST_LOG")
        .env_remove("VERSETTER_LOG_PATH")
        .env_remove("VERSETTER_LOG_DIR");
    cmd
}

fn write_record(dir: &Path, yaml: &str) {
    fs::write(dir.join("version.yaml"), yaml).unwrap();
}

fn json_report(dir: &Path, args: &[&str]) -> serde_json::Value {
    let output = cmd_in(dir).args(args).arg("--json").output().unwrap();
    assert!(output.status.success(), "{output:?}");
    serde_json::from_slice(&output.stdout).unwrap()
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_shows_usage() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--incmajor"))
        .stdout(predicate::str::contains("ENVIRONMENTS:"));
}

#[test]
fn short_help_flag_shows_usage() {
    cmd()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn version_flag_shows_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_flag_is_a_usage_error() {
    cmd().arg("--frobnicate").assert().failure().code(2);
}

// =============================================================================
// Record & Bumps
// =============================================================================

#[test]
fn first_run_creates_initial_record() {
    let tmp = TempDir::new().unwrap();

    cmd_in(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("actual version"))
        .stdout(predicate::str::contains("0.0.1"));

    assert!(tmp.path().join("version.yaml").is_file());
}

#[test]
fn increments_are_independent() {
    let tmp = TempDir::new().unwrap();
    write_record(tmp.path(), "major: 1\nminor: 2\npatch: 3\nprerelease: \"\"\n");

    let report = json_report(tmp.path(), &["-n", "-m", "-i"]);
    assert_eq!(report["previous"], "1.2.3");
    assert_eq!(report["current"], "2.3.4");
    assert_eq!(report["changed"], true);
    assert_eq!(report["changes"][0]["kind"], "major");
    assert_eq!(report["changes"][0]["value"], 2);

    let again = json_report(tmp.path(), &[]);
    assert_eq!(again["previous"], "2.3.4");
    assert_eq!(again["changed"], false);
}

#[test]
fn prerelease_set_and_cleared() {
    let tmp = TempDir::new().unwrap();
    write_record(tmp.path(), "major: 1\nminor: 0\npatch: 0\n");

    let report = json_report(tmp.path(), &["-p", "beta.1"]);
    assert_eq!(report["current"], "1.0.0-beta.1");

    let report = json_report(tmp.path(), &["--pre", " "]);
    assert_eq!(report["previous"], "1.0.0-beta.1");
    assert_eq!(report["current"], "1.0.0");
    assert_eq!(report["changes"][0]["kind"], "prerelease-cleared");
}

#[test]
fn human_output_lists_changes() {
    let tmp = TempDir::new().unwrap();
    write_record(tmp.path(), "major: 0\nminor: 4\npatch: 0\n");

    cmd_in(tmp.path())
        .args(["--color", "never", "-m", "-p", "rc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("actual version: 0.4.0"))
        .stdout(predicate::str::contains("increment minor: 5"))
        .stdout(predicate::str::contains("prerelease changed: rc"))
        .stdout(predicate::str::contains("version for processing: 0.5.0-rc"));
}

#[test]
fn version_file_flag_moves_record() {
    let tmp = TempDir::new().unwrap();

    cmd_in(tmp.path())
        .args(["--version-file", "meta.yaml", "-i"])
        .assert()
        .success();

    assert!(tmp.path().join("meta.yaml").is_file());
    assert!(!tmp.path().join("version.yaml").exists());
}

#[test]
fn chdir_flag_runs_elsewhere() {
    let tmp = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();

    cmd_in(elsewhere.path())
        .args(["-C", tmp.path().to_str().unwrap()])
        .assert()
        .success();

    assert!(tmp.path().join("version.yaml").is_file());
}

// =============================================================================
// Targets
// =============================================================================

#[test]
fn npm_target_rewritten() {
    let tmp = TempDir::new().unwrap();
    write_record(tmp.path(), "major: 0\nminor: 0\npatch: 9\n");
    fs::write(
        tmp.path().join("package.json"),
        r#"{"name":"x","version":"0.0.1"}"#,
    )
    .unwrap();

    let report = json_report(tmp.path(), &["-i", "-e", "npm", "-f", "package.json"]);
    assert_eq!(report["target"]["status"], "rewritten");
    assert_eq!(report["target"]["environment"], "npm");
    assert_eq!(
        fs::read_to_string(tmp.path().join("package.json")).unwrap(),
        r#"{"name":"x","version":"0.0.10"}"#
    );
}

#[test]
fn npm_without_version_field_is_reported_and_untouched() {
    let tmp = TempDir::new().unwrap();
    let original = "{\"name\": \"x\"}\n";
    fs::write(tmp.path().join("package.json"), original).unwrap();

    let report = json_report(tmp.path(), &["-e", "npm", "-f", "package.json"]);
    assert_eq!(report["target"]["status"], "failed");
    assert_eq!(report["target"]["error"], "version field not present");
    assert_eq!(
        fs::read_to_string(tmp.path().join("package.json")).unwrap(),
        original
    );
}

#[test]
fn iss_define_inserted_then_replaced() {
    let tmp = TempDir::new().unwrap();
    write_record(tmp.path(), "major: 1\nminor: 0\npatch: 0\n");
    let script = tmp.path().join("setup.iss");
    fs::write(&script, "[Setup]\r\n").unwrap();

    for _ in 0..2 {
        cmd_in(tmp.path())
            .args(["-e", "iss", "-f", "setup.iss", "-o", "AppVer"])
            .assert()
            .success();
    }

    assert_eq!(
        fs::read_to_string(&script).unwrap(),
        ";version number set by GoVersionSetter.\r\n#define AppVer \"1.0.0\"\r\n[Setup]\r\n"
    );
}

#[test]
fn txt_line_rewritten_with_template() {
    let tmp = TempDir::new().unwrap();
    write_record(tmp.path(), "major: 2\nminor: 0\npatch: 0\nprerelease: dev\n");
    fs::write(tmp.path().join("VERSION.txt"), "a\nb\nc").unwrap();

    cmd_in(tmp.path())
        .args(["-e", "txt", "-f", "VERSION.txt", "-o", "1,X=%s"])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(tmp.path().join("VERSION.txt")).unwrap(),
        "a\nX=2.0.0\nc"
    );
}

#[test]
fn go_blob_written() {
    let tmp = TempDir::new().unwrap();
    write_record(tmp.path(), "major: 3\nminor: 1\npatch: 4\nprerelease: rc\n");

    cmd_in(tmp.path())
        .args(["-e", "go", "-f", "version.json"])
        .assert()
        .success();

    let blob: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(tmp.path().join("version.json")).unwrap())
            .unwrap();
    assert_eq!(blob["Major"], 3);
    assert_eq!(blob["Special"], "rc");
}

#[test]
fn vs_project_rewritten() {
    let tmp = TempDir::new().unwrap();
    write_record(tmp.path(), "major: 1\nminor: 2\npatch: 0\nprerelease: beta\n");
    let project = tmp.path().join("app.csproj");
    fs::write(
        &project,
        "<Project Sdk=\"Microsoft.NET.Sdk\">\n  <PropertyGroup>\n    <Version>0.0.1</Version>\n  </PropertyGroup>\n</Project>\n",
    )
    .unwrap();

    cmd_in(tmp.path())
        .args(["-e", "vs", "-f", "app.csproj"])
        .assert()
        .success();

    assert!(
        fs::read_to_string(&project)
            .unwrap()
            .contains("<Version>1.2.0</Version>")
    );
}

#[cfg(unix)]
#[test]
fn vs_unreadable_project_fails_the_run() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("app.csproj")).unwrap();

    cmd_in(tmp.path())
        .args(["-e", "vs", "-f", "app.csproj"])
        .assert()
        .failure();
}

#[test]
fn vs_non_utf8_project_is_skipped() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path().join("app.csproj");
    let original: &[u8] =
        b"<Project><PropertyGroup><Company>M\xfcller</Company><Version>0</Version></PropertyGroup></Project>";
    fs::write(&project, original).unwrap();

    cmd_in(tmp.path())
        .args(["--color", "never", "-e", "vs", "-f", "app.csproj"])
        .assert()
        .success()
        .stderr(predicate::str::contains("target not updated"));

    assert_eq!(fs::read(&project).unwrap(), original);
}

#[test]
fn missing_target_file_still_succeeds() {
    let tmp = TempDir::new().unwrap();

    cmd_in(tmp.path())
        .args(["-e", "npm", "-f", "nope.json"])
        .assert()
        .success();

    assert!(!tmp.path().join("nope.json").exists());
}

#[test]
fn unknown_environment_is_a_no_op() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Cargo.toml"), "[package]\n").unwrap();

    let report = json_report(tmp.path(), &["-e", "cargo", "-f", "Cargo.toml"]);
    assert_eq!(report["target"]["status"], "unknown-environment");
    assert_eq!(
        fs::read_to_string(tmp.path().join("Cargo.toml")).unwrap(),
        "[package]\n"
    );
}

#[test]
fn no_environment_means_no_target() {
    let tmp = TempDir::new().unwrap();
    let report = json_report(tmp.path(), &["-f", "package.json"]);
    assert!(report.get("target").is_none());
}

// =============================================================================
// Logging
// =============================================================================

#[test]
fn quiet_suppresses_warnings() {
    let tmp = TempDir::new().unwrap();

    cmd_in(tmp.path())
        .args(["-q", "-e", "npm", "-f", "nope.json"])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn skipped_rewrite_warns_on_stderr() {
    let tmp = TempDir::new().unwrap();

    cmd_in(tmp.path())
        .args(["--color", "never", "-e", "npm", "-f", "nope.json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("target not updated"));
}

#[test]
fn log_path_env_writes_jsonl() {
    let tmp = TempDir::new().unwrap();
    let log = tmp.path().join("logs").join("run.jsonl");

    cmd_in(tmp.path())
        .env("VERSETTER_LOG_PATH", &log)
        .arg("-v")
        .assert()
        .success();

    let logs_dir = tmp.path().join("logs");
    let written: String = fs::read_dir(&logs_dir)
        .unwrap()
        .filter_map(Result::ok)
        .map(|entry| fs::read_to_string(entry.path()).unwrap_or_default())
        .collect();
    assert!(written.contains("\"level\":\"debug\""));
}
