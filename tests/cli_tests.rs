//! Command-surface checks driven through the real binary.

use std::process::Command;

fn apkforge() -> Command {
    Command::new(env!("CARGO_BIN_EXE_apkforge"))
}

#[test]
fn no_arguments_prints_usage_and_fails() {
    let output = apkforge().output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage:"));
    assert!(stderr.contains("unpack"));
    assert!(stderr.contains("pack"));
}

#[test]
fn unknown_subcommand_fails() {
    let output = apkforge().arg("repack").arg("x").output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn version_flag_reports_the_crate_version() {
    let output = apkforge().arg("--version").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unpack_failure_exits_nonzero_with_an_error_message() {
    let temp = tempfile::TempDir::new().unwrap();
    let output = apkforge()
        .arg("unpack")
        .arg(temp.path().join("missing.apk"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(!output.stderr.is_empty());
}

#[test]
fn pack_failure_exits_nonzero_with_an_error_message() {
    let temp = tempfile::TempDir::new().unwrap();
    let output = apkforge()
        .arg("pack")
        .arg(temp.path().join("missing-dir"))
        .arg(temp.path().join("out.apk"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(!output.stderr.is_empty());
}
