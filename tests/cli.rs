mod common;

use assert_cmd::Command;
use common::{blank_png, qr_png};
use predicates::str::contains;
use std::fs;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("vcverify").unwrap();
    cmd.env_remove("VCVERIFY_URL").env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_flags() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("--qr-text"))
        .stdout(contains("--scan-only"))
        .stdout(contains("--first-hit"));
}

#[test]
fn url_is_required_for_verification() {
    cmd()
        .args(["--qr-text", "anything"])
        .assert()
        .failure()
        .stderr(contains("--url"));
}

#[test]
fn file_and_qr_text_conflict() {
    cmd()
        .args(["card.png", "--qr-text", "x", "--url", "http://127.0.0.1:9/"])
        .assert()
        .failure();
}

#[test]
fn undecodable_qr_text_prints_failure() {
    cmd()
        .args([
            "--qr-text",
            "!!not a credential!!",
            "--url",
            "http://127.0.0.1:9/verify",
            "--compact",
            "--no-progress",
        ])
        .assert()
        .failure()
        .stdout(contains(r#""status":"FAILURE""#))
        .stdout(contains(r#""data":{}"#));
}

#[test]
fn scan_only_prints_decoded_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("card.png");
    fs::write(&path, qr_png("scanned-by-cli")).unwrap();

    cmd()
        .arg(&path)
        .args(["--scan-only", "--compact", "--no-progress"])
        .assert()
        .success()
        .stdout(contains(r#""data":"scanned-by-cli""#));
}

#[test]
fn scan_only_blank_image_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blank.png");
    fs::write(&path, blank_png()).unwrap();

    cmd()
        .arg(&path)
        .args(["--scan-only", "--compact", "--no-progress"])
        .assert()
        .failure()
        .stdout(contains("No QRCode found"))
        .stdout(contains(r#""data":null"#));
}

#[test]
fn missing_input_file_is_an_error() {
    cmd()
        .args(["/nonexistent/card.png", "--scan-only", "--no-progress"])
        .assert()
        .failure()
        .stderr(contains("Failed to read"));
}
