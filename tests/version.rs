//! Integration test: Verify binary prints correct version

use std::process::Command;

#[test]
fn binary_prints_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_gridscale"))
        .arg("--version")
        .output()
        .expect("Failed to execute binary");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(
        stdout.contains(env!("CARGO_PKG_VERSION")),
        "Expected output to contain version '{}', but got: {}",
        env!("CARGO_PKG_VERSION"),
        stdout
    );
}

#[test]
fn binary_reports_missing_score_file() {
    let output = Command::new(env!("CARGO_BIN_EXE_gridscale"))
        .arg("/nonexistent/gridscale/score.json")
        .env("GRIDSCALE_LOG", std::env::temp_dir().join("gridscale-version-test.log"))
        .env("GRIDSCALE_CONFIG", "/nonexistent/gridscale/config.toml")
        .output()
        .expect("Failed to execute binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("FileNotFound"),
        "Expected a file-not-found error, got: {}",
        stderr
    );
}
