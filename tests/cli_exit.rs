//! Exit behaviour of the `entry-reconciler` binary.

use std::process::Command;
use tempfile::TempDir;

// =============================================================================
// Fatal Errors
// =============================================================================

#[test]
fn test_fatal_error_reported_once() {
    let workdir = TempDir::new().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_entry-reconciler"))
        .current_dir(workdir.path())
        .env_clear()
        .arg("--log-file")
        .arg(workdir.path().join("run.log"))
        .output()
        .unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stderr.matches("Missing required configuration").count(),
        1,
        "{}",
        stderr
    );

    let logged = std::fs::read_to_string(workdir.path().join("run.log")).unwrap();
    assert_eq!(logged.matches("Missing required configuration").count(), 1);
}
