//! Instance lock / single-writer guarantee:
//! a second `fabd` pointed at the same `FAB_DIR` refuses to start while
//! the first is alive.

use std::process::{Command, Stdio};

use crate::prelude::Daemon;

fn fabd_binary() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("target/debug/fabd")
}

#[test]
fn second_daemon_on_same_fab_dir_refuses_to_start() {
    let daemon = Daemon::start();

    let mut cmd = Command::new(fabd_binary());
    cmd.env("FAB_DIR", daemon.fab_dir());
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    let output = cmd.output().expect("second fabd should run to completion");

    assert!(!output.status.success(), "a second fabd on a live FAB_DIR must refuse to start");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("already running"), "stderr: {stderr}");
}

#[test]
fn socket_and_pid_file_are_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let daemon = Daemon::start();

    let socket_path = daemon.fab_dir().join("fabd.sock");
    let pid_path = daemon.fab_dir().join("fabd.pid");

    let socket_mode = std::fs::metadata(&socket_path).expect("socket exists").permissions().mode() & 0o777;
    let pid_mode = std::fs::metadata(&pid_path).expect("pid file exists").permissions().mode() & 0o777;

    assert_eq!(socket_mode, 0o600, "socket should be owner-only (0600)");
    assert_eq!(pid_mode, 0o600, "pid file should be owner-only (0600)");
}
