//! `fab`/`fabd` argument parsing that doesn't require a running daemon.

use std::process::{Command, Stdio};

fn fab_cmd() -> Command {
    // Re-resolve the same way the prelude does, via a throwaway daemon-less
    // builder: just shell out directly since `--help`/`--version` never
    // touch `FAB_DIR`.
    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let path = manifest_dir.join("target/debug/fab");
    Command::new(path)
}

#[test]
fn fab_help_lists_subcommands() {
    let output = fab_cmd().arg("--help").output().expect("fab --help should run");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("project"));
    assert!(stdout.contains("agent"));
    assert!(stdout.contains("attach"));
}

#[test]
fn fab_unknown_subcommand_fails() {
    let mut cmd = fab_cmd();
    cmd.arg("not-a-real-command");
    cmd.stdout(Stdio::null()).stderr(Stdio::piped());
    let output = cmd.output().expect("fab should run");
    assert!(!output.status.success());
}

#[test]
fn fab_ping_without_daemon_fails_with_clear_message() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = fab_cmd();
    cmd.arg("ping").env("FAB_DIR", dir.path());
    let output = cmd.output().expect("fab should run");
    assert!(!output.status.success(), "ping against a dead FAB_DIR should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not running") || stderr.contains("error"));
}
