//! Permission ask-broker round trip and expiry//! scenarios 2 and 3).

use std::thread;

use crate::prelude::{wait_for, Daemon, SLEEPER_BACKEND, SPEC_WAIT_MAX_MS};

fn agent_in_project(daemon: &Daemon, project: &str) -> String {
    daemon.cli().args(&["project", "add", "https://example.invalid/repo.git", "--name", project]).passes();
    daemon.cli().args(&["project", "config", "set", project, "agent-backend", SLEEPER_BACKEND]).passes();
    daemon.cli().args(&["start", project]).passes();
    daemon.cli().args(&["agent", "create", project]).passes();

    let appeared = wait_for(SPEC_WAIT_MAX_MS, || {
        daemon.cli().args(&["agent", "list", "--project", project]).passes().stdout().contains("agt-")
    });
    assert!(appeared);
    let listing = daemon.cli().args(&["agent", "list", "--project", project]).passes().stdout();
    listing.lines().find_map(|l| l.split_whitespace().next()).unwrap().to_string()
}

#[test]
fn permission_request_round_trips_through_an_operator_allow() {
    let daemon = Daemon::start();
    let agent_id = agent_in_project(&daemon, "permits");

    let fab_dir = daemon.fab_dir().to_path_buf();
    let agent_id_owned = agent_id.clone();
    let requester = thread::spawn(move || {
        let mut cmd = std::process::Command::new(
            std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("target/debug/fab"),
        );
        cmd.env("FAB_DIR", &fab_dir);
        cmd.args(["permission", "request", &agent_id_owned, "permits", "Bash", r#"{"command":"ls"}"#]);
        cmd.output().expect("fab permission request should run")
    });

    let showed_up = wait_for(SPEC_WAIT_MAX_MS, || {
        daemon.cli().args(&["permission", "list"]).passes().stdout().contains("Bash")
    });
    assert!(showed_up, "expected the permission request to appear in the pending list");

    let listing = daemon.cli().args(&["permission", "list"]).passes().stdout();
    let ask_id = listing.lines().find_map(|l| l.split_whitespace().next()).expect("one pending ask");

    daemon.cli().args(&["permission", "respond", ask_id, "allow"]).passes();

    let output = requester.join().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Allow"), "stdout: {stdout}");

    let after = daemon.cli().args(&["permission", "list"]).passes().stdout();
    assert!(!after.contains(ask_id), "the answered ask should be removed from the pending list");
}

#[test]
fn unanswered_permission_ask_expires_to_a_deny_not_a_forged_allow() {
    let daemon = Daemon::start_with_env(&[("FAB_ASK_TIMEOUT_MS", "300")]);
    let agent_id = agent_in_project(&daemon, "expiring");

    let output = daemon
        .cli()
        .args(&["permission", "request", &agent_id, "expiring", "Bash", r#"{"command":"rm -rf /"}"#])
        .passes();
    let stdout = output.stdout();
    assert!(stdout.contains("Deny"), "expired ask must surface as a deny, not a forged allow: {stdout}");

    let after = daemon.cli().args(&["permission", "list"]).passes().stdout();
    assert!(after.contains("no pending permission requests"));
}

#[test]
fn disconnect_cancels_the_pending_ask() {
    let daemon = Daemon::start();
    let agent_id = agent_in_project(&daemon, "droppable");

    let fab_dir = daemon.fab_dir().to_path_buf();
    let agent_id_owned = agent_id.clone();
    let mut child = std::process::Command::new(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("target/debug/fab"),
    )
    .env("FAB_DIR", &fab_dir)
    .args(["permission", "request", &agent_id_owned, "droppable", "Bash", r#"{"command":"ls"}"#])
    .spawn()
    .expect("fab permission request should spawn");

    let showed_up = wait_for(SPEC_WAIT_MAX_MS, || {
        daemon.cli().args(&["permission", "list"]).passes().stdout().contains("Bash")
    });
    assert!(showed_up);

    child.kill().expect("kill the requesting client");
    let _ = child.wait();

    let gone = wait_for(SPEC_WAIT_MAX_MS, || {
        daemon.cli().args(&["permission", "list"]).passes().stdout().contains("no pending")
    });
    assert!(gone, "disconnecting the requester should cancel its pending ask");
}
