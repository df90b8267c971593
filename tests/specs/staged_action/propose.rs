//! Staged-action propose/approve/reject round trip.

use crate::prelude::{wait_for, Daemon, SLEEPER_BACKEND, SPEC_WAIT_MAX_MS};

fn setup(daemon: &Daemon, project: &str) -> String {
    daemon.cli().args(&["project", "add", "https://example.invalid/repo.git", "--name", project]).passes();
    daemon.cli().args(&["project", "config", "set", project, "agent-backend", SLEEPER_BACKEND]).passes();
    daemon.cli().args(&["start", project]).passes();
    daemon.cli().args(&["agent", "create", project]).passes();
    let appeared = wait_for(SPEC_WAIT_MAX_MS, || {
        !daemon.cli().args(&["agent", "list", "--project", project]).passes().stdout().is_empty()
    });
    assert!(appeared);
    let listing = daemon.cli().args(&["agent", "list", "--project", project]).passes().stdout();
    listing.lines().find_map(|l| l.split_whitespace().next()).expect("at least one agent").to_string()
}

#[test]
fn approve_executes_a_proposed_quit_and_removes_it_from_the_queue() {
    let daemon = Daemon::start();
    let agent_id = setup(&daemon, "stage-approve");

    let id = daemon
        .cli()
        .args(&["staged-action", "propose-quit", &agent_id])
        .passes()
        .stdout()
        .trim()
        .to_string();
    assert!(id.starts_with("stg-"));

    daemon.cli().args(&["staged-action", "list"]).passes().stdout_has(&id);

    daemon.cli().args(&["staged-action", "approve", &id]).passes();
    let removed = wait_for(SPEC_WAIT_MAX_MS, || {
        !daemon.cli().args(&["staged-action", "list"]).passes().stdout().contains(&id)
    });
    assert!(removed, "approved action should leave the pending queue");
}

#[test]
fn reject_discards_without_executing() {
    let daemon = Daemon::start();
    let agent_id = setup(&daemon, "stage-reject");

    let id = daemon
        .cli()
        .args(&["staged-action", "propose-send-message", &agent_id, "wrap up soon"])
        .passes()
        .stdout()
        .trim()
        .to_string();

    daemon.cli().args(&["staged-action", "reject", &id, "--reason", "not yet"]).passes();
    let gone = daemon.cli().args(&["staged-action", "list"]).passes().stdout();
    assert!(!gone.contains(&id));

    // Rejecting twice is a not-found failure, not a silent success.
    daemon.cli().args(&["staged-action", "reject", &id]).fails();
}
