//! Agent create/describe/abort/delete.

use crate::prelude::{wait_for, Daemon, SLEEPER_BACKEND, SPEC_WAIT_MAX_MS};

fn setup(daemon: &Daemon, project: &str) {
    daemon.cli().args(&["project", "add", "https://example.invalid/repo.git", "--name", project]).passes();
    daemon.cli().args(&["project", "config", "set", project, "agent-backend", SLEEPER_BACKEND]).passes();
    daemon.cli().args(&["start", project]).passes();
}

fn first_agent_id(daemon: &Daemon, project: &str) -> String {
    let listing = daemon.cli().args(&["agent", "list", "--project", project]).passes().stdout();
    listing.lines().find_map(|l| l.split_whitespace().next()).expect("at least one agent").to_string()
}

#[test]
fn create_describe_and_delete_a_manual_agent() {
    let daemon = Daemon::start();
    setup(&daemon, "manual");

    daemon.cli().args(&["agent", "create", "manual"]).passes();
    let appeared = wait_for(SPEC_WAIT_MAX_MS, || {
        daemon.cli().args(&["agent", "list", "--project", "manual"]).passes().stdout().contains("agt-")
    });
    assert!(appeared);

    let id = first_agent_id(&daemon, "manual");

    daemon.cli().args(&["agent", "describe", "--id", &id, "triaging flaky test"]).passes();
    daemon
        .cli()
        .args(&["agent", "list", "--project", "manual"])
        .passes()
        .stdout_has("triaging flaky test");

    // A live agent isn't done yet, so a non-forced delete must fail.
    daemon.cli().args(&["agent", "delete", &id]).fails();

    daemon.cli().args(&["agent", "abort", &id]).passes();
    let stopped_or_gone = wait_for(SPEC_WAIT_MAX_MS, || {
        let listing = daemon.cli().args(&["agent", "list", "--project", "manual"]).passes().stdout();
        !listing.lines().any(|l| l.starts_with(&id) && !l.contains("stopping") && !l.contains("done"))
    });
    assert!(stopped_or_gone, "expected the agent to leave the running state after abort");

    daemon.cli().args(&["agent", "delete", &id, "--force"]).passes();
}

#[test]
fn deleting_an_unknown_agent_id_fails_and_is_idempotent_for_repeats() {
    let daemon = Daemon::start();
    setup(&daemon, "ghost");

    let first = daemon.cli().args(&["agent", "delete", "agt-doesnotexist0000000", "--force"]).run_any();
    let second = daemon.cli().args(&["agent", "delete", "agt-doesnotexist0000000", "--force"]).run_any();
    assert_eq!(first.succeeded(), second.succeeded(), "unknown-id delete should behave the same way twice");
}

#[test]
fn sending_input_returns_an_idle_agent_to_running() {
    let daemon = Daemon::start();
    setup(&daemon, "wakeup");
    daemon.cli().args(&["agent", "create", "wakeup"]).passes();

    let id = wait_for(SPEC_WAIT_MAX_MS, || {
        !daemon.cli().args(&["agent", "list", "--project", "wakeup"]).passes().stdout().is_empty()
    });
    assert!(id);
    let agent_id = first_agent_id(&daemon, "wakeup");

    daemon.cli().args(&["agent", "idle", "--agent-id", &agent_id]).passes();
    let went_idle = wait_for(SPEC_WAIT_MAX_MS, || {
        daemon
            .cli()
            .args(&["agent", "list", "--project", "wakeup"])
            .passes()
            .stdout()
            .lines()
            .any(|l| l.starts_with(&agent_id) && l.contains("idle"))
    });
    assert!(went_idle, "expected agent.idle to move the agent to the idle state");

    daemon.cli().args(&["agent", "send-message", &agent_id, "keep going"]).passes();
    let back_running = wait_for(SPEC_WAIT_MAX_MS, || {
        daemon
            .cli()
            .args(&["agent", "list", "--project", "wakeup"])
            .passes()
            .stdout()
            .lines()
            .any(|l| l.starts_with(&agent_id) && l.contains("running"))
    });
    assert!(back_running, "expected a send_message to return an idle agent to running");
}
