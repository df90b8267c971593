//! Planner agent creation, its `done`-triggered plan artifact, and its
//! exemption from `max_agents` pool accounting.

use crate::prelude::{wait_for, Daemon, SLEEPER_BACKEND, SPEC_WAIT_MAX_MS};

#[test]
fn a_planner_does_not_count_against_max_agents() {
    let daemon = Daemon::start();
    daemon.cli().args(&["project", "add", "https://example.invalid/repo.git", "--name", "plans"]).passes();
    daemon.cli().args(&["project", "config", "set", "plans", "agent-backend", SLEEPER_BACKEND]).passes();
    daemon.cli().args(&["project", "config", "set", "plans", "max-agents", "1"]).passes();
    daemon.cli().args(&["start", "plans"]).passes();

    let plan_id = daemon.cli().args(&["plan", "create", "plans"]).passes().stdout().trim().to_string();
    assert!(plan_id.starts_with("agt-"));

    // max_agents=1 still leaves room for a plain worker alongside the planner.
    daemon.cli().args(&["agent", "create", "plans"]).passes();
    let both_present = wait_for(SPEC_WAIT_MAX_MS, || {
        let listing = daemon.cli().args(&["agent", "list", "--project", "plans"]).passes().stdout();
        listing.lines().filter(|l| l.starts_with("agt-")).count() >= 2
    });
    assert!(both_present, "planner must not consume the project's single worker slot");
}

#[test]
fn done_writes_a_plan_artifact_readable_by_plan_show() {
    let daemon = Daemon::start();
    daemon.cli().args(&["project", "add", "https://example.invalid/repo.git", "--name", "plan-done"]).passes();
    daemon.cli().args(&["project", "config", "set", "plan-done", "agent-backend", "true"]).passes();
    daemon.cli().args(&["start", "plan-done"]).passes();

    let plan_id = daemon.cli().args(&["plan", "create", "plan-done"]).passes().stdout().trim().to_string();

    // The `true` backend exits immediately; wait for the scheduler to reap it into `done`.
    let wrote = wait_for(SPEC_WAIT_MAX_MS, || daemon.cli().args(&["plan", "show", &plan_id]).run_any().succeeded());
    assert!(wrote, "planner's done transition should have written a plan artifact");
}
