//! Scheduler capacity enforcement:
//! "Project P has max_agents=2, three ready tickets T1,T2,T3. After
//! `start P`, exactly two agents exist; when the first `agent.done`
//! arrives, exactly one new agent spawns with T3."

use crate::prelude::{wait_for, Daemon, SLEEPER_BACKEND, SPEC_WAIT_MAX_MS};

fn agent_count(daemon: &Daemon, project: &str) -> usize {
    let stdout = daemon.cli().args(&["agent", "list", "--project", project]).passes().stdout();
    stdout.lines().filter(|l| l.contains("agt-")).count()
}

#[test]
fn scheduler_caps_concurrency_and_refills_on_done() {
    let daemon = Daemon::start();

    daemon
        .cli()
        .args(&[
            "project", "add", "https://example.invalid/repo.git", "--name", "capped", "--max-agents", "2",
        ])
        .passes();
    daemon.cli().args(&["project", "config", "set", "capped", "agent-backend", SLEEPER_BACKEND]).passes();

    daemon.write_ticket("capped", "T1", "first ticket");
    daemon.write_ticket("capped", "T2", "second ticket");
    daemon.write_ticket("capped", "T3", "third ticket");

    daemon.cli().args(&["start", "capped"]).passes();

    let reached_cap = wait_for(SPEC_WAIT_MAX_MS, || agent_count(&daemon, "capped") == 2);
    assert!(reached_cap, "expected exactly 2 agents once max_agents=2 is saturated");

    let claims = daemon.cli().args(&["claim", "list", "--project", "capped"]).passes().stdout();
    let claimed_tickets = claims.lines().filter(|l| l.starts_with('T')).count();
    assert_eq!(claimed_tickets, 2, "expected exactly 2 of the 3 tickets claimed while at capacity");

    // Pick one running agent and report it done; a third agent should
    // then spawn and claim the remaining ticket.
    let agents_out = daemon.cli().args(&["agent", "list", "--project", "capped"]).passes().stdout();
    let first_agent_id = agents_out
        .lines()
        .find_map(|l| l.split_whitespace().next())
        .expect("at least one agent line");

    daemon.cli().args(&["agent", "done", "--agent-id", first_agent_id]).passes();

    let refilled = wait_for(SPEC_WAIT_MAX_MS, || {
        let claims = daemon.cli().args(&["claim", "list", "--project", "capped"]).passes().stdout();
        claims.contains("T3")
    });
    assert!(refilled, "expected the freed slot to pick up the third ticket");
}

#[test]
fn stop_transitions_every_agent_and_start_resumes_scheduling() {
    let daemon = Daemon::start();

    daemon
        .cli()
        .args(&["project", "add", "https://example.invalid/repo.git", "--name", "stoppable", "--max-agents", "1"])
        .passes();
    daemon
        .cli()
        .args(&["project", "config", "set", "stoppable", "agent-backend", SLEEPER_BACKEND])
        .passes();
    daemon.write_ticket("stoppable", "ST1", "only ticket");
    daemon.cli().args(&["start", "stoppable"]).passes();

    let has_agent = wait_for(SPEC_WAIT_MAX_MS, || agent_count(&daemon, "stoppable") == 1);
    assert!(has_agent, "expected one agent to spawn for the single ticket");

    daemon.cli().args(&["stop", "stoppable"]).passes();

    let stopped = wait_for(SPEC_WAIT_MAX_MS, || {
        let listing = daemon.cli().args(&["project", "list"]).passes().stdout();
        listing.lines().any(|l| l.starts_with("stoppable") && l.contains("running=false"))
    });
    assert!(stopped, "expected the project to report not-running after stop");
}
