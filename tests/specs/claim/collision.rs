//! Ticket-claim collisions: "Two agents
//! A1, A2 call agent.claim {agent_id:A1, ticket_id:T1} and {A2, T1}
//! concurrently. Exactly one returns success=true ... claim.list returns
//! exactly one entry for T1."

use std::thread;

use crate::prelude::{wait_for, Daemon, SLEEPER_BACKEND, SPEC_WAIT_MAX_MS};

fn spawn_two_agents(daemon: &Daemon, project: &str) -> (String, String) {
    daemon.cli().args(&["project", "add", "https://example.invalid/repo.git", "--name", project]).passes();
    daemon.cli().args(&["project", "config", "set", project, "agent-backend", SLEEPER_BACKEND]).passes();
    daemon.cli().args(&["start", project]).passes();

    daemon.cli().args(&["agent", "create", project]).passes();
    daemon.cli().args(&["agent", "create", project]).passes();

    let got_both = wait_for(SPEC_WAIT_MAX_MS, || {
        daemon.cli().args(&["agent", "list", "--project", project]).passes().stdout().lines().filter(|l| l.contains("agt-")).count() == 2
    });
    assert!(got_both, "expected two agents to appear");

    let listing = daemon.cli().args(&["agent", "list", "--project", project]).passes().stdout();
    let mut ids = listing.lines().filter_map(|l| l.split_whitespace().next()).map(str::to_string);
    (ids.next().unwrap(), ids.next().unwrap())
}

#[test]
fn exactly_one_concurrent_claim_wins() {
    let daemon = Daemon::start();
    let (a1, a2) = spawn_two_agents(&daemon, "racers");

    // Race two `fab agent claim` invocations for the same ticket. The
    // daemon serializes them through the claim registry's single mutex
 //, so exactly one succeeds regardless of client-side
    // scheduling.
    let result = thread::scope(|scope| {
        let daemon_ref = &daemon;
        let a1_ref = &a1;
        let a2_ref = &a2;
        let t1 = scope.spawn(move || {
            daemon_ref.cli().args(&["agent", "claim", a1_ref, "T1"]).run_any().succeeded()
        });
        let t2 = scope.spawn(move || {
            daemon_ref.cli().args(&["agent", "claim", a2_ref, "T1"]).run_any().succeeded()
        });
        (t1.join().unwrap(), t2.join().unwrap())
    });

    assert_ne!(result.0, result.1, "expected exactly one of the two claims to succeed, got {result:?}");

    let claims = daemon.cli().args(&["claim", "list"]).passes().stdout();
    let t1_lines: Vec<&str> = claims.lines().filter(|l| l.starts_with("T1 ")).collect();
    assert_eq!(t1_lines.len(), 1, "expected exactly one claim entry for T1, got: {claims}");
}

#[test]
fn repeated_claim_by_same_agent_is_a_idempotent_no_op() {
    let daemon = Daemon::start();
    let (a1, _a2) = spawn_two_agents(&daemon, "idempotent");

    daemon.cli().args(&["agent", "claim", &a1, "T-repeat"]).passes();
    daemon.cli().args(&["agent", "claim", &a1, "T-repeat"]).passes();

    let claims = daemon.cli().args(&["claim", "list"]).passes().stdout();
    let matches = claims.lines().filter(|l| l.starts_with("T-repeat ")).count();
    assert_eq!(matches, 1);
}

#[test]
fn claim_by_a_different_agent_fails() {
    let daemon = Daemon::start();
    let (a1, a2) = spawn_two_agents(&daemon, "conflict");

    daemon.cli().args(&["agent", "claim", &a1, "T-conflict"]).passes();
    daemon.cli().args(&["agent", "claim", &a2, "T-conflict"]).fails();
}
