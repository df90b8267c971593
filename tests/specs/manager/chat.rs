//! Manager agents: long-lived per-project chat, excluded from pool
//! accounting.

use crate::prelude::{wait_for, Daemon, SLEEPER_BACKEND, SPEC_WAIT_MAX_MS};

#[test]
fn manager_chat_history_records_operator_messages() {
    let daemon = Daemon::start();

    daemon
        .cli()
        .args(&["project", "add", "https://example.invalid/repo.git", "--name", "chatty", "--max-agents", "1"])
        .passes();
    daemon.cli().args(&["project", "config", "set", "chatty", "agent-backend", SLEEPER_BACKEND]).passes();
    daemon.cli().args(&["start", "chatty"]).passes();

    daemon.cli().args(&["manager", "chat", "chatty", "what's the status of ticket T1?"]).passes();

    let recorded = wait_for(SPEC_WAIT_MAX_MS, || {
        daemon
            .cli()
            .args(&["manager", "chat-history", "chatty"])
            .passes()
            .stdout()
            .contains("status of ticket T1")
    });
    assert!(recorded, "expected the chat message to show up in manager chat history");
}

#[test]
fn manager_agents_are_excluded_from_pool_capacity() {
    let daemon = Daemon::start();

    daemon
        .cli()
        .args(&[
            "project", "add", "https://example.invalid/repo.git", "--name", "roomy", "--max-agents", "1",
        ])
        .passes();
    daemon.cli().args(&["project", "config", "set", "roomy", "agent-backend", SLEEPER_BACKEND]).passes();
    daemon.cli().args(&["start", "roomy"]).passes();

    daemon.cli().args(&["manager", "chat", "roomy", "hello"]).passes();
    let manager_up = wait_for(SPEC_WAIT_MAX_MS, || {
        daemon.cli().args(&["agent", "list", "--project", "roomy"]).passes().stdout().contains("Manager")
    });
    assert!(manager_up, "expected a manager agent to be spawned for the project");

    // max_agents=1 is a worker-pool budget; a manager already exists, but
 // a worker agent should still be creatable    // excludes managers/planners from the count).
    daemon.cli().args(&["agent", "create", "roomy"]).passes();
    let both_present = wait_for(SPEC_WAIT_MAX_MS, || {
        daemon.cli().args(&["agent", "list", "--project", "roomy"]).passes().stdout().lines().count() == 2
    });
    assert!(both_present, "expected both the manager and a worker agent to coexist");
}
