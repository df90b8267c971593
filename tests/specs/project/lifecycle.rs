//! `fab project add/list/config/remove`.

use crate::prelude::Daemon;

#[test]
fn add_list_configure_and_remove_a_project() {
    let daemon = Daemon::start();

    daemon
        .cli()
        .args(&["project", "add", "https://example.invalid/repo.git", "--name", "widgets", "--max-agents", "3"])
        .passes();

    daemon
        .cli()
        .args(&["project", "list"])
        .passes()
        .stdout_has("widgets")
        .stdout_has("max_agents=3");

    daemon
        .cli()
        .args(&["project", "config", "get", "widgets", "max-agents"])
        .passes()
        .stdout_has("3");

    daemon
        .cli()
        .args(&["project", "config", "set", "widgets", "max-agents", "5"])
        .passes();

    daemon
        .cli()
        .args(&["project", "config", "get", "widgets", "max-agents"])
        .passes()
        .stdout_has("5");

    daemon.cli().args(&["project", "remove", "widgets"]).passes();

    daemon
        .cli()
        .args(&["project", "list"])
        .passes()
        .stdout_has("no projects registered");
}

#[test]
fn duplicate_project_name_is_rejected() {
    let daemon = Daemon::start();

    daemon
        .cli()
        .args(&["project", "add", "https://example.invalid/a.git", "--name", "dup"])
        .passes();

    daemon
        .cli()
        .args(&["project", "add", "https://example.invalid/b.git", "--name", "dup"])
        .fails();
}

#[test]
fn invalid_project_name_is_rejected() {
    let daemon = Daemon::start();

    daemon
        .cli()
        .args(&["project", "add", "https://example.invalid/a.git", "--name", "not a valid name!"])
        .fails();
}

#[test]
fn max_agents_out_of_bounds_is_rejected() {
    let daemon = Daemon::start();

    daemon
        .cli()
        .args(&[
            "project",
            "add",
            "https://example.invalid/a.git",
            "--name",
            "toobig",
            "--max-agents",
            "0",
        ])
        .fails();

    daemon
        .cli()
        .args(&[
            "project",
            "add",
            "https://example.invalid/a.git",
            "--name",
            "toobig",
            "--max-agents",
            "101",
        ])
        .fails();
}

#[test]
fn removing_a_project_with_a_live_agent_fails() {
    let daemon = Daemon::start();

    daemon
        .cli()
        .args(&["project", "add", "https://example.invalid/a.git", "--name", "busy"])
        .passes();
    daemon
        .cli()
        .args(&["project", "config", "set", "busy", "agent-backend", crate::prelude::SLEEPER_BACKEND])
        .passes();
    daemon.cli().args(&["start", "busy"]).passes();
    daemon.cli().args(&["agent", "create", "busy"]).passes();

    let has_agent = crate::prelude::wait_for(crate::prelude::SPEC_WAIT_MAX_MS, || {
        daemon.cli().args(&["agent", "list", "--project", "busy"]).passes().stdout().contains("agt-")
    });
    assert!(has_agent, "expected a worker agent to appear under 'busy'");

    daemon.cli().args(&["project", "remove", "busy"]).fails();
}
