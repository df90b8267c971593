//! Rule short-circuit: a matching global
//! rule answers a permission request without ever reaching the ask
//! broker; a non-matching request still falls through to brokering.

use crate::prelude::{wait_for, Daemon, SLEEPER_BACKEND, SPEC_WAIT_MAX_MS};

#[test]
fn matching_allow_rule_short_circuits_without_an_operator() {
    let daemon = Daemon::start();
    daemon.write_global_rules(
        r#"
[[rule]]
tool = "Bash"
action = "allow"
pattern = "git :*"
"#,
    );

    daemon.cli().args(&["project", "add", "https://example.invalid/repo.git", "--name", "ruled"]).passes();
    daemon.cli().args(&["project", "config", "set", "ruled", "agent-backend", SLEEPER_BACKEND]).passes();
    daemon.cli().args(&["start", "ruled"]).passes();
    daemon.cli().args(&["agent", "create", "ruled"]).passes();
    let appeared = wait_for(SPEC_WAIT_MAX_MS, || {
        daemon.cli().args(&["agent", "list", "--project", "ruled"]).passes().stdout().contains("agt-")
    });
    assert!(appeared);
    let agent_id = daemon
        .cli()
        .args(&["agent", "list", "--project", "ruled"])
        .passes()
        .stdout()
        .lines()
        .find_map(|l| l.split_whitespace().next())
        .unwrap()
        .to_string();

    // Matching rule: returns instantly (`allow`), never creates a pending ask.
    daemon
        .cli()
        .args(&["permission", "request", &agent_id, "ruled", "Bash", r#"{"command":"git status"}"#])
        .passes()
        .stdout_has("Allow");

    let still_empty = daemon.cli().args(&["permission", "list"]).passes().stdout();
    assert!(still_empty.contains("no pending permission requests"));
}

#[test]
fn non_matching_request_falls_through_to_brokering() {
    let daemon = Daemon::start_with_env(&[("FAB_ASK_TIMEOUT_MS", "300")]);
    daemon.write_global_rules(
        r#"
[[rule]]
tool = "Bash"
action = "allow"
pattern = "git :*"
"#,
    );

    daemon.cli().args(&["project", "add", "https://example.invalid/repo.git", "--name", "unruled"]).passes();
    daemon.cli().args(&["project", "config", "set", "unruled", "agent-backend", SLEEPER_BACKEND]).passes();
    daemon.cli().args(&["start", "unruled"]).passes();
    daemon.cli().args(&["agent", "create", "unruled"]).passes();
    let appeared = wait_for(SPEC_WAIT_MAX_MS, || {
        daemon.cli().args(&["agent", "list", "--project", "unruled"]).passes().stdout().contains("agt-")
    });
    assert!(appeared);
    let agent_id = daemon
        .cli()
        .args(&["agent", "list", "--project", "unruled"])
        .passes()
        .stdout()
        .lines()
        .find_map(|l| l.split_whitespace().next())
        .unwrap()
        .to_string();

    // "rm -rf /" doesn't match the "git :*" pattern, so it must fall
    // through to normal brokering (and, here, time out to a deny).
    let output =
        daemon.cli().args(&["permission", "request", &agent_id, "unruled", "Bash", r#"{"command":"rm -rf /"}"#]).passes();
    output.stdout_has("Deny");
}
