//! User-question ask-broker round trip//! the permission-ask scenarios in §8).

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
fn question_request_round_trips_through_an_operator_answer() {
    let daemon = Daemon::start();
    let agent_id = agent_in_project(&daemon, "asking");

    let fab_dir = daemon.fab_dir().to_path_buf();
    let agent_id_owned = agent_id.clone();
    let requester = thread::spawn(move || {
        let mut cmd = std::process::Command::new(
            std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("target/debug/fab"),
        );
        cmd.env("FAB_DIR", &fab_dir);
        cmd.args([
            "question",
            "request",
            &agent_id_owned,
            "asking",
            "branch:which branch should I target?:main,develop",
        ]);
        cmd.output().expect("fab question request should run")
    });

    let showed_up = wait_for(SPEC_WAIT_MAX_MS, || {
        daemon.cli().args(&["question", "list"]).passes().stdout().contains("1 item(s)")
    });
    assert!(showed_up);

    let listing = daemon.cli().args(&["question", "list"]).passes().stdout();
    let ask_id = listing.lines().find_map(|l| l.split_whitespace().next()).expect("one pending ask");

    daemon.cli().args(&["question", "respond", ask_id, "branch=develop"]).passes();

    let output = requester.join().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("develop"), "stdout: {stdout}");

    let after = daemon.cli().args(&["question", "list"]).passes().stdout();
    assert!(after.contains("no pending questions"));
}
