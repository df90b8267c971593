//! Test helpers for behavioral specifications.
//!
//! Provides a high-level DSL for driving a real `fabd` daemon and the
//! `fab` CLI against it, grounded on the black-box `tests/specs/prelude.rs`
//! `CliBuilder`/`Project` shape used by `oj`'s own sibling forks.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::Duration;

pub const SPEC_POLL_INTERVAL_MS: u64 = 20;
pub const SPEC_WAIT_MAX_MS: u64 = 3000;

/// Returns the path to a binary, checking the llvm-cov target directory
/// first (same fallback chain used elsewhere, since this
/// workspace's root test package doesn't depend on `fab-cli`/`fab-daemon`
/// directly and must locate their binaries under the shared `target/`).
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

fn fab_binary() -> PathBuf {
    binary_path("fab")
}

fn fabd_binary() -> PathBuf {
    binary_path("fabd")
}

/// Create a CLI builder for `fab` commands against `daemon`.
pub fn cli<'a>(daemon: &'a Daemon) -> CliBuilder<'a> {
    CliBuilder { daemon, args: Vec::new(), stdin: None }
}

/// Fluent builder for one `fab` invocation.
pub struct CliBuilder<'a> {
    daemon: &'a Daemon,
    args: Vec<String>,
    stdin: Option<String>,
}

impl<'a> CliBuilder<'a> {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(fab_binary());
        cmd.args(&self.args);
        cmd.env("FAB_DIR", self.daemon.fab_dir());
        cmd
    }

    fn run(self) -> Output {
        let mut cmd = self.command();
        if let Some(input) = &self.stdin {
            cmd.stdin(Stdio::piped());
            cmd.stdout(Stdio::piped());
            cmd.stderr(Stdio::piped());
            let mut child = cmd.spawn().expect("fab should spawn");
            child
                .stdin
                .take()
                .expect("piped stdin")
                .write_all(input.as_bytes())
                .expect("write stdin");
            child.wait_with_output().expect("fab should run")
        } else {
            cmd.output().expect("fab should run")
        }
    }

    /// Run and expect success (exit code 0).
    pub fn passes(self) -> RunAssert {
        let output = self.run();
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run and expect failure (non-zero exit code).
    pub fn fails(self) -> RunAssert {
        let output = self.run();
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run without asserting on the exit code (for racy concurrent calls).
    pub fn run_any(self) -> RunAssert {
        let output = self.run();
        RunAssert { output }
    }
}

/// Result of a CLI run, for chaining assertions.
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn succeeded(&self) -> bool {
        self.output.status.success()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(expected), "stdout does not contain '{expected}'\nstdout: {stdout}");
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(expected), "stderr does not contain '{expected}'\nstderr: {stderr}");
        self
    }
}

/// Poll a condition until it returns true or the timeout is reached.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(timeout_ms);
    let poll_interval = Duration::from_millis(SPEC_POLL_INTERVAL_MS);
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

/// A running `fabd` bound to an isolated, temporary `FAB_DIR`.
pub struct Daemon {
    fab_dir: tempfile::TempDir,
    child: Child,
}

impl Daemon {
    /// Spawns `fabd` with a fresh `FAB_DIR` and blocks until it prints
    /// `READY` on stdout (`crates/daemon/src/main.rs`'s startup marker).
    pub fn start() -> Self {
        Self::start_with_env(&[])
    }

    pub fn start_with_env(extra_env: &[(&str, &str)]) -> Self {
        let fab_dir = tempfile::tempdir().expect("tempdir");
        let mut cmd = Command::new(fabd_binary());
        cmd.env("FAB_DIR", fab_dir.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null());
        for (key, value) in extra_env {
            cmd.env(key, value);
        }
        let mut child = cmd.spawn().expect("fabd should spawn");

        let stdout = child.stdout.take().expect("piped stdout");
        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        let ready = wait_for(SPEC_WAIT_MAX_MS, || {
            line.clear();
            reader.read_line(&mut line).unwrap_or(0) > 0 && line.trim() == "READY"
        });
        assert!(ready, "fabd did not print READY within {SPEC_WAIT_MAX_MS}ms");

        Self { fab_dir, child }
    }

    pub fn fab_dir(&self) -> &Path {
        self.fab_dir.path()
    }

    /// Writes a `*.json` ticket file for the local file-backed issue
    /// backend (`crates/daemon/src/local_backend.rs`): drop a file under
    /// `$FAB_DIR/projects/<name>/tickets/*.json` and it becomes ready.
    pub fn write_ticket(&self, project: &str, ticket_id: &str, title: &str) {
        let dir = self.fab_dir().join("projects").join(project).join("tickets");
        std::fs::create_dir_all(&dir).expect("mkdir tickets dir");
        let body = serde_json::json!({ "title": title, "body": "" });
        std::fs::write(dir.join(format!("{ticket_id}.json")), serde_json::to_vec(&body).unwrap())
            .expect("write ticket file");
    }

    /// Writes a global rule file consulted before any project-scoped one
    /// (`crates/daemon/src/rule_store.rs::global_path`).
    pub fn write_global_rules(&self, toml: &str) {
        std::fs::write(self.fab_dir().join("rules.toml"), toml).expect("write rules.toml");
    }

    pub fn cli(&self) -> CliBuilder<'_> {
        cli(self)
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        // Best-effort graceful shutdown, then make sure the process is gone.
        let mut cmd = Command::new(fab_binary());
        cmd.arg("shutdown").env("FAB_DIR", self.fab_dir.path());
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
        let _ = cmd.status();
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// A no-op agent backend command: reads stdin until closed, never
/// produces output on its own. Good enough to occupy a pool slot for
/// scheduler/claim tests without a real coding-agent binary.
pub const SLEEPER_BACKEND: &str = "cat";
