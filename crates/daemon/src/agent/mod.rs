// SPDX-License-Identifier: MIT

//! Agent process supervision.
//!
//! Grounded on `oj`'s own per-stream reader-task convention
//! (`daemon/src/adapters/agent/*`): stdout/stderr are read line-by-line
//! by dedicated tasks that only ever *emit* events, never mutate shared
//! state, preserving the single-writer-per-project invariant (§5) — the
//! child's exit is reported back to the owning scheduler through a
//! channel rather than mutated here directly.

use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use fab_core::{AgentId, Event, OutputStream};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, Command};
use tokio::sync::{mpsc, watch, Mutex as AsyncMutex};

use crate::error::AgentError;
use crate::event_bus::EventBus;

/// Newline-delimited token written to an agent's stdin to request a
/// cooperative quit before escalating to `SIGTERM`/`SIGKILL` (§4.5:
/// "graceful abort sends a cooperative quit token").
pub const QUIT_TOKEN: &str = "__fab_quit__";

/// Most recent lines of captured output retained so a late `agent.output`
/// request has something to return beyond what the event bus
/// already pushed to attached clients.
const OUTPUT_LOG_CAPACITY: usize = 500;

pub type OutputLog = Arc<Mutex<VecDeque<String>>>;

pub fn new_output_log() -> OutputLog {
    Arc::new(Mutex::new(VecDeque::with_capacity(OUTPUT_LOG_CAPACITY)))
}

/// Posted by the process waiter task when the child exits, so the owning
/// project scheduler — the single writer of its agent table — performs
/// the state transition (§4.12).
#[derive(Debug, Clone)]
pub struct AgentExit {
    pub agent_id: AgentId,
    pub success: bool,
}

/// A live agent child process. The `Child` itself is owned exclusively by
/// a background waiter task (so `.wait()` never contends with signaling);
/// this handle keeps only the pid and the stdin pipe, which is enough for
/// `send_input` and `abort`.
pub struct AgentProcess {
    pid: Option<u32>,
    stdin: AsyncMutex<Option<ChildStdin>>,
    exited: watch::Receiver<bool>,
}

impl AgentProcess {
    /// Spawns `command` with `cwd` as its working directory and
    /// `FAB_AGENT_ID` set so the agent's own hook calls can correlate.
    /// Stdout/stderr are piped and captured by dedicated
    /// reader tasks; stdin is piped for `agent.input`/`agent.send_message`
    /// and the cooperative quit token.
    pub fn spawn(
        command: &str,
        cwd: &Path,
        agent_id: AgentId,
        project: String,
        event_bus: Arc<EventBus>,
        output_log: OutputLog,
        on_exit: mpsc::Sender<AgentExit>,
    ) -> Result<Self, AgentError> {
        let mut cmd = Command::new(command);
        cmd.current_dir(cwd)
            .env("FAB_AGENT_ID", agent_id.as_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| AgentError::SpawnFailed(e.to_string()))?;

        let pid = child.id();
        let stdin = child.stdin.take();

        if let Some(stdout) = child.stdout.take() {
            spawn_reader(
                stdout,
                OutputStream::Stdout,
                project.clone(),
                agent_id,
                Arc::clone(&event_bus),
                Arc::clone(&output_log),
            );
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_reader(stderr, OutputStream::Stderr, project, agent_id, event_bus, output_log);
        }

        let (exited_tx, exited_rx) = watch::channel(false);
        tokio::spawn(async move {
            let success = child.wait().await.map(|s| s.success()).unwrap_or(false);
            let _ = exited_tx.send(true);
            let _ = on_exit.send(AgentExit { agent_id, success }).await;
        });

        Ok(Self { pid, stdin: AsyncMutex::new(stdin), exited: exited_rx })
    }

    /// Writes `text` followed by a newline to the agent's stdin (used for
    /// `agent.input`/`agent.send_message`).
    pub async fn send_input(&self, text: &str) -> std::io::Result<()> {
        let mut stdin = self.stdin.lock().await;
        if let Some(stdin) = stdin.as_mut() {
            stdin.write_all(text.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
        }
        Ok(())
    }

    /// Aborts the process. `force=true` skips the cooperative quit token
    /// and grace window and sends `SIGKILL` immediately. Graceful abort
    /// writes the quit token, sends `SIGTERM`, and waits up to `grace`
    /// for the waiter task to observe exit before escalating.
    pub async fn abort(&self, grace: Duration, force: bool) {
        let Some(pid) = self.pid else { return };
        let pid = Pid::from_raw(pid as i32);

        if !force {
            let _ = self.send_input(QUIT_TOKEN).await;
            let _ = signal::kill(pid, Signal::SIGTERM);

            let mut exited = self.exited.clone();
            if tokio::time::timeout(grace, exited.wait_for(|done| *done)).await.is_ok() {
                return;
            }
        }

        let _ = signal::kill(pid, Signal::SIGKILL);
    }
}

fn spawn_reader<R>(
    stream: R,
    kind: OutputStream,
    project: String,
    agent_id: AgentId,
    event_bus: Arc<EventBus>,
    output_log: OutputLog,
) where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            {
                let mut log = output_log.lock();
                if log.len() == OUTPUT_LOG_CAPACITY {
                    log.pop_front();
                }
                log.push_back(line.clone());
            }
            event_bus
                .broadcast(Event::Output {
                    project: project.clone(),
                    agent_id,
                    stream: kind,
                    line,
                })
                .await;
        }
    });
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
