// SPDX-License-Identifier: MIT

//! Per-project supervisor/scheduler. One task per
//! running project, single-consumer over a command channel, the sole
//! writer of that project's agent table. Grounded on `oj`'s own
//! per-connection `tokio::spawn` + command-channel actor shape
//! (`daemon/src/listener/mod.rs`), adapted from "one task per connection"
//! to "one task per running project".

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use fab_core::{AgentId, AgentKind, AgentState, Clock, Event, IssueBackend, Project, RepoManager, TicketId};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::agent::{new_output_log, AgentExit, AgentProcess, OutputLog};
use crate::claim_registry::ClaimRegistry;
use crate::error::{AgentError, SupervisorError};
use crate::event_bus::EventBus;

/// A supervised agent's full bookkeeping record. The wire
/// layer projects this down to `AgentSummary`; `process`/`output_log` are
/// runtime-only and never serialized.
#[derive(Clone)]
pub struct AgentRecord {
    pub id: AgentId,
    pub project: String,
    pub kind: AgentKind,
    pub state: AgentState,
    pub worktree: PathBuf,
    pub started_at_ms: u64,
    pub task: Option<TicketId>,
    pub description: Option<String>,
    pub backend: String,
    process: Option<Arc<AgentProcess>>,
    output_log: OutputLog,
}

impl AgentRecord {
    pub fn output_lines(&self) -> Vec<String> {
        self.output_log.lock().iter().cloned().collect()
    }
}

enum Command {
    Tick,
    Create {
        kind: AgentKind,
        task: Option<TicketId>,
        description: Option<String>,
        reply: oneshot::Sender<Result<AgentRecord, SupervisorError>>,
    },
    Delete {
        id: AgentId,
        force: bool,
        reply: oneshot::Sender<Result<(), SupervisorError>>,
    },
    Abort {
        id: AgentId,
        force: bool,
        reply: oneshot::Sender<Result<(), SupervisorError>>,
    },
    Input {
        id: AgentId,
        text: String,
        reply: oneshot::Sender<Result<(), SupervisorError>>,
    },
    Describe {
        id: Option<AgentId>,
        description: String,
        reply: oneshot::Sender<Result<(), SupervisorError>>,
    },
    Done {
        agent_id: Option<AgentId>,
        task_id: Option<TicketId>,
        error: Option<String>,
    },
    Idle {
        agent_id: Option<AgentId>,
    },
    List {
        reply: oneshot::Sender<Vec<AgentRecord>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
}

/// Cheap, cloneable front for a running project's scheduler task.
#[derive(Clone)]
pub struct SupervisorHandle {
    tx: mpsc::Sender<Command>,
}

impl SupervisorHandle {
    pub async fn create(
        &self,
        kind: AgentKind,
        task: Option<TicketId>,
        description: Option<String>,
    ) -> Result<AgentRecord, SupervisorError> {
        self.call(|reply| Command::Create { kind, task, description, reply }).await
    }

    pub async fn delete(&self, id: AgentId, force: bool) -> Result<(), SupervisorError> {
        self.call(|reply| Command::Delete { id, force, reply }).await
    }

    pub async fn abort(&self, id: AgentId, force: bool) -> Result<(), SupervisorError> {
        self.call(|reply| Command::Abort { id, force, reply }).await
    }

    pub async fn input(&self, id: AgentId, text: String) -> Result<(), SupervisorError> {
        self.call(|reply| Command::Input { id, text, reply }).await
    }

    pub async fn describe(&self, id: Option<AgentId>, description: String) -> Result<(), SupervisorError> {
        self.call(|reply| Command::Describe { id, description, reply }).await
    }

    pub async fn done(&self, agent_id: Option<AgentId>, task_id: Option<TicketId>, error: Option<String>) {
        let _ = self.tx.send(Command::Done { agent_id, task_id, error }).await;
    }

    pub async fn idle(&self, agent_id: Option<AgentId>) {
        let _ = self.tx.send(Command::Idle { agent_id }).await;
    }

    pub async fn list(&self) -> Vec<AgentRecord> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send(Command::List { reply: reply_tx }).await.is_err() {
            return Vec::new();
        }
        reply_rx.await.unwrap_or_default()
    }

    pub async fn tick(&self) {
        let _ = self.tx.send(Command::Tick).await;
    }

    /// Transitions every live agent to `stopping` and waits for the
    /// scheduler to acknowledge; the per-agent grace/force-kill timing
    /// happens inside [`AgentProcess::abort`].
    pub async fn stop(&self) {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send(Command::Stop { reply: reply_tx }).await.is_ok() {
            let _ = reply_rx.await;
        }
    }

    async fn call<T>(&self, make: impl FnOnce(oneshot::Sender<Result<T, SupervisorError>>) -> Command) -> Result<T, SupervisorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| SupervisorError::UnknownProject("scheduler task is gone".to_string()))?;
        reply_rx.await.map_err(|_| SupervisorError::UnknownProject("scheduler task is gone".to_string()))?
    }
}

/// Everything a project's scheduler task needs that outlives any single
/// agent: shared registries and the capability traits kept out of the
/// core (§1: issue backends and git operations are external
/// collaborators).
pub struct SchedulerContext<C: Clock> {
    pub project: Project,
    pub clock: C,
    pub claims: Arc<ClaimRegistry>,
    pub event_bus: Arc<EventBus>,
    pub issue_backend: Arc<dyn IssueBackend>,
    pub repo_manager: Arc<dyn RepoManager>,
    pub abort_grace: Duration,
    pub plans_dir: PathBuf,
}

/// Spawns the per-project scheduler task and returns a handle to it.
pub fn spawn<C: Clock>(ctx: SchedulerContext<C>) -> SupervisorHandle {
    let (tx, rx) = mpsc::channel(64);
    let handle = SupervisorHandle { tx };
    tokio::spawn(run(ctx, rx));
    handle
}

async fn run<C: Clock>(ctx: SchedulerContext<C>, mut rx: mpsc::Receiver<Command>) {
    let mut agents: HashMap<AgentId, AgentRecord> = HashMap::new();
    let (exit_tx, mut exit_rx) = mpsc::channel::<AgentExit>(64);
    let mut ticker = tokio::time::interval(Duration::from_secs(5));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            cmd = rx.recv() => {
                match cmd {
                    Some(cmd) => handle_command(&ctx, &mut agents, &exit_tx, cmd).await,
                    None => break,
                }
            }
            Some(exit) = exit_rx.recv() => {
                on_process_exited(&ctx, &mut agents, exit).await;
            }
            _ = ticker.tick() => {
                tick(&ctx, &mut agents, &exit_tx).await;
            }
        }
    }
}

async fn handle_command<C: Clock>(
    ctx: &SchedulerContext<C>,
    agents: &mut HashMap<AgentId, AgentRecord>,
    exit_tx: &mpsc::Sender<AgentExit>,
    cmd: Command,
) {
    match cmd {
        Command::Tick => tick(ctx, agents, exit_tx).await,
        Command::Create { kind, task, description, reply } => {
            let result = create_agent(ctx, agents, exit_tx, AgentId::new(), kind, task, description).await;
            let _ = reply.send(result);
        }
        Command::Delete { id, force, reply } => {
            let result = delete_agent(ctx, agents, id, force).await;
            let _ = reply.send(result);
        }
        Command::Abort { id, force, reply } => {
            let result = match agents.get_mut(&id) {
                None => Err(SupervisorError::Agent(AgentError::NotFound(id))),
                Some(record) => {
                    let next = AgentState::Stopping { force };
                    if !record.state.can_transition_to(&next) {
                        Err(SupervisorError::Agent(AgentError::IllegalTransition(
                            id,
                            record.state.label(),
                            next.label(),
                        )))
                    } else {
                        record.state = next;
                        broadcast_state(ctx, record).await;
                        if let Some(process) = record.process.clone() {
                            let grace = ctx.abort_grace;
                            tokio::spawn(async move { process.abort(grace, force).await });
                        }
                        Ok(())
                    }
                }
            };
            let _ = reply.send(result);
        }
        Command::Input { id, text, reply } => {
            let result = match agents.get(&id).and_then(|r| r.process.clone()) {
                None => Err(SupervisorError::Agent(AgentError::NotFound(id))),
                Some(process) => {
                    process.send_input(&text).await.map_err(|e| {
                        SupervisorError::Agent(AgentError::SpawnFailed(e.to_string()))
                    })
                }
            };
            if result.is_ok() {
                // Any inbound send-message returns an idle agent to running; a no-op if it wasn't idle.
                if let Some(record) = agents.get_mut(&id) {
                    if record.state.can_transition_to(&AgentState::Running) {
                        record.state = AgentState::Running;
                        broadcast_state(ctx, record).await;
                    }
                }
            }
            let _ = reply.send(result);
        }
        Command::Describe { id, description, reply } => {
            let result = match id {
                Some(id) => match agents.get_mut(&id) {
                    Some(record) => {
                        record.description = Some(description);
                        Ok(())
                    }
                    None => Err(SupervisorError::Agent(AgentError::NotFound(id))),
                },
                None => {
                    for record in agents.values_mut() {
                        record.description = Some(description.clone());
                    }
                    Ok(())
                }
            };
            let _ = reply.send(result);
        }
        Command::Done { agent_id, task_id, error } => {
            let target = resolve_agent(agents, agent_id, task_id.as_ref());
            if let Some(id) = target {
                finish_agent(ctx, agents, id, error).await;
                tick(ctx, agents, exit_tx).await;
            } else {
                warn!(?agent_id, ?task_id, "agent.done referenced an unknown agent");
            }
        }
        Command::Idle { agent_id } => {
            let target = resolve_agent(agents, agent_id, None);
            if let Some(id) = target {
                if let Some(record) = agents.get_mut(&id) {
                    let next = AgentState::Idle;
                    if record.state.can_transition_to(&next) {
                        record.state = next;
                        broadcast_state(ctx, record).await;
                    }
                }
            }
        }
        Command::List { reply } => {
            let mut list: Vec<AgentRecord> = agents.values().cloned().collect();
            list.sort_by(|a, b| a.started_at_ms.cmp(&b.started_at_ms));
            let _ = reply.send(list);
        }
        Command::Stop { reply } => {
            stop_all(ctx, agents).await;
            let _ = reply.send(());
        }
    }
}

/// Looks an agent up by explicit id, else by the ticket it's working on
/// (the calling hook knows its own `FAB_AGENT_ID` but a manual test harness
/// may only know the ticket).
fn resolve_agent(
    agents: &HashMap<AgentId, AgentRecord>,
    agent_id: Option<AgentId>,
    task_id: Option<&TicketId>,
) -> Option<AgentId> {
    if let Some(id) = agent_id {
        return Some(id);
    }
    task_id.and_then(|task| agents.values().find(|r| r.task.as_ref() == Some(task)).map(|r| r.id))
}

async fn tick<C: Clock>(ctx: &SchedulerContext<C>, agents: &mut HashMap<AgentId, AgentRecord>, exit_tx: &mpsc::Sender<AgentExit>) {
    let active = agents
        .values()
        .filter(|r| r.kind.counts_toward_pool() && !r.state.is_terminal_or_stopping())
        .count() as u32;
    if active >= ctx.project.max_agents {
        return;
    }

    let tickets = match ctx.issue_backend.list_open_tickets(&ctx.project.name).await {
        Ok(tickets) => tickets,
        Err(e) => {
            warn!(project = %ctx.project.name, error = %e, "failed to list open tickets");
            return;
        }
    };

    let mut active = active;
    for ticket in tickets {
        if active >= ctx.project.max_agents {
            break;
        }
        if ctx.claims.get(&ticket.id).is_some() {
            continue;
        }

        let agent_id = AgentId::new();
        // Claim failure means another supervisor (or a concurrent explicit
        // `agent.claim`) got there first — not an error, just try the next
        // candidate.
        if ctx.claims.claim(ticket.id.clone(), agent_id, ctx.project.name.clone()).is_err() {
            continue;
        }

        match create_agent(
            ctx,
            agents,
            exit_tx,
            agent_id,
            AgentKind::Worker,
            Some(ticket.id.clone()),
            Some(ticket.title.clone()),
        )
        .await
        {
            Ok(_) => active += 1,
            Err(e) => {
                ctx.claims.release_for_agent(&agent_id);
                warn!(project = %ctx.project.name, ticket = %ticket.id, error = %e, "failed to spawn agent for ticket");
            }
        }
    }
}

async fn create_agent<C: Clock>(
    ctx: &SchedulerContext<C>,
    agents: &mut HashMap<AgentId, AgentRecord>,
    exit_tx: &mpsc::Sender<AgentExit>,
    agent_id: AgentId,
    kind: AgentKind,
    task: Option<TicketId>,
    description: Option<String>,
) -> Result<AgentRecord, SupervisorError> {
    let worktree = ctx
        .repo_manager
        .prepare_workdir(&ctx.project.name, agent_id.as_str())
        .await
        .map_err(SupervisorError::Backend)?;

    let output_log = new_output_log();
    let process = AgentProcess::spawn(
        &ctx.project.agent_backend,
        &worktree,
        agent_id,
        ctx.project.name.clone(),
        Arc::clone(&ctx.event_bus),
        Arc::clone(&output_log),
        exit_tx.clone(),
    )
    .map_err(SupervisorError::Agent)?;

    let mut record = AgentRecord {
        id: agent_id,
        project: ctx.project.name.clone(),
        kind,
        state: AgentState::Starting,
        worktree,
        started_at_ms: ctx.clock.epoch_ms(),
        task,
        description,
        backend: ctx.project.agent_backend.clone(),
        process: Some(Arc::new(process)),
        output_log,
    };
    ctx.event_bus.broadcast(Event::Created { project: ctx.project.name.clone(), agent_id }).await;

    // The child is live as soon as `spawn` returns; there is no separate
    // readiness probe, so `starting` is promoted to `running` immediately
    // rather than left dangling (it would otherwise never leave `starting`,
    // since nothing else in the state machine transitions out of it).
    record.state = AgentState::Running;
    agents.insert(agent_id, record.clone());
    broadcast_state(ctx, &record).await;

    info!(project = %ctx.project.name, agent = %agent_id, "agent created");
    Ok(record)
}

async fn delete_agent<C: Clock>(
    ctx: &SchedulerContext<C>,
    agents: &mut HashMap<AgentId, AgentRecord>,
    id: AgentId,
    force: bool,
) -> Result<(), SupervisorError> {
    let Some(record) = agents.get(&id) else {
        return Err(SupervisorError::Agent(AgentError::NotFound(id)));
    };
    if !record.state.is_terminal_or_stopping() && !force {
        return Err(SupervisorError::Agent(AgentError::IllegalTransition(
            id,
            record.state.label(),
            "deleted",
        )));
    }
    if let Some(process) = record.process.clone() {
        process.abort(ctx.abort_grace, true).await;
    }
    ctx.claims.release_for_agent(&id);
    agents.remove(&id);
    ctx.event_bus.broadcast(Event::Deleted { project: ctx.project.name.clone(), agent_id: id }).await;
    Ok(())
}

async fn finish_agent<C: Clock>(
    ctx: &SchedulerContext<C>,
    agents: &mut HashMap<AgentId, AgentRecord>,
    id: AgentId,
    error: Option<String>,
) {
    ctx.claims.release_for_agent(&id);
    if let Some(record) = agents.get_mut(&id) {
        let next = AgentState::Done { error };
        if record.state.can_transition_to(&next) {
            record.state = next;
            if record.kind == AgentKind::Planner {
                write_plan_artifact(ctx, record);
            }
            broadcast_state(ctx, record).await;
            // `done` additionally emits `deleted`: the agent is gone from
            // the client's point of view even though its record lingers
            // here until `agent.delete`/`agent.list` prunes it.
            ctx.event_bus.broadcast(Event::Deleted { project: ctx.project.name.clone(), agent_id: id }).await;
        }
    }
}

/// Persists a planner's captured output to its well-known plan path
/// (§4.11) when it reaches `done`. Best-effort: a write failure is
/// logged, not propagated, since the agent's own `done` transition must
/// still land.
fn write_plan_artifact<C: Clock>(ctx: &SchedulerContext<C>, record: &AgentRecord) {
    if let Err(e) = std::fs::create_dir_all(&ctx.plans_dir) {
        warn!(agent_id = %record.id, error = %e, "failed to create plans directory");
        return;
    }
    let path = ctx.plans_dir.join(format!("{}.md", record.id));
    let content = record.output_lines().join("\n");
    if let Err(e) = std::fs::write(&path, content) {
        warn!(agent_id = %record.id, error = %e, "failed to write plan artifact");
    }
}

/// Reaps an agent whose process exited, translating the OS-level exit
/// into the state-machine's terminal `done` (§4.12: the
/// scheduler performs the single mutating transition).
async fn on_process_exited<C: Clock>(ctx: &SchedulerContext<C>, agents: &mut HashMap<AgentId, AgentRecord>, exit: AgentExit) {
    let error = if exit.success { None } else { Some("agent process exited with a failure status".to_string()) };
    finish_agent(ctx, agents, exit.agent_id, error).await;
}

async fn stop_all<C: Clock>(ctx: &SchedulerContext<C>, agents: &mut HashMap<AgentId, AgentRecord>) {
    for record in agents.values_mut() {
        let next = AgentState::Stopping { force: false };
        if !record.state.can_transition_to(&next) {
            continue;
        }
        record.state = next;
        broadcast_state(ctx, record).await;
        if let Some(process) = record.process.clone() {
            let grace = ctx.abort_grace;
            tokio::spawn(async move { process.abort(grace, false).await });
        }
    }
}

/// Workers broadcast the generic `state` event; a manager's transitions
/// are a distinct kind (§4.8) so the TUI can render its long-lived chat
/// session differently from a worker's state line.
async fn broadcast_state<C: Clock>(ctx: &SchedulerContext<C>, record: &AgentRecord) {
    let project = ctx.project.name.clone();
    let event = if record.kind == AgentKind::Manager {
        Event::ManagerState { project, agent_id: record.id, state: record.state.clone() }
    } else {
        Event::State { project, agent_id: record.id, state: record.state.clone() }
    };
    ctx.event_bus.broadcast(event).await;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
