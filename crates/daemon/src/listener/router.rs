// SPDX-License-Identifier: MIT

//! Request dispatch: one function per `RequestPayload` family, grounded
//! on `oj`'s `listener::{query, mutations, workers, crons}`
//! submodule split (`daemon/src/listener/mod.rs`), collapsed into one
//! file since fab's request surface is far smaller.

use std::sync::Arc;

use fab_core::{AgentKind, ChatFrom, Clock, Event, PermissionBehavior, PermissionOutcome, QuestionOutcome, RuleEffect, StagedActionKind, TicketId};
use tokio::io::AsyncRead;
use tokio::net::unix::OwnedWriteHalf;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

use fab_wire::{
    AgentSummary, ClaimEntry, ConfigValue, FrameReader, PermissionEntry, ProjectSummary,
    QuestionEntry, RequestPayload, ResponsePayload, StagedActionEntry,
};

use crate::local_backend;
use crate::supervisor::{self, AgentRecord, SchedulerContext, SupervisorHandle};

use super::{race_ask, HandlerError, ListenCtx};

pub(super) async fn dispatch<C: Clock, R: AsyncRead + Unpin>(
    ctx: &ListenCtx<C>,
    reader: &mut FrameReader<R>,
    writer: &Arc<AsyncMutex<OwnedWriteHalf>>,
    subscriber_id: &mut Option<crate::event_bus::SubscriberId>,
    payload: RequestPayload,
) -> Result<ResponsePayload, HandlerError> {
    match payload {
        RequestPayload::Ping => Ok(ResponsePayload::Pong),
        RequestPayload::Shutdown => {
            ctx.shutdown.notify_one();
            Ok(ResponsePayload::ShuttingDown)
        }
        RequestPayload::Status => status(ctx).await,
        RequestPayload::Stats => stats(ctx).await,

        RequestPayload::ProjectAdd { remote_url, name, max_agents, autostart, backend } => {
            project_add(ctx, remote_url, name, max_agents, autostart, backend).await
        }
        RequestPayload::ProjectRemove { name, delete_worktrees } => {
            project_remove(ctx, &name, delete_worktrees.unwrap_or(false)).await
        }
        RequestPayload::ProjectList => project_list(ctx).await,
        RequestPayload::ProjectConfigShow { name } => project_config_show(ctx, &name),
        RequestPayload::ProjectConfigGet { name, key } => {
            let value = ctx.projects.config_get(&name, &key)?;
            Ok(ResponsePayload::ConfigValue(ConfigValue { key, value }))
        }
        RequestPayload::ProjectConfigSet { name, key, value } => {
            ctx.projects.config_set(&name, &key, &value)?;
            Ok(ResponsePayload::None)
        }

        RequestPayload::Start { project, all } => {
            if all.unwrap_or(false) {
                for p in ctx.projects.list() {
                    if let Err(e) = start_project(ctx, &p.name).await {
                        warn!(project = %p.name, error = %e, "failed to start project");
                    }
                }
                Ok(ResponsePayload::None)
            } else if let Some(name) = project {
                start_project(ctx, &name).await?;
                Ok(ResponsePayload::None)
            } else {
                Err(HandlerError::MissingTarget)
            }
        }
        RequestPayload::Stop { project, all } => {
            if all.unwrap_or(false) {
                let names: Vec<String> = ctx.supervisors.lock().keys().cloned().collect();
                for name in names {
                    stop_project(ctx, &name).await?;
                }
                Ok(ResponsePayload::None)
            } else if let Some(name) = project {
                stop_project(ctx, &name).await?;
                Ok(ResponsePayload::None)
            } else {
                Err(HandlerError::MissingTarget)
            }
        }

        RequestPayload::AgentList { project } => agent_list(ctx, project).await,
        RequestPayload::AgentCreate { project, task } => agent_create(ctx, project, task).await,
        RequestPayload::AgentDelete { id, force } => {
            let (handle, _) = owner(ctx, id).await?;
            handle.delete(id, force.unwrap_or(false)).await?;
            Ok(ResponsePayload::None)
        }
        RequestPayload::AgentAbort { id, force } => {
            let (handle, _) = owner(ctx, id).await?;
            handle.abort(id, force.unwrap_or(false)).await?;
            Ok(ResponsePayload::None)
        }
        RequestPayload::AgentInput { id, text } => {
            let (handle, _) = owner(ctx, id).await?;
            handle.input(id, text).await?;
            Ok(ResponsePayload::None)
        }
        RequestPayload::AgentOutput { id } => {
            let (_, record) = owner(ctx, id).await?;
            Ok(ResponsePayload::Output { lines: record.output_lines() })
        }
        RequestPayload::AgentSendMessage { id, content } => {
            let (handle, record) = owner(ctx, id).await?;
            handle.input(id, content.clone()).await?;
            let entry = ctx.manager_chat.append(id, ChatFrom::Operator, content);
            ctx.event_bus
                .broadcast(Event::ChatEntry {
                    project: record.project,
                    agent_id: id,
                    from: entry.from,
                    body: entry.body,
                    at_ms: entry.at_ms,
                })
                .await;
            Ok(ResponsePayload::None)
        }
        RequestPayload::AgentChatHistory { id, limit } => {
            Ok(ResponsePayload::ChatHistory { entries: ctx.manager_chat.history(&id, limit) })
        }
        RequestPayload::AgentDescribe { id, description } => {
            let id = id.ok_or(HandlerError::AgentIdRequired)?;
            let (handle, _) = owner(ctx, id).await?;
            handle.describe(Some(id), description).await?;
            Ok(ResponsePayload::None)
        }
        RequestPayload::AgentDone { agent_id, task_id, error } => {
            let ticket = task_id.map(TicketId::new);
            if let Some(handle) = resolve_done_owner(ctx, agent_id, ticket.as_ref()).await {
                handle.done(agent_id, ticket, error).await;
            }
            Ok(ResponsePayload::None)
        }
        RequestPayload::AgentIdle { agent_id } => {
            if let Some(handle) = resolve_done_owner(ctx, agent_id, None).await {
                handle.idle(agent_id).await;
            }
            Ok(ResponsePayload::None)
        }
        RequestPayload::AgentClaim { agent_id, ticket_id } => {
            let (_, record) = owner(ctx, agent_id).await?;
            ctx.claims.claim(ticket_id, agent_id, record.project)?;
            Ok(ResponsePayload::Claimed)
        }

        RequestPayload::PermissionRequest { agent_id, project, tool_name, tool_input } => {
            permission_request(ctx, reader, agent_id, project, tool_name, tool_input).await
        }
        RequestPayload::PermissionRespond { id, behavior, message, interrupt } => {
            let outcome = PermissionOutcome {
                behavior,
                message: message.unwrap_or_default(),
                interrupt: interrupt.unwrap_or(false),
            };
            ctx.permissions.respond(&id, outcome)?;
            Ok(ResponsePayload::None)
        }
        RequestPayload::PermissionList { project } => Ok(ResponsePayload::Permissions {
            requests: ctx.permissions.list(project.as_deref()).into_iter().map(PermissionEntry).collect(),
        }),

        RequestPayload::QuestionRequest { agent_id, project, items } => {
            question_request(ctx, reader, agent_id, project, items).await
        }
        RequestPayload::QuestionRespond { id, answers } => {
            ctx.questions.respond(&id, QuestionOutcome { answers })?;
            Ok(ResponsePayload::None)
        }
        RequestPayload::QuestionList { project } => Ok(ResponsePayload::Questions {
            requests: ctx.questions.list(project.as_deref()).into_iter().map(QuestionEntry).collect(),
        }),

        RequestPayload::ClaimList { project } => Ok(ResponsePayload::Claims {
            claims: ctx.claims.list(project.as_deref()).into_iter().map(ClaimEntry::from).collect(),
        }),

        RequestPayload::StagedActionCreate { agent_id, kind } => {
            let (_, record) = owner(ctx, agent_id).await?;
            let action = ctx.staged_actions.enqueue(agent_id, record.project.clone(), kind);
            ctx.event_bus
                .broadcast(Event::Intervention { project: record.project, action: action.clone() })
                .await;
            Ok(ResponsePayload::StagedActionCreated { id: action.id })
        }
        RequestPayload::StagedActionList { project } => Ok(ResponsePayload::StagedActions {
            actions: ctx.staged_actions.list(project.as_deref()).into_iter().map(StagedActionEntry).collect(),
        }),
        RequestPayload::StagedActionApprove { id } => staged_action_approve(ctx, id).await,
        RequestPayload::StagedActionReject { id, reason: _ } => {
            ctx.staged_actions.take(&id)?;
            Ok(ResponsePayload::None)
        }

        RequestPayload::ManagerChat { project, content } => manager_chat(ctx, project, content).await,
        RequestPayload::ManagerChatHistory { project, limit } => {
            let manager_id = manager_agent_id(ctx, &project).await?;
            Ok(ResponsePayload::ChatHistory { entries: ctx.manager_chat.history(&manager_id, limit) })
        }

        RequestPayload::PlanCreate { project, task } => plan_create(ctx, project, task).await,
        RequestPayload::PlanShow { agent_id } => plan_show(ctx, agent_id),

        RequestPayload::Attach { projects } => {
            if let Some(id) = subscriber_id.take() {
                ctx.event_bus.detach(id);
            }
            *subscriber_id = Some(ctx.event_bus.attach(Arc::clone(writer), projects));
            Ok(ResponsePayload::None)
        }
        RequestPayload::Detach => {
            if let Some(id) = subscriber_id.take() {
                ctx.event_bus.detach(id);
            }
            Ok(ResponsePayload::None)
        }
    }
}

async fn status<C: Clock>(ctx: &ListenCtx<C>) -> Result<ResponsePayload, HandlerError> {
    let handles: Vec<SupervisorHandle> = ctx.supervisors.lock().values().cloned().collect();
    let mut agents_active = 0;
    for handle in &handles {
        agents_active += handle.list().await.len();
    }
    Ok(ResponsePayload::Status {
        uptime_secs: ctx.start_time.elapsed().as_secs(),
        projects_running: handles.len(),
        agents_active,
    })
}

async fn stats<C: Clock>(ctx: &ListenCtx<C>) -> Result<ResponsePayload, HandlerError> {
    let handles: Vec<SupervisorHandle> = ctx.supervisors.lock().values().cloned().collect();
    let mut agents_running = 0;
    for handle in &handles {
        agents_running += handle.list().await.len();
    }
    Ok(ResponsePayload::Stats(fab_core::DaemonStats {
        uptime_secs: ctx.start_time.elapsed().as_secs(),
        projects: ctx.projects.list().len(),
        agents_running,
        pending_permissions: ctx.permissions.len(),
        pending_questions: ctx.questions.len(),
        staged_actions: ctx.staged_actions.list(None).len(),
    }))
}

async fn project_add<C: Clock>(
    ctx: &ListenCtx<C>,
    remote_url: String,
    name: Option<String>,
    max_agents: Option<u32>,
    autostart: Option<bool>,
    backend: Option<String>,
) -> Result<ResponsePayload, HandlerError> {
    let project = ctx.projects.add(&ctx.fab_dir, remote_url, name, max_agents, autostart, backend)?;
    if project.autostart {
        start_project(ctx, &project.name).await?;
    }
    Ok(ResponsePayload::None)
}

async fn project_remove<C: Clock>(
    ctx: &ListenCtx<C>,
    name: &str,
    delete_worktrees: bool,
) -> Result<ResponsePayload, HandlerError> {
    if let Some(handle) = ctx.supervisor_for(name) {
        let live = handle.list().await.into_iter().filter(|r| !matches!(r.state, fab_core::AgentState::Done { .. })).count();
        if live > 0 {
            return Err(HandlerError::Project(crate::error::ProjectError::HasLiveAgents(name.to_string(), live)));
        }
    }
    ctx.projects.remove(name)?;
    if delete_worktrees {
        let _ = std::fs::remove_dir_all(ctx.fab_dir.join("projects").join(name).join("worktrees"));
    }
    Ok(ResponsePayload::None)
}

async fn project_list<C: Clock>(ctx: &ListenCtx<C>) -> Result<ResponsePayload, HandlerError> {
    let mut projects = Vec::new();
    for p in ctx.projects.list() {
        let handle = ctx.supervisor_for(&p.name);
        let (running, agents_active) = match &handle {
            Some(h) => (true, h.list().await.len()),
            None => (false, 0),
        };
        projects.push(ProjectSummary {
            name: p.name,
            remote_url: p.remote_url,
            max_agents: p.max_agents,
            autostart: p.autostart,
            running,
            agents_active,
        });
    }
    Ok(ResponsePayload::Projects { projects })
}

fn project_config_show<C: Clock>(ctx: &ListenCtx<C>, name: &str) -> Result<ResponsePayload, HandlerError> {
    const KEYS: [&str; 4] = ["max-agents", "autostart", "issue-backend", "agent-backend"];
    let mut lines = Vec::with_capacity(KEYS.len());
    for key in KEYS {
        let value = ctx.projects.config_get(name, key)?;
        lines.push(format!("{key}={value}"));
    }
    Ok(ResponsePayload::Output { lines })
}

async fn agent_list<C: Clock>(ctx: &ListenCtx<C>, project: Option<String>) -> Result<ResponsePayload, HandlerError> {
    let mut agents = Vec::new();
    let handles: Vec<(String, SupervisorHandle)> = match project {
        Some(name) => {
            let handle = ctx.supervisor_for(&name).ok_or_else(|| HandlerError::ProjectNotRunning(name.clone()))?;
            vec![(name, handle)]
        }
        None => ctx.supervisors.lock().iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
    };
    for (_, handle) in handles {
        for record in handle.list().await {
            agents.push(summarize(record));
        }
    }
    Ok(ResponsePayload::Agents { agents })
}

fn summarize(record: AgentRecord) -> AgentSummary {
    AgentSummary {
        id: record.id,
        project: record.project,
        kind: record.kind,
        state: record.state,
        ticket_id: record.task.map(|t| t.as_str().to_string()),
        description: record.description,
    }
}

async fn agent_create<C: Clock>(
    ctx: &ListenCtx<C>,
    project: String,
    task: Option<String>,
) -> Result<ResponsePayload, HandlerError> {
    let handle = ctx.supervisor_for(&project).ok_or_else(|| HandlerError::ProjectNotRunning(project.clone()))?;
    let ticket = task.map(TicketId::new);
    let record = handle.create(AgentKind::Worker, ticket.clone(), None).await?;
    if let Some(ticket) = ticket {
        if let Err(e) = ctx.claims.claim(ticket, record.id, project) {
            let _ = handle.delete(record.id, true).await;
            return Err(HandlerError::from(e));
        }
    }
    Ok(ResponsePayload::AgentCreated { agent_id: record.id })
}

async fn owner<C: Clock>(
    ctx: &ListenCtx<C>,
    id: fab_core::AgentId,
) -> Result<(SupervisorHandle, AgentRecord), HandlerError> {
    ctx.find_agent(id).await.ok_or(HandlerError::AgentNotFound(id))
}

async fn resolve_done_owner<C: Clock>(
    ctx: &ListenCtx<C>,
    agent_id: Option<fab_core::AgentId>,
    task_id: Option<&TicketId>,
) -> Option<SupervisorHandle> {
    if let Some(id) = agent_id {
        if let Some((handle, _)) = ctx.find_agent(id).await {
            return Some(handle);
        }
    }
    if let Some(ticket) = task_id {
        if let Some(claim) = ctx.claims.get(ticket) {
            return ctx.supervisor_for(&claim.project);
        }
    }
    None
}

async fn permission_request<C: Clock, R: AsyncRead + Unpin>(
    ctx: &ListenCtx<C>,
    reader: &mut FrameReader<R>,
    agent_id: fab_core::AgentId,
    project: String,
    tool_name: String,
    tool_input: serde_json::Value,
) -> Result<ResponsePayload, HandlerError> {
    let cwd = match ctx.find_agent(agent_id).await {
        Some((_, record)) => record.worktree,
        None => ctx.fab_dir.join("projects").join(&project),
    };
    let (effect, matched) = ctx.rules.evaluate(&tool_name, &tool_input, Some(&project), &cwd).await?;
    if matched {
        let behavior = match effect {
            RuleEffect::Allow => Some(PermissionBehavior::Allow),
            RuleEffect::Deny => Some(PermissionBehavior::Deny),
            RuleEffect::Pass => None,
        };
        if let Some(behavior) = behavior {
            return Ok(ResponsePayload::PermissionDecision(PermissionOutcome {
                behavior,
                message: String::new(),
                interrupt: false,
            }));
        }
    }

    let (request, rx) = ctx.permissions.request(agent_id, project.clone(), tool_name, tool_input);
    ctx.event_bus.broadcast(Event::PermissionRequest { project, request }).await;
    match race_ask(reader, rx).await {
        Some(outcome) => Ok(ResponsePayload::PermissionDecision(outcome)),
        None => {
            ctx.permissions.remove_for_agent(&agent_id);
            Ok(ResponsePayload::PermissionDecision(PermissionOutcome {
                behavior: PermissionBehavior::Deny,
                message: "ask expired or connection closed".to_string(),
                interrupt: false,
            }))
        }
    }
}

async fn question_request<C: Clock, R: AsyncRead + Unpin>(
    ctx: &ListenCtx<C>,
    reader: &mut FrameReader<R>,
    agent_id: fab_core::AgentId,
    project: String,
    items: Vec<fab_core::QuestionItem>,
) -> Result<ResponsePayload, HandlerError> {
    let (request, rx) = ctx.questions.request(agent_id, project.clone(), items.clone());
    ctx.event_bus
        .broadcast(Event::UserQuestion {
            project,
            agent_id,
            id: request.id,
            items,
            requested_at_ms: request.requested_at_ms,
        })
        .await;
    match race_ask(reader, rx).await {
        Some(outcome) => Ok(ResponsePayload::QuestionDecision(outcome)),
        None => {
            ctx.questions.remove_for_agent(&agent_id);
            Ok(ResponsePayload::QuestionDecision(QuestionOutcome::default()))
        }
    }
}

async fn staged_action_approve<C: Clock>(
    ctx: &ListenCtx<C>,
    id: fab_core::StagedActionId,
) -> Result<ResponsePayload, HandlerError> {
    let action = ctx.staged_actions.take(&id)?;
    let (handle, _) = owner(ctx, action.agent_id).await?;
    match action.kind {
        StagedActionKind::SendMessage { content } => {
            handle.input(action.agent_id, content).await?;
        }
        StagedActionKind::Quit => {
            handle.abort(action.agent_id, false).await?;
        }
    }
    Ok(ResponsePayload::None)
}

async fn manager_agent_id<C: Clock>(ctx: &ListenCtx<C>, project: &str) -> Result<fab_core::AgentId, HandlerError> {
    let handle = ctx.supervisor_for(project).ok_or_else(|| HandlerError::ProjectNotRunning(project.to_string()))?;
    handle
        .list()
        .await
        .into_iter()
        .find(|r| r.kind == AgentKind::Manager)
        .map(|r| r.id)
        .ok_or_else(|| HandlerError::NoManagerAgent(project.to_string()))
}

async fn manager_chat<C: Clock>(
    ctx: &ListenCtx<C>,
    project: String,
    content: String,
) -> Result<ResponsePayload, HandlerError> {
    let manager_id = manager_agent_id(ctx, &project).await?;
    let handle = ctx.supervisor_for(&project).ok_or_else(|| HandlerError::ProjectNotRunning(project.clone()))?;
    handle.input(manager_id, content.clone()).await?;
    let entry = ctx.manager_chat.append(manager_id, ChatFrom::Operator, content);
    ctx.event_bus
        .broadcast(Event::ManagerChatEntry { project, agent_id: manager_id, from: entry.from, body: entry.body, at_ms: entry.at_ms })
        .await;
    Ok(ResponsePayload::None)
}

/// Spawns an ephemeral planner agent (§4.11): exempt from `max_agents`
/// pool accounting and holds no ticket claim, unlike `agent.create`'s
/// worker agents.
async fn plan_create<C: Clock>(
    ctx: &ListenCtx<C>,
    project: String,
    task: Option<String>,
) -> Result<ResponsePayload, HandlerError> {
    let handle = ctx.supervisor_for(&project).ok_or_else(|| HandlerError::ProjectNotRunning(project.clone()))?;
    let ticket = task.map(TicketId::new);
    let record = handle.create(AgentKind::Planner, ticket, None).await?;
    Ok(ResponsePayload::AgentCreated { agent_id: record.id })
}

fn plan_show<C: Clock>(ctx: &ListenCtx<C>, agent_id: fab_core::AgentId) -> Result<ResponsePayload, HandlerError> {
    let path = ctx.fab_dir.join("plans").join(format!("{agent_id}.md"));
    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(ResponsePayload::Plan { content }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(HandlerError::PlanNotFound(agent_id)),
        Err(e) => Err(HandlerError::Io(e)),
    }
}

/// Starts a project's scheduler (idempotent) and its long-lived manager
/// agent (§4.11: spawned automatically the first time a project starts,
/// not requested through `agent.create`).
pub async fn start_project<C: Clock>(ctx: &ListenCtx<C>, name: &str) -> Result<(), HandlerError> {
    if ctx.supervisor_for(name).is_some() {
        return Ok(());
    }
    let project = ctx.projects.get(name)?;
    if project.issue_backend != "local" {
        return Err(HandlerError::UnsupportedBackend(project.issue_backend.clone()));
    }
    let (issue_backend, repo_manager) = local_backend::resolve(&ctx.fab_dir);
    let scheduler_ctx = SchedulerContext {
        project: project.clone(),
        clock: ctx.clock.clone(),
        claims: Arc::clone(&ctx.claims),
        event_bus: Arc::clone(&ctx.event_bus),
        issue_backend: Arc::new(issue_backend),
        repo_manager: Arc::new(repo_manager),
        abort_grace: ctx.abort_grace,
        plans_dir: ctx.fab_dir.join("plans"),
    };
    let handle = supervisor::spawn(scheduler_ctx);
    ctx.supervisors.lock().insert(name.to_string(), handle.clone());

    if let Err(e) = handle.create(AgentKind::Manager, None, Some(format!("{name} manager"))).await {
        warn!(project = name, error = %e, "failed to start project manager agent");
    }
    info!(project = name, "project started");
    Ok(())
}

/// Stops a project's scheduler task, if running (idempotent).
pub async fn stop_project<C: Clock>(ctx: &ListenCtx<C>, name: &str) -> Result<(), HandlerError> {
    let handle = ctx.supervisors.lock().remove(name);
    if let Some(handle) = handle {
        handle.stop().await;
    }
    Ok(())
}
