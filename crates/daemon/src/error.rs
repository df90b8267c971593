// SPDX-License-Identifier: MIT

//! Per-subsystem error types (§7.1). Handlers convert these
//! to `Response { success: false, error: e.to_string() }` at the single
//! point the router calls a handler — never ad hoc.

use fab_core::{AgentId, AskId, BackendError, StagedActionId, TicketId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("could not determine a state directory (no FAB_DIR, XDG_STATE_HOME, or $HOME)")]
    NoStateDir,
    #[error("another fabd instance is already running (pid {0})")]
    AlreadyRunning(u32),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid project registry: {0}")]
    Registry(String),
}

#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("ticket {0} already claimed")]
    AlreadyClaimed(TicketId),
}

#[derive(Debug, Error)]
pub enum AskError {
    #[error("no pending ask with id {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("invalid project name: {0}")]
    InvalidName(String),
    #[error("project {0:?} not found")]
    NotFound(String),
    #[error("project {0:?} already exists")]
    AlreadyExists(String),
    #[error("project {0:?} has {1} live agent(s), refusing to remove")]
    HasLiveAgents(String, usize),
    #[error("unrecognized config key {0:?}")]
    UnknownConfigKey(String),
    #[error("invalid value for {key:?}: {reason}")]
    InvalidConfigValue { key: String, reason: String },
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent {0} not found")]
    NotFound(AgentId),
    #[error("agent {0} cannot transition from {1} to {2}")]
    IllegalTransition(AgentId, &'static str, &'static str),
    #[error("project {0:?} is at its agent capacity ({1})")]
    AtCapacity(String, u32),
    #[error("failed to spawn agent process: {0}")]
    SpawnFailed(String),
}

#[derive(Debug, Error)]
pub enum StagedActionError {
    #[error("staged action {0} not found")]
    NotFound(StagedActionId),
    #[error("staged action {0} failed to execute: {1}")]
    ExecutionFailed(StagedActionId, String),
}

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule file {0:?} is not valid TOML: {1}")]
    Parse(std::path::PathBuf, String),
 #[error]
    LlmCheckerUnsupported,
    #[error("rule script {0:?} timed out or failed: {1}")]
    ScriptFailed(std::path::PathBuf, String),
}

/// Surfaced by supervisor operations that name an unknown project.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("project {0:?} not found")]
    UnknownProject(String),
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error(transparent)]
    Claim(#[from] ClaimError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub(crate) fn ask_not_found(id: &AskId) -> AskError {
    AskError::NotFound(id.as_str().to_string())
}
