// SPDX-License-Identifier: MIT

//! Response payload catalog: one variant per reply to a request family,
//! mirroring the shape of `RequestPayload`.

use fab_core::{AgentId, ChatEntry, DaemonStats, PermissionOutcome, QuestionOutcome, StagedActionId};
use serde::{Deserialize, Serialize};

use crate::types::{
    AgentSummary, ClaimEntry, ConfigValue, PermissionEntry, ProjectSummary, QuestionEntry,
    StagedActionEntry,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum ResponsePayload {
    /// No payload — used for bare `success`/`error` responses (spec §7:
    /// a failure response never carries a typed payload).
    #[serde(rename = "none")]
    None,
    #[serde(rename = "pong")]
    Pong,
    #[serde(rename = "shutting_down")]
    ShuttingDown,
    #[serde(rename = "status")]
    Status { uptime_secs: u64, projects_running: usize, agents_active: usize },
    #[serde(rename = "stats")]
    Stats(DaemonStats),
    #[serde(rename = "projects")]
    Projects { projects: Vec<ProjectSummary> },
    #[serde(rename = "config_value")]
    ConfigValue(ConfigValue),
    #[serde(rename = "agents")]
    Agents { agents: Vec<AgentSummary> },
    #[serde(rename = "agent_created")]
    AgentCreated { agent_id: AgentId },
    #[serde(rename = "output")]
    Output { lines: Vec<String> },
    #[serde(rename = "chat_history")]
    ChatHistory { entries: Vec<ChatEntry> },
    #[serde(rename = "claimed")]
    Claimed,
    #[serde(rename = "claims")]
    Claims { claims: Vec<ClaimEntry> },
    #[serde(rename = "permissions")]
    Permissions { requests: Vec<PermissionEntry> },
    #[serde(rename = "questions")]
    Questions { requests: Vec<QuestionEntry> },
    #[serde(rename = "staged_actions")]
    StagedActions { actions: Vec<StagedActionEntry> },
    #[serde(rename = "staged_action_created")]
    StagedActionCreated { id: StagedActionId },
    #[serde(rename = "plan")]
    Plan { content: String },
    /// The resolved outcome of a blocking `permission.request` call
    /// (sent back to the hook's own connection once a rule, the human
    /// operator, or an expiry resolves it).
    #[serde(rename = "permission_decision")]
    PermissionDecision(PermissionOutcome),
    /// The resolved outcome of a blocking `question.request` call.
    #[serde(rename = "question_decision")]
    QuestionDecision(QuestionOutcome),
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
