// SPDX-License-Identifier: MIT

//! Stream event kinds broadcast to attached clients.

use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, AgentState};
use crate::ask::{AskId, PermissionRequest, QuestionItem};
use crate::staged_action::StagedAction;

/// A single broadcastable state change, agent output line, ask, or chat
/// entry. Every variant carries the `project` it belongs to so
/// [`crate::ask`]-unrelated subscribers can filter by project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A line of captured stdout/stderr from an agent's child process.
    Output { project: String, agent_id: AgentId, stream: OutputStream, line: String },

    /// An agent transitioned to a new lifecycle state.
    State { project: String, agent_id: AgentId, state: AgentState },

    /// An agent (or staged action, etc.) was created.
    Created { project: String, agent_id: AgentId },

    /// An agent was deleted/reaped.
    Deleted { project: String, agent_id: AgentId },

    /// A free-form informational message.
    Info { project: Option<String>, message: String },

    /// A manager/planner chat entry was appended.
    ChatEntry { project: String, agent_id: AgentId, from: ChatFrom, body: String, at_ms: u64 },

    /// A permission ask is awaiting operator response.
    PermissionRequest { project: String, request: PermissionRequest },

    /// A user question ask is awaiting operator response.
    UserQuestion {
        project: String,
        agent_id: AgentId,
        id: AskId,
        items: Vec<QuestionItem>,
        requested_at_ms: u64,
    },

    /// A staged action was proposed and is awaiting approval.
    Intervention { project: String, action: StagedAction },

    /// The project manager agent changed state.
    ManagerState { project: String, agent_id: AgentId, state: AgentState },

    /// A chat entry was appended to the project manager's history.
    ManagerChatEntry { project: String, agent_id: AgentId, from: ChatFrom, body: String, at_ms: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatFrom {
    Agent,
    Operator,
}

impl Event {
    /// The project this event belongs to, if any (used by attach
    /// filtering). `Info` events without a project are broadcast to
    /// every subscriber regardless of filter.
    pub fn project(&self) -> Option<&str> {
        match self {
            Event::Output { project, .. }
            | Event::State { project, .. }
            | Event::Created { project, .. }
            | Event::Deleted { project, .. }
            | Event::ChatEntry { project, .. }
            | Event::PermissionRequest { project, .. }
            | Event::UserQuestion { project, .. }
            | Event::Intervention { project, .. }
            | Event::ManagerState { project, .. }
            | Event::ManagerChatEntry { project, .. } => Some(project),
            Event::Info { project, .. } => project.as_deref(),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
