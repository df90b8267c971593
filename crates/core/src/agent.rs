// SPDX-License-Identifier: MIT

//! Agent identifier and state-machine types.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a running agent instance.
    pub struct AgentId("agt-");
}

/// Whether an agent participates in a project's `max_agents` pool
/// accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Worker,
    Manager,
    Planner,
}

impl AgentKind {
    /// Managers and planners are exempt from the per-project capacity count.
    pub fn counts_toward_pool(self) -> bool {
        matches!(self, AgentKind::Worker)
    }
}

/// State machine for a supervised agent.
///
/// ```text
///         +--- abort(force) -----------------+
///         |                                  v
///   (new)-> starting -> running <-> idle -> done -> (reaped)
///                          |
///                          v
///                       stopping -> (reaped)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AgentState {
    Starting,
    Running,
    Idle,
    Done {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Stopping {
        force: bool,
    },
}

impl AgentState {
    pub fn label(&self) -> &'static str {
        match self {
            AgentState::Starting => "starting",
            AgentState::Running => "running",
            AgentState::Idle => "idle",
            AgentState::Done { .. } => "done",
            AgentState::Stopping { .. } => "stopping",
        }
    }

    /// Done/Stopping agents no longer occupy a pool slot or accept work.
    pub fn is_terminal_or_stopping(&self) -> bool {
        matches!(self, AgentState::Done { .. } | AgentState::Stopping { .. })
    }

    pub fn is_done(&self) -> bool {
        matches!(self, AgentState::Done { .. })
    }

    /// Validates a transition per the state machine above. `abort` may be
    /// requested from any non-terminal state; all other transitions are
    /// restricted to their one legal predecessor.
    pub fn can_transition_to(&self, next: &AgentState) -> bool {
        use AgentState::*;
        match (self, next) {
            (_, Stopping { .. }) => !matches!(self, Done { .. }),
            (Starting, Running) => true,
            (Running, Idle) | (Idle, Running) => true,
            (Running, Done { .. }) | (Idle, Done { .. }) => true,
            (Stopping { .. }, Done { .. }) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
