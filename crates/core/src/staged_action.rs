// SPDX-License-Identifier: MIT

//! Operator-approved orchestrator moves.

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;

crate::define_id! {
    /// Unique identifier for a staged action.
    pub struct StagedActionId("stg-");
}

/// The orchestrator move an approved staged action performs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StagedActionKind {
    SendMessage { content: String },
    Quit,
}

/// A single proposed orchestrator move awaiting operator approval.
/// Unordered across different (agent, project) pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedAction {
    pub id: StagedActionId,
    pub agent_id: AgentId,
    pub project: String,
    pub kind: StagedActionKind,
    pub created_at_ms: u64,
}
