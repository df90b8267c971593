// SPDX-License-Identifier: MIT

//! Summary/detail structs embedded in response payloads.

use fab_core::{AgentId, AgentKind, AgentState, Claim, PermissionRequest, StagedAction, UserQuestion};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSummary {
    pub name: String,
    pub remote_url: String,
    pub max_agents: u32,
    pub autostart: bool,
    pub running: bool,
    pub agents_active: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSummary {
    pub id: AgentId,
    pub project: String,
    pub kind: AgentKind,
    pub state: AgentState,
    pub ticket_id: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigValue {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClaimEntry {
    pub ticket_id: String,
    pub agent_id: AgentId,
    pub project: String,
}

impl From<Claim> for ClaimEntry {
    fn from(claim: Claim) -> Self {
        Self {
            ticket_id: claim.ticket_id.as_str().to_string(),
            agent_id: claim.agent_id,
            project: claim.project,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionEntry(pub PermissionRequest);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionEntry(pub UserQuestion);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedActionEntry(pub StagedAction);
