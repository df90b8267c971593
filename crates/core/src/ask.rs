// SPDX-License-Identifier: MIT

//! Pending-ask payload types shared by the permission and question
//! ask-broker instances.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::agent::AgentId;
use crate::id::random_hex8;

/// Identifier for a pending ask. Deliberately an opaque random 8-hex-digit
/// id per, not the 23-byte `define_id!` scheme used for
/// longer-lived entities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AskId(pub String);

impl AskId {
    pub fn new() -> Self {
        Self(random_hex8())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A permission request raised by an agent's tool-use hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionRequest {
    pub id: AskId,
    pub agent_id: AgentId,
    pub project: String,
    pub tool_name: String,
    pub tool_input: serde_json::Value,
    pub requested_at_ms: u64,
}

/// The human's decision behavior for a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionBehavior {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionOutcome {
    pub behavior: PermissionBehavior,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub interrupt: bool,
}

/// One question item within a multi-question ask, with its selectable
/// options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionItem {
    pub header: String,
    pub prompt: String,
    pub options: Vec<String>,
}

/// A user-question ask raised by an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserQuestion {
    pub id: AskId,
    pub agent_id: AgentId,
    pub project: String,
    pub items: Vec<QuestionItem>,
    pub requested_at_ms: u64,
}

/// Resolution for a user question: one selected answer per question,
/// keyed by the question's header.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub answers: std::collections::HashMap<String, String>,
}
