// SPDX-License-Identifier: MIT

//! Ticket claims — exclusive ticket-to-agent assignment.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use crate::agent::AgentId;

/// Identifier assigned by an external issue backend. Opaque and
/// backend-owned, so unlike [`crate::agent::AgentId`] it is a plain
/// string newtype rather than a `define_id!` type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub String);

impl TicketId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TicketId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Borrow<str> for TicketId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A single exclusive ticket assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub ticket_id: TicketId,
    pub agent_id: AgentId,
    pub project: String,
}
