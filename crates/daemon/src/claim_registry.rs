// SPDX-License-Identifier: MIT

//! Ticket-claim registry. In-memory map guarded by a
//! single lock, mirrored to `claims.json` (rewritten whole-file on every
//! mutation — the file is small enough that the append-vs-rewrite
//! tradeoffs a WAL has to make don't apply here).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use fab_core::{AgentId, Claim, TicketId};
use parking_lot::Mutex;

use crate::error::{ClaimError, DaemonError};

pub struct ClaimRegistry {
    path: PathBuf,
    claims: Mutex<HashMap<TicketId, Claim>>,
}

impl ClaimRegistry {
    /// Loads `claims.json` under `fab_dir` if present, else starts empty.
    pub fn load(fab_dir: &Path) -> Result<Self, DaemonError> {
        let path = fab_dir.join("claims.json");
        let claims = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            let list: Vec<Claim> =
                serde_json::from_str(&raw).map_err(|e| DaemonError::Registry(e.to_string()))?;
            list.into_iter().map(|c| (c.ticket_id.clone(), c)).collect()
        } else {
            HashMap::new()
        };
        Ok(Self { path, claims: Mutex::new(claims) })
    }

    /// Fails if `ticket_id` is claimed by a different agent. Idempotent
    /// for the same agent.
    pub fn claim(
        &self,
        ticket_id: TicketId,
        agent_id: AgentId,
        project: String,
    ) -> Result<(), ClaimError> {
        let mut claims = self.claims.lock();
        if let Some(existing) = claims.get(&ticket_id) {
            if existing.agent_id == agent_id {
                return Ok(());
            }
            return Err(ClaimError::AlreadyClaimed(ticket_id));
        }
        claims.insert(ticket_id.clone(), Claim { ticket_id, agent_id, project });
        self.persist(&claims);
        Ok(())
    }

    /// Removes every claim owned by `agent_id` (released on its
    /// `done`/deletion per §4.5).
    pub fn release_for_agent(&self, agent_id: &AgentId) {
        let mut claims = self.claims.lock();
        let before = claims.len();
        claims.retain(|_, c| &c.agent_id != agent_id);
        if claims.len() != before {
            self.persist(&claims);
        }
    }

    pub fn list(&self, project: Option<&str>) -> Vec<Claim> {
        let claims = self.claims.lock();
        let mut out: Vec<Claim> = claims
            .values()
            .filter(|c| project.is_none_or(|p| c.project == p))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.ticket_id.as_str().cmp(b.ticket_id.as_str()));
        out
    }

    pub fn get(&self, ticket_id: &TicketId) -> Option<Claim> {
        self.claims.lock().get(ticket_id).cloned()
    }

    fn persist(&self, claims: &HashMap<TicketId, Claim>) {
        let mut list: Vec<&Claim> = claims.values().collect();
        list.sort_by(|a, b| a.ticket_id.as_str().cmp(b.ticket_id.as_str()));
        let Ok(rendered) = serde_json::to_string_pretty(&list) else { return };
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = std::fs::write(&self.path, rendered);
    }
}

#[cfg(test)]
#[path = "claim_registry_tests.rs"]
mod tests;
