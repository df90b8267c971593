// SPDX-License-Identifier: MIT

//! Permission ask-broker instance.

use fab_core::{AgentId, AskId, Clock, PermissionOutcome, PermissionRequest};
use tokio::sync::oneshot;

use crate::error::AskError;

use super::AskBroker;

pub struct PermissionManager<C: Clock> {
    clock: C,
    broker: AskBroker<C, PermissionRequest, PermissionOutcome>,
}

impl<C: Clock> PermissionManager<C> {
    pub fn new(clock: C, timeout: std::time::Duration) -> Self {
        Self { broker: AskBroker::new(clock.clone(), timeout), clock }
    }

    /// Raises a new permission ask, returning the normalized request (for
    /// broadcasting as a `permission_request` event) and the receiver the
    /// blocked hook handler awaits.
    pub fn request(
        &self,
        agent_id: AgentId,
        project: String,
        tool_name: String,
        tool_input: serde_json::Value,
    ) -> (PermissionRequest, oneshot::Receiver<PermissionOutcome>) {
        let id = AskId::new();
        let request = PermissionRequest {
            id: id.clone(),
            agent_id,
            project,
            tool_name,
            tool_input,
            requested_at_ms: self.clock.epoch_ms(),
        };
        let rx = self.broker.add(id, agent_id, request.clone());
        (request, rx)
    }

    pub fn respond(&self, id: &AskId, outcome: PermissionOutcome) -> Result<(), AskError> {
        self.broker.respond(id, outcome)
    }

    pub fn remove_for_agent(&self, agent_id: &AgentId) {
        self.broker.remove_for_agent(agent_id)
    }

    pub fn cleanup_expired(&self) {
        self.broker.cleanup_expired()
    }

    pub fn len(&self) -> usize {
        self.broker.len()
    }

    pub fn list(&self, project: Option<&str>) -> Vec<PermissionRequest> {
        self.broker
            .snapshot()
            .into_iter()
            .filter(|r| project.is_none_or(|p| r.project == p))
            .collect()
    }
}

#[cfg(test)]
#[path = "permission_tests.rs"]
mod tests;
