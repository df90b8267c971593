// SPDX-License-Identifier: MIT

//! User-question ask-broker instance.

use fab_core::{AgentId, AskId, Clock, QuestionItem, QuestionOutcome, UserQuestion};
use tokio::sync::oneshot;

use crate::error::AskError;

use super::AskBroker;

pub struct QuestionManager<C: Clock> {
    clock: C,
    broker: AskBroker<C, UserQuestion, QuestionOutcome>,
}

impl<C: Clock> QuestionManager<C> {
    pub fn new(clock: C, timeout: std::time::Duration) -> Self {
        Self { broker: AskBroker::new(clock.clone(), timeout), clock }
    }

    pub fn request(
        &self,
        agent_id: AgentId,
        project: String,
        items: Vec<QuestionItem>,
    ) -> (UserQuestion, oneshot::Receiver<QuestionOutcome>) {
        let id = AskId::new();
        let request =
            UserQuestion { id: id.clone(), agent_id, project, items, requested_at_ms: self.clock.epoch_ms() };
        let rx = self.broker.add(id, agent_id, request.clone());
        (request, rx)
    }

    pub fn respond(&self, id: &AskId, outcome: QuestionOutcome) -> Result<(), AskError> {
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

    pub fn list(&self, project: Option<&str>) -> Vec<UserQuestion> {
        self.broker
            .snapshot()
            .into_iter()
            .filter(|r| project.is_none_or(|p| r.project == p))
            .collect()
    }
}

#[cfg(test)]
#[path = "question_tests.rs"]
mod tests;
