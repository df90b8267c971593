// SPDX-License-Identifier: MIT

//! In-memory chat history for manager/planner agents: their chat
//! histories are retained in memory until clear/stop (§4.11). No
//! direct precedent in `oj`; shaped like
//! [`crate::staged_action::StagedActionStore`] — a `Clock`-stamped
//! `HashMap` behind one lock, scoped per agent rather than per project
//! since a project may run both a manager and, transiently, a planner.

use std::collections::HashMap;

use fab_core::{AgentId, ChatEntry, ChatFrom, Clock};
use parking_lot::Mutex;

pub struct ManagerChatStore<C> {
    clock: C,
    history: Mutex<HashMap<AgentId, Vec<ChatEntry>>>,
}

impl<C: Clock> ManagerChatStore<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, history: Mutex::new(HashMap::new()) }
    }

    pub fn append(&self, agent_id: AgentId, from: ChatFrom, body: String) -> ChatEntry {
        let entry = ChatEntry { at_ms: self.clock.epoch_ms(), from, body };
        self.history.lock().entry(agent_id).or_default().push(entry.clone());
        entry
    }

    /// Returns the most recent `limit` entries (all of them if `limit`
    /// is `None`), oldest first.
    pub fn history(&self, agent_id: &AgentId, limit: Option<usize>) -> Vec<ChatEntry> {
        let history = self.history.lock();
        let Some(entries) = history.get(agent_id) else { return Vec::new() };
        match limit {
            Some(n) if n < entries.len() => entries[entries.len() - n..].to_vec(),
            _ => entries.clone(),
        }
    }

    pub fn clear(&self, agent_id: &AgentId) {
        self.history.lock().remove(agent_id);
    }
}

#[cfg(test)]
#[path = "manager_chat_tests.rs"]
mod tests;
