// SPDX-License-Identifier: MIT

//! Staged-action queue store. Execution (sending the
//! message, signaling quit) is the supervisor's job; this module only
//! owns the pending-approval queue itself. Unordered across different
//! (agent, project) pairs, per 
use std::collections::HashMap;

use fab_core::{AgentId, Clock, StagedAction, StagedActionId, StagedActionKind};
use parking_lot::Mutex;

use crate::error::StagedActionError;

pub struct StagedActionStore<C> {
    clock: C,
    actions: Mutex<HashMap<StagedActionId, StagedAction>>,
}

impl<C: Clock> StagedActionStore<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, actions: Mutex::new(HashMap::new()) }
    }

    /// Proposes a move awaiting operator approval (e.g. the supervisor
    /// suggesting a quit after a long idle period).
    pub fn enqueue(&self, agent_id: AgentId, project: String, kind: StagedActionKind) -> StagedAction {
        let action = StagedAction {
            id: StagedActionId::new(),
            agent_id,
            project,
            kind,
            created_at_ms: self.clock.epoch_ms(),
        };
        self.actions.lock().insert(action.id, action.clone());
        action
    }

    pub fn list(&self, project: Option<&str>) -> Vec<StagedAction> {
        let mut out: Vec<StagedAction> = self
            .actions
            .lock()
            .values()
            .filter(|a| project.is_none_or(|p| a.project == p))
            .cloned()
            .collect();
        out.sort_by_key(|a| a.created_at_ms);
        out
    }

    /// Removes and returns the action, regardless of whether the caller
    /// goes on to execute or discard it ("approve executes... then
    /// removes it", "reject... removes without executing" — either way
    /// the queue entry is gone).
    pub fn take(&self, id: &StagedActionId) -> Result<StagedAction, StagedActionError> {
        self.actions.lock().remove(id).ok_or(StagedActionError::NotFound(*id))
    }
}

#[cfg(test)]
#[path = "staged_action_tests.rs"]
mod tests;
