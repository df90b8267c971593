// SPDX-License-Identifier: MIT

//! Generic ask-broker primitive: "add a pending
//! request keyed by id, return a single-shot response slot, expire after
//! T, cancel on disconnect." [`PermissionManager`] and [`QuestionManager`]
//! are its two concrete instances.
//!
//! No direct precedent in `oj` — it has no human-in-the-loop permission
//! concept. Grounded on the single-slot-channel idea common to
//! blocking request/response bridges, generalized over
//! [`fab_core::Clock`] so expiry is deterministically testable the same
//! way `oj`'s own timeout logic is (`core/src/clock.rs`).

mod permission;
mod question;

pub use permission::PermissionManager;
pub use question::QuestionManager;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use fab_core::{AgentId, AskId, Clock};
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::{ask_not_found, AskError};

struct Pending<Req, Resp> {
    request: Req,
    agent_id: AgentId,
    requested_at: Instant,
    tx: oneshot::Sender<Resp>,
}

/// A registry of pending asks keyed by [`AskId`], each with a
/// single-consumer one-slot delivery channel.
///
/// Dropping a [`Pending`] entry (via [`Self::remove_for_agent`] or
/// [`Self::cleanup_expired`]) drops its `tx` without sending, which is
/// exactly how `tokio::sync::oneshot` signals "closed, no value" to the
/// waiting receiver — the invariant that expiry/cancel must never
/// synthesize a deny falls out of the channel's own semantics rather
/// than needing a sentinel value.
pub struct AskBroker<C, Req, Resp> {
    clock: C,
    timeout: Duration,
    pending: Mutex<HashMap<AskId, Pending<Req, Resp>>>,
}

impl<C: Clock, Req: Clone, Resp> AskBroker<C, Req, Resp> {
    pub fn new(clock: C, timeout: Duration) -> Self {
        Self { clock, timeout, pending: Mutex::new(HashMap::new()) }
    }

    /// Registers `request` under `id`, returning the single-shot receiver
    /// the caller blocks on.
    pub fn add(&self, id: AskId, agent_id: AgentId, request: Req) -> oneshot::Receiver<Resp> {
        let (tx, rx) = oneshot::channel();
        let requested_at = self.clock.now();
        self.pending.lock().insert(id, Pending { request, agent_id, requested_at, tx });
        rx
    }

    /// Delivers `resp` and removes the entry. Unknown id fails with
    /// [`AskError::NotFound`].
    pub fn respond(&self, id: &AskId, resp: Resp) -> Result<(), AskError> {
        let pending = self.pending.lock().remove(id).ok_or_else(|| ask_not_found(id))?;
        // A send failure means the caller already gave up (e.g. the
        // connection that opened the ask disconnected) — not an error
        // from the responder's point of view.
        let _ = pending.tx.send(resp);
        Ok(())
    }

    /// Closes every slot owned by `agent_id` without delivering a value.
    pub fn remove_for_agent(&self, agent_id: &AgentId) {
        self.pending.lock().retain(|_, p| &p.agent_id != agent_id);
    }

    /// Closes every slot older than the broker's configured timeout.
    pub fn cleanup_expired(&self) {
        let now = self.clock.now();
        let timeout = self.timeout;
        self.pending.lock().retain(|_, p| now.duration_since(p.requested_at) < timeout);
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<Req> {
        self.pending.lock().values().map(|p| p.request.clone()).collect()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
