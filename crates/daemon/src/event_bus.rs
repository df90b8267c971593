// SPDX-License-Identifier: MIT

//! Event bus / attach. Grounded on `oj`'s own
//! `event_bus::EventBus` name and the "one write lock per connection
//! shared between broadcaster and request handler" idea from
//! `daemon/src/listener/mod.rs`, stripped of `oj`'s WAL-backed
//! durability. Late attachers only see future events.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fab_core::Event;
use parking_lot::Mutex;
use tokio::net::unix::OwnedWriteHalf;
use tokio::sync::Mutex as AsyncMutex;
use tracing::warn;

pub type SubscriberId = u64;

struct Subscriber {
    /// Project names this subscriber is restricted to; empty means all
    /// projects.
    filter: Vec<String>,
    /// Shared with the owning connection's request handler so a response
    /// and a broadcast never interleave on the same socket.
    writer: Arc<AsyncMutex<OwnedWriteHalf>>,
}

pub struct EventBus {
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<SubscriberId, Subscriber>>,
    write_deadline: Duration,
}

impl EventBus {
    pub fn new(write_deadline: Duration) -> Self {
        Self { next_id: AtomicU64::new(1), subscribers: Mutex::new(HashMap::new()), write_deadline }
    }

    pub fn attach(
        &self,
        writer: Arc<AsyncMutex<OwnedWriteHalf>>,
        projects: Option<Vec<String>>,
    ) -> SubscriberId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().insert(id, Subscriber { filter: projects.unwrap_or_default(), writer });
        id
    }

    pub fn detach(&self, id: SubscriberId) {
        self.subscribers.lock().remove(&id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Broadcasts `event` to every subscriber whose filter admits it.
    /// Each write has its own deadline; a stalled client just misses the
    /// event (dropped, a warning is logged), it is never detached for
    /// that reason alone.
    pub async fn broadcast(&self, event: Event) {
        let project = event.project().map(str::to_string);
        let targets: Vec<Arc<AsyncMutex<OwnedWriteHalf>>> = self
            .subscribers
            .lock()
            .values()
            .filter(|s| admits(&s.filter, project.as_deref()))
            .map(|s| Arc::clone(&s.writer))
            .collect();

        for writer in targets {
            let result = tokio::time::timeout(self.write_deadline, async {
                let mut w = writer.lock().await;
                fab_wire::write_message(&mut *w, &event).await
            })
            .await;

            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "broadcast write failed"),
                Err(_) => warn!(deadline_ms = self.write_deadline.as_millis(), "broadcast write deadline exceeded"),
            }
        }
    }
}

/// Filter semantics from : empty filter admits everything;
/// a project-less event (e.g. `Info` with no project) is admitted by
/// every subscriber regardless of their filter.
fn admits(filter: &[String], project: Option<&str>) -> bool {
    if filter.is_empty() {
        return true;
    }
    match project {
        Some(p) => filter.iter().any(|f| f == p),
        None => true,
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
