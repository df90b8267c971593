// SPDX-License-Identifier: MIT

//! Connection listener. Grounded on `oj`'s own
//! `listener::ListenCtx`/`Listener`/per-connection-task shape
//! (`daemon/src/listener/mod.rs`), simplified to a single Unix socket (no
//! TCP/auth-token path — the transport is a single local stream socket)
//! and restructured so a connection's requests are handled
//! strictly sequentially rather than one spawned task per request: this
//! trivially satisfies the FIFO-per-connection ordering invariant
//! without a reorder buffer. `attach`'s interleaved event
//! pushes still happen concurrently with this loop — they go through the
//! same `Arc<AsyncMutex<OwnedWriteHalf>>` the event bus already shares
//! with every subscriber (`crate::event_bus`), so a broadcast and a
//! response never race for the socket but also never block on each other
//! beyond that one lock.

mod router;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fab_core::{AgentId, Clock};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{Mutex as AsyncMutex, Notify};
use tracing::{debug, info, warn};

use fab_wire::{FrameReader, Request, Response};

use crate::ask::{PermissionManager, QuestionManager};
use crate::claim_registry::ClaimRegistry;
use crate::error::{AskError, ClaimError, ProjectError, RuleError, StagedActionError, SupervisorError};
use crate::event_bus::{EventBus, SubscriberId};
use crate::manager_chat::ManagerChatStore;
use crate::project_registry::ProjectRegistry;
use crate::rule_store::RuleStore;
use crate::staged_action::StagedActionStore;
use crate::supervisor::SupervisorHandle;

pub use router::{start_project, stop_project};

/// Shared daemon state every connection's request handler reads or
/// mutates through. One value per running daemon — no global mutable
/// singletons; everything is wired once at startup.
pub struct ListenCtx<C: Clock> {
    pub fab_dir: PathBuf,
    pub clock: C,
    pub start_time: Instant,
    pub abort_grace: Duration,
    pub projects: Arc<ProjectRegistry>,
    pub claims: Arc<ClaimRegistry>,
    pub event_bus: Arc<EventBus>,
    pub permissions: Arc<PermissionManager<C>>,
    pub questions: Arc<QuestionManager<C>>,
    pub staged_actions: Arc<StagedActionStore<C>>,
    pub manager_chat: Arc<ManagerChatStore<C>>,
    pub rules: Arc<RuleStore>,
    pub supervisors: Mutex<HashMap<String, SupervisorHandle>>,
    pub shutdown: Arc<Notify>,
}

impl<C: Clock> ListenCtx<C> {
    pub fn supervisor_for(&self, project: &str) -> Option<SupervisorHandle> {
        self.supervisors.lock().get(project).cloned()
    }

    /// Scans every running project's agent table for `id` (the wire API
    /// names agents by id alone for most `agent.*` requests, with no
    /// project field to narrow the search).
    async fn find_agent(&self, id: AgentId) -> Option<(SupervisorHandle, crate::supervisor::AgentRecord)> {
        let handles: Vec<SupervisorHandle> = self.supervisors.lock().values().cloned().collect();
        for handle in handles {
            if let Some(record) = handle.list().await.into_iter().find(|r| r.id == id) {
                return Some((handle, record));
            }
        }
        None
    }
}

/// Errors surfaced by request handlers, unified at the single point the
/// router converts them to `Response::fail`.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
    #[error(transparent)]
    Ask(#[from] AskError),
    #[error(transparent)]
    Claim(#[from] ClaimError),
    #[error(transparent)]
    StagedAction(#[from] StagedActionError),
    #[error(transparent)]
    Rule(#[from] RuleError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("project {0:?} is not running")]
    ProjectNotRunning(String),
    #[error("backend {0:?} is not supported (only \"local\" is implemented)")]
    UnsupportedBackend(String),
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),
    #[error("agent.describe requires an explicit id")]
    AgentIdRequired,
    #[error("start/stop requires a project name or all=true")]
    MissingTarget,
    #[error("no manager agent is running for project {0:?}")]
    NoManagerAgent(String),
    #[error("no plan artifact found for agent {0}")]
    PlanNotFound(AgentId),
}

/// Accepts connections on the daemon's Unix socket, spawning one task
/// per connection.
pub struct Listener<C: Clock> {
    unix: UnixListener,
    ctx: Arc<ListenCtx<C>>,
}

impl<C: Clock> Listener<C> {
    pub fn new(unix: UnixListener, ctx: Arc<ListenCtx<C>>) -> Self {
        Self { unix, ctx }
    }

    pub async fn run(self) {
        let Listener { unix, ctx } = self;
        let notified = ctx.shutdown.notified();
        tokio::pin!(notified);

        loop {
            tokio::select! {
                accepted = unix.accept() => {
                    match accepted {
                        Ok((stream, _)) => {
                            let ctx = Arc::clone(&ctx);
                            tokio::spawn(async move { handle_connection(stream, ctx).await });
                        }
                        Err(e) => warn!(error = %e, "accept failed"),
                    }
                }
                _ = &mut notified => {
                    info!("listener shutting down");
                    break;
                }
            }
        }
    }
}

/// Reads and dispatches requests from one connection strictly
/// sequentially: the next request is only read once the previous one's
/// response has been written.
async fn handle_connection<C: Clock>(stream: UnixStream, ctx: Arc<ListenCtx<C>>) {
    let (read_half, write_half) = stream.into_split();
    let writer = Arc::new(AsyncMutex::new(write_half));
    let mut reader = FrameReader::new(read_half);
    let mut subscriber_id: Option<SubscriberId> = None;

    loop {
        let deadline =
            if subscriber_id.is_some() { crate::env::stream_read_deadline() } else { crate::env::request_deadline() };

        let request = match tokio::time::timeout(deadline, reader.read_message::<Request>()).await {
            Ok(Ok(Some(request))) => request,
            Ok(Ok(None)) => break,
            Ok(Err(e)) => {
                debug!(error = %e, "connection protocol error");
                break;
            }
            // Streaming connections poll on a short deadline so this loop
            // can keep servicing requests interleaved with attach's
            // broadcasts; a non-streaming connection idle past its
            // deadline is just dropped.
            Err(_) => {
                if subscriber_id.is_some() {
                    continue;
                }
                break;
            }
        };

        let id = request.id.clone();
        let result = router::dispatch(&ctx, &mut reader, &writer, &mut subscriber_id, request.payload).await;
        let response = match result {
            Ok(payload) => Response::ok(id, payload),
            Err(e) => Response::fail(id, e.to_string()),
        };

        let mut w = writer.lock().await;
        let write_result = fab_wire::write_message(&mut *w, &response).await;
        drop(w);
        if write_result.is_err() {
            break;
        }
    }

    if let Some(id) = subscriber_id {
        ctx.event_bus.detach(id);
    }
}

/// Blocks on `rx` while also polling the connection for a client
/// disconnect, so a permission/question ask doesn't wait out its full
/// expiry after the caller has already gone away (§5: "client
/// disconnect cancels every pending ask originated through that
/// connection"). Returns `None` either way — disconnect and expiry are
/// deliberately indistinguishable to the caller.
async fn race_ask<R: AsyncRead + Unpin, T>(
    reader: &mut FrameReader<R>,
    mut rx: tokio::sync::oneshot::Receiver<T>,
) -> Option<T> {
    loop {
        tokio::select! {
            result = &mut rx => return result.ok(),
            closed = reader.closed() => {
                if closed {
                    return None;
                }
            }
        }
    }
}
