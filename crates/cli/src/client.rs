// SPDX-License-Identifier: MIT

//! Thin Unix-socket client, grounded on `oj`'s own `DaemonClient`
//! request/response convention (`cli/src/client_queries.rs`): one
//! connection per invocation, a typed `send` that round-trips a
//! `Request`/`Response`, and a `reject` helper for "got the wrong
//! response variant" programming errors.

use std::path::PathBuf;
use std::time::Duration;

use fab_wire::{FrameReader, ProtocolError, Request, Response, ResponsePayload};
use thiserror::Error;
use tokio::net::UnixStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("fabd is not running at {0:?}")]
    NotRunning(PathBuf),
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("request timed out")]
    Timeout,
    #[error("daemon closed the connection without a response")]
    Disconnected,
    #[error("{0}")]
    Failed(String),
    #[error("unexpected response payload")]
    UnexpectedPayload,
}

impl ClientError {
    pub fn is_not_running(&self) -> bool {
        matches!(self, ClientError::NotRunning(_))
    }
}

pub struct DaemonClient {
    stream: UnixStream,
}

impl DaemonClient {
    /// Resolves the socket path under `fab_dir()` and connects, bounded
    /// by the client connect timeout.
    pub async fn connect() -> Result<Self, ClientError> {
        let fab_dir = fab_daemon_env::fab_dir()?;
        let socket_path = fab_dir.join("fabd.sock");
        let connect = UnixStream::connect(&socket_path);
        match tokio::time::timeout(fab_daemon_env::connect_timeout(), connect).await {
            Ok(Ok(stream)) => Ok(Self { stream }),
            Ok(Err(_)) => Err(ClientError::NotRunning(socket_path)),
            Err(_) => Err(ClientError::NotRunning(socket_path)),
        }
    }

    /// Sends `payload` and waits for the correlated response, bounded by
    /// the 30s request/response deadline.
    pub async fn send(&mut self, payload: fab_wire::RequestPayload) -> Result<ResponsePayload, ClientError> {
        let request = Request::with_id(payload, nanoid::nanoid!(8));
        let (read_half, mut write_half) = self.stream.split();
        fab_wire::write_message(&mut write_half, &request).await?;

        let mut reader = FrameReader::new(read_half);
        let response: Response =
            match tokio::time::timeout(Duration::from_secs(30), reader.read_message()).await {
                Ok(Ok(Some(response))) => response,
                Ok(Ok(None)) => return Err(ClientError::Disconnected),
                Ok(Err(e)) => return Err(ClientError::Protocol(e)),
                Err(_) => return Err(ClientError::Timeout),
            };

        if response.success {
            Ok(response.payload)
        } else {
            Err(ClientError::Failed(response.error.unwrap_or_else(|| "unknown error".to_string())))
        }
    }

    /// Attaches to the event stream and reads events until the
    /// connection closes, invoking `on_event` for each one.
    pub async fn stream_events(
        mut self,
        projects: Option<Vec<String>>,
        mut on_event: impl FnMut(fab_wire::Event),
    ) -> Result<(), ClientError> {
        self.send(fab_wire::RequestPayload::Attach { projects }).await?;
        let (read_half, _write_half) = self.stream.into_split();
        let mut reader = FrameReader::new(read_half);
        loop {
            match reader.read_message::<fab_wire::Event>().await {
                Ok(Some(event)) => on_event(event),
                Ok(None) => return Ok(()),
                Err(e) => return Err(ClientError::Protocol(e)),
            }
        }
    }
}

/// Standalone copy of the daemon's environment resolution so the CLI
/// binary doesn't depend on `fab-daemon` just for `fab_dir()`/timeout
/// defaults.
mod fab_daemon_env {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::ClientError;

    pub fn fab_dir() -> Result<PathBuf, ClientError> {
        if let Ok(dir) = std::env::var("FAB_DIR") {
            return Ok(PathBuf::from(dir));
        }
        if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
            return Ok(PathBuf::from(xdg).join("fab"));
        }
        let home = dirs::home_dir()
            .ok_or_else(|| ClientError::Io(std::io::Error::other("no home directory")))?;
        Ok(home.join(".local/state/fab"))
    }

    pub fn connect_timeout() -> Duration {
        std::env::var("FAB_CONNECT_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_secs(5))
    }
}
