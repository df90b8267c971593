// SPDX-License-Identifier: MIT

//! Centralized environment variable access.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::DaemonError;

/// Resolve the base directory: `FAB_DIR` > `XDG_STATE_HOME/fab` >
/// `~/.local/state/fab`.
pub fn fab_dir() -> Result<PathBuf, DaemonError> {
    if let Ok(dir) = std::env::var("FAB_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("fab"));
    }
    let home = dirs::home_dir().ok_or(DaemonError::NoStateDir)?;
    Ok(home.join(".local/state/fab"))
}

/// Per-request deadline: client request/response has a 30 s deadline
/// per cycle.
pub fn request_deadline() -> Duration {
    env_ms("FAB_REQUEST_TIMEOUT_MS").unwrap_or(Duration::from_secs(30))
}

/// Read deadline used while a connection is also streaming events, so a
/// client can interleave requests with a 100 ms read deadline.
pub fn stream_read_deadline() -> Duration {
    env_ms("FAB_STREAM_READ_MS").unwrap_or(Duration::from_millis(100))
}

/// Broadcast write deadline per subscriber.
pub fn broadcast_write_deadline() -> Duration {
    env_ms("FAB_BROADCAST_MS").unwrap_or(Duration::from_millis(100))
}

/// Ask-broker expiry.
pub fn ask_expiry() -> Duration {
    env_ms("FAB_ASK_TIMEOUT_MS").unwrap_or(Duration::from_secs(60))
}

/// Rule script-matcher timeout, default <=5s.
pub fn script_matcher_timeout() -> Duration {
    env_ms("FAB_SCRIPT_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

/// Connect timeout used by clients.
pub fn connect_timeout() -> Duration {
    env_ms("FAB_CONNECT_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

/// Grace window before a graceful agent abort escalates to a forced kill.
pub fn abort_grace_window() -> Duration {
    env_ms("FAB_ABORT_GRACE_MS").unwrap_or(Duration::from_secs(10))
}

fn env_ms(var: &str) -> Option<Duration> {
    std::env::var(var).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
