// SPDX-License-Identifier: MIT

//! Daemon-wide statistics backing the `stats` request.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DaemonStats {
    pub uptime_secs: u64,
    pub projects: usize,
    pub agents_running: usize,
    pub pending_permissions: usize,
    pub pending_questions: usize,
    pub staged_actions: usize,
}
