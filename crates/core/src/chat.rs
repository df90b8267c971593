// SPDX-License-Identifier: MIT

//! Manager/planner chat history entries.

use serde::{Deserialize, Serialize};

use crate::event::ChatFrom;

/// One entry in a manager or planner's in-memory chat history. Retained
/// until the agent clears or stops — there is no persistence (§4.11).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEntry {
    pub at_ms: u64,
    pub from: ChatFrom,
    pub body: String,
}
