// SPDX-License-Identifier: MIT

//! IPC protocol for daemon communication.
//!
//! Wire format: UTF-8 concatenated JSON objects, no length prefix and no
//! separator. Every request/response carries an
//! explicit correlation `id`; event messages are [`fab_core::Event`]
//! directly, since its own `#[serde(tag = "type")]` shape already
//! matches the wire `Event` contract.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod codec;
mod envelope;
mod request;
mod response;
mod types;

pub use codec::{write_message, FrameReader, ProtocolError};
pub use envelope::{Request, Response};
pub use request::RequestPayload;
pub use response::ResponsePayload;
pub use types::{
    AgentSummary, ClaimEntry, ConfigValue, PermissionEntry, ProjectSummary, QuestionEntry,
    StagedActionEntry,
};

/// Stream events pushed to attached clients. Re-exported from `fab-core`
/// since `Event`'s own tagging already matches the wire contract.
pub use fab_core::Event;

#[cfg(test)]
mod property_tests;
