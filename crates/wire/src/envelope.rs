// SPDX-License-Identifier: MIT

//! Generic request/response envelopes.
//!
//! Unlike the variant-per-message-kind enum this workspace's wire
//! protocol grew from, every message here carries an explicit
//! correlation `id` and, for responses, a `success`/`error` pair at the
//! envelope level rather than folded into the payload. The payload
//! itself is still an internally-discriminated enum — adjacently tagged
//! on `type`/`payload` — so `{type, id?, payload?}` and
//! `{type, id?, success, error?, payload?}` fall out of `#[serde(flatten)]`
//! without hand-written (de)serialization.

use serde::{Deserialize, Serialize};

use crate::request::RequestPayload;
use crate::response::ResponsePayload;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request {
    #[serde(flatten)]
    pub payload: RequestPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Request {
    pub fn new(payload: RequestPayload) -> Self {
        Self { payload, id: None }
    }

    pub fn with_id(payload: RequestPayload, id: impl Into<String>) -> Self {
        Self { payload, id: Some(id.into()) }
    }

    pub fn type_name(&self) -> &'static str {
        self.payload.type_name()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    #[serde(flatten)]
    pub payload: ResponsePayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// Builds a successful response, correlated to `id` (copied from the
    /// originating request — the router fills in a missing type/id from
    /// the request for correlation, per §4.2).
    pub fn ok(id: Option<String>, payload: ResponsePayload) -> Self {
        Self { payload, id, success: true, error: None }
    }

    /// Builds a failure response. The payload is `ResponsePayload::None`
    /// — failures never carry a typed payload (spec §7).
    pub fn fail(id: Option<String>, message: impl Into<String>) -> Self {
        Self { payload: ResponsePayload::None, id, success: false, error: Some(message.into()) }
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
