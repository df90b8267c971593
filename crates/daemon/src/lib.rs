// SPDX-License-Identifier: MIT

//! The `fabd` daemon's internal library: one module per subsystem,
//! wired together by `main.rs`'s startup sequence. Grounded on `oj`'s
//! own `daemon/src/lib.rs` module tree (`core`, `listener`,
//! `registry`, `supervisor`, ...), renamed to this project's subsystems.

pub mod agent;
pub mod ask;
pub mod claim_registry;
pub mod env;
pub mod error;
pub mod event_bus;
pub mod instance_lock;
pub mod listener;
pub mod local_backend;
pub mod manager_chat;
pub mod project_registry;
pub mod rule_store;
pub mod staged_action;
pub mod supervisor;
