// SPDX-License-Identifier: MIT

//! `fab hook <name>` — invoked out-of-process by an agent binary's tool
//! hooks, not by a human. Reads a
//! predefined input object from stdin and writes exactly one of two
//! output shapes depending on which hook name invoked it. Grounded on
//! `oj`'s own stdin-JSON hook pattern (`cli/src/commands/agent/hooks.rs`)
//! but implementing this project's own permission-ask contract instead
//! of `oj`'s job-event contract.
//!
//! Failure policy is deny-by-default: any unrecoverable
//! branch — daemon unreachable, malformed stdin, ask expiry — prints a
//! `deny` decision with a reason, never an `allow`.

use std::io::Read;

use fab_core::{AgentId, PermissionBehavior};
use fab_wire::{RequestPayload, ResponsePayload};
use serde::{Deserialize, Serialize};

use crate::client::DaemonClient;
use crate::exit_error::ExitError;

#[derive(Debug, Deserialize, Default)]
struct ToolUseInput {
    #[serde(default)]
    tool_name: String,
    #[serde(default)]
    tool_input: serde_json::Value,
}

/// The newer `PreToolUse` hook output shape.
#[derive(Debug, Serialize)]
struct PreToolUseDecision {
    #[serde(rename = "permissionDecision")]
    permission_decision: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(rename = "updatedInput", skip_serializing_if = "Option::is_none")]
    updated_input: Option<serde_json::Value>,
}

/// The legacy permission-request hook output shape.
#[derive(Debug, Serialize)]
struct LegacyDecision {
    decision: LegacyBehavior,
}

#[derive(Debug, Serialize)]
struct LegacyBehavior {
    behavior: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    interrupt: Option<bool>,
}

/// Runs `fab hook <hook_name>`. `hook_name` selects the output shape
/// (`pre-tool-use` vs `permission-request`) and, for `stop`, marks the
/// calling agent idle instead of raising a permission ask.
pub async fn run(hook_name: &str) -> Result<(), ExitError> {
    match hook_name {
        "stop" => run_stop().await,
        "pre-tool-use" | "permission-request" => run_permission_ask(hook_name).await,
        other => Err(ExitError::new(2, format!("unknown hook {other:?}"))),
    }
}

async fn run_stop() -> Result<(), ExitError> {
    let agent_id = agent_id_from_env()?;
    let mut client = match DaemonClient::connect().await {
        Ok(client) => client,
        // The stop hook has nothing to deny; a daemon that is already
        // gone simply has no idle state to record.
        Err(_) => return Ok(()),
    };
    let _ = client.send(RequestPayload::AgentIdle { agent_id: Some(agent_id) }).await;
    Ok(())
}

async fn run_permission_ask(hook_name: &str) -> Result<(), ExitError> {
    let input = read_hook_input();
    let agent_id = match agent_id_from_env() {
        Ok(id) => id,
        Err(e) => return deny_and_exit(hook_name, e.to_string()),
    };

    let mut client = match DaemonClient::connect().await {
        Ok(client) => client,
        Err(e) => return deny_and_exit(hook_name, format!("daemon unreachable: {e}")),
    };

    let project = match find_project_for_agent(&mut client, &agent_id).await {
        Some(project) => project,
        None => return deny_and_exit(hook_name, "agent not found in any running project"),
    };

    let payload = RequestPayload::PermissionRequest {
        agent_id,
        project,
        tool_name: input.tool_name,
        tool_input: input.tool_input,
    };
    let response = match client.send(payload).await {
        Ok(response) => response,
        Err(e) => return deny_and_exit(hook_name, format!("permission request failed: {e}")),
    };

    let ResponsePayload::PermissionDecision(outcome) = response else {
        return deny_and_exit(hook_name, "unexpected response to permission request");
    };

    print_decision(hook_name, &outcome);
    Ok(())
}

fn print_decision(hook_name: &str, outcome: &fab_core::PermissionOutcome) {
    let allowed = outcome.behavior == PermissionBehavior::Allow;
    let message = if outcome.message.is_empty() { None } else { Some(outcome.message.clone()) };
    print_json(hook_name, allowed, message, Some(outcome.interrupt));
}

fn deny_and_exit(hook_name: &str, reason: String) -> Result<(), ExitError> {
    print_json(hook_name, false, Some(reason), None);
    Ok(())
}

fn print_json(hook_name: &str, allowed: bool, reason: Option<String>, interrupt: Option<bool>) {
    match hook_name {
        "pre-tool-use" => {
            let decision = PreToolUseDecision {
                permission_decision: if allowed { "allow" } else { "deny" },
                reason,
                updated_input: None,
            };
            print_or_fallback(&decision, allowed);
        }
        _ => {
            let decision = LegacyDecision {
                decision: LegacyBehavior {
                    behavior: if allowed { "allow" } else { "deny" },
                    message: reason,
                    interrupt,
                },
            };
            print_or_fallback(&decision, allowed);
        }
    }
}

fn read_hook_input() -> ToolUseInput {
    let mut input_json = String::new();
    if std::io::stdin().read_to_string(&mut input_json).is_err() {
        return ToolUseInput::default();
    }
    serde_json::from_str(&input_json).unwrap_or_default()
}

fn agent_id_from_env() -> Result<AgentId, ExitError> {
    std::env::var("FAB_AGENT_ID")
        .map(|s| AgentId::from_string(&s))
        .map_err(|_| ExitError::new(1, "FAB_AGENT_ID is not set"))
}

async fn find_project_for_agent(client: &mut DaemonClient, agent_id: &AgentId) -> Option<String> {
    let response = client.send(RequestPayload::AgentList { project: None }).await.ok()?;
    let ResponsePayload::Agents { agents } = response else { return None };
    agents.into_iter().find(|a| &a.id == agent_id).map(|a| a.project)
}
