// SPDX-License-Identifier: MIT

//! `fab permission ...` / `fab question ...` — the operator-facing side
//! of the ask brokers.

use std::collections::HashMap;

use clap::Subcommand;
use fab_core::{AgentId, AskId, PermissionBehavior, QuestionItem};
use fab_wire::{RequestPayload, ResponsePayload};

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{emit, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum PermissionCommand {
    /// Raises a permission ask on behalf of an agent and blocks for the
    /// answer (used internally by `fab hook`; rarely invoked directly).
    Request {
        agent_id: String,
        project: String,
        tool_name: String,
        /// Raw tool input, as a JSON object.
        tool_input: String,
    },
    /// Answers a pending permission ask.
    Respond {
        id: String,
        #[arg(value_enum)]
        behavior: Behavior,
        #[arg(long)]
        message: Option<String>,
        #[arg(long)]
        interrupt: bool,
    },
    /// Lists pending permission asks.
    List {
        #[arg(long)]
        project: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum QuestionCommand {
    /// Raises a question ask on behalf of an agent and blocks for the
    /// answer.
    Request {
        agent_id: String,
        project: String,
        /// `header:prompt:opt1,opt2,...` per question item.
        #[arg(required = true)]
        items: Vec<String>,
    },
    /// Answers a pending question ask. `answers` are `header=answer` pairs.
    Respond {
        id: String,
        #[arg(required = true)]
        answers: Vec<String>,
    },
    /// Lists pending question asks.
    List {
        #[arg(long)]
        project: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum Behavior {
    Allow,
    Deny,
}

impl From<Behavior> for PermissionBehavior {
    fn from(b: Behavior) -> Self {
        match b {
            Behavior::Allow => PermissionBehavior::Allow,
            Behavior::Deny => PermissionBehavior::Deny,
        }
    }
}

pub async fn run_permission(cmd: PermissionCommand, format: OutputFormat) -> Result<(), ExitError> {
    let mut client = DaemonClient::connect().await?;
    let payload = match cmd {
        PermissionCommand::Request { agent_id, project, tool_name, tool_input } => {
            let tool_input: serde_json::Value = serde_json::from_str(&tool_input)
                .map_err(|e| ExitError::new(2, format!("invalid tool_input JSON: {e}")))?;
            RequestPayload::PermissionRequest {
                agent_id: AgentId::from_string(&agent_id),
                project,
                tool_name,
                tool_input,
            }
        }
        PermissionCommand::Respond { id, behavior, message, interrupt } => {
            RequestPayload::PermissionRespond {
                id: AskId::from(id.as_str()),
                behavior: behavior.into(),
                message,
                interrupt: Some(interrupt),
            }
        }
        PermissionCommand::List { project } => RequestPayload::PermissionList { project },
    };
    let response = client.send(payload).await?;
    emit(format, &response, |payload| match payload {
        ResponsePayload::Permissions { requests } => {
            if requests.is_empty() {
                println!("no pending permission requests");
            }
            for entry in requests {
                let r = &entry.0;
                println!("{}  {}  {}  {}", r.id, r.project, r.agent_id, r.tool_name);
            }
        }
        ResponsePayload::PermissionDecision(outcome) => {
            println!("{:?}{}", outcome.behavior, if outcome.message.is_empty() { String::new() } else { format!(": {}", outcome.message) });
        }
        ResponsePayload::None => println!("ok"),
        other => println!("{other:?}"),
    });
    Ok(())
}

pub async fn run_question(cmd: QuestionCommand, format: OutputFormat) -> Result<(), ExitError> {
    let mut client = DaemonClient::connect().await?;
    let payload = match cmd {
        QuestionCommand::Request { agent_id, project, items } => {
            let items = items
                .iter()
                .map(|raw| parse_question_item(raw))
                .collect::<Result<Vec<_>, ExitError>>()?;
            RequestPayload::QuestionRequest { agent_id: AgentId::from_string(&agent_id), project, items }
        }
        QuestionCommand::Respond { id, answers } => {
            let mut map = HashMap::new();
            for pair in answers {
                let (header, answer) = pair
                    .split_once('=')
                    .ok_or_else(|| ExitError::new(2, format!("expected header=answer, got {pair:?}")))?;
                map.insert(header.to_string(), answer.to_string());
            }
            RequestPayload::QuestionRespond { id: AskId::from(id.as_str()), answers: map }
        }
        QuestionCommand::List { project } => RequestPayload::QuestionList { project },
    };
    let response = client.send(payload).await?;
    emit(format, &response, |payload| match payload {
        ResponsePayload::Questions { requests } => {
            if requests.is_empty() {
                println!("no pending questions");
            }
            for entry in requests {
                let q = &entry.0;
                println!("{}  {}  {}  {} item(s)", q.id, q.project, q.agent_id, q.items.len());
            }
        }
        ResponsePayload::QuestionDecision(outcome) => {
            for (header, answer) in &outcome.answers {
                println!("{header}: {answer}");
            }
        }
        ResponsePayload::None => println!("ok"),
        other => println!("{other:?}"),
    });
    Ok(())
}

fn parse_question_item(raw: &str) -> Result<QuestionItem, ExitError> {
    let mut parts = raw.splitn(3, ':');
    let header = parts.next().unwrap_or_default().to_string();
    let prompt = parts
        .next()
        .ok_or_else(|| ExitError::new(2, format!("expected header:prompt:options, got {raw:?}")))?
        .to_string();
    let options = parts.next().map(|s| s.split(',').map(str::to_string).collect()).unwrap_or_default();
    Ok(QuestionItem { header, prompt, options })
}
