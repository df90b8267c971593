// SPDX-License-Identifier: MIT

//! `fab agent ...` — the per-agent lifecycle and inspection commands.

use clap::Subcommand;
use fab_core::AgentId;
use fab_wire::{RequestPayload, ResponsePayload};

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{emit, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum AgentCommand {
    /// Lists agents, optionally scoped to one project.
    List {
        #[arg(long)]
        project: Option<String>,
    },
    /// Spawns a new worker agent in a project's worktree.
    Create {
        project: String,
        #[arg(long)]
        task: Option<String>,
    },
    /// Deletes an agent's record (it must already be done, unless --force).
    Delete {
        id: String,
        #[arg(long)]
        force: bool,
    },
    /// Aborts a running agent.
    Abort {
        id: String,
        #[arg(long)]
        force: bool,
    },
    /// Sends a line of input to an agent's stdin.
    Input { id: String, text: String },
    /// Prints an agent's captured output lines.
    Output { id: String },
    /// Sends a chat message to an agent (manager/planner).
    SendMessage { id: String, content: String },
    /// Prints an agent's chat history.
    ChatHistory {
        id: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Sets or reads the human-readable description for an agent.
    Describe {
        #[arg(long)]
        id: Option<String>,
        description: String,
    },
    /// Reports an agent as done (used by the agent's own exit hook).
    Done {
        #[arg(long)]
        agent_id: Option<String>,
        #[arg(long)]
        task_id: Option<String>,
        #[arg(long)]
        error: Option<String>,
    },
    /// Marks the running agent idle (used by the agent's Stop hook).
    Idle {
        #[arg(long)]
        agent_id: Option<String>,
    },
    /// Claims a ticket for an agent, failing if already claimed.
    Claim { agent_id: String, ticket_id: String },
}

pub async fn run(cmd: AgentCommand, format: OutputFormat) -> Result<(), ExitError> {
    let mut client = DaemonClient::connect().await?;
    let payload = match cmd {
        AgentCommand::List { project } => RequestPayload::AgentList { project },
        AgentCommand::Create { project, task } => RequestPayload::AgentCreate { project, task },
        AgentCommand::Delete { id, force } => {
            RequestPayload::AgentDelete { id: AgentId::from_string(&id), force: Some(force) }
        }
        AgentCommand::Abort { id, force } => {
            RequestPayload::AgentAbort { id: AgentId::from_string(&id), force: Some(force) }
        }
        AgentCommand::Input { id, text } => {
            RequestPayload::AgentInput { id: AgentId::from_string(&id), text }
        }
        AgentCommand::Output { id } => RequestPayload::AgentOutput { id: AgentId::from_string(&id) },
        AgentCommand::SendMessage { id, content } => {
            RequestPayload::AgentSendMessage { id: AgentId::from_string(&id), content }
        }
        AgentCommand::ChatHistory { id, limit } => {
            RequestPayload::AgentChatHistory { id: AgentId::from_string(&id), limit }
        }
        AgentCommand::Describe { id, description } => {
            RequestPayload::AgentDescribe { id: id.map(|s| AgentId::from_string(&s)), description }
        }
        AgentCommand::Done { agent_id, task_id, error } => RequestPayload::AgentDone {
            agent_id: agent_id.map(|s| AgentId::from_string(&s)),
            task_id,
            error,
        },
        AgentCommand::Idle { agent_id } => {
            RequestPayload::AgentIdle { agent_id: agent_id.map(|s| AgentId::from_string(&s)) }
        }
        AgentCommand::Claim { agent_id, ticket_id } => RequestPayload::AgentClaim {
            agent_id: AgentId::from_string(&agent_id),
            ticket_id: fab_core::TicketId::from(ticket_id.as_str()),
        },
    };
    let response = client.send(payload).await?;
    emit(format, &response, |payload| match payload {
        ResponsePayload::Agents { agents } => {
            if agents.is_empty() {
                println!("no agents");
            }
            for a in agents {
                println!(
                    "{}  {}  {:?}  {}{}",
                    a.id,
                    a.project,
                    a.kind,
                    a.state.label(),
                    a.description.as_deref().map(|d| format!("  {d}")).unwrap_or_default()
                );
            }
        }
        ResponsePayload::AgentCreated { agent_id } => println!("{agent_id}"),
        ResponsePayload::Output { lines } => {
            for line in lines {
                println!("{line}");
            }
        }
        ResponsePayload::ChatHistory { entries } => {
            for entry in entries {
                println!("[{:?}] {}", entry.from, entry.body);
            }
        }
        ResponsePayload::Claimed => println!("claimed"),
        ResponsePayload::None => println!("ok"),
        other => println!("{other:?}"),
    });
    Ok(())
}
