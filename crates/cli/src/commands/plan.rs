// SPDX-License-Identifier: MIT

//! `fab plan ...` — spawning a planner agent and reading its plan artifact.

use clap::Subcommand;
use fab_core::AgentId;
use fab_wire::{RequestPayload, ResponsePayload};

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{emit, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum PlanCommand {
    /// Spawns an ephemeral planner agent in a project's worktree.
    Create {
        project: String,
        #[arg(long)]
        task: Option<String>,
    },
    /// Prints a planner agent's plan artifact.
    Show { agent_id: String },
}

pub async fn run(cmd: PlanCommand, format: OutputFormat) -> Result<(), ExitError> {
    let mut client = DaemonClient::connect().await?;
    let payload = match cmd {
        PlanCommand::Create { project, task } => RequestPayload::PlanCreate { project, task },
        PlanCommand::Show { agent_id } => {
            RequestPayload::PlanShow { agent_id: AgentId::from_string(&agent_id) }
        }
    };
    let response = client.send(payload).await?;
    emit(format, &response, |payload| match payload {
        ResponsePayload::AgentCreated { agent_id } => println!("{agent_id}"),
        ResponsePayload::Plan { content } => println!("{content}"),
        ResponsePayload::None => println!("ok"),
        other => println!("{other:?}"),
    });
    Ok(())
}
