// SPDX-License-Identifier: MIT

//! `fab staged-action ...` — operator approval queue for orchestrator
//! moves.

use clap::Subcommand;
use fab_core::{AgentId, StagedActionId, StagedActionKind};
use fab_wire::{RequestPayload, ResponsePayload};

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{emit, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum StagedActionCommand {
    /// Proposes sending a chat message to an agent, pending approval.
    ProposeSendMessage { agent_id: String, content: String },
    /// Proposes quitting an agent, pending approval.
    ProposeQuit { agent_id: String },
    /// Lists staged actions awaiting approval.
    List {
        #[arg(long)]
        project: Option<String>,
    },
    /// Approves a staged action, letting it execute.
    Approve { id: String },
    /// Rejects a staged action, discarding it.
    Reject {
        id: String,
        #[arg(long)]
        reason: Option<String>,
    },
}

pub async fn run(cmd: StagedActionCommand, format: OutputFormat) -> Result<(), ExitError> {
    let mut client = DaemonClient::connect().await?;
    let payload = match cmd {
        StagedActionCommand::ProposeSendMessage { agent_id, content } => {
            RequestPayload::StagedActionCreate {
                agent_id: AgentId::from_string(&agent_id),
                kind: StagedActionKind::SendMessage { content },
            }
        }
        StagedActionCommand::ProposeQuit { agent_id } => RequestPayload::StagedActionCreate {
            agent_id: AgentId::from_string(&agent_id),
            kind: StagedActionKind::Quit,
        },
        StagedActionCommand::List { project } => RequestPayload::StagedActionList { project },
        StagedActionCommand::Approve { id } => {
            RequestPayload::StagedActionApprove { id: StagedActionId::from_string(&id) }
        }
        StagedActionCommand::Reject { id, reason } => {
            RequestPayload::StagedActionReject { id: StagedActionId::from_string(&id), reason }
        }
    };
    let response = client.send(payload).await?;
    emit(format, &response, |payload| match payload {
        ResponsePayload::StagedActions { actions } => {
            if actions.is_empty() {
                println!("no staged actions");
            }
            for entry in actions {
                let a = &entry.0;
                println!("{}  {}  {}  {:?}", a.id, a.project, a.agent_id, a.kind);
            }
        }
        ResponsePayload::StagedActionCreated { id } => println!("{id}"),
        ResponsePayload::None => println!("ok"),
        other => println!("{other:?}"),
    });
    Ok(())
}
