// SPDX-License-Identifier: MIT

//! `fab manager ...` — chatting with a project's manager agent.

use clap::Subcommand;
use fab_wire::{RequestPayload, ResponsePayload};

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{emit, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ManagerCommand {
    /// Sends a chat message to a project's manager.
    Chat { project: String, content: String },
    /// Prints a project manager's chat history.
    ChatHistory {
        project: String,
        #[arg(long)]
        limit: Option<usize>,
    },
}

pub async fn run(cmd: ManagerCommand, format: OutputFormat) -> Result<(), ExitError> {
    let mut client = DaemonClient::connect().await?;
    let payload = match cmd {
        ManagerCommand::Chat { project, content } => RequestPayload::ManagerChat { project, content },
        ManagerCommand::ChatHistory { project, limit } => {
            RequestPayload::ManagerChatHistory { project, limit }
        }
    };
    let response = client.send(payload).await?;
    emit(format, &response, |payload| match payload {
        ResponsePayload::ChatHistory { entries } => {
            for entry in entries {
                println!("[{:?}] {}", entry.from, entry.body);
            }
        }
        ResponsePayload::None => println!("ok"),
        other => println!("{other:?}"),
    });
    Ok(())
}
