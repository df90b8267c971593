// SPDX-License-Identifier: MIT

//! `fab claim ...` — read-only inspection of the ticket-claim registry.

use clap::Subcommand;
use fab_wire::{RequestPayload, ResponsePayload};

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{emit, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ClaimCommand {
    /// Lists outstanding ticket claims.
    List {
        #[arg(long)]
        project: Option<String>,
    },
}

pub async fn run(cmd: ClaimCommand, format: OutputFormat) -> Result<(), ExitError> {
    let mut client = DaemonClient::connect().await?;
    let ClaimCommand::List { project } = cmd;
    let response = client.send(RequestPayload::ClaimList { project }).await?;
    emit(format, &response, |payload| match payload {
        ResponsePayload::Claims { claims } => {
            if claims.is_empty() {
                println!("no claims");
            }
            for c in claims {
                println!("{}  {}  {}", c.ticket_id, c.project, c.agent_id);
            }
        }
        other => println!("{other:?}"),
    });
    Ok(())
}
