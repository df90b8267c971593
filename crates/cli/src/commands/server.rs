// SPDX-License-Identifier: MIT

//! Server-level commands: ping, status, stats, shutdown, start/stop.

use clap::{Args, Subcommand};
use fab_wire::{RequestPayload, ResponsePayload};

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{emit, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ServerCommand {
    /// Checks that the daemon is reachable.
    Ping,
    /// Prints uptime and running-project/agent counts.
    Status,
    /// Prints daemon-wide counters.
    Stats,
    /// Requests a graceful shutdown.
    Shutdown,
}

#[derive(Debug, Args)]
pub struct StartStopArgs {
    /// Project name. Omit with --all to affect every configured project.
    pub project: Option<String>,
    #[arg(long)]
    pub all: bool,
}

pub async fn run(cmd: ServerCommand, format: OutputFormat) -> Result<(), ExitError> {
    let mut client = DaemonClient::connect().await?;
    let payload = match cmd {
        ServerCommand::Ping => RequestPayload::Ping,
        ServerCommand::Status => RequestPayload::Status,
        ServerCommand::Stats => RequestPayload::Stats,
        ServerCommand::Shutdown => RequestPayload::Shutdown,
    };
    let response = client.send(payload).await?;
    print_response(format, &response);
    Ok(())
}

pub async fn start(args: StartStopArgs, format: OutputFormat) -> Result<(), ExitError> {
    if args.project.is_none() && !args.all {
        return Err(ExitError::new(2, "specify a project name or --all"));
    }
    let mut client = DaemonClient::connect().await?;
    let payload = RequestPayload::Start { project: args.project, all: Some(args.all) };
    let response = client.send(payload).await?;
    print_response(format, &response);
    Ok(())
}

pub async fn stop(args: StartStopArgs, format: OutputFormat) -> Result<(), ExitError> {
    if args.project.is_none() && !args.all {
        return Err(ExitError::new(2, "specify a project name or --all"));
    }
    let mut client = DaemonClient::connect().await?;
    let payload = RequestPayload::Stop { project: args.project, all: Some(args.all) };
    let response = client.send(payload).await?;
    print_response(format, &response);
    Ok(())
}

fn print_response(format: OutputFormat, response: &ResponsePayload) {
    emit(format, response, |payload| match payload {
        ResponsePayload::Pong => println!("pong"),
        ResponsePayload::ShuttingDown => println!("shutting down"),
        ResponsePayload::Status { uptime_secs, projects_running, agents_active } => {
            println!("uptime: {uptime_secs}s");
            println!("projects running: {projects_running}");
            println!("agents active: {agents_active}");
        }
        ResponsePayload::Stats(stats) => {
            println!("uptime: {}s", stats.uptime_secs);
            println!("projects: {}", stats.projects);
            println!("agents running: {}", stats.agents_running);
            println!("pending permissions: {}", stats.pending_permissions);
            println!("pending questions: {}", stats.pending_questions);
            println!("staged actions: {}", stats.staged_actions);
        }
        ResponsePayload::None => println!("ok"),
        other => println!("{other:?}"),
    });
}
