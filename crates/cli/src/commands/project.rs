// SPDX-License-Identifier: MIT

//! `fab project ...` — registering, removing, listing and configuring
//! projects.

use clap::{Args, Subcommand};
use fab_wire::{RequestPayload, ResponsePayload};

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{emit, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    /// Registers a project from a git remote.
    Add(AddArgs),
    /// Unregisters a project.
    Remove(RemoveArgs),
    /// Lists every registered project.
    List,
    /// Config subcommands.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Args)]
pub struct AddArgs {
    pub remote_url: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub max_agents: Option<u32>,
    #[arg(long)]
    pub autostart: Option<bool>,
    #[arg(long)]
    pub backend: Option<String>,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    pub name: String,
    #[arg(long)]
    pub delete_worktrees: bool,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Prints every config key for a project.
    Show { name: String },
    /// Prints a single config key.
    Get { name: String, key: String },
    /// Sets a single config key.
    Set { name: String, key: String, value: String },
}

pub async fn run(cmd: ProjectCommand, format: OutputFormat) -> Result<(), ExitError> {
    let mut client = DaemonClient::connect().await?;
    let payload = match cmd {
        ProjectCommand::Add(args) => RequestPayload::ProjectAdd {
            remote_url: args.remote_url,
            name: args.name,
            max_agents: args.max_agents,
            autostart: args.autostart,
            backend: args.backend,
        },
        ProjectCommand::Remove(args) => RequestPayload::ProjectRemove {
            name: args.name,
            delete_worktrees: Some(args.delete_worktrees),
        },
        ProjectCommand::List => RequestPayload::ProjectList,
        ProjectCommand::Config { command: ConfigCommand::Show { name } } => {
            RequestPayload::ProjectConfigShow { name }
        }
        ProjectCommand::Config { command: ConfigCommand::Get { name, key } } => {
            RequestPayload::ProjectConfigGet { name, key }
        }
        ProjectCommand::Config { command: ConfigCommand::Set { name, key, value } } => {
            RequestPayload::ProjectConfigSet { name, key, value }
        }
    };
    let response = client.send(payload).await?;
    emit(format, &response, |payload| match payload {
        ResponsePayload::Projects { projects } => {
            if projects.is_empty() {
                println!("no projects registered");
            }
            for p in projects {
                println!(
                    "{}  {}  max_agents={} autostart={} running={} active={}",
                    p.name, p.remote_url, p.max_agents, p.autostart, p.running, p.agents_active
                );
            }
        }
        ResponsePayload::ConfigValue(value) => println!("{}={}", value.key, value.value),
        ResponsePayload::Output { lines } => {
            for line in lines {
                println!("{line}");
            }
        }
        ResponsePayload::None => println!("ok"),
        other => println!("{other:?}"),
    });
    Ok(())
}
