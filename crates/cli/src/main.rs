// SPDX-License-Identifier: MIT

//! `fab` — the CLI client for `fabd`. Connects over the daemon's Unix
//! socket for every command except `hook`, which is invoked
//! out-of-process by an agent binary's tool hooks and speaks a
//! stdin/stdout JSON contract instead.
//!
//! Grounded on `oj`'s own top-level `clap` dispatcher (`cli/src/main.rs`,
//! `cli/src/commands/mod.rs`): one `Subcommand` variant per request area,
//! each delegating to its own `commands::*` module, with `ExitError`
//! carrying the process exit code back up to `main`.

mod client;
mod commands;
mod exit_error;
mod output;

use clap::{Parser, Subcommand};

use commands::agent::AgentCommand;
use commands::ask::{PermissionCommand, QuestionCommand};
use commands::claim::ClaimCommand;
use commands::manager::ManagerCommand;
use commands::plan::PlanCommand;
use commands::project::ProjectCommand;
use commands::server::{ServerCommand, StartStopArgs};
use commands::staged_action::StagedActionCommand;
use exit_error::ExitError;
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "fab", version, about = "Multi-project coding-agent supervisor CLI")]
struct Cli {
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Checks that the daemon is reachable.
    Ping,
    /// Prints uptime and running-project/agent counts.
    Status,
    /// Prints daemon-wide counters.
    Stats,
    /// Requests a graceful shutdown.
    Shutdown,
    /// Starts a project's supervisor loop.
    Start(StartStopArgs),
    /// Stops a project's supervisor loop.
    Stop(StartStopArgs),
    /// Project registration and configuration.
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    /// Agent lifecycle and inspection.
    Agent {
        #[command(subcommand)]
        command: AgentCommand,
    },
    /// Operator responses to permission asks.
    Permission {
        #[command(subcommand)]
        command: PermissionCommand,
    },
    /// Operator responses to question asks.
    Question {
        #[command(subcommand)]
        command: QuestionCommand,
    },
    /// Ticket-claim registry inspection.
    Claim {
        #[command(subcommand)]
        command: ClaimCommand,
    },
    /// Operator approval queue for orchestrator moves.
    StagedAction {
        #[command(subcommand)]
        command: StagedActionCommand,
    },
    /// Chatting with a project's manager agent.
    Manager {
        #[command(subcommand)]
        command: ManagerCommand,
    },
    /// Planner agent lifecycle and plan artifact inspection.
    Plan {
        #[command(subcommand)]
        command: PlanCommand,
    },
    /// Subscribes to the live event stream.
    Attach {
        /// Restrict the stream to these projects (default: all).
        #[arg(long = "project")]
        projects: Vec<String>,
    },
    /// Out-of-process hook entry point. Not for interactive use.
    Hook { hook_name: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let result = dispatch(cli).await;
    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(e.code);
    }
}

async fn dispatch(cli: Cli) -> Result<(), ExitError> {
    let format = cli.format;
    match cli.command {
        Command::Ping => commands::server::run(ServerCommand::Ping, format).await,
        Command::Status => commands::server::run(ServerCommand::Status, format).await,
        Command::Stats => commands::server::run(ServerCommand::Stats, format).await,
        Command::Shutdown => commands::server::run(ServerCommand::Shutdown, format).await,
        Command::Start(args) => commands::server::start(args, format).await,
        Command::Stop(args) => commands::server::stop(args, format).await,
        Command::Project { command } => commands::project::run(command, format).await,
        Command::Agent { command } => commands::agent::run(command, format).await,
        Command::Permission { command } => commands::ask::run_permission(command, format).await,
        Command::Question { command } => commands::ask::run_question(command, format).await,
        Command::Claim { command } => commands::claim::run(command, format).await,
        Command::StagedAction { command } => commands::staged_action::run(command, format).await,
        Command::Manager { command } => commands::manager::run(command, format).await,
        Command::Plan { command } => commands::plan::run(command, format).await,
        Command::Attach { projects } => commands::stream::attach(projects, format).await,
        Command::Hook { hook_name } => commands::hook::run(&hook_name).await,
    }
}
