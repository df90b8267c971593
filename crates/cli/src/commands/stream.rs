// SPDX-License-Identifier: MIT

//! `fab attach` — subscribes to the daemon's event stream and prints
//! events as they arrive until the connection closes or the user
//! interrupts.

use fab_core::Event;

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::OutputFormat;

pub async fn attach(projects: Vec<String>, format: OutputFormat) -> Result<(), ExitError> {
    let client = DaemonClient::connect().await?;
    let filter = if projects.is_empty() { None } else { Some(projects) };
    client
        .stream_events(filter, |event| print_event(format, &event))
        .await
        .map_err(ExitError::from_client)
}

fn print_event(format: OutputFormat, event: &Event) {
    if format == OutputFormat::Json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(err) => eprintln!("failed to encode event: {err}"),
        }
        return;
    }
    match event {
        Event::Output { project, agent_id, stream, line } => {
            println!("[{project}/{agent_id}] {stream:?}: {line}")
        }
        Event::State { project, agent_id, state } => {
            println!("[{project}/{agent_id}] state -> {}", state.label())
        }
        Event::Created { project, agent_id } => println!("[{project}/{agent_id}] created"),
        Event::Deleted { project, agent_id } => println!("[{project}/{agent_id}] deleted"),
        Event::Info { project, message } => {
            println!("[{}] {message}", project.as_deref().unwrap_or("-"))
        }
        Event::ChatEntry { project, agent_id, from, body, .. } => {
            println!("[{project}/{agent_id}] {from:?}: {body}")
        }
        Event::PermissionRequest { project, request } => {
            println!("[{project}] permission request {} ({})", request.id, request.tool_name)
        }
        Event::UserQuestion { project, agent_id, id, items, .. } => {
            println!("[{project}/{agent_id}] question {id} ({} item(s))", items.len())
        }
        Event::Intervention { project, action } => {
            println!("[{project}] staged action {} awaiting approval", action.id)
        }
        Event::ManagerState { project, agent_id, state } => {
            println!("[{project}/{agent_id}] manager state -> {}", state.label())
        }
        Event::ManagerChatEntry { project, agent_id, from, body, .. } => {
            println!("[{project}/{agent_id}] manager {from:?}: {body}")
        }
    }
}
