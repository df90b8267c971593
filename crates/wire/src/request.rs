// SPDX-License-Identifier: MIT

//! Request payload catalog covering every request family this protocol
//! names — server, project, supervisor, agent, asks,
//! claims/staged-actions/manager/plan, and streaming.

use std::collections::HashMap;

use fab_core::{AgentId, AskId, PermissionBehavior, QuestionItem, StagedActionId, StagedActionKind, TicketId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum RequestPayload {
    #[serde(rename = "ping")]
    Ping,
    #[serde(rename = "shutdown")]
    Shutdown,
    #[serde(rename = "status")]
    Status,
    #[serde(rename = "stats")]
    Stats,

    #[serde(rename = "project.add")]
    ProjectAdd {
        remote_url: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        max_agents: Option<u32>,
        #[serde(default)]
        autostart: Option<bool>,
        #[serde(default)]
        backend: Option<String>,
    },
    #[serde(rename = "project.remove")]
    ProjectRemove {
        name: String,
        #[serde(default)]
        delete_worktrees: Option<bool>,
    },
    #[serde(rename = "project.list")]
    ProjectList,
    #[serde(rename = "project.config.show")]
    ProjectConfigShow { name: String },
    #[serde(rename = "project.config.get")]
    ProjectConfigGet { name: String, key: String },
    #[serde(rename = "project.config.set")]
    ProjectConfigSet { name: String, key: String, value: String },

    #[serde(rename = "start")]
    Start {
        #[serde(default)]
        project: Option<String>,
        #[serde(default)]
        all: Option<bool>,
    },
    #[serde(rename = "stop")]
    Stop {
        #[serde(default)]
        project: Option<String>,
        #[serde(default)]
        all: Option<bool>,
    },

    #[serde(rename = "agent.list")]
    AgentList {
        #[serde(default)]
        project: Option<String>,
    },
    #[serde(rename = "agent.create")]
    AgentCreate {
        project: String,
        #[serde(default)]
        task: Option<String>,
    },
    #[serde(rename = "agent.delete")]
    AgentDelete {
        id: AgentId,
        #[serde(default)]
        force: Option<bool>,
    },
    #[serde(rename = "agent.abort")]
    AgentAbort {
        id: AgentId,
        #[serde(default)]
        force: Option<bool>,
    },
    #[serde(rename = "agent.input")]
    AgentInput { id: AgentId, text: String },
    #[serde(rename = "agent.output")]
    AgentOutput { id: AgentId },
    #[serde(rename = "agent.send_message")]
    AgentSendMessage { id: AgentId, content: String },
    #[serde(rename = "agent.chat_history")]
    AgentChatHistory {
        id: AgentId,
        #[serde(default)]
        limit: Option<usize>,
    },
    #[serde(rename = "agent.describe")]
    AgentDescribe {
        #[serde(default)]
        id: Option<AgentId>,
        description: String,
    },
    #[serde(rename = "agent.done")]
    AgentDone {
        #[serde(default)]
        agent_id: Option<AgentId>,
        #[serde(default)]
        task_id: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },
    #[serde(rename = "agent.idle")]
    AgentIdle {
        #[serde(default)]
        agent_id: Option<AgentId>,
    },
    #[serde(rename = "agent.claim")]
    AgentClaim { agent_id: AgentId, ticket_id: TicketId },

    #[serde(rename = "permission.request")]
    PermissionRequest {
        agent_id: AgentId,
        project: String,
        tool_name: String,
        tool_input: serde_json::Value,
    },
    #[serde(rename = "permission.respond")]
    PermissionRespond {
        id: AskId,
        behavior: PermissionBehavior,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        interrupt: Option<bool>,
    },
    #[serde(rename = "permission.list")]
    PermissionList {
        #[serde(default)]
        project: Option<String>,
    },

    #[serde(rename = "question.request")]
    QuestionRequest { agent_id: AgentId, project: String, items: Vec<QuestionItem> },
    #[serde(rename = "question.respond")]
    QuestionRespond { id: AskId, answers: HashMap<String, String> },
    #[serde(rename = "question.list")]
    QuestionList {
        #[serde(default)]
        project: Option<String>,
    },

    #[serde(rename = "claim.list")]
    ClaimList {
        #[serde(default)]
        project: Option<String>,
    },

    #[serde(rename = "staged_action.create")]
    StagedActionCreate { agent_id: AgentId, kind: StagedActionKind },
    #[serde(rename = "staged_action.list")]
    StagedActionList {
        #[serde(default)]
        project: Option<String>,
    },
    #[serde(rename = "staged_action.approve")]
    StagedActionApprove { id: StagedActionId },
    #[serde(rename = "staged_action.reject")]
    StagedActionReject {
        id: StagedActionId,
        #[serde(default)]
        reason: Option<String>,
    },

    #[serde(rename = "manager.chat")]
    ManagerChat { project: String, content: String },
    #[serde(rename = "manager.chat_history")]
    ManagerChatHistory {
        project: String,
        #[serde(default)]
        limit: Option<usize>,
    },
    #[serde(rename = "plan.create")]
    PlanCreate {
        project: String,
        #[serde(default)]
        task: Option<String>,
    },
    #[serde(rename = "plan.show")]
    PlanShow { agent_id: AgentId },

    #[serde(rename = "attach")]
    Attach {
        #[serde(default)]
        projects: Option<Vec<String>>,
    },
    #[serde(rename = "detach")]
    Detach,
}

impl RequestPayload {
    /// The hierarchical `type` string this payload serializes as.
    pub fn type_name(&self) -> &'static str {
        match self {
            RequestPayload::Ping => "ping",
            RequestPayload::Shutdown => "shutdown",
            RequestPayload::Status => "status",
            RequestPayload::Stats => "stats",
            RequestPayload::ProjectAdd { .. } => "project.add",
            RequestPayload::ProjectRemove { .. } => "project.remove",
            RequestPayload::ProjectList => "project.list",
            RequestPayload::ProjectConfigShow { .. } => "project.config.show",
            RequestPayload::ProjectConfigGet { .. } => "project.config.get",
            RequestPayload::ProjectConfigSet { .. } => "project.config.set",
            RequestPayload::Start { .. } => "start",
            RequestPayload::Stop { .. } => "stop",
            RequestPayload::AgentList { .. } => "agent.list",
            RequestPayload::AgentCreate { .. } => "agent.create",
            RequestPayload::AgentDelete { .. } => "agent.delete",
            RequestPayload::AgentAbort { .. } => "agent.abort",
            RequestPayload::AgentInput { .. } => "agent.input",
            RequestPayload::AgentOutput { .. } => "agent.output",
            RequestPayload::AgentSendMessage { .. } => "agent.send_message",
            RequestPayload::AgentChatHistory { .. } => "agent.chat_history",
            RequestPayload::AgentDescribe { .. } => "agent.describe",
            RequestPayload::AgentDone { .. } => "agent.done",
            RequestPayload::AgentIdle { .. } => "agent.idle",
            RequestPayload::AgentClaim { .. } => "agent.claim",
            RequestPayload::PermissionRequest { .. } => "permission.request",
            RequestPayload::PermissionRespond { .. } => "permission.respond",
            RequestPayload::PermissionList { .. } => "permission.list",
            RequestPayload::QuestionRequest { .. } => "question.request",
            RequestPayload::QuestionRespond { .. } => "question.respond",
            RequestPayload::QuestionList { .. } => "question.list",
            RequestPayload::ClaimList { .. } => "claim.list",
            RequestPayload::StagedActionCreate { .. } => "staged_action.create",
            RequestPayload::StagedActionList { .. } => "staged_action.list",
            RequestPayload::StagedActionApprove { .. } => "staged_action.approve",
            RequestPayload::StagedActionReject { .. } => "staged_action.reject",
            RequestPayload::ManagerChat { .. } => "manager.chat",
            RequestPayload::ManagerChatHistory { .. } => "manager.chat_history",
            RequestPayload::PlanCreate { .. } => "plan.create",
            RequestPayload::PlanShow { .. } => "plan.show",
            RequestPayload::Attach { .. } => "attach",
            RequestPayload::Detach => "detach",
        }
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
