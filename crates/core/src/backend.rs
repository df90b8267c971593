// SPDX-License-Identifier: MIT

//! Capability traits for the external collaborators the daemon delegates
//! to: issue trackers and repository/worktree management. Kept out of
//! scope for `fab-core` to actually implement — these
//! traits exist so `fab-daemon` can depend on an abstract capability
//! without hard-coding a specific issue tracker or VCS.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::claim::TicketId;

#[derive(Debug, Clone)]
pub struct TicketSummary {
    pub id: TicketId,
    pub title: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend {backend:?} is not configured for project {project:?}")]
    NotConfigured { backend: String, project: String },
    #[error("ticket {0:?} not found")]
    TicketNotFound(TicketId),
    #[error("backend operation failed: {0}")]
    Failed(String),
}

/// An issue tracker a project's agents pull tickets from and post updates
/// to. Implementations live outside this crate (§1: no bundled
/// issue-tracker integration).
#[async_trait]
pub trait IssueBackend: Send + Sync {
    async fn list_open_tickets(&self, project: &str) -> Result<Vec<TicketSummary>, BackendError>;

    async fn get_ticket(
        &self,
        project: &str,
        ticket_id: &TicketId,
    ) -> Result<TicketSummary, BackendError>;

    async fn comment(
        &self,
        project: &str,
        ticket_id: &TicketId,
        body: &str,
    ) -> Result<(), BackendError>;
}

/// Repository/worktree provisioning for an agent's working directory.
/// Implementations live outside this crate (§1: no bundled VCS
/// integration).
#[async_trait]
pub trait RepoManager: Send + Sync {
    /// Ensures a working directory exists for `agent_id` within `project`,
    /// returning its path.
    async fn prepare_workdir(
        &self,
        project: &str,
        agent_id: &str,
    ) -> Result<PathBuf, BackendError>;

    /// Tears down a previously prepared working directory.
    async fn cleanup_workdir(&self, project: &str, agent_id: &str) -> Result<(), BackendError>;
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
