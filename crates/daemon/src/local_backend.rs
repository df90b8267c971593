// SPDX-License-Identifier: MIT

//! The `"local"` `IssueBackend`/`RepoManager` pair behind the
//! `issue-backend`/`agent-backend` config `"local"` tag. No direct
//! precedent in `oj` — it has no issue-tracker or VCS capability
//! boundary at all. Grounded on the claim registry's own whole-file JSON
//! persistence idiom, scaled down to a directory of one-file-per-ticket
//! JSON blobs so a project can be driven without any external tracker:
//! drop a file under `$FAB_DIR/projects/<name>/tickets/*.json` and it
//! becomes a ready ticket. This is intentionally not a real
//! issue-tracker/VCS integration — real backends are out of scope per
//! §1 — it exists so the system is runnable standalone and so tests
//! have a concrete, file-backed double instead of a bespoke mock per
//! test.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fab_core::{BackendError, IssueBackend, RepoManager, TicketId, TicketSummary};
use serde::{Deserialize, Serialize};

pub struct LocalIssueBackend {
    fab_dir: PathBuf,
}

impl LocalIssueBackend {
    pub fn new(fab_dir: PathBuf) -> Self {
        Self { fab_dir }
    }

    fn tickets_dir(&self, project: &str) -> PathBuf {
        self.fab_dir.join("projects").join(project).join("tickets")
    }

    fn ticket_path(&self, project: &str, ticket_id: &TicketId) -> PathBuf {
        self.tickets_dir(project).join(format!("{}.json", ticket_id.as_str()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TicketFile {
    title: String,
    #[serde(default)]
    body: String,
}

#[async_trait]
impl IssueBackend for LocalIssueBackend {
    /// Lists `*.json` files under the project's ticket directory, in
    /// filename order (the issue backend is responsible for priority;
    /// filename order is this backend's priority scheme, e.g.
    /// `001-first.json` before `002-second.json`).
    async fn list_open_tickets(&self, project: &str) -> Result<Vec<TicketSummary>, BackendError> {
        let dir = self.tickets_dir(project);
        let mut entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
                .collect::<Vec<_>>(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(BackendError::Failed(e.to_string())),
        };
        entries.sort_by_key(|e| e.file_name());

        let mut tickets = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = TicketId::new(entry.path().file_stem().unwrap_or_default().to_string_lossy().into_owned());
            tickets.push(self.get_ticket(project, &id).await?);
        }
        Ok(tickets)
    }

    async fn get_ticket(&self, project: &str, ticket_id: &TicketId) -> Result<TicketSummary, BackendError> {
        let path = self.ticket_path(project, ticket_id);
        let raw = std::fs::read_to_string(&path).map_err(|_| BackendError::TicketNotFound(ticket_id.clone()))?;
        let file: TicketFile =
            serde_json::from_str(&raw).map_err(|e| BackendError::Failed(e.to_string()))?;
        Ok(TicketSummary { id: ticket_id.clone(), title: file.title, body: file.body })
    }

    /// Appends `body` as a line to a sibling `<ticket>.log` file; this
    /// backend has no real commenting API to call out to.
    async fn comment(&self, project: &str, ticket_id: &TicketId, body: &str) -> Result<(), BackendError> {
        let log_path = self.tickets_dir(project).join(format!("{}.log", ticket_id.as_str()));
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| BackendError::Failed(e.to_string()))?;
        writeln!(file, "{body}").map_err(|e| BackendError::Failed(e.to_string()))
    }
}

pub struct LocalRepoManager {
    fab_dir: PathBuf,
}

impl LocalRepoManager {
    pub fn new(fab_dir: PathBuf) -> Self {
        Self { fab_dir }
    }

    fn worktree_path(&self, project: &str, agent_id: &str) -> PathBuf {
        self.fab_dir.join("projects").join(project).join("worktrees").join(agent_id)
    }
}

#[async_trait]
impl RepoManager for LocalRepoManager {
    /// Creates a plain directory — no git clone/worktree machinery; this
    /// reference backend is explicitly out of the "no bundled VCS
    /// integration" scope real `RepoManager`s cover.
    async fn prepare_workdir(&self, project: &str, agent_id: &str) -> Result<PathBuf, BackendError> {
        let path = self.worktree_path(project, agent_id);
        std::fs::create_dir_all(&path).map_err(|e| BackendError::Failed(e.to_string()))?;
        Ok(path)
    }

    async fn cleanup_workdir(&self, project: &str, agent_id: &str) -> Result<(), BackendError> {
        let path = self.worktree_path(project, agent_id);
        match std::fs::remove_dir_all(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BackendError::Failed(e.to_string())),
        }
    }
}

/// Returns `(issue_backend, repo_manager)` for the `"local"` tag, the
/// only one this crate implements.
pub fn resolve(fab_dir: &Path) -> (LocalIssueBackend, LocalRepoManager) {
    (LocalIssueBackend::new(fab_dir.to_path_buf()), LocalRepoManager::new(fab_dir.to_path_buf()))
}

#[cfg(test)]
#[path = "local_backend_tests.rs"]
mod tests;
