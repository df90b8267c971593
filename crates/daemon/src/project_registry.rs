// SPDX-License-Identifier: MIT

//! Persisted project registry (§6.1). Grounded on `oj`'s own
//! TOML-backed config loading idiom (`toml` + `serde`) but with no
//! direct precedent for the data itself — `oj` has no multi-project
//! concept.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use fab_core::{validate_project_name, Project};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{DaemonError, ProjectError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default, rename = "project")]
    projects: Vec<Project>,
}

pub struct ProjectRegistry {
    path: PathBuf,
    projects: Mutex<HashMap<String, Project>>,
}

impl ProjectRegistry {
    /// Loads `projects.toml` under `fab_dir` if present, else starts empty.
    pub fn load(fab_dir: &Path) -> Result<Self, DaemonError> {
        let path = fab_dir.join("projects.toml");
        let projects = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            let file: RegistryFile =
                toml::from_str(&raw).map_err(|e| DaemonError::Registry(e.to_string()))?;
            file.projects.into_iter().map(|p| (p.name.clone(), p)).collect()
        } else {
            HashMap::new()
        };
        Ok(Self { path, projects: Mutex::new(projects) })
    }

    pub fn add(
        &self,
        fab_dir: &Path,
        remote_url: String,
        name: Option<String>,
        max_agents: Option<u32>,
        autostart: Option<bool>,
        backend: Option<String>,
    ) -> Result<Project, ProjectError> {
        let name = name.unwrap_or_else(|| derive_name(&remote_url));
        validate_project_name(&name).map_err(|e| ProjectError::InvalidName(e.to_string()))?;
        let max_agents = max_agents.unwrap_or(1);
        Project::validate_max_agents(max_agents)
            .map_err(|reason| ProjectError::InvalidConfigValue { key: "max-agents".into(), reason })?;

        let mut projects = self.projects.lock();
        if projects.contains_key(&name) {
            return Err(ProjectError::AlreadyExists(name));
        }
        let project = Project {
            name: name.clone(),
            remote_url,
            repo_dir: Project::derive_repo_dir(fab_dir, &name),
            max_agents,
            autostart: autostart.unwrap_or(false),
            issue_backend: backend.clone().unwrap_or_else(|| "local".to_string()),
            agent_backend: backend.unwrap_or_else(|| "local".to_string()),
        };
        projects.insert(name, project.clone());
        self.persist(&projects)?;
        Ok(project)
    }

    /// Removes `name`. The caller is responsible for checking no live
    /// agents exist first ("fails if any agent of that project is
    /// alive") — this registry has no agent-table visibility.
    pub fn remove(&self, name: &str) -> Result<Project, ProjectError> {
        let mut projects = self.projects.lock();
        let project = projects.remove(name).ok_or_else(|| ProjectError::NotFound(name.to_string()))?;
        self.persist(&projects).map_err(|e| ProjectError::InvalidName(e.to_string()))?;
        Ok(project)
    }

    pub fn list(&self) -> Vec<Project> {
        let mut out: Vec<Project> = self.projects.lock().values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    pub fn get(&self, name: &str) -> Result<Project, ProjectError> {
        self.projects.lock().get(name).cloned().ok_or_else(|| ProjectError::NotFound(name.to_string()))
    }

    pub fn config_get(&self, name: &str, key: &str) -> Result<String, ProjectError> {
        let project = self.get(name)?;
        Ok(match key {
            "max-agents" => project.max_agents.to_string(),
            "autostart" => project.autostart.to_string(),
            "issue-backend" => project.issue_backend,
            "agent-backend" => project.agent_backend,
            other => return Err(ProjectError::UnknownConfigKey(other.to_string())),
        })
    }

    pub fn config_set(&self, name: &str, key: &str, value: &str) -> Result<(), ProjectError> {
        let mut projects = self.projects.lock();
        let project = projects.get_mut(name).ok_or_else(|| ProjectError::NotFound(name.to_string()))?;
        match key {
            "max-agents" => {
                let n: u32 = value
                    .parse()
                    .map_err(|_| ProjectError::InvalidConfigValue {
                        key: key.to_string(),
                        reason: "not an integer".to_string(),
                    })?;
                Project::validate_max_agents(n)
                    .map_err(|reason| ProjectError::InvalidConfigValue { key: key.to_string(), reason })?;
                project.max_agents = n;
            }
            "autostart" => {
                project.autostart = value.parse().map_err(|_| ProjectError::InvalidConfigValue {
                    key: key.to_string(),
                    reason: "not a bool".to_string(),
                })?;
            }
            "issue-backend" => project.issue_backend = value.to_string(),
            "agent-backend" => project.agent_backend = value.to_string(),
            other => return Err(ProjectError::UnknownConfigKey(other.to_string())),
        }
        self.persist(&projects).map_err(|e| ProjectError::InvalidName(e.to_string()))
    }

    fn persist(&self, projects: &HashMap<String, Project>) -> Result<(), DaemonError> {
        let mut list: Vec<&Project> = projects.values().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        let file = RegistryFile { projects: list.into_iter().cloned().collect() };
        let rendered = toml::to_string_pretty(&file).map_err(|e| DaemonError::Registry(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, rendered)?;
        Ok(())
    }
}

/// Derives a default project name from a remote URL's last path segment,
/// stripping a trailing `.git` (e.g. `git@host:org/repo.git` -> `repo`).
fn derive_name(remote_url: &str) -> String {
    let trimmed = remote_url.trim_end_matches('/');
    let last = trimmed.rsplit(['/', ':']).next().unwrap_or(trimmed);
    last.strip_suffix(".git").unwrap_or(last).to_string()
}

#[cfg(test)]
#[path = "project_registry_tests.rs"]
mod tests;
