// SPDX-License-Identifier: MIT

//! Project registry entries.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of a project name, per pub const MAX_PROJECT_NAME_LEN: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectNameError {
    #[error("project name must not be empty")]
    Empty,
    #[error("project name exceeds {max} characters")]
    TooLong { max: usize },
    #[error("project name must start with an alphanumeric character")]
    BadStart,
    #[error("project name contains invalid character {0:?} (allowed: alphanumeric, '.', '_', '-')")]
    BadChar(char),
}

/// Validates a project name against `[A-Za-z0-9][A-Za-z0-9._-]*`, <= 64 chars.
pub fn validate_project_name(name: &str) -> Result<(), ProjectNameError> {
    let mut chars = name.chars();
    let first = chars.next().ok_or(ProjectNameError::Empty)?;
    if !first.is_ascii_alphanumeric() {
        return Err(ProjectNameError::BadStart);
    }
    for c in chars {
        if !(c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-') {
            return Err(ProjectNameError::BadChar(c));
        }
    }
    if name.len() > MAX_PROJECT_NAME_LEN {
        return Err(ProjectNameError::TooLong { max: MAX_PROJECT_NAME_LEN });
    }
    Ok(())
}

/// A registered repository with a concurrency budget and backend tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub remote_url: String,
    pub repo_dir: PathBuf,
    pub max_agents: u32,
    pub autostart: bool,
    pub issue_backend: String,
    pub agent_backend: String,
}

pub const MIN_MAX_AGENTS: u32 = 1;
pub const MAX_MAX_AGENTS: u32 = 100;

impl Project {
    /// Derives `repo_dir` from the project name under a base directory.
    /// Names are validated to be filesystem-safe, so no hashing is needed.
    pub fn derive_repo_dir(base_dir: &Path, name: &str) -> PathBuf {
        base_dir.join("repos").join(name)
    }

    pub fn validate_max_agents(n: u32) -> Result<(), String> {
        if (MIN_MAX_AGENTS..=MAX_MAX_AGENTS).contains(&n) {
            Ok(())
        } else {
            Err(format!("max_agents must be between {MIN_MAX_AGENTS} and {MAX_MAX_AGENTS}"))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct ProjectBuilder => Project {
        into {
            name: String = "demo",
            remote_url: String = "https://example.invalid/demo.git",
            issue_backend: String = "local",
            agent_backend: String = "local",
        }
        set {
            max_agents: u32 = 1,
            autostart: bool = false,
        }
        computed {
            repo_dir: PathBuf = PathBuf::from("/tmp/fab-test/repos/demo"),
        }
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
