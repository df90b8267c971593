// SPDX-License-Identifier: MIT

//! Stateful wrapper around [`fab_core::rule`]'s pure matcher (§4.9):
//! file loading, mtime-based caching, and `<=5s` script-matcher
//! execution. The pure field-extraction/pattern matching primitives
//! stay in `fab-core`; this module owns the I/O the doc comment on
//! `fab_core::rule` explicitly defers here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use fab_core::rule::{pattern_matches, primary_field};
use fab_core::RuleEffect;
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::process::Command;

use crate::error::RuleError;

/// A rule as it appears in a TOML rule file, before the
/// daemon decides whether its matcher is a pattern, a pattern set, or an
/// external script to run.
#[derive(Debug, Clone, Deserialize)]
struct RawRule {
    tool: String,
    action: RuleEffect,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default)]
    patterns: Option<Vec<String>>,
    #[serde(default)]
    script: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRuleFile {
    #[serde(default, rename = "rule")]
    rule: Vec<RawRule>,
}

struct CachedFile {
    mtime: Option<SystemTime>,
    rules: Vec<RawRule>,
}

pub struct RuleStore {
    fab_dir: PathBuf,
    script_timeout: std::time::Duration,
    cache: Mutex<HashMap<PathBuf, CachedFile>>,
}

impl RuleStore {
    pub fn new(fab_dir: PathBuf, script_timeout: std::time::Duration) -> Self {
        Self { fab_dir, script_timeout, cache: Mutex::new(HashMap::new()) }
    }

    fn global_path(&self) -> PathBuf {
        self.fab_dir.join("rules.toml")
    }

    fn project_path(&self, project: &str) -> PathBuf {
        self.fab_dir.join("projects").join(project).join("rules.toml")
    }

    /// Loads and parses `path`, reusing the cached parse if the file's
    /// mtime hasn't changed since the last load (rules are cached by
    /// file mtime).
    fn load(&self, path: &Path) -> Vec<RawRule> {
        let mtime = std::fs::metadata(path).and_then(|m| m.modified()).ok();

        let mut cache = self.cache.lock();
        if let Some(cached) = cache.get(path) {
            if cached.mtime == mtime {
                return cached.rules.clone();
            }
        }

        let rules = std::fs::read_to_string(path)
            .ok()
            .and_then(|raw| toml::from_str::<RawRuleFile>(&raw).ok())
            .map(|f| f.rule)
            .unwrap_or_default();

        cache.insert(path.to_path_buf(), CachedFile { mtime, rules: rules.clone() });
        rules
    }

    /// Evaluates `(tool_name, tool_input)` against project rules (if a
    /// project is given) then global rules, running `fab_core::rule`'s
    /// full algorithm plus script-matcher execution.
    pub async fn evaluate(
        &self,
        tool_name: &str,
        tool_input: &serde_json::Value,
        project: Option<&str>,
        cwd: &Path,
    ) -> Result<(RuleEffect, bool), RuleError> {
        let field = primary_field(tool_name, tool_input);

        let project_rules = project.map(|p| self.load(&self.project_path(p))).unwrap_or_default();
        let global_rules = self.load(&self.global_path());

        for rule in project_rules.iter().chain(global_rules.iter()) {
            if rule.tool != "*" && rule.tool != tool_name {
                continue;
            }

            if let Some(script) = &rule.script {
                let effect = self.run_script(script, tool_name, &field, cwd).await?;
                if !matches!(effect, RuleEffect::Pass) {
                    return Ok((effect, true));
                }
                continue;
            }

            let matched = match (&rule.pattern, &rule.patterns) {
                (Some(p), _) => pattern_matches(&expand_pattern(p, cwd), &field),
                (None, Some(ps)) => ps.iter().any(|p| pattern_matches(&expand_pattern(p, cwd), &field)),
                (None, None) => true,
            };
            if matched && !matches!(rule.action, RuleEffect::Pass) {
                return Ok((rule.action, true));
            }
        }

        Ok((RuleEffect::Pass, false))
    }

    async fn run_script(
        &self,
        script: &Path,
        tool_name: &str,
        field: &str,
        cwd: &Path,
    ) -> Result<RuleEffect, RuleError> {
        let mut command = Command::new(script);
        command.arg(tool_name).arg(field).arg(cwd);

        let output = tokio::time::timeout(self.script_timeout, command.output())
            .await
            .map_err(|_| RuleError::ScriptFailed(script.to_path_buf(), "timed out".to_string()))?
            .map_err(|e| RuleError::ScriptFailed(script.to_path_buf(), e.to_string()))?;

        if !output.status.success() {
            return Err(RuleError::ScriptFailed(
                script.to_path_buf(),
                format!("exited with {}", output.status),
            ));
        }

        let line = String::from_utf8_lossy(&output.stdout);
        match line.trim() {
            "allow" => Ok(RuleEffect::Allow),
            "deny" => Ok(RuleEffect::Deny),
            "pass" => Ok(RuleEffect::Pass),
            "llm" => Err(RuleError::LlmCheckerUnsupported),
            other => Err(RuleError::ScriptFailed(script.to_path_buf(), format!("unrecognized output {other:?}"))),
        }
    }
}

/// Expands the path-prefix rewrite rules in : a leading `/`
/// is cwd-relative, `//` is absolute, `~` expands to the user's home.
/// Patterns with none of these prefixes (e.g. Bash command patterns) pass
/// through unchanged. The trailing `:*` wildcard marker, if present,
/// survives the rewrite since it's only ever a suffix.
fn expand_pattern(pattern: &str, cwd: &Path) -> String {
    if let Some(rest) = pattern.strip_prefix("//") {
        format!("/{rest}")
    } else if let Some(rest) = pattern.strip_prefix('/') {
        cwd.join(rest).to_string_lossy().into_owned()
    } else if let Some(rest) = pattern.strip_prefix('~') {
        dirs::home_dir()
            .map(|home| home.join(rest.trim_start_matches('/')).to_string_lossy().into_owned())
            .unwrap_or_else(|| pattern.to_string())
    } else {
        pattern.to_string()
    }
}

#[cfg(test)]
#[path = "rule_store_tests.rs"]
mod tests;
