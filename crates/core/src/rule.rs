// SPDX-License-Identifier: MIT

//! Rule evaluation — the pure matching algorithm behind the rule
//! evaluator. File loading, mtime caching and script
//! execution are I/O and live in the daemon crate; this module is the
//! part property 7 requires to be pure.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleEffect {
    Allow,
    Deny,
    Pass,
}

/// How a rule's effect is determined once it matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RuleMatcher {
    /// Match the primary field against a single pattern.
    Pattern(String),
    /// Match the primary field against any of several patterns.
    Patterns(Vec<String>),
    /// Run an external script (daemon-side only); the evaluator treats a
    /// rule with this matcher as always "undetermined" pending that
    /// execution, so the pure matcher in this module never constructs one
    /// — it is resolved by the daemon before the rule reaches here.
    ScriptResolved(RuleEffect),
    /// No matcher — matches everything.
    Any,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Tool name this rule applies to, or "*" for any tool.
    pub tool: String,
    pub action: RuleEffect,
    #[serde(default = "default_matcher")]
    pub matcher: RuleMatcher,
}

fn default_matcher() -> RuleMatcher {
    RuleMatcher::Any
}

/// Extracts the "primary field" used for pattern matching from a tool's
/// raw JSON input, per the per-tool-kind table in step 1.
/// Unknown tools have an empty primary field.
pub fn primary_field(tool_name: &str, tool_input: &serde_json::Value) -> String {
    let key = match tool_name {
        "Bash" => "command",
        "Read" | "Write" | "Edit" => "file_path",
        "Grep" => "pattern",
        "WebFetch" => "url",
        _ => return String::new(),
    };
    tool_input.get(key).and_then(|v| v.as_str()).unwrap_or_default().to_string()
}

/// Matches `field` against the pattern language:
/// - `""` or `":*"` matches anything
/// - a `":*"` suffix is a prefix match on everything before it
/// - otherwise, exact match
pub fn pattern_matches(pattern: &str, field: &str) -> bool {
    if pattern.is_empty() || pattern == ":*" {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix(":*") {
        return field.starts_with(prefix);
    }
    pattern == field
}

impl Rule {
    fn matches(&self, tool_name: &str, field: &str) -> bool {
        if self.tool != "*" && self.tool != tool_name {
            return false;
        }
        match &self.matcher {
            RuleMatcher::Any => true,
            RuleMatcher::Pattern(p) => pattern_matches(p, field),
            RuleMatcher::Patterns(ps) => ps.iter().any(|p| pattern_matches(p, field)),
            RuleMatcher::ScriptResolved(_) => true,
        }
    }

    fn resolved_effect(&self) -> RuleEffect {
        match &self.matcher {
            RuleMatcher::ScriptResolved(effect) => *effect,
            _ => self.action,
        }
    }
}

/// Evaluates `(tool_name, tool_input)` against project rules (if any,
/// with precedence) then global rules. Rules whose effect is `Pass`
/// continue scanning; the first non-`Pass` match short-circuits. Falls
/// through to `(Pass, matched=false)` if nothing matches.
///
/// Pure in its inputs: the same `(tool, input, ruleset)` always yields
/// the same output. `cwd` is accepted for interface symmetry with the
/// caller's evaluation context but does not affect the pattern-matching
/// algorithm itself (it only affects the daemon-side path-prefix
/// rewrites a rule's pattern may reference, resolved before rules reach
/// this function).
pub fn evaluate(
    tool_name: &str,
    tool_input: &serde_json::Value,
    project_rules: &[Rule],
    global_rules: &[Rule],
) -> (RuleEffect, bool) {
    let field = primary_field(tool_name, tool_input);
    for rule in project_rules.iter().chain(global_rules.iter()) {
        if rule.matches(tool_name, &field) {
            let effect = rule.resolved_effect();
            if !matches!(effect, RuleEffect::Pass) {
                return (effect, true);
            }
        }
    }
    (RuleEffect::Pass, false)
}

#[cfg(test)]
#[path = "rule_tests.rs"]
mod tests;
