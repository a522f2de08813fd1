//! Project-level configuration support
//!
//! Loads per-project configuration from `flowlint.toml` or `.flowlintrc.json`
//! in the project root.
//!
//! # Configuration Format
//!
//! ```toml
//! # flowlint.toml
//!
//! [rules.flow-complexity]
//! enabled = true
//! severity = "error"  # Override default severity
//! options = { max_complexity = 15 }
//!
//! [rules.flow-naming]
//! options = { pattern = "^[a-z][a-zA-Z0-9]*$" }
//!
//! [scan]
//! flows_dir = "src/main/mule"
//! exclude = ["**/generated/**"]
//! workers = 4
//!
//! [defaults]
//! format = "json"
//! fail_on = "error"
//! skip_rules = ["project-gitignore"]
//! ```

use crate::models::Severity;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Where Mule projects keep their flow definitions
pub const DEFAULT_FLOWS_DIR: &str = "src/main/mule";

/// Project-level configuration loaded from flowlint.toml or similar
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectConfig {
    /// Per-rule configuration overrides
    #[serde(default)]
    pub rules: RulesConfig,

    /// Scan settings
    #[serde(default)]
    pub scan: ScanConfig,

    /// Default CLI flags
    #[serde(default)]
    pub defaults: CliDefaults,
}

impl ProjectConfig {
    /// Rule configuration with `defaults.skip_rules` folded in
    pub fn effective_rules(&self) -> RulesConfig {
        let mut rules = self.rules.clone();
        for id in &self.defaults.skip_rules {
            rules.disable(id);
        }
        rules
    }
}

/// Per-rule overrides, keyed by normalized rule id
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(from = "HashMap<String, RuleConfigOverride>")]
pub struct RulesConfig {
    overrides: HashMap<String, RuleConfigOverride>,
}

impl From<HashMap<String, RuleConfigOverride>> for RulesConfig {
    fn from(raw: HashMap<String, RuleConfigOverride>) -> Self {
        Self {
            overrides: raw
                .into_iter()
                .map(|(id, config)| (normalize_rule_id(&id), config))
                .collect(),
        }
    }
}

impl RulesConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, rule_id: &str) -> Option<&RuleConfigOverride> {
        self.overrides.get(&normalize_rule_id(rule_id))
    }

    /// Check if a rule is enabled (defaults to true if not specified)
    pub fn is_enabled(&self, rule_id: &str) -> bool {
        self.get(rule_id).and_then(|c| c.enabled).unwrap_or(true)
    }

    /// Severity to report for a rule: the override if configured, else `default`
    pub fn severity_for(&self, rule_id: &str, default: Severity) -> Severity {
        self.get(rule_id).and_then(|c| c.severity).unwrap_or(default)
    }

    pub fn option(&self, rule_id: &str, key: &str) -> Option<&OptionValue> {
        self.get(rule_id).and_then(|c| c.options.get(key))
    }

    pub fn option_i64(&self, rule_id: &str, key: &str) -> Option<i64> {
        self.option(rule_id, key).and_then(OptionValue::as_i64)
    }

    pub fn option_f64(&self, rule_id: &str, key: &str) -> Option<f64> {
        self.option(rule_id, key).and_then(OptionValue::as_f64)
    }

    pub fn option_bool(&self, rule_id: &str, key: &str) -> Option<bool> {
        self.option(rule_id, key).and_then(OptionValue::as_bool)
    }

    pub fn option_str(&self, rule_id: &str, key: &str) -> Option<&str> {
        self.option(rule_id, key).and_then(OptionValue::as_str)
    }

    pub fn disable(&mut self, rule_id: &str) {
        self.entry(rule_id).enabled = Some(false);
    }

    pub fn set_severity(&mut self, rule_id: &str, severity: Severity) {
        self.entry(rule_id).severity = Some(severity);
    }

    pub fn set_option(&mut self, rule_id: &str, key: impl Into<String>, value: OptionValue) {
        self.entry(rule_id).options.insert(key.into(), value);
    }

    /// Builder form of [`RulesConfig::set_option`]
    pub fn with_option(mut self, rule_id: &str, key: impl Into<String>, value: OptionValue) -> Self {
        self.set_option(rule_id, key, value);
        self
    }

    /// Builder form of [`RulesConfig::set_severity`]
    pub fn with_severity(mut self, rule_id: &str, severity: Severity) -> Self {
        self.set_severity(rule_id, severity);
        self
    }

    /// Builder form of [`RulesConfig::disable`]
    pub fn without(mut self, rule_id: &str) -> Self {
        self.disable(rule_id);
        self
    }

    /// Rule ids explicitly disabled
    pub fn disabled_rules(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .overrides
            .iter()
            .filter(|(_, c)| c.enabled == Some(false))
            .map(|(id, _)| id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    fn entry(&mut self, rule_id: &str) -> &mut RuleConfigOverride {
        self.overrides.entry(normalize_rule_id(rule_id)).or_default()
    }
}

/// Configuration override for a specific rule
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct RuleConfigOverride {
    /// Whether the rule is enabled (default: true)
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Override the default severity (error, warning, info)
    #[serde(default)]
    pub severity: Option<Severity>,

    /// Rule-specific options (e.g. max_complexity, pattern)
    #[serde(default)]
    pub options: HashMap<String, OptionValue>,
}

/// An option value can be an integer, float, boolean or string
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OptionValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
}

impl OptionValue {
    /// Get as i64 (floats are truncated)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            OptionValue::Integer(v) => Some(*v),
            OptionValue::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            OptionValue::Integer(v) => Some(*v as f64),
            OptionValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

/// Scan settings
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ScanConfig {
    /// Flow directory relative to the project root (default: src/main/mule)
    #[serde(default)]
    pub flows_dir: Option<String>,

    /// Glob patterns (relative to the flows directory) to skip
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Worker threads for per-file rules (0 or unset = CPU count)
    #[serde(default)]
    pub workers: Option<usize>,
}

impl ScanConfig {
    pub fn flows_dir(&self) -> &str {
        self.flows_dir.as_deref().unwrap_or(DEFAULT_FLOWS_DIR)
    }
}

/// Default CLI flags that can be set in project config
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CliDefaults {
    /// Default output format (text, json)
    #[serde(default)]
    pub format: Option<String>,

    /// Fail-on severity threshold for CI
    #[serde(default)]
    pub fail_on: Option<Severity>,

    /// Rules to skip by default
    #[serde(default)]
    pub skip_rules: Vec<String>,
}

/// Load project configuration from the project root.
///
/// Searches for configuration files in this order:
/// 1. `flowlint.toml`
/// 2. `.flowlintrc.json`
///
/// Returns default configuration if no usable config file is found.
pub fn load_project_config(project_root: &Path) -> ProjectConfig {
    let toml_path = project_root.join("flowlint.toml");
    if toml_path.exists() {
        match load_toml_config(&toml_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", toml_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", toml_path.display(), e);
            }
        }
    }

    let json_path = project_root.join(".flowlintrc.json");
    if json_path.exists() {
        match load_json_config(&json_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", json_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", json_path.display(), e);
            }
        }
    }

    debug!("No project config found, using defaults");
    ProjectConfig::default()
}

fn load_toml_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = toml::from_str(&content)?;
    Ok(config)
}

fn load_json_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = serde_json::from_str(&content)?;
    Ok(config)
}

/// Normalize a rule id for config lookup
///
/// `FlowComplexityRule`, `flow_complexity` and `Flow-Complexity` all become
/// `flow-complexity`.
pub fn normalize_rule_id(id: &str) -> String {
    let chars: Vec<char> = id.trim().chars().collect();
    let mut result = String::with_capacity(chars.len() + 4);

    for (i, c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_is_lower = i > 0 && chars[i - 1].is_lowercase();
            let is_acronym_end = i > 0
                && chars[i - 1].is_uppercase()
                && i + 1 < chars.len()
                && chars[i + 1].is_lowercase();
            if (prev_is_lower || is_acronym_end) && !result.ends_with('-') {
                result.push('-');
            }
            result.extend(c.to_lowercase());
        } else if *c == '_' || *c == ' ' {
            result.push('-');
        } else {
            result.push(*c);
        }
    }

    result.trim_end_matches("-rule").to_string()
}

#[cfg(test)]
mod tests;
