//! Configuration module for flowlint
//!
//! This module handles:
//! - Project-level configuration (flowlint.toml)
//! - Per-rule enable flags, severity and option overrides
//! - Scan settings and CLI defaults

mod project_config;

pub use project_config::{
    load_project_config,
    normalize_rule_id,
    CliDefaults,
    OptionValue,
    ProjectConfig,
    RuleConfigOverride,
    RulesConfig,
    ScanConfig,
    DEFAULT_FLOWS_DIR,
};
