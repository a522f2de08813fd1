//! Flow naming rule
//!
//! Flow and sub-flow names must match option `pattern` (kebab-case by
//! default). Unnamed flows are reported too.

use crate::flows::find_flows;
use crate::models::{Issue, Severity};
use crate::rules::{DocumentRule, RuleMeta, ValidationContext};
use crate::xml::Document;
use anyhow::{Context, Result};
use regex::Regex;
use std::sync::OnceLock;

static META: RuleMeta = RuleMeta {
    id: "flow-naming",
    name: "Flow naming",
    description: "Flow names should follow a consistent convention",
    category: "naming",
    severity: Severity::Info,
};

pub const DEFAULT_NAME_PATTERN: &str = r"^[a-z][a-z0-9]*(-[a-z0-9]+)*$";

static DEFAULT_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

pub struct FlowNamingRule;

impl FlowNamingRule {
    fn pattern(&self, ctx: &ValidationContext) -> Result<Regex> {
        match ctx.config.option_str(META.id, "pattern") {
            Some(pattern) => Regex::new(pattern)
                .with_context(|| format!("invalid flow name pattern '{}'", pattern)),
            None => DEFAULT_REGEX
                .get_or_init(|| Regex::new(DEFAULT_NAME_PATTERN).ok())
                .clone()
                .context("built-in flow name pattern failed to compile"),
        }
    }
}

impl DocumentRule for FlowNamingRule {
    fn meta(&self) -> &RuleMeta {
        &META
    }

    fn validate(&self, document: &Document, ctx: &ValidationContext) -> Result<Vec<Issue>> {
        let pattern = self.pattern(ctx)?;
        let mut issues = Vec::new();

        for flow in find_flows(&ctx.query, document) {
            let line = flow.node.line();
            match flow.name.map(str::trim).filter(|n| !n.is_empty()) {
                None => issues.push(
                    Issue::new(line, format!("{} at line {} has no name", flow.kind, line))
                        .with_suggestion("Give every flow a name attribute"),
                ),
                Some(name) if !pattern.is_match(name) => issues.push(
                    Issue::new(
                        line,
                        format!(
                            "{} name '{}' does not match pattern {}",
                            flow.kind,
                            name,
                            pattern.as_str()
                        ),
                    )
                    .with_suggestion("Rename the flow and update its flow-ref callers"),
                ),
                Some(_) => {}
            }
        }
        Ok(issues)
    }
}
