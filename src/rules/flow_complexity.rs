//! Flow complexity rule
//!
//! Flags flows and sub-flows whose structural complexity exceeds the
//! configured maximum (option `max_complexity`, default 10).

use crate::complexity::{calculate_flow_complexity, LOW_COMPLEXITY_MAX};
use crate::flows::find_flows;
use crate::models::{Issue, Severity};
use crate::rules::{DocumentRule, RuleMeta, ValidationContext};
use crate::xml::Document;
use anyhow::{bail, Result};

static META: RuleMeta = RuleMeta {
    id: "flow-complexity",
    name: "Flow complexity",
    description: "Flows with too many decision points are hard to test and maintain",
    category: "complexity",
    severity: Severity::Warning,
};

pub struct FlowComplexityRule;

impl DocumentRule for FlowComplexityRule {
    fn meta(&self) -> &RuleMeta {
        &META
    }

    fn validate(&self, document: &Document, ctx: &ValidationContext) -> Result<Vec<Issue>> {
        let max = ctx
            .config
            .option_i64(META.id, "max_complexity")
            .unwrap_or(i64::from(LOW_COMPLEXITY_MAX));
        if max < 1 {
            bail!("option max_complexity must be at least 1, got {}", max);
        }

        let mut issues = Vec::new();
        for flow in find_flows(&ctx.query, document) {
            let result = calculate_flow_complexity(&ctx.query, flow.node);
            if i64::from(result.complexity) <= max {
                continue;
            }
            issues.push(
                Issue::new(
                    flow.node.line(),
                    format!(
                        "{} '{}' has complexity {} (max {}, rating {}): {}",
                        flow.kind,
                        flow.display_name(),
                        result.complexity,
                        max,
                        result.rating,
                        result.breakdown()
                    ),
                )
                .with_suggestion("Move branches into sub-flows or simplify the routing"),
            );
        }
        Ok(issues)
    }
}
