//! Missing error handler rule
//!
//! A flow without its own `error-handler` falls back to the application
//! default, which usually just logs and rethrows. Sub-flows are skipped
//! since they run inside the caller's error handling.

use crate::flows::{find_flows, FlowKind};
use crate::models::{Issue, Severity};
use crate::rules::{DocumentRule, RuleMeta, ValidationContext};
use crate::xml::Document;
use anyhow::Result;

static META: RuleMeta = RuleMeta {
    id: "missing-error-handler",
    name: "Missing error handler",
    description: "Flows should declare an error handler",
    category: "reliability",
    severity: Severity::Warning,
};

const DEFAULT_HANDLER_QUERY: &str = "/mule:mule/mule:configuration[@defaultErrorHandler-ref]";
const HANDLER_QUERY: &str = "mule:error-handler";

pub struct MissingErrorHandlerRule;

impl DocumentRule for MissingErrorHandlerRule {
    fn meta(&self) -> &RuleMeta {
        &META
    }

    fn validate(&self, document: &Document, ctx: &ValidationContext) -> Result<Vec<Issue>> {
        if ctx.query.exists(DEFAULT_HANDLER_QUERY, document.root()) {
            return Ok(Vec::new());
        }

        Ok(find_flows(&ctx.query, document)
            .into_iter()
            .filter(|flow| flow.kind == FlowKind::Flow)
            .filter(|flow| !ctx.query.exists(HANDLER_QUERY, flow.node))
            .map(|flow| {
                Issue::new(
                    flow.node.line(),
                    format!("Flow '{}' has no error handler", flow.display_name()),
                )
                .with_suggestion(
                    "Add an <error-handler> with on-error-continue or on-error-propagate, \
                     or set defaultErrorHandler-ref on a global <configuration>",
                )
            })
            .collect())
    }
}
