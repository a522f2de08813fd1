//! Structural complexity of flows
//!
//! Cyclomatic complexity specialised to Mule flow-control constructs. A flow
//! starts at 1 (one linear path) and every decision point found anywhere
//! under it adds one:
//!
//! ```text
//! choice/when        each `when` branch (an N-way choice adds N)
//! until-successful   retry scope
//! foreach            sequential iteration
//! parallel-foreach   parallel iteration
//! scatter-gather     fan-out / fan-in
//! async              fire-and-forget
//! try                exception handling scope
//! first-successful   fallback routing
//! round-robin        load balancing
//! error-handler      on-error-continue + on-error-propagate
//! ```
//!
//! The per-flow rating (low <= 10 < moderate <= 20 < high) is a triage
//! scale for single flows. It is separate from the project-wide complexity
//! grade in [`crate::scoring`], which works on the average over all flows.

use crate::flows::FlowKind;
use crate::xml::{Node, QueryEngine};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Construct kinds in scan order, each with the queries that count it
const DECISION_CONSTRUCTS: &[(&str, &[&str])] = &[
    ("choice/when", &[".//mule:when"]),
    ("until-successful", &[".//mule:until-successful"]),
    ("foreach", &[".//mule:foreach"]),
    ("parallel-foreach", &[".//mule:parallel-foreach"]),
    ("scatter-gather", &[".//mule:scatter-gather"]),
    ("async", &[".//mule:async"]),
    ("try", &[".//mule:try"]),
    ("first-successful", &[".//mule:first-successful"]),
    ("round-robin", &[".//mule:round-robin"]),
    (
        "error-handler",
        &[".//mule:on-error-continue", ".//mule:on-error-propagate"],
    ),
];

/// Upper bound (inclusive) of a `low` rating
pub const LOW_COMPLEXITY_MAX: u32 = 10;
/// Upper bound (inclusive) of a `moderate` rating
pub const MODERATE_COMPLEXITY_MAX: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityRating {
    Low,
    Moderate,
    High,
}

impl ComplexityRating {
    pub fn from_complexity(complexity: u32) -> Self {
        if complexity <= LOW_COMPLEXITY_MAX {
            ComplexityRating::Low
        } else if complexity <= MODERATE_COMPLEXITY_MAX {
            ComplexityRating::Moderate
        } else {
            ComplexityRating::High
        }
    }
}

impl std::fmt::Display for ComplexityRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComplexityRating::Low => write!(f, "low"),
            ComplexityRating::Moderate => write!(f, "moderate"),
            ComplexityRating::High => write!(f, "high"),
        }
    }
}

/// Contribution of one construct kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityDetail {
    pub construct_kind: String,
    pub count: u32,
    pub contribution: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityResult {
    /// Always `1 + sum(details[].contribution)`
    pub complexity: u32,
    pub details: Vec<ComplexityDetail>,
    pub rating: ComplexityRating,
}

impl ComplexityResult {
    /// Human-readable breakdown, e.g. `choice/when: 3, try: 1`
    pub fn breakdown(&self) -> String {
        self.details
            .iter()
            .map(|d| format!("{}: {}", d.construct_kind, d.count))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Complexity of one flow, as reported by a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowComplexity {
    pub file: PathBuf,
    pub name: String,
    pub kind: FlowKind,
    pub line: u32,
    #[serde(flatten)]
    pub result: ComplexityResult,
}

/// Compute the complexity of the flow rooted at `flow`
///
/// Never fails: a query that cannot be evaluated counts as zero matches for
/// its own construct kind and the rest of the calculation goes on.
pub fn calculate_flow_complexity(query: &QueryEngine, flow: Node<'_>) -> ComplexityResult {
    calculate_with(query, flow, DECISION_CONSTRUCTS)
}

fn calculate_with(
    query: &QueryEngine,
    flow: Node<'_>,
    constructs: &[(&str, &[&str])],
) -> ComplexityResult {
    let mut complexity = 1u32;
    let mut details = Vec::new();

    for (kind, expressions) in constructs {
        let count: usize = expressions
            .iter()
            .map(|expr| match query.try_count(expr, flow) {
                Ok(n) => n,
                Err(e) => {
                    debug!("Complexity query for {} failed, counting 0: {}", kind, e);
                    0
                }
            })
            .sum();
        if count == 0 {
            continue;
        }
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        complexity = complexity.saturating_add(count);
        details.push(ComplexityDetail {
            construct_kind: kind.to_string(),
            count,
            contribution: count,
        });
    }

    ComplexityResult {
        complexity,
        details,
        rating: ComplexityRating::from_complexity(complexity),
    }
}
