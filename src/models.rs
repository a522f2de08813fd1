//! Core data models for flowlint
//!
//! These models are shared by the rule engine, the scoring subsystem
//! and the reporters.

use crate::complexity::FlowComplexity;
use crate::rules::engine::{ParseFailure, ScanReport};
use crate::scoring::{self, QualityRatings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Severity levels for issues
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl Severity {
    /// Parse a severity name, accepting the short `warn` alias
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "info" => Some(Severity::Info),
            "warning" | "warn" => Some(Severity::Warning),
            "error" => Some(Severity::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single problem reported by a rule
///
/// `line == 0` is reserved for project-scoped issues that have no single
/// location. `rule_id`, `severity`, `category` and `file` are stamped by the
/// engine, so rules only need to fill in the location and message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Issue {
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub rule_id: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Path relative to the project root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Issue {
    pub fn new(line: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
            ..Default::default()
        }
    }

    /// Issue without a single location (project rules)
    pub fn project(message: impl Into<String>) -> Self {
        Self::new(0, message)
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn is_project_level(&self) -> bool {
        self.line == 0 && self.file.is_none()
    }
}

/// Summary of issues by severity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuesSummary {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
    pub total: usize,
}

impl IssuesSummary {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let mut summary = Self::default();
        for issue in issues {
            match issue.severity {
                Severity::Error => summary.error += 1,
                Severity::Warning => summary.warning += 1,
                Severity::Info => summary.info += 1,
            }
            summary.total += 1;
        }
        summary
    }

    /// Whether any issue is at `threshold` or above
    pub fn meets(&self, threshold: Severity) -> bool {
        match threshold {
            Severity::Error => self.error > 0,
            Severity::Warning => self.error + self.warning > 0,
            Severity::Info => self.total > 0,
        }
    }
}

/// Graded quality report for one project scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub project_root: PathBuf,
    pub files_scanned: usize,
    pub flow_count: usize,
    pub sub_flow_count: usize,
    pub issues: Vec<Issue>,
    pub summary: IssuesSummary,
    pub flows: BTreeMap<String, FlowComplexity>,
    pub ratings: QualityRatings,
    pub tech_debt_minutes: u64,
    pub tech_debt: String,
    pub debt_ratio: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parse_failures: Vec<ParseFailure>,
}

impl AnalysisReport {
    /// Grade a finished scan
    pub fn from_scan(project_root: impl Into<PathBuf>, scan: ScanReport) -> Self {
        let metrics = scan.quality_metrics();
        let ratings = scoring::calculate_all_ratings(&metrics);
        let tech_debt_minutes = scan.tech_debt_minutes();

        Self {
            project_root: project_root.into(),
            files_scanned: scan.files_scanned,
            flow_count: scan.flow_count(),
            sub_flow_count: scan.sub_flow_count(),
            summary: IssuesSummary::from_issues(&scan.issues),
            tech_debt: scoring::format_tech_debt(tech_debt_minutes),
            debt_ratio: metrics.debt_ratio.unwrap_or(0.0),
            tech_debt_minutes,
            ratings,
            issues: scan.issues,
            flows: scan.complexity_by_flow,
            parse_failures: scan.parse_failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering_and_parse() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        assert_eq!(Severity::parse("WARN"), Some(Severity::Warning));
        assert_eq!(Severity::parse("error"), Some(Severity::Error));
        assert_eq!(Severity::parse("critical"), None);
    }

    #[test]
    fn test_summary_meets_threshold() {
        let mut warning = Issue::new(3, "w");
        warning.severity = Severity::Warning;
        let summary = IssuesSummary::from_issues(&[warning, Issue::new(4, "i")]);

        assert_eq!(summary.total, 2);
        assert!(summary.meets(Severity::Warning));
        assert!(summary.meets(Severity::Info));
        assert!(!summary.meets(Severity::Error));
    }

    #[test]
    fn test_project_issue_has_no_location() {
        let issue = Issue::project("missing pom.xml").with_suggestion("add one");
        assert!(issue.is_project_level());
        assert_eq!(issue.suggestion.as_deref(), Some("add one"));
    }
}
