//! Base rule contract and types
//!
//! This module defines the core abstractions for flow validation:
//! - `DocumentRule` and `ProjectRule`, the two rule shapes
//! - `Rule`, the tagged variant the engine dispatches on
//! - `ValidationContext`, the read-only bundle every rule receives
//! - `ScanState`, the per-scan run-once bookkeeping for project rules
//! - `RuleResult` / `ExecutionSummary` for capturing execution results

use crate::config::RulesConfig;
use crate::models::{Issue, Severity};
use crate::xml::{Document, QueryEngine};
use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Category stamped on issues the engine synthesizes for failing rules
pub const RULE_FAILURE_CATEGORY: &str = "rule-failure";

/// Identity shared by both rule shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMeta {
    /// Unique kebab-case id, also the key in `[rules.<id>]` config tables
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Used for grouping and for deriving quality metrics
    /// (`reliability` issues count as bugs, `security` as vulnerabilities)
    pub category: &'static str,
    /// Severity reported unless the configuration overrides it
    pub severity: Severity,
}

/// A check that runs once per parsed flow document
///
/// # Example Implementation
///
/// ```ignore
/// static META: RuleMeta = RuleMeta {
///     id: "no-loggers",
///     name: "No loggers",
///     description: "Flags logger processors",
///     category: "style",
///     severity: Severity::Info,
/// };
///
/// struct NoLoggers;
///
/// impl DocumentRule for NoLoggers {
///     fn meta(&self) -> &RuleMeta {
///         &META
///     }
///
///     fn validate(&self, document: &Document, ctx: &ValidationContext) -> Result<Vec<Issue>> {
///         Ok(ctx
///             .query
///             .select_nodes("//mule:logger", document.root())
///             .iter()
///             .map(|n| Issue::new(n.line(), "logger found"))
///             .collect())
///     }
/// }
/// ```
pub trait DocumentRule: Send + Sync {
    fn meta(&self) -> &RuleMeta;

    /// Validate one document
    ///
    /// Returned issues only need a line and a message; the engine stamps
    /// rule id, effective severity, category and file.
    fn validate(&self, document: &Document, ctx: &ValidationContext) -> Result<Vec<Issue>>;
}

/// A check on project-level concerns, run once per scan
pub trait ProjectRule: Send + Sync {
    fn meta(&self) -> &RuleMeta;

    fn validate(&self, ctx: &ValidationContext) -> Result<Vec<Issue>>;
}

/// Any registered rule
#[derive(Clone)]
pub enum Rule {
    Document(Arc<dyn DocumentRule>),
    Project(Arc<dyn ProjectRule>),
}

impl Rule {
    pub fn document(rule: impl DocumentRule + 'static) -> Self {
        Rule::Document(Arc::new(rule))
    }

    pub fn project(rule: impl ProjectRule + 'static) -> Self {
        Rule::Project(Arc::new(rule))
    }

    pub fn meta(&self) -> &RuleMeta {
        match self {
            Rule::Document(rule) => rule.meta(),
            Rule::Project(rule) => rule.meta(),
        }
    }

    pub fn id(&self) -> &'static str {
        self.meta().id
    }

    pub fn is_project(&self) -> bool {
        matches!(self, Rule::Project(_))
    }

    /// Execute the rule
    ///
    /// Document rules need a document; without one they produce nothing.
    /// Project rules ignore `document` and claim their run-once slot in
    /// `state` before doing any work, so every call after the first one in
    /// the same scan returns no issues.
    pub fn execute(
        &self,
        document: Option<&Document>,
        ctx: &ValidationContext,
        state: &ScanState,
    ) -> Result<Vec<Issue>> {
        match self {
            Rule::Document(rule) => match document {
                Some(document) => rule.validate(document, ctx),
                None => Ok(Vec::new()),
            },
            Rule::Project(rule) => {
                if !state.try_claim(rule.meta().id) {
                    debug!("Project rule {} already ran in this scan", rule.meta().id);
                    return Ok(Vec::new());
                }
                rule.validate(ctx)
            }
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_project() { "project" } else { "document" };
        write!(f, "Rule({}, {})", self.id(), kind)
    }
}

/// Read-only inputs for one rule invocation
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// File under validation (the project root for project rules)
    pub file_path: PathBuf,
    /// `file_path` relative to `project_root`
    pub relative_path: PathBuf,
    pub project_root: PathBuf,
    pub config: Arc<RulesConfig>,
    /// Every flow file in the scan
    pub files: Arc<[PathBuf]>,
    pub query: Arc<QueryEngine>,
}

impl ValidationContext {
    /// Project-level context with default config and query facility
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        Self {
            file_path: project_root.clone(),
            relative_path: PathBuf::new(),
            project_root,
            config: Arc::new(RulesConfig::default()),
            files: Arc::from(Vec::new()),
            query: Arc::new(QueryEngine::default()),
        }
    }

    pub fn with_config(mut self, config: Arc<RulesConfig>) -> Self {
        self.config = config;
        self
    }

    pub fn with_files(mut self, files: Arc<[PathBuf]>) -> Self {
        self.files = files;
        self
    }

    pub fn with_query(mut self, query: Arc<QueryEngine>) -> Self {
        self.query = query;
        self
    }

    /// Same context, narrowed to one file
    pub fn for_file(&self, file_path: &Path) -> Self {
        let relative_path = file_path
            .strip_prefix(&self.project_root)
            .unwrap_or(file_path)
            .to_path_buf();
        Self {
            file_path: file_path.to_path_buf(),
            relative_path,
            ..self.clone()
        }
    }
}

/// Whether a project rule has already run in the current scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotRun,
    Run,
}

/// Per-scan execution state
///
/// Holds the run-once state machine of every project rule, keyed by rule
/// id. Claiming a slot is a single locked operation, so concurrent callers
/// still get exactly one run per rule.
#[derive(Debug, Default)]
pub struct ScanState {
    completed: Mutex<HashSet<String>>,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put every project rule back into `NotRun`
    pub fn reset(&self) {
        self.lock().clear();
    }

    /// Move `rule_id` to `Run`; true if this call made the transition
    pub fn try_claim(&self, rule_id: &str) -> bool {
        self.lock().insert(rule_id.to_string())
    }

    pub fn state_of(&self, rule_id: &str) -> RunState {
        if self.lock().contains(rule_id) {
            RunState::Run
        } else {
            RunState::NotRun
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.completed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Result from running a single rule once
#[derive(Debug, Clone)]
pub struct RuleResult {
    pub rule_id: &'static str,
    /// Issues produced, or the single failure notice
    pub issues: Vec<Issue>,
    pub duration_ms: u64,
    pub success: bool,
    pub error: Option<String>,
}

impl RuleResult {
    pub fn success(rule_id: &'static str, issues: Vec<Issue>, duration_ms: u64) -> Self {
        Self {
            rule_id,
            issues,
            duration_ms,
            success: true,
            error: None,
        }
    }

    pub fn failure(rule_id: &'static str, notice: Issue, error: String, duration_ms: u64) -> Self {
        Self {
            rule_id,
            issues: vec![notice],
            duration_ms,
            success: false,
            error: Some(error),
        }
    }
}

/// Summary statistics from running rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    /// Rule invocations (document rules count once per file)
    pub rules_run: usize,
    pub rules_failed: usize,
    pub total_issues: usize,
    pub total_duration_ms: u64,
}

impl ExecutionSummary {
    pub fn add_result(&mut self, result: &RuleResult) {
        self.rules_run += 1;
        self.total_duration_ms += result.duration_ms;
        self.total_issues += result.issues.len();
        if !result.success {
            self.rules_failed += 1;
        }
    }

    pub fn merge(&mut self, other: &ExecutionSummary) {
        self.rules_run += other.rules_run;
        self.rules_failed += other.rules_failed;
        self.total_issues += other.total_issues;
        self.total_duration_ms += other.total_duration_ms;
    }
}
