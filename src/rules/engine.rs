//! Rule execution engine
//!
//! Runs the registered rules over a set of flow files:
//!
//! 1. Files are parsed and document rules run per file, in parallel on a
//!    bounded rayon pool. Files are independent of each other.
//! 2. Project rules then run once, on the calling thread, with the full
//!    file inventory.
//!
//! A rule that returns an error or panics never aborts the scan. Its run
//! is replaced by a single warning issue in the `rule-failure` category.

use crate::complexity::{calculate_flow_complexity, ComplexityRating, FlowComplexity};
use crate::config::RulesConfig;
use crate::flows::{find_flows, FlowKind};
use crate::models::{Issue, Severity};
use crate::rules::base::{
    ExecutionSummary, Rule, RuleMeta, RuleResult, ScanState, ValidationContext,
    RULE_FAILURE_CATEGORY,
};
use crate::rules::default_rules;
use crate::scoring::{self, QualityMetrics};
use crate::xml::{load_document, parse_document, Document, ParseError, QueryEngine};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Upper bound for the auto-detected worker count
const MAX_AUTO_WORKERS: usize = 16;

/// A flow file and the outcome of parsing it
#[derive(Debug)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub document: Result<Document, ParseError>,
}

impl SourceDocument {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let document = load_document(&path);
        Self { path, document }
    }

    pub fn parsed(path: impl Into<PathBuf>, document: Document) -> Self {
        Self {
            path: path.into(),
            document: Ok(document),
        }
    }

    pub fn from_source(path: impl Into<PathBuf>, source: &str) -> Self {
        Self {
            path: path.into(),
            document: parse_document(source),
        }
    }
}

/// A file no document rule could look at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailure {
    /// Path relative to the project root
    pub file: PathBuf,
    pub message: String,
}

/// Everything one scan produced
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Sorted by severity (highest first), then file, then line
    pub issues: Vec<Issue>,
    /// Keyed by `relative/path.xml::flow-name`
    pub complexity_by_flow: BTreeMap<String, FlowComplexity>,
    pub files_scanned: usize,
    pub parse_failures: Vec<ParseFailure>,
    pub summary: ExecutionSummary,
    /// Set when the scan stopped dispatching files early
    pub cancelled: bool,
}

impl ScanReport {
    pub fn flow_count(&self) -> usize {
        self.count_kind(FlowKind::Flow)
    }

    pub fn sub_flow_count(&self) -> usize {
        self.count_kind(FlowKind::SubFlow)
    }

    fn count_kind(&self, kind: FlowKind) -> usize {
        self.complexity_by_flow
            .values()
            .filter(|f| f.kind == kind)
            .count()
    }

    /// Mean complexity over all flows and sub-flows, `None` without flows
    pub fn average_complexity(&self) -> Option<f64> {
        if self.complexity_by_flow.is_empty() {
            return None;
        }
        let total: u64 = self
            .complexity_by_flow
            .values()
            .map(|f| u64::from(f.result.complexity))
            .sum();
        Some(total as f64 / self.complexity_by_flow.len() as f64)
    }

    pub fn hotspot_count(&self) -> usize {
        self.complexity_by_flow
            .values()
            .filter(|f| f.result.rating == ComplexityRating::High)
            .count()
    }

    pub fn bug_count(&self) -> usize {
        self.count_category(|c| c == "reliability")
    }

    pub fn vulnerability_count(&self) -> usize {
        self.count_category(|c| c == "security")
    }

    /// Every other issue, engine failure notices excluded
    pub fn code_smell_count(&self) -> usize {
        self.count_category(|c| !matches!(c, "reliability" | "security" | RULE_FAILURE_CATEGORY))
    }

    fn count_category(&self, pred: impl Fn(&str) -> bool) -> usize {
        self.issues
            .iter()
            .filter(|i| pred(i.category.as_deref().unwrap_or("")))
            .count()
    }

    pub fn tech_debt_minutes(&self) -> u64 {
        scoring::calculate_tech_debt_minutes(
            self.code_smell_count() as u64,
            self.bug_count() as u64,
            self.vulnerability_count() as u64,
        )
    }

    pub fn quality_metrics(&self) -> QualityMetrics {
        let development =
            scoring::estimate_development_minutes(self.flow_count() as u64, self.sub_flow_count() as u64);
        QualityMetrics {
            average_complexity: self.average_complexity(),
            debt_ratio: Some(scoring::calculate_debt_ratio(self.tech_debt_minutes(), development)),
            bug_count: Some(self.bug_count() as u64),
            vulnerability_count: Some(self.vulnerability_count() as u64),
            hotspot_count: Some(self.hotspot_count() as u64),
        }
    }
}

/// What one file contributed to the scan
#[derive(Default)]
struct FileOutcome {
    issues: Vec<Issue>,
    flows: Vec<FlowComplexity>,
    failure: Option<ParseFailure>,
    summary: ExecutionSummary,
    skipped: bool,
}

/// Main engine for running rules
pub struct RuleEngine {
    rules: Vec<Rule>,
    workers: usize,
    query: Arc<QueryEngine>,
    cancel: Option<Arc<AtomicBool>>,
}

impl RuleEngine {
    /// Create an engine with no rules
    ///
    /// # Arguments
    /// * `workers` - Number of worker threads (0 = auto-detect)
    pub fn new(workers: usize) -> Self {
        let actual_workers = if workers == 0 {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
                .min(MAX_AUTO_WORKERS)
        } else {
            workers
        };

        Self {
            rules: Vec::new(),
            workers: actual_workers,
            query: Arc::new(QueryEngine::default()),
            cancel: None,
        }
    }

    /// Engine with the built-in rule catalog
    pub fn with_default_rules(workers: usize) -> Self {
        let mut engine = Self::new(workers);
        engine.register_all(default_rules());
        engine
    }

    pub fn with_query(mut self, query: QueryEngine) -> Self {
        self.query = Arc::new(query);
        self
    }

    /// Stop dispatching new files once `flag` is set
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn register(&mut self, rule: Rule) {
        debug!("Registered rule: {}", rule.id());
        self.rules.push(rule);
    }

    pub fn register_all(&mut self, rules: impl IntoIterator<Item = Rule>) {
        for rule in rules {
            self.register(rule);
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(Rule::id).collect()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn query(&self) -> &QueryEngine {
        &self.query
    }

    /// Parse `files` and run every enabled rule over them
    pub fn scan(&self, project_root: &Path, files: &[PathBuf], config: &RulesConfig) -> ScanReport {
        let sources: Vec<SourceDocument> = self.install(|| {
            files
                .par_iter()
                .filter(|_| !self.is_cancelled())
                .map(|path| SourceDocument::load(path.clone()))
                .collect()
        });
        if sources.len() < files.len() {
            debug!("Cancelled while loading, read {} of {} files", sources.len(), files.len());
        }
        self.scan_documents(project_root, &sources, config)
    }

    /// Run every enabled rule over already-parsed documents
    pub fn scan_documents(
        &self,
        project_root: &Path,
        sources: &[SourceDocument],
        config: &RulesConfig,
    ) -> ScanReport {
        let state = ScanState::new();
        self.scan_with_state(project_root, sources, config, &state)
    }

    /// Like [`RuleEngine::scan_documents`], with caller-owned run-once state
    ///
    /// `state` is reset before any rule runs.
    pub fn scan_with_state(
        &self,
        project_root: &Path,
        sources: &[SourceDocument],
        config: &RulesConfig,
        state: &ScanState,
    ) -> ScanReport {
        let start = Instant::now();
        state.reset();

        let (document_rules, project_rules): (Vec<&Rule>, Vec<&Rule>) = self
            .rules
            .iter()
            .filter(|r| {
                let enabled = config.is_enabled(r.id());
                if !enabled {
                    debug!("Rule {} disabled by configuration", r.id());
                }
                enabled
            })
            .partition(|r| !r.is_project());

        info!(
            "Scanning {} files with {} document and {} project rules on {} workers",
            sources.len(),
            document_rules.len(),
            project_rules.len(),
            self.workers
        );

        let files: Arc<[PathBuf]> = sources.iter().map(|s| s.path.clone()).collect();
        let base = ValidationContext::new(project_root)
            .with_config(Arc::new(config.clone()))
            .with_files(files)
            .with_query(Arc::clone(&self.query));

        let outcomes: Vec<FileOutcome> = self.install(|| {
            sources
                .par_iter()
                .map(|source| {
                    if self.is_cancelled() {
                        return FileOutcome {
                            skipped: true,
                            ..Default::default()
                        };
                    }
                    self.analyze_file(source, &base, &document_rules, state)
                })
                .collect()
        });

        let mut report = ScanReport::default();
        for outcome in outcomes {
            if outcome.skipped {
                report.cancelled = true;
                continue;
            }
            report.files_scanned += 1;
            report.summary.merge(&outcome.summary);
            report.issues.extend(outcome.issues);
            report.parse_failures.extend(outcome.failure);
            for flow in outcome.flows {
                insert_flow(&mut report.complexity_by_flow, flow);
            }
        }

        report.cancelled |= self.is_cancelled();
        if report.cancelled {
            warn!("Scan cancelled after {} files, project rules skipped", report.files_scanned);
        } else {
            for rule in project_rules {
                let result = self.run_rule(rule, None, &base, state);
                report.summary.add_result(&result);
                report.issues.extend(result.issues);
            }
        }

        report.issues.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.file.cmp(&b.file))
                .then_with(|| a.line.cmp(&b.line))
                .then_with(|| a.rule_id.cmp(&b.rule_id))
        });

        info!(
            "Scan complete: {} issues from {} rule runs ({} failed), {} flows in {:?}",
            report.issues.len(),
            report.summary.rules_run,
            report.summary.rules_failed,
            report.complexity_by_flow.len(),
            start.elapsed()
        );
        report
    }

    fn analyze_file(
        &self,
        source: &SourceDocument,
        base: &ValidationContext,
        document_rules: &[&Rule],
        state: &ScanState,
    ) -> FileOutcome {
        let ctx = base.for_file(&source.path);
        let document = match &source.document {
            Ok(document) => document,
            Err(e) => {
                warn!("Skipping {}: {}", ctx.relative_path.display(), e);
                return FileOutcome {
                    failure: Some(ParseFailure {
                        file: ctx.relative_path,
                        message: e.to_string(),
                    }),
                    ..Default::default()
                };
            }
        };

        let mut outcome = FileOutcome::default();
        for rule in document_rules {
            let result = self.run_rule(rule, Some(document), &ctx, state);
            outcome.summary.add_result(&result);
            outcome.issues.extend(result.issues);
        }

        outcome.flows = find_flows(&self.query, document)
            .into_iter()
            .map(|flow| FlowComplexity {
                file: ctx.relative_path.clone(),
                name: flow.display_name(),
                kind: flow.kind,
                line: flow.node.line(),
                result: calculate_flow_complexity(&self.query, flow.node),
            })
            .collect();
        outcome
    }

    /// Run one rule with error handling and timing
    ///
    /// Issues come back stamped with the rule id, effective severity,
    /// category and, for document rules, the relative file path.
    pub fn run_rule(
        &self,
        rule: &Rule,
        document: Option<&Document>,
        ctx: &ValidationContext,
        state: &ScanState,
    ) -> RuleResult {
        let meta = rule.meta();
        let start = Instant::now();
        let severity = ctx.config.severity_for(meta.id, meta.severity);
        let file = (!rule.is_project()).then(|| ctx.relative_path.clone());

        debug!("Running rule {} on {}", meta.id, ctx.relative_path.display());

        // Wrap in catch_unwind to handle panics
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            rule.execute(document, ctx, state)
        }));
        let duration = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(issues)) => {
                let issues: Vec<Issue> = issues
                    .into_iter()
                    .map(|issue| stamp(issue, meta, severity, file.as_ref()))
                    .collect();
                debug!("Rule {} found {} issues in {}ms", meta.id, issues.len(), duration);
                RuleResult::success(meta.id, issues, duration)
            }
            Ok(Err(e)) => {
                let message = format!("{:#}", e);
                warn!("Rule {} failed on {}: {}", meta.id, ctx.relative_path.display(), message);
                RuleResult::failure(meta.id, failure_notice(meta, &message, file), message, duration)
            }
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                error!("Rule {} panicked: {}", meta.id, panic_msg);
                let message = format!("panic: {}", panic_msg);
                RuleResult::failure(meta.id, failure_notice(meta, &message, file), message, duration)
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Run `op` on a pool sized to `workers`, or the global pool if that fails
    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match rayon::ThreadPoolBuilder::new().num_threads(self.workers).build() {
            Ok(pool) => pool.install(op),
            Err(e) => {
                warn!("Falling back to the global thread pool: {}", e);
                op()
            }
        }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(0)
    }
}

fn stamp(mut issue: Issue, meta: &RuleMeta, severity: Severity, file: Option<&PathBuf>) -> Issue {
    issue.rule_id = meta.id.to_string();
    issue.severity = severity;
    if issue.category.is_none() {
        issue.category = Some(meta.category.to_string());
    }
    if issue.file.is_none() {
        issue.file = file.cloned();
    }
    issue
}

fn failure_notice(meta: &RuleMeta, message: &str, file: Option<PathBuf>) -> Issue {
    Issue {
        line: 0,
        message: format!("Rule '{}' failed: {}", meta.id, message),
        rule_id: meta.id.to_string(),
        severity: Severity::Warning,
        suggestion: Some(format!(
            "Check the [rules.{}] options or disable the rule in flowlint.toml",
            meta.id
        )),
        category: Some(RULE_FAILURE_CATEGORY.to_string()),
        file,
    }
}

/// Two flows of one file sharing a name get their line appended
fn insert_flow(map: &mut BTreeMap<String, FlowComplexity>, flow: FlowComplexity) {
    let base = format!(
        "{}::{}",
        flow.file.to_string_lossy().replace('\\', "/"),
        flow.name
    );
    let key = if map.contains_key(&base) {
        format!("{}@{}", base, flow.line)
    } else {
        base
    };
    map.insert(key, flow);
}

/// Builder for RuleEngine with fluent API
pub struct RuleEngineBuilder {
    workers: usize,
    rules: Vec<Rule>,
    query: Option<QueryEngine>,
    cancel: Option<Arc<AtomicBool>>,
}

impl RuleEngineBuilder {
    pub fn new() -> Self {
        Self {
            workers: 0,
            rules: Vec::new(),
            query: None,
            cancel: None,
        }
    }

    /// Set number of worker threads
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn default_rules(self) -> Self {
        self.rules(default_rules())
    }

    pub fn query(mut self, query: QueryEngine) -> Self {
        self.query = Some(query);
        self
    }

    pub fn cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn build(self) -> RuleEngine {
        let mut engine = RuleEngine::new(self.workers);
        if let Some(query) = self.query {
            engine = engine.with_query(query);
        }
        if let Some(flag) = self.cancel {
            engine = engine.with_cancellation(flag);
        }
        engine.register_all(self.rules);
        engine
    }
}

impl Default for RuleEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
