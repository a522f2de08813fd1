//! Analyze command implementation
//!
//! 1. Load flowlint.toml and merge CLI overrides
//! 2. Discover flow files under the flow directory
//! 3. Run all enabled rules and compute flow complexity
//! 4. Grade the project and estimate technical debt
//! 5. Output results (text, json)

use super::files::discover_flow_files_excluding;
use super::AnalyzeArgs;
use crate::config::{load_project_config, OptionValue, ProjectConfig, RulesConfig};
use crate::models::{AnalysisReport, IssuesSummary, Severity};
use crate::reporters;
use crate::rules::RuleEngine;

use anyhow::{bail, Context, Result};
use console::style;
use std::path::Path;
use std::time::Instant;
use tracing::info;

pub(super) fn run(path: &Path, workers: Option<usize>, args: AnalyzeArgs) -> Result<()> {
    let start = Instant::now();
    let project_root = path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", path.display()))?;
    if !project_root.is_dir() {
        bail!("Not a directory: {}", project_root.display());
    }

    let config = load_project_config(&project_root);
    let rules = effective_rules(&config, &args);
    let flows_dir = args
        .flows_dir
        .clone()
        .unwrap_or_else(|| config.scan.flows_dir().to_string());
    let files = discover_flow_files_excluding(&project_root, &flows_dir, &config.scan.exclude)?;
    if files.is_empty() {
        eprintln!(
            "{} no flow files found under {}",
            style("warning:").yellow().bold(),
            project_root.join(&flows_dir).display()
        );
    }

    let engine = RuleEngine::with_default_rules(workers.or(config.scan.workers).unwrap_or(0));
    let scan = engine.scan(&project_root, &files, &rules);
    let report = AnalysisReport::from_scan(&project_root, scan);
    info!("Analysis finished in {:?}", start.elapsed());

    let format = args
        .format
        .as_deref()
        .or(config.defaults.format.as_deref())
        .unwrap_or("text");
    let rendered = reporters::report(&report, format)?;

    match &args.output {
        Some(output) => {
            std::fs::write(output, &rendered)
                .with_context(|| format!("Failed to write report to {}", output.display()))?;
            eprintln!("Report written to {}", output.display());
        }
        None => print!("{}", rendered),
    }

    let fail_on = match args.fail_on.as_deref() {
        Some(value) => Severity::parse(value),
        None => config.defaults.fail_on,
    };
    check_fail_threshold(fail_on, &report.summary);
    Ok(())
}

/// Rule configuration after `[defaults]` and command line overrides
fn effective_rules(config: &ProjectConfig, args: &AnalyzeArgs) -> RulesConfig {
    let mut rules = config.effective_rules();
    for id in &args.disable_rule {
        rules.disable(id);
    }
    if let Some(max) = args.max_complexity {
        rules.set_option("flow-complexity", "max_complexity", OptionValue::Integer(max));
    }
    rules
}

fn should_fail(fail_on: Option<Severity>, summary: &IssuesSummary) -> bool {
    fail_on.is_some_and(|threshold| summary.meets(threshold))
}

fn check_fail_threshold(fail_on: Option<Severity>, summary: &IssuesSummary) {
    if should_fail(fail_on, summary) {
        if let Some(threshold) = fail_on {
            eprintln!("Failing due to --fail-on={} threshold", threshold);
        }
        std::process::exit(1);
    }
}
