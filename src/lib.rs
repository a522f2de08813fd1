//! flowlint - static analysis for Mule flow definitions
//!
//! Parses Mule XML configurations, runs document- and project-scoped
//! validation rules over them, measures per-flow structural complexity and
//! grades the project on an A-E scale with a technical debt estimate.
//!
//! ```no_run
//! use flowlint::config::RulesConfig;
//! use flowlint::models::AnalysisReport;
//! use flowlint::rules::RuleEngine;
//! use std::path::Path;
//!
//! let root = Path::new("my-mule-app");
//! let files = flowlint::cli::discover_flow_files(root, "src/main/mule")?;
//! let scan = RuleEngine::with_default_rules(0).scan(root, &files, &RulesConfig::default());
//! let report = AnalysisReport::from_scan(root, scan);
//! println!("{} issues, debt {}", report.summary.total, report.tech_debt);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod complexity;
pub mod config;
pub mod flows;
pub mod models;
pub mod reporters;
pub mod rules;
pub mod scoring;
pub mod xml;
