//! Rules command - list the rule catalog

use crate::config::load_project_config;
use crate::rules::default_rules;
use anyhow::Result;
use console::style;
use std::path::Path;

pub(super) fn run(path: &Path) -> Result<()> {
    let config = load_project_config(path).effective_rules();

    println!("\n{}\n", style("Available rules").bold());
    for rule in default_rules() {
        let meta = rule.meta();
        let kind = if rule.is_project() { "project" } else { "document" };
        let severity = config.severity_for(meta.id, meta.severity);
        let state = if config.is_enabled(meta.id) {
            style("enabled").green()
        } else {
            style("disabled").dim()
        };
        println!(
            "  {:<24} {:<9} {:<12} {:<8} {}",
            style(meta.id).bold(),
            kind,
            meta.category,
            severity.to_string(),
            state
        );
        println!("  {}", style(meta.description).dim());
    }
    println!();
    Ok(())
}
