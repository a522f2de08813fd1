//! Text (terminal) reporter with colors and formatting

use crate::models::{AnalysisReport, Issue, Severity};
use crate::scoring::{Dimension, RatingResult};
use anyhow::Result;
use console::{style, Style, StyledObject};
use std::fmt::Write;

/// Flows listed in the complexity section
const TOP_FLOWS: usize = 5;

/// Grade letter in the color of the ladder step it landed on
fn grade_style(dimension: Dimension, rating: &RatingResult) -> StyledObject<String> {
    Style::from_dotted_str(rating.color(dimension))
        .bold()
        .apply_to(rating.grade.to_string())
}

fn severity_tag(severity: Severity) -> StyledObject<&'static str> {
    match severity {
        Severity::Error => style("[E]").red(),
        Severity::Warning => style("[W]").yellow(),
        Severity::Info => style("[I]").dim(),
    }
}

fn location(issue: &Issue) -> String {
    match (&issue.file, issue.line) {
        (Some(file), 0) => file.display().to_string(),
        (Some(file), line) => format!("{}:{}", file.display(), line),
        (None, _) => "(project)".to_string(),
    }
}

fn rating_line(out: &mut String, dimension: Dimension, rating: &RatingResult) -> std::fmt::Result {
    writeln!(
        out,
        "  {:<16} {}  {} ({})",
        dimension.to_string(),
        grade_style(dimension, rating),
        rating.label,
        rating.display_value
    )
}

/// Render report as formatted terminal output
pub fn render(report: &AnalysisReport) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "\n{}", style("flowlint analysis").bold())?;
    writeln!(out, "{}", style("──────────────────────────────────────").dim())?;
    writeln!(
        out,
        "Files: {}  Flows: {}  Sub-flows: {}",
        report.files_scanned, report.flow_count, report.sub_flow_count
    )?;
    writeln!(
        out,
        "Technical debt: {}  Debt ratio: {:.1}%\n",
        style(&report.tech_debt).bold(),
        report.debt_ratio
    )?;

    if !report.ratings.is_empty() {
        writeln!(out, "{}", style("RATINGS").bold())?;
        for (dimension, rating) in report.ratings.iter() {
            rating_line(&mut out, dimension, rating)?;
        }
        out.push('\n');
    }

    let mut flows: Vec<_> = report.flows.values().collect();
    flows.sort_by(|a, b| b.result.complexity.cmp(&a.result.complexity));
    if !flows.is_empty() {
        writeln!(out, "{}", style("MOST COMPLEX FLOWS").bold())?;
        for flow in flows.iter().take(TOP_FLOWS) {
            writeln!(
                out,
                "  {:>3}  {} {} {}",
                flow.result.complexity,
                flow.name,
                style(format!("({}:{})", flow.file.display(), flow.line)).dim(),
                style(flow.result.rating).dim()
            )?;
        }
        out.push('\n');
    }

    let s = &report.summary;
    writeln!(out, "{} ({} total)", style("ISSUES").bold(), s.total)?;
    if s.total == 0 {
        writeln!(out, "  {}", style("No issues found").green())?;
    } else {
        writeln!(
            out,
            "  {} errors, {} warnings, {} info\n",
            style(s.error).red(),
            style(s.warning).yellow(),
            s.info
        )?;
        for issue in &report.issues {
            writeln!(
                out,
                "  {} {} {} {}",
                severity_tag(issue.severity),
                location(issue),
                issue.message,
                style(format!("[{}]", issue.rule_id)).dim()
            )?;
            if let Some(suggestion) = &issue.suggestion {
                writeln!(out, "      {} {}", style("→").dim(), style(suggestion).dim())?;
            }
        }
    }

    if !report.parse_failures.is_empty() {
        writeln!(out, "\n{}", style("UNPARSEABLE FILES").bold())?;
        for failure in &report.parse_failures {
            writeln!(out, "  {} {}", failure.file.display(), style(&failure.message).dim())?;
        }
    }

    Ok(out)
}
