//! Project .gitignore rule
//!
//! Maven writes build output to `target/`, which must stay out of version
//! control.

use crate::models::{Issue, Severity};
use crate::rules::{ProjectRule, RuleMeta, ValidationContext};
use anyhow::{Context, Result};

static META: RuleMeta = RuleMeta {
    id: "project-gitignore",
    name: "Project .gitignore",
    description: "The project should ignore Maven build output",
    category: "structure",
    severity: Severity::Warning,
};

const TARGET_PATTERNS: &[&str] = &["target", "target/", "/target", "/target/", "target/*", "/target/*"];

pub struct ProjectGitignoreRule;

fn ignores_target(content: &str) -> bool {
    content
        .lines()
        .map(str::trim)
        .any(|line| TARGET_PATTERNS.contains(&line))
}

impl ProjectRule for ProjectGitignoreRule {
    fn meta(&self) -> &RuleMeta {
        &META
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<Vec<Issue>> {
        let path = ctx.project_root.join(".gitignore");
        if !path.is_file() {
            return Ok(vec![Issue::project("Project has no .gitignore")
                .with_suggestion("Add a .gitignore that excludes target/")]);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if ignores_target(&content) {
            Ok(Vec::new())
        } else {
            Ok(vec![Issue::project(".gitignore does not ignore target/")
                .with_suggestion("Add a 'target/' line to .gitignore")])
        }
    }
}
