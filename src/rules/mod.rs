//! Flow validation rules
//!
//! Rules come in two shapes:
//!
//! ```text
//!   DocumentRule ── runs once per parsed flow file
//!   ProjectRule  ── runs once per scan, on project-level concerns
//! ```
//!
//! Both are wrapped in [`Rule`] and registered with the [`engine::RuleEngine`],
//! which runs document rules per file on a worker pool and project rules
//! once afterwards.
//!
//! # Catalog
//!
//! | id | kind | category |
//! |----|------|----------|
//! | `flow-complexity` | document | complexity |
//! | `missing-error-handler` | document | reliability |
//! | `flow-naming` | document | naming |
//! | `hardcoded-credentials` | document | security |
//! | `project-pom` | project | structure |
//! | `project-gitignore` | project | structure |

mod base;
pub mod engine;

mod flow_complexity;
mod flow_naming;
mod hardcoded_credentials;
mod missing_error_handler;
mod project_gitignore;
mod project_pom;

pub use base::{
    DocumentRule, ExecutionSummary, ProjectRule, Rule, RuleMeta, RuleResult, RunState, ScanState,
    ValidationContext, RULE_FAILURE_CATEGORY,
};
pub use engine::{ParseFailure, RuleEngine, RuleEngineBuilder, ScanReport, SourceDocument};

pub use flow_complexity::FlowComplexityRule;
pub use flow_naming::{FlowNamingRule, DEFAULT_NAME_PATTERN};
pub use hardcoded_credentials::HardcodedCredentialsRule;
pub use missing_error_handler::MissingErrorHandlerRule;
pub use project_gitignore::ProjectGitignoreRule;
pub use project_pom::ProjectPomRule;

/// The built-in catalog, in registration order
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::document(FlowComplexityRule),
        Rule::document(MissingErrorHandlerRule),
        Rule::document(FlowNamingRule),
        Rule::document(HardcodedCredentialsRule),
        Rule::project(ProjectPomRule),
        Rule::project(ProjectGitignoreRule),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_rules_have_unique_ids() {
        let rules = default_rules();
        let ids: HashSet<&str> = rules.iter().map(Rule::id).collect();
        assert_eq!(ids.len(), rules.len());
    }

    #[test]
    fn test_ids_are_normalized_kebab_case() {
        for rule in default_rules() {
            assert_eq!(crate::config::normalize_rule_id(rule.id()), rule.id());
        }
    }

    #[test]
    fn test_project_rules_in_catalog() {
        let project: Vec<&str> = default_rules()
            .iter()
            .filter(|r| r.is_project())
            .map(Rule::id)
            .collect();
        assert_eq!(project, vec!["project-pom", "project-gitignore"]);
    }
}
