//! Project POM rule
//!
//! A Mule application is built by Maven, so the project root needs a
//! well-formed `pom.xml` declaring a Mule packaging.

use crate::models::{Issue, Severity};
use crate::rules::{ProjectRule, RuleMeta, ValidationContext};
use crate::xml::load_document;
use anyhow::Result;

static META: RuleMeta = RuleMeta {
    id: "project-pom",
    name: "Project POM",
    description: "The project root must contain a Maven pom.xml",
    category: "structure",
    severity: Severity::Error,
};

pub struct ProjectPomRule;

impl ProjectRule for ProjectPomRule {
    fn meta(&self) -> &RuleMeta {
        &META
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<Vec<Issue>> {
        let path = ctx.project_root.join("pom.xml");
        if !path.is_file() {
            return Ok(vec![Issue::project("Project has no pom.xml at its root")
                .with_suggestion("Add a Maven pom.xml with mule-application packaging")]);
        }

        let document = match load_document(&path) {
            Ok(document) => document,
            Err(e) => return Ok(vec![Issue::project(format!("pom.xml cannot be parsed: {}", e))]),
        };

        let packaging = document
            .root()
            .children()
            .find(|n| n.local_name() == "packaging")
            .map(|n| n.text());
        match packaging {
            Some(p) if p.starts_with("mule-") => Ok(Vec::new()),
            Some(p) => Ok(vec![Issue::project(format!(
                "pom.xml declares packaging '{}' instead of a Mule packaging",
                p
            ))
            .with_suggestion("Use <packaging>mule-application</packaging>")]),
            None => Ok(vec![Issue::project("pom.xml does not declare a packaging")
                .with_suggestion("Use <packaging>mule-application</packaging>")]),
        }
    }
}
