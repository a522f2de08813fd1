//! Hardcoded credentials rule
//!
//! Detects credential-like attributes (passwords, secrets, API keys,
//! tokens) holding literal values instead of `${property}` placeholders or
//! `#[expression]` lookups.
//! CWE-798: Use of Hard-coded Credentials

use crate::models::{Issue, Severity};
use crate::rules::{DocumentRule, RuleMeta, ValidationContext};
use crate::xml::Document;
use anyhow::Result;

static META: RuleMeta = RuleMeta {
    id: "hardcoded-credentials",
    name: "Hardcoded credentials",
    description: "Credentials must come from secure properties, not literals",
    category: "security",
    severity: Severity::Error,
};

/// Fragments of a normalized attribute name that mark it as a credential
const SENSITIVE_FRAGMENTS: &[&str] = &["password", "passwd", "passphrase", "secret", "apikey"];

pub struct HardcodedCredentialsRule;

/// `clientSecret`, `api-key`, `keyPassword`, `accessToken`...
fn is_sensitive_attribute(qualified_name: &str) -> bool {
    let local = qualified_name
        .rsplit_once(':')
        .map_or(qualified_name, |(_, local)| local);
    let normalized: String = local
        .chars()
        .filter(|c| !matches!(c, '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect();
    if normalized.ends_with("ref") {
        return false;
    }
    normalized.ends_with("token") || SENSITIVE_FRAGMENTS.iter().any(|f| normalized.contains(f))
}

fn is_literal(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !value.contains("${") && !value.starts_with("#[")
}

impl DocumentRule for HardcodedCredentialsRule {
    fn meta(&self) -> &RuleMeta {
        &META
    }

    fn validate(&self, document: &Document, _ctx: &ValidationContext) -> Result<Vec<Issue>> {
        let root = document.root();
        let mut issues = Vec::new();

        for node in std::iter::once(root).chain(root.descendants()) {
            for (name, value) in node.attributes() {
                if is_sensitive_attribute(name) && is_literal(value) {
                    issues.push(
                        Issue::new(
                            node.line(),
                            format!(
                                "Attribute '{}' on <{}> holds a literal credential",
                                name,
                                node.name()
                            ),
                        )
                        .with_suggestion(
                            "Move the value to a secure properties file and reference it as ${secure::key}",
                        ),
                    );
                }
            }
        }
        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    #[test]
    fn test_sensitive_names() {
        assert!(is_sensitive_attribute("password"));
        assert!(is_sensitive_attribute("keyPassword"));
        assert!(is_sensitive_attribute("clientSecret"));
        assert!(is_sensitive_attribute("api-key"));
        assert!(is_sensitive_attribute("apiKey"));
        assert!(is_sensitive_attribute("accessToken"));
        assert!(is_sensitive_attribute("token"));
        assert!(is_sensitive_attribute("sfdc:password"));

        assert!(!is_sensitive_attribute("tokenUrl"));
        assert!(!is_sensitive_attribute("username"));
        assert!(!is_sensitive_attribute("secret-ref"));
        assert!(!is_sensitive_attribute("doc:name"));
    }

    #[test]
    fn test_literal_values() {
        assert!(is_literal("s3cret"));
        assert!(!is_literal(""));
        assert!(!is_literal("  "));
        assert!(!is_literal("${secure::db.password}"));
        assert!(!is_literal("#[vars.token]"));
        assert!(!is_literal("prefix-${env}-suffix"));
    }

    #[test]
    fn test_reports_literal_credentials() {
        let doc = parse_document(
            r#"<mule xmlns="http://www.mulesoft.org/schema/mule/core"
      xmlns:db="http://www.mulesoft.org/schema/mule/db"
      xmlns:http="http://www.mulesoft.org/schema/mule/http">
  <db:config name="db">
    <db:my-sql-connection user="${db.user}" password="hunter2"/>
  </db:config>
  <http:request-config name="api">
    <http:request-connection host="example.com">
      <http:authentication>
        <http:basic-authentication username="svc" password="${secure::api.password}"/>
      </http:authentication>
    </http:request-connection>
  </http:request-config>
  <flow name="f">
    <http:request config-ref="api" path="/x">
      <http:headers>#[{ 'x-api-key': vars.key }]</http:headers>
    </http:request>
    <set-variable variableName="accessToken" value="abc"/>
    <set-variable accessToken="abc123" value="x"/>
  </flow>
</mule>"#,
        )
        .expect("parse");

        let issues = HardcodedCredentialsRule
            .validate(&doc, &ValidationContext::new("/proj"))
            .expect("validate");

        let found: Vec<(u32, &str)> = issues
            .iter()
            .map(|i| (i.line, i.message.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                (5, "Attribute 'password' on <db:my-sql-connection> holds a literal credential"),
                (19, "Attribute 'accessToken' on <set-variable> holds a literal credential"),
            ]
        );
        // The secret itself is never echoed
        assert!(issues.iter().all(|i| !i.message.contains("hunter2")));
    }
}
