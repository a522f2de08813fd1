//! Prefix to namespace URI table used by path expressions

use std::collections::BTreeMap;

/// Mule core schema namespace
pub const MULE_CORE_NS: &str = "http://www.mulesoft.org/schema/mule/core";

const DEFAULT_NAMESPACES: &[(&str, &str)] = &[
    ("mule", MULE_CORE_NS),
    ("doc", "http://www.mulesoft.org/schema/mule/documentation"),
    ("http", "http://www.mulesoft.org/schema/mule/http"),
    ("ee", "http://www.mulesoft.org/schema/mule/ee/core"),
    ("db", "http://www.mulesoft.org/schema/mule/db"),
    ("vm", "http://www.mulesoft.org/schema/mule/vm"),
    ("jms", "http://www.mulesoft.org/schema/mule/jms"),
    ("file", "http://www.mulesoft.org/schema/mule/file"),
    ("sftp", "http://www.mulesoft.org/schema/mule/sftp"),
    ("os", "http://www.mulesoft.org/schema/mule/os"),
    ("apikit", "http://www.mulesoft.org/schema/mule/mule-apikit"),
    ("salesforce", "http://www.mulesoft.org/schema/mule/salesforce"),
    ("tls", "http://www.mulesoft.org/schema/mule/tls"),
];

/// Namespace prefixes understood by the query facility
///
/// Prefixes in path expressions are resolved against this table, never
/// against the prefixes a particular document happens to use, so
/// `mule:flow` matches `<flow>` under a default core namespace as well as
/// `<core:flow>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceTable {
    entries: BTreeMap<String, String>,
}

impl NamespaceTable {
    /// Table with no prefixes at all
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Add or replace a prefix mapping
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.entries.insert(prefix.into(), uri.into());
        self
    }

    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.entries.get(prefix).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NamespaceTable {
    fn default() -> Self {
        DEFAULT_NAMESPACES
            .iter()
            .fold(Self::empty(), |table, (prefix, uri)| {
                table.with_namespace(*prefix, *uri)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_knows_mule_families() {
        let table = NamespaceTable::default();
        assert_eq!(table.resolve("mule"), Some(MULE_CORE_NS));
        assert_eq!(
            table.resolve("ee"),
            Some("http://www.mulesoft.org/schema/mule/ee/core")
        );
        assert_eq!(table.resolve("nope"), None);
    }

    #[test]
    fn test_table_is_extensible() {
        let table = NamespaceTable::default().with_namespace("kafka", "urn:kafka");
        assert_eq!(table.resolve("kafka"), Some("urn:kafka"));
        assert_eq!(table.len(), DEFAULT_NAMESPACES.len() + 1);
    }
}
