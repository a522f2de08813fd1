//! Locating flow and sub-flow definitions inside a Mule configuration

use crate::xml::{Document, Node, QueryEngine};
use serde::{Deserialize, Serialize};

const FLOW_QUERY: &str = "/mule:mule/mule:flow";
const SUB_FLOW_QUERY: &str = "/mule:mule/mule:sub-flow";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowKind {
    Flow,
    SubFlow,
}

impl std::fmt::Display for FlowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowKind::Flow => write!(f, "flow"),
            FlowKind::SubFlow => write!(f, "sub-flow"),
        }
    }
}

/// A top-level `<flow>` or `<sub-flow>` element
#[derive(Debug, Clone, Copy)]
pub struct FlowDefinition<'a> {
    pub kind: FlowKind,
    pub name: Option<&'a str>,
    pub node: Node<'a>,
}

impl FlowDefinition<'_> {
    /// Declared name, or a positional placeholder for unnamed flows
    pub fn display_name(&self) -> String {
        match self.name {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => format!("<unnamed {} at line {}>", self.kind, self.node.line()),
        }
    }
}

/// All flows and sub-flows of `document`, in document order
pub fn find_flows<'a>(query: &QueryEngine, document: &'a Document) -> Vec<FlowDefinition<'a>> {
    let root = document.root();
    let mut flows: Vec<FlowDefinition<'a>> = query
        .select_nodes(FLOW_QUERY, root)
        .into_iter()
        .map(|node| (FlowKind::Flow, node))
        .chain(
            query
                .select_nodes(SUB_FLOW_QUERY, root)
                .into_iter()
                .map(|node| (FlowKind::SubFlow, node)),
        )
        .map(|(kind, node)| FlowDefinition {
            kind,
            name: node.attribute("name"),
            node,
        })
        .collect();
    flows.sort_by_key(|flow| flow.node.id());
    flows
}
