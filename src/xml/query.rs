//! Namespace-aware path queries over parsed documents
//!
//! Supports the subset of XPath 1.0 location paths the rules need:
//!
//! ```text
//! /mule:mule/mule:flow          absolute child steps
//! //mule:flow                   descendants of the document
//! .//mule:when  ./mule:try  x/y relative to a context element
//! *  mule:*  .  ..              wildcards, self and parent
//! mule:flow[@name='main'][1]    attribute and position predicates
//! mule:flow/@doc:name  //@name  trailing attribute step
//! ```
//!
//! Unprefixed name tests match elements without a namespace, as in XPath.
//! Attribute names are matched on the qualified name as written in the
//! source. A positional predicate counts among siblings: `//mule:when[1]`
//! selects the first `when` of every parent, as in XPath.
//!
//! The `try_*` methods report [`QueryError`]s. The plain methods absorb them
//! and behave as if nothing matched, which is what rules and the complexity
//! calculator rely on.

use super::{Document, NamespaceTable, Node, NodeId};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("empty path expression")]
    Empty,

    #[error("invalid path `{expression}`: {message}")]
    Syntax { expression: String, message: String },

    #[error("unknown namespace prefix `{0}`")]
    UnknownPrefix(String),

    #[error("`{0}` selects attribute values, not elements")]
    NotNodeSet(String),
}

/// Result of evaluating a path
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue<'a> {
    Nodes(Vec<Node<'a>>),
    Strings(Vec<&'a str>),
}

impl QueryValue<'_> {
    pub fn len(&self) -> usize {
        match self {
            QueryValue::Nodes(nodes) => nodes.len(),
            QueryValue::Strings(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq)]
enum NodeTest {
    Name {
        namespace: Option<String>,
        local: String,
    },
    AnyElement,
    AnyInNamespace(String),
    SelfNode,
    Parent,
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    HasAttribute(String),
    AttributeEquals(String, String),
    Position(usize),
}

#[derive(Debug, Clone)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone)]
struct CompiledPath {
    absolute: bool,
    steps: Vec<Step>,
    attribute: Option<(Axis, String)>,
}

#[derive(Clone, Copy)]
enum Context<'a> {
    Document(&'a Document),
    Element(Node<'a>),
}

/// Stateless query capability, passed to whatever needs to run paths
#[derive(Debug, Clone, Default)]
pub struct QueryEngine {
    namespaces: NamespaceTable,
}

impl QueryEngine {
    pub fn new(namespaces: NamespaceTable) -> Self {
        Self { namespaces }
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    /// Evaluate `expression` with `context` as the context element
    pub fn try_evaluate<'a>(
        &self,
        expression: &str,
        context: Node<'a>,
    ) -> Result<QueryValue<'a>, QueryError> {
        let path = self.compile(expression)?;
        Ok(evaluate(&path, context))
    }

    pub fn try_select_nodes<'a>(
        &self,
        expression: &str,
        context: Node<'a>,
    ) -> Result<Vec<Node<'a>>, QueryError> {
        match self.try_evaluate(expression, context)? {
            QueryValue::Nodes(nodes) => Ok(nodes),
            QueryValue::Strings(_) => Err(QueryError::NotNodeSet(expression.trim().to_string())),
        }
    }

    pub fn try_count(&self, expression: &str, context: Node<'_>) -> Result<usize, QueryError> {
        self.try_evaluate(expression, context).map(|value| value.len())
    }

    /// Matching elements, or nothing if the expression cannot be evaluated
    pub fn select_nodes<'a>(&self, expression: &str, context: Node<'a>) -> Vec<Node<'a>> {
        self.try_select_nodes(expression, context)
            .unwrap_or_else(|err| absorb(expression, err))
    }

    pub fn select_node<'a>(&self, expression: &str, context: Node<'a>) -> Option<Node<'a>> {
        self.select_nodes(expression, context).into_iter().next()
    }

    /// First attribute value, or the text of the first matching element
    pub fn select_string<'a>(&self, expression: &str, context: Node<'a>) -> Option<&'a str> {
        match self.try_evaluate(expression, context) {
            Ok(QueryValue::Strings(values)) => values.into_iter().next(),
            Ok(QueryValue::Nodes(nodes)) => nodes.first().map(|n| n.text()),
            Err(err) => absorb(expression, err),
        }
    }

    pub fn exists(&self, expression: &str, context: Node<'_>) -> bool {
        self.count(expression, context) > 0
    }

    pub fn count(&self, expression: &str, context: Node<'_>) -> usize {
        self.try_count(expression, context)
            .unwrap_or_else(|err| absorb(expression, err))
    }

    fn compile(&self, expression: &str) -> Result<CompiledPath, QueryError> {
        let expr = expression.trim();
        if expr.is_empty() {
            return Err(QueryError::Empty);
        }
        let syntax = |message: &str| QueryError::Syntax {
            expression: expr.to_string(),
            message: message.to_string(),
        };

        let (absolute, mut axis, mut rest) = if let Some(r) = expr.strip_prefix("//") {
            (true, Axis::Descendant, r)
        } else if let Some(r) = expr.strip_prefix(".//") {
            (false, Axis::Descendant, r)
        } else if let Some(r) = expr.strip_prefix("./") {
            (false, Axis::Child, r)
        } else if let Some(r) = expr.strip_prefix('/') {
            (true, Axis::Child, r)
        } else {
            (false, Axis::Child, expr)
        };

        let mut steps = Vec::new();
        let mut attribute = None;
        loop {
            if rest.is_empty() {
                return Err(syntax("expected a step"));
            }
            let end = step_end(rest).ok_or_else(|| syntax("unbalanced brackets or quotes"))?;
            let (token, remainder) = rest.split_at(end);

            if let Some(name) = token.strip_prefix('@') {
                if !remainder.is_empty() {
                    return Err(syntax("an attribute step must be the last step"));
                }
                if name != "*" && !is_attribute_name(name) {
                    return Err(syntax("invalid attribute name"));
                }
                attribute = Some((axis, name.to_string()));
                break;
            }

            steps.push(self.compile_step(axis, token, &syntax)?);
            if remainder.is_empty() {
                break;
            }
            if let Some(r) = remainder.strip_prefix("//") {
                axis = Axis::Descendant;
                rest = r;
            } else if let Some(r) = remainder.strip_prefix('/') {
                axis = Axis::Child;
                rest = r;
            } else {
                return Err(syntax("unexpected character after step"));
            }
        }

        Ok(CompiledPath {
            absolute,
            steps,
            attribute,
        })
    }

    fn compile_step(
        &self,
        axis: Axis,
        token: &str,
        syntax: &dyn Fn(&str) -> QueryError,
    ) -> Result<Step, QueryError> {
        let (test_part, mut tail) = match token.find('[') {
            Some(i) => token.split_at(i),
            None => (token, ""),
        };

        let test = match test_part {
            "." => NodeTest::SelfNode,
            ".." => NodeTest::Parent,
            "*" => NodeTest::AnyElement,
            other => match other.split_once(':') {
                Some((prefix, local)) => {
                    let uri = self
                        .namespaces
                        .resolve(prefix)
                        .ok_or_else(|| QueryError::UnknownPrefix(prefix.to_string()))?
                        .to_string();
                    if local == "*" {
                        NodeTest::AnyInNamespace(uri)
                    } else if is_local_name(local) {
                        NodeTest::Name {
                            namespace: Some(uri),
                            local: local.to_string(),
                        }
                    } else {
                        return Err(syntax("invalid element name"));
                    }
                }
                None if is_local_name(other) => NodeTest::Name {
                    namespace: None,
                    local: other.to_string(),
                },
                None => return Err(syntax("invalid element name")),
            },
        };

        let mut predicates = Vec::new();
        while !tail.is_empty() {
            let close = predicate_end(tail).ok_or_else(|| syntax("unterminated predicate"))?;
            predicates.push(parse_predicate(&tail[1..close], syntax)?);
            tail = &tail[close + 1..];
            if !tail.is_empty() && !tail.starts_with('[') {
                return Err(syntax("unexpected text after predicate"));
            }
        }

        Ok(Step {
            axis,
            test,
            predicates,
        })
    }
}

fn absorb<T: Default>(expression: &str, err: QueryError) -> T {
    debug!("Query `{}` treated as no match: {}", expression, err);
    T::default()
}

/// Byte offset of the `/` ending the first step, or the length of `s`
fn step_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.checked_sub(1)?,
            (None, '/') if depth == 0 => return Some(i),
            _ => {}
        }
    }
    (depth == 0 && quote.is_none()).then_some(s.len())
}

/// Offset of the `]` closing the predicate that starts at `s[0]`
fn predicate_end(s: &str) -> Option<usize> {
    if !s.starts_with('[') {
        return None;
    }
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, ']') => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_predicate(
    inner: &str,
    syntax: &dyn Fn(&str) -> QueryError,
) -> Result<Predicate, QueryError> {
    let inner = inner.trim();
    if let Ok(position) = inner.parse::<usize>() {
        if position == 0 {
            return Err(syntax("positions start at 1"));
        }
        return Ok(Predicate::Position(position));
    }

    let Some(attr) = inner.strip_prefix('@') else {
        return Err(syntax("unsupported predicate"));
    };
    match attr.split_once('=') {
        None if is_attribute_name(attr.trim()) => {
            Ok(Predicate::HasAttribute(attr.trim().to_string()))
        }
        None => Err(syntax("invalid attribute name")),
        Some((name, value)) => {
            let name = name.trim();
            let value = value.trim();
            if !is_attribute_name(name) {
                return Err(syntax("invalid attribute name"));
            }
            let unquoted = value
                .strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
                .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
                .ok_or_else(|| syntax("attribute value must be quoted"))?;
            Ok(Predicate::AttributeEquals(
                name.to_string(),
                unquoted.to_string(),
            ))
        }
    }
}

fn is_local_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn is_attribute_name(name: &str) -> bool {
    match name.split_once(':') {
        Some((prefix, local)) => is_local_name(prefix) && is_local_name(local),
        None => is_local_name(name),
    }
}

fn evaluate<'a>(path: &CompiledPath, context: Node<'a>) -> QueryValue<'a> {
    let mut contexts = vec![if path.absolute {
        Context::Document(context.document())
    } else {
        Context::Element(context)
    }];

    for step in &path.steps {
        let mut next: Vec<Node<'a>> = contexts
            .iter()
            .flat_map(|ctx| apply_step(step, *ctx))
            .collect();
        next.sort_by_key(|n| n.id());
        next.dedup_by_key(|n| n.id());
        contexts = next.into_iter().map(Context::Element).collect();
    }

    let Some((axis, name)) = &path.attribute else {
        return QueryValue::Nodes(
            contexts
                .into_iter()
                .filter_map(|ctx| match ctx {
                    Context::Element(node) => Some(node),
                    Context::Document(doc) => Some(doc.root()),
                })
                .collect(),
        );
    };

    let mut owners: Vec<Node<'a>> = contexts
        .iter()
        .flat_map(|ctx| match (ctx, axis) {
            (Context::Element(node), Axis::Child) => vec![*node],
            (Context::Element(node), Axis::Descendant) => {
                std::iter::once(*node).chain(node.descendants()).collect()
            }
            (Context::Document(_), Axis::Child) => Vec::new(),
            (Context::Document(doc), Axis::Descendant) => {
                let root = doc.root();
                std::iter::once(root).chain(root.descendants()).collect()
            }
        })
        .collect();
    owners.sort_by_key(|n| n.id());
    owners.dedup_by_key(|n| n.id());

    let values = owners
        .iter()
        .flat_map(|owner| {
            owner
                .attributes()
                .filter(|(key, _)| name == "*" || key == name)
                .map(|(_, value)| value)
                .collect::<Vec<_>>()
        })
        .collect();
    QueryValue::Strings(values)
}

fn apply_step<'a>(step: &Step, ctx: Context<'a>) -> Vec<Node<'a>> {
    let matched: Vec<Node<'a>> = match (&step.test, ctx) {
        (NodeTest::SelfNode, Context::Element(node)) => match step.axis {
            Axis::Child => vec![node],
            Axis::Descendant => std::iter::once(node).chain(node.descendants()).collect(),
        },
        (NodeTest::SelfNode, Context::Document(doc)) => vec![doc.root()],
        (NodeTest::Parent, Context::Element(node)) => node.parent().into_iter().collect(),
        (NodeTest::Parent, Context::Document(_)) => Vec::new(),
        (test, ctx) => {
            let matched: Vec<Node<'a>> = candidates(ctx, step.axis)
                .into_iter()
                .filter(|node| matches_test(test, node))
                .collect();
            if step.axis == Axis::Descendant {
                return apply_per_parent(matched, &step.predicates);
            }
            matched
        }
    };
    apply_predicates(matched, &step.predicates)
}

/// `//x[n]` is `descendant-or-self::node()/child::x[n]`, so predicates see
/// the siblings under each parent rather than the whole descendant list
fn apply_per_parent<'a>(matched: Vec<Node<'a>>, predicates: &[Predicate]) -> Vec<Node<'a>> {
    if predicates.is_empty() {
        return matched;
    }
    let mut groups: BTreeMap<Option<NodeId>, Vec<Node<'a>>> = BTreeMap::new();
    for node in matched {
        groups
            .entry(node.parent().map(|p| p.id()))
            .or_default()
            .push(node);
    }
    groups
        .into_values()
        .flat_map(|siblings| apply_predicates(siblings, predicates))
        .collect()
}

fn apply_predicates<'a>(mut matched: Vec<Node<'a>>, predicates: &[Predicate]) -> Vec<Node<'a>> {
    for predicate in predicates {
        matched = match predicate {
            Predicate::HasAttribute(name) => matched
                .into_iter()
                .filter(|n| n.attribute(name).is_some())
                .collect(),
            Predicate::AttributeEquals(name, value) => matched
                .into_iter()
                .filter(|n| n.attribute(name) == Some(value.as_str()))
                .collect(),
            Predicate::Position(position) => {
                matched.get(position - 1).copied().into_iter().collect()
            }
        };
    }
    matched
}

fn candidates<'a>(ctx: Context<'a>, axis: Axis) -> Vec<Node<'a>> {
    match (ctx, axis) {
        (Context::Document(doc), Axis::Child) => vec![doc.root()],
        (Context::Document(doc), Axis::Descendant) => {
            let root = doc.root();
            std::iter::once(root).chain(root.descendants()).collect()
        }
        (Context::Element(node), Axis::Child) => node.children().collect(),
        (Context::Element(node), Axis::Descendant) => node.descendants(),
    }
}

fn matches_test(test: &NodeTest, node: &Node<'_>) -> bool {
    match test {
        NodeTest::Name { namespace, local } => {
            node.local_name() == local && node.namespace() == namespace.as_deref()
        }
        NodeTest::AnyElement => true,
        NodeTest::AnyInNamespace(uri) => node.namespace() == Some(uri.as_str()),
        NodeTest::SelfNode | NodeTest::Parent => false,
    }
}
