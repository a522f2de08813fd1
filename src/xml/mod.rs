//! Parsed XML documents
//!
//! Flow definitions are parsed once into a small arena tree. Every element
//! remembers its resolved namespace URI and the source line of its opening
//! tag, which is all the rules and the query facility need. The tree is
//! immutable after parsing and can be shared freely between threads.

mod namespaces;
pub mod query;

pub use namespaces::{NamespaceTable, MULE_CORE_NS};
pub use query::{QueryEngine, QueryError};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Reserved namespace for the `xml:` prefix
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Errors produced while loading or parsing a document
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML at line {line}: {message}")]
    Malformed { line: u32, message: String },

    #[error("document has no root element")]
    NoRoot,
}

/// Index of an element inside its [`Document`]
///
/// Ids are assigned in document order, so sorting by id sorts nodes the way
/// they appear in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct ElementData {
    name: String,
    prefix_len: usize,
    namespace: Option<String>,
    attributes: Vec<(String, String)>,
    text: String,
    line: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl ElementData {
    fn local_name(&self) -> &str {
        if self.prefix_len == 0 {
            &self.name
        } else {
            &self.name[self.prefix_len + 1..]
        }
    }
}

/// An immutable, parsed XML document
#[derive(Debug, Clone)]
pub struct Document {
    path: Option<PathBuf>,
    nodes: Vec<ElementData>,
}

impl Document {
    /// Root element
    pub fn root(&self) -> Node<'_> {
        Node {
            doc: self,
            id: NodeId(0),
        }
    }

    /// File the document was loaded from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn element_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<Node<'_>> {
        (id.0 < self.nodes.len()).then_some(Node { doc: self, id })
    }

    fn data(&self, id: NodeId) -> &ElementData {
        &self.nodes[id.0]
    }
}

/// Borrowed handle to one element of a [`Document`]
#[derive(Clone, Copy)]
pub struct Node<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> Node<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'a Document {
        self.doc
    }

    /// Qualified name as written (`mule:flow`, `flow`)
    pub fn name(&self) -> &'a str {
        &self.doc.data(self.id).name
    }

    pub fn local_name(&self) -> &'a str {
        self.doc.data(self.id).local_name()
    }

    pub fn prefix(&self) -> Option<&'a str> {
        let data = self.doc.data(self.id);
        (data.prefix_len > 0).then(|| &data.name[..data.prefix_len])
    }

    /// Resolved namespace URI
    pub fn namespace(&self) -> Option<&'a str> {
        self.doc.data(self.id).namespace.as_deref()
    }

    /// Whether this element is `local` in namespace `ns`
    pub fn is(&self, ns: &str, local: &str) -> bool {
        self.namespace() == Some(ns) && self.local_name() == local
    }

    /// Attribute value by its qualified name as written (`name`, `doc:name`)
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.doc
            .data(self.id)
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.doc
            .data(self.id)
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Trimmed text directly inside this element
    pub fn text(&self) -> &'a str {
        &self.doc.data(self.id).text
    }

    /// 1-based line of the opening tag
    pub fn line(&self) -> u32 {
        self.doc.data(self.id).line
    }

    pub fn parent(&self) -> Option<Node<'a>> {
        let doc = self.doc;
        doc.data(self.id).parent.map(|id| Node { doc, id })
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        let doc = self.doc;
        doc.data(self.id)
            .children
            .iter()
            .map(move |&id| Node { doc, id })
    }

    /// All descendants in document order, excluding `self`
    pub fn descendants(&self) -> Vec<Node<'a>> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.doc.data(self.id).children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(Node { doc: self.doc, id });
            stack.extend(self.doc.data(id).children.iter().rev().copied());
        }
        out
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}> (line {})", self.name(), self.line())
    }
}

/// Parse XML source text
pub fn parse_document(source: &str) -> Result<Document, ParseError> {
    TreeBuilder::new(source).build(None)
}

/// Read and parse an XML file
pub fn load_document(path: &Path) -> Result<Document, ParseError> {
    let source = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    TreeBuilder::new(&source).build(Some(path.to_path_buf()))
}

struct TreeBuilder<'s> {
    source: &'s str,
    line_starts: Vec<usize>,
    nodes: Vec<ElementData>,
    stack: Vec<NodeId>,
    scopes: Vec<Vec<(String, String)>>,
}

impl<'s> TreeBuilder<'s> {
    fn new(source: &'s str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            line_starts,
            nodes: Vec::new(),
            stack: Vec::new(),
            scopes: Vec::new(),
        }
    }

    fn build(mut self, path: Option<PathBuf>) -> Result<Document, ParseError> {
        let mut reader = Reader::from_str(self.source);

        loop {
            let offset = reader.buffer_position() as usize;
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let id = self.open_element(&e, offset)?;
                    self.stack.push(id);
                }
                Ok(Event::Empty(e)) => {
                    self.open_element(&e, offset)?;
                    self.scopes.pop();
                }
                Ok(Event::End(_)) => {
                    self.stack.pop();
                    self.scopes.pop();
                }
                Ok(Event::Text(t)) => {
                    let text = t.unescape().map_err(|e| self.malformed(offset, e))?;
                    self.append_text(&text);
                }
                Ok(Event::CData(c)) => {
                    let raw = c.into_inner();
                    self.append_text(&String::from_utf8_lossy(&raw));
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(self.malformed(reader.buffer_position() as usize, e)),
            }
        }

        if let Some(open) = self.stack.last() {
            let data = &self.nodes[open.0];
            return Err(ParseError::Malformed {
                line: data.line,
                message: format!("element <{}> is never closed", data.name),
            });
        }
        if self.nodes.is_empty() {
            return Err(ParseError::NoRoot);
        }

        Ok(Document {
            path,
            nodes: self.nodes,
        })
    }

    fn open_element(&mut self, start: &BytesStart<'_>, offset: usize) -> Result<NodeId, ParseError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();

        let mut declarations = Vec::new();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.malformed(offset, e))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| self.malformed(offset, e))?
                .into_owned();
            if key == "xmlns" {
                declarations.push((String::new(), value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declarations.push((prefix.to_string(), value));
            } else {
                attributes.push((key, value));
            }
        }
        self.scopes.push(declarations);

        let prefix_len = name.find(':').unwrap_or(0);
        let prefix = &name[..prefix_len];
        let namespace = self.resolve(prefix);
        if namespace.is_none() && !prefix.is_empty() {
            debug!("Undeclared namespace prefix '{}' on <{}>", prefix, name);
        }

        let parent = self.stack.last().copied();
        if parent.is_none() && !self.nodes.is_empty() {
            return Err(ParseError::Malformed {
                line: self.line_of(offset),
                message: format!("unexpected second root element <{}>", name),
            });
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(ElementData {
            name,
            prefix_len,
            namespace,
            attributes,
            text: String::new(),
            line: self.line_of(offset),
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        Ok(id)
    }

    fn resolve(&self, prefix: &str) -> Option<String> {
        if prefix == "xml" {
            return Some(XML_NS.to_string());
        }
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter())
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.clone())
            .filter(|uri| !uri.is_empty())
    }

    fn append_text(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if let Some(current) = self.stack.last() {
            let buf = &mut self.nodes[current.0].text;
            if !buf.is_empty() {
                buf.push(' ');
            }
            buf.push_str(text);
        }
    }

    /// Line of the first non-whitespace byte at or after `offset`
    fn line_of(&self, offset: usize) -> u32 {
        let offset = self
            .source
            .get(offset..)
            .map(|rest| offset + (rest.len() - rest.trim_start().len()))
            .unwrap_or(offset);
        self.line_starts.partition_point(|&start| start <= offset) as u32
    }

    fn malformed(&self, offset: usize, err: impl std::fmt::Display) -> ParseError {
        ParseError::Malformed {
            line: self.line_of(offset),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLOW: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mule xmlns="http://www.mulesoft.org/schema/mule/core"
      xmlns:doc="http://www.mulesoft.org/schema/mule/documentation">
    <flow name="orders-flow" doc:name="Orders">
        <logger message="start &amp; go"/>
        <set-payload value="x">  hello  </set-payload>
    </flow>
</mule>
"#;

    #[test]
    fn test_parse_resolves_default_namespace() {
        let doc = parse_document(FLOW).expect("parse");
        let root = doc.root();
        assert!(root.is(MULE_CORE_NS, "mule"));
        let flow = root.children().next().expect("flow");
        assert!(flow.is(MULE_CORE_NS, "flow"));
        assert_eq!(flow.attribute("name"), Some("orders-flow"));
        assert_eq!(flow.attribute("doc:name"), Some("Orders"));
        assert_eq!(flow.parent(), Some(root));
    }

    #[test]
    fn test_lines_point_at_opening_tags() {
        let doc = parse_document(FLOW).expect("parse");
        assert_eq!(doc.root().line(), 2);
        let names: Vec<(String, u32)> = doc
            .root()
            .descendants()
            .iter()
            .map(|n| (n.local_name().to_string(), n.line()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("flow".to_string(), 4),
                ("logger".to_string(), 5),
                ("set-payload".to_string(), 6)
            ]
        );
    }

    #[test]
    fn test_text_and_entities() {
        let doc = parse_document(FLOW).expect("parse");
        let nodes = doc.root().descendants();
        assert_eq!(nodes[1].attribute("message"), Some("start & go"));
        assert_eq!(nodes[2].text(), "hello");
    }

    #[test]
    fn test_prefixed_elements() {
        let src = r#"<mule xmlns:http="http://www.mulesoft.org/schema/mule/http"><http:listener path="/x"/></mule>"#;
        let doc = parse_document(src).expect("parse");
        let listener = doc.root().children().next().expect("listener");
        assert_eq!(listener.prefix(), Some("http"));
        assert_eq!(listener.local_name(), "listener");
        assert_eq!(listener.namespace(), Some("http://www.mulesoft.org/schema/mule/http"));
        // The root has no default namespace declared
        assert_eq!(doc.root().namespace(), None);
    }

    #[test]
    fn test_malformed_documents_are_errors() {
        assert!(matches!(
            parse_document("<mule><flow></mule>"),
            Err(ParseError::Malformed { .. })
        ));
        assert!(matches!(
            parse_document("<mule><flow>"),
            Err(ParseError::Malformed { .. })
        ));
        assert!(matches!(parse_document("   "), Err(ParseError::NoRoot)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_document(Path::new("/definitely/not/here.xml")).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
        assert!(err.to_string().contains("not/here.xml"));
    }
}
