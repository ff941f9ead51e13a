//! Qualified names, node trees and namespace snapshots.
//!
//! This crate holds the leaf data model shared by the `xmlbind` bridge: a
//! call-scoped XML node tree that can represent arbitrary structure without a
//! predefined schema, plus the namespace bookkeeping required to rebuild
//! equivalent scoping later.

#![deny(unsafe_code)]

mod escaping;
mod namespace;
mod parser;
mod tracing_macros;
mod writer;

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

pub use escaping::{escape_attribute, escape_text};
pub use namespace::{
    DEFAULT_NS_PREFIX, NULL_NS_URI, NamespaceSnapshot, XML_NS_PREFIX, XML_NS_URI, XMLNS_ATTRIBUTE,
    XMLNS_ATTRIBUTE_NS_URI,
};
pub use parser::{ParseError, parse_element, parse_forest};

/// A qualified XML name: optional namespace URI, local name, optional prefix.
///
/// Equality and hashing consider only the namespace URI and local name; the
/// prefix is presentation-only and never participates in comparisons.
#[derive(Debug, Clone, Default)]
pub struct QName {
    /// The namespace URI, or `None` for the null namespace.
    pub namespace_uri: Option<String>,
    /// The local part of the name.
    pub local_name: String,
    /// The presentation prefix, if one was bound when the name was read.
    pub prefix: Option<String>,
}

impl QName {
    /// A name in the null namespace.
    pub fn local(local_name: impl Into<String>) -> Self {
        QName {
            namespace_uri: None,
            local_name: local_name.into(),
            prefix: None,
        }
    }

    /// A name in the given namespace, without a presentation prefix.
    pub fn namespaced(namespace_uri: impl Into<String>, local_name: impl Into<String>) -> Self {
        QName {
            namespace_uri: Some(namespace_uri.into()),
            local_name: local_name.into(),
            prefix: None,
        }
    }

    /// A fully specified name.
    pub fn prefixed(
        namespace_uri: impl Into<String>,
        prefix: impl Into<String>,
        local_name: impl Into<String>,
    ) -> Self {
        QName {
            namespace_uri: Some(namespace_uri.into()),
            local_name: local_name.into(),
            prefix: Some(prefix.into()),
        }
    }

    /// The namespace URI, with the null namespace rendered as `""`.
    pub fn namespace_or_null(&self) -> &str {
        self.namespace_uri.as_deref().unwrap_or(NULL_NS_URI)
    }

    /// The name as written in a document: `prefix:local` or bare `local`.
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(p) if !p.is_empty() => format!("{p}:{}", self.local_name),
            _ => self.local_name.clone(),
        }
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.namespace_uri == other.namespace_uri && self.local_name == other.local_name
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace_uri.hash(state);
        self.local_name.hash(state);
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace_uri {
            Some(ns) => write!(f, "{{{ns}}}{}", self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

impl From<&str> for QName {
    fn from(local_name: &str) -> Self {
        QName::local(local_name)
    }
}

impl From<String> for QName {
    fn from(local_name: String) -> Self {
        QName::local(local_name)
    }
}

/// A node in a call-scoped XML tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element with attributes and children.
    Element(Element),
    /// Text content.
    Text(String),
    /// A CDATA section, kept distinct so it round-trips unescaped.
    CData(String),
    /// A comment.
    Comment(String),
    /// A processing instruction.
    ProcessingInstruction {
        /// Target (e.g. `xml-stylesheet`).
        target: String,
        /// Everything after the target.
        data: String,
    },
}

impl Node {
    /// Returns `Some(&str)` if this is text or CDATA content.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(t) | Node::CData(t) => Some(t),
            _ => None,
        }
    }

    /// Returns `Some(&Element)` if this is an element.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    /// True for text or CDATA consisting entirely of XML whitespace.
    pub fn is_ignorable_whitespace(&self) -> bool {
        match self {
            Node::Text(t) => is_xml_whitespace(t),
            _ => false,
        }
    }
}

/// An XML element: name, attributes, namespace declarations and children.
///
/// Namespace declarations (`xmlns`/`xmlns:p`) are held apart from ordinary
/// attributes so that attribute maps never contain binding noise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// The element name.
    pub name: QName,

    /// Ordinary attributes. Keys are unique, order is irrelevant.
    pub attributes: HashMap<QName, String>,

    /// Namespace declarations on this element, in declaration order.
    /// The empty prefix denotes the default namespace.
    pub ns_decls: Vec<(String, String)>,

    /// Child nodes, in document order.
    pub children: Vec<Node>,
}

impl Element {
    /// Create a new element with just a name.
    pub fn new(name: impl Into<QName>) -> Self {
        Element {
            name: name.into(),
            attributes: HashMap::new(),
            ns_decls: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attr(mut self, name: impl Into<QName>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Declare a namespace binding. The empty prefix binds the default
    /// namespace.
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.ns_decls.push((prefix.into(), uri.into()));
        self
    }

    /// Add a child element.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Add text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Get an attribute value by exact qualified name.
    pub fn attr(&self, name: &QName) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Get an attribute value by local name in the null namespace.
    pub fn get_attr(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .get(&QName::local(local_name))
            .map(|s| s.as_str())
    }

    /// Iterate over child elements (skipping text and other nodes).
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| c.as_element())
    }

    /// The combined text content, concatenated depth-first.
    pub fn text_content(&self) -> String {
        let mut result = String::new();
        for child in &self.children {
            match child {
                Node::Text(t) | Node::CData(t) => result.push_str(t),
                Node::Element(e) => result.push_str(&e.text_content()),
                _ => {}
            }
        }
        result
    }

    /// The namespace URI bound to `prefix` on this element, if declared here.
    /// Later declarations shadow earlier ones.
    pub fn declared_uri(&self, prefix: &str) -> Option<&str> {
        self.ns_decls
            .iter()
            .rev()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// Serialize this element (and its subtree) to an XML string.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        writer::write_element(self, &mut out);
        out
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Text(s)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Text(s.to_owned())
    }
}

/// Serialize a forest of nodes to an XML string.
pub fn forest_to_xml(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        writer::write_node(node, &mut out);
    }
    out
}

/// True if `text` consists entirely of XML whitespace characters.
pub fn is_xml_whitespace(text: &str) -> bool {
    text.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}
