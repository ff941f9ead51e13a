//! The generic exchange representation between typed values and documents.

use std::collections::HashMap;

use xmlbind_node::{NamespaceSnapshot, Node, QName, forest_to_xml, parse_forest};

use crate::error::BindError;
use crate::unmarshal::synthesize_root;

/// A generic XML fragment: optional element name, attribute map, ordered
/// child list and an optional namespace snapshot.
///
/// Fragments are created per marshal call and discarded once consumed; they
/// are never cached across calls. When `children` holds more than one node
/// the fragment is a forest: `name` and `attributes` carry no meaning and no
/// wrapper is stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    /// The logical element name, when the runtime knows it.
    pub name: Option<QName>,
    /// Attributes of the unwrapped element. Never contains namespace
    /// declarations.
    pub attributes: HashMap<QName, String>,
    /// Child nodes in document order.
    pub children: Vec<Node>,
    /// Namespace bindings in scope where the fragment was captured. Attached
    /// only for unmarshalling.
    pub namespaces: Option<NamespaceSnapshot>,
}

impl Fragment {
    /// An empty fragment: no name, no attributes, no children.
    pub fn empty() -> Self {
        Fragment::default()
    }

    /// True if the fragment carries nothing at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.attributes.is_empty() && self.children.is_empty()
    }

    /// True if the fragment is a forest of sibling nodes.
    pub fn is_forest(&self) -> bool {
        self.children.len() > 1
    }

    /// Set the logical element name.
    pub fn with_name(mut self, name: impl Into<QName>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach a namespace snapshot.
    pub fn with_namespaces(mut self, namespaces: NamespaceSnapshot) -> Self {
        self.namespaces = Some(namespaces);
        self
    }

    /// Parse XML text into a fragment holding the resulting forest.
    ///
    /// The parsed nodes become `children` verbatim; no unwrapping is applied
    /// and no name is assigned. Namespace bindings declared in the text stay
    /// on the elements that declared them.
    pub fn parse(input: &str) -> Result<Self, BindError> {
        let children = parse_forest(input)?;
        Ok(Fragment {
            children,
            ..Fragment::default()
        })
    }

    /// Parse XML text captured together with the bindings that were in scope
    /// around it.
    pub fn parse_with_namespaces(
        namespaces: NamespaceSnapshot,
        input: &str,
    ) -> Result<Self, BindError> {
        Ok(Self::parse(input)?.with_namespaces(namespaces))
    }

    /// Serialize to XML text.
    ///
    /// A fragment with a name or attributes is rendered inside its
    /// synthesized wrapper element (with the snapshot replayed as `xmlns`
    /// declarations); a bare forest is rendered as-is.
    pub fn to_xml_string(&self) -> String {
        if self.name.is_some() || !self.attributes.is_empty() {
            synthesize_root(self, None).to_xml()
        } else {
            forest_to_xml(&self.children)
        }
    }
}
