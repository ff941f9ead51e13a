//! Namespace snapshots: ordered, replayable prefix-to-URI bindings.

/// The null namespace URI.
pub const NULL_NS_URI: &str = "";

/// The prefix of the default namespace.
pub const DEFAULT_NS_PREFIX: &str = "";

/// The reserved `xml` prefix.
pub const XML_NS_PREFIX: &str = "xml";

/// The namespace the `xml` prefix is permanently bound to.
pub const XML_NS_URI: &str = "http://www.w3.org/XML/1998/namespace";

/// The reserved `xmlns` attribute name/prefix.
pub const XMLNS_ATTRIBUTE: &str = "xmlns";

/// The namespace of `xmlns` declaration attributes.
pub const XMLNS_ATTRIBUTE_NS_URI: &str = "http://www.w3.org/2000/xmlns/";

/// An ordered capture of `(prefix, namespaceURI)` bindings.
///
/// Bindings are kept in capture order and are individually indexable so that
/// replaying them onto a synthetic root reconstructs equivalent scoping
/// deterministically. The empty prefix denotes the default namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceSnapshot {
    bindings: Vec<(String, String)>,
}

impl NamespaceSnapshot {
    /// An empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from `(prefix, uri)` pairs, in order.
    pub fn from_pairs<P, U>(pairs: impl IntoIterator<Item = (P, U)>) -> Self
    where
        P: Into<String>,
        U: Into<String>,
    {
        NamespaceSnapshot {
            bindings: pairs
                .into_iter()
                .map(|(p, u)| (p.into(), u.into()))
                .collect(),
        }
    }

    /// Append a binding.
    pub fn bind(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.bindings.push((prefix.into(), uri.into()));
    }

    /// Append a binding, builder style.
    pub fn with_binding(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.bind(prefix, uri);
        self
    }

    /// Number of captured bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// True if no bindings were captured.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// The prefix of the binding at `index`.
    pub fn prefix(&self, index: usize) -> &str {
        &self.bindings[index].0
    }

    /// The namespace URI of the binding at `index`.
    pub fn uri(&self, index: usize) -> &str {
        &self.bindings[index].1
    }

    /// The URI bound to `prefix`. Later bindings shadow earlier ones.
    pub fn namespace_uri(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// The first prefix bound to `uri`, if any.
    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(_, u)| u == uri)
            .map(|(p, _)| p.as_str())
    }

    /// Iterate over bindings in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }
}

impl<P: Into<String>, U: Into<String>> FromIterator<(P, U)> for NamespaceSnapshot {
    fn from_iter<T: IntoIterator<Item = (P, U)>>(iter: T) -> Self {
        NamespaceSnapshot::from_pairs(iter)
    }
}
