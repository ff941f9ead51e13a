//! The unmarshal adapter: generic fragment to typed value.

use xmlbind_node::{
    DEFAULT_NS_PREFIX, Element, NULL_NS_URI, NamespaceSnapshot, QName, XML_NS_PREFIX,
    XMLNS_ATTRIBUTE,
};

use crate::error::BindError;
use crate::event::XmlRead;
use crate::fragment::Fragment;
use crate::registry::{DeserializerFactory, FactoryRegistry};
use crate::tracing_macros::{trace, trace_span};
use crate::tree_reader::TreeReader;

/// Local name of the synthetic root when the fragment carries no name.
pub const PLACEHOLDER_NAME: &str = "value";

/// Unmarshal a fragment into a value of type `T`.
///
/// The factory is resolved first; a missing registration is a configuration
/// error raised before any document construction. The fragment is then
/// rebuilt into a synthetic subtree, the namespace snapshot is replayed onto
/// the subtree root, and the factory is invoked with a cursor positioned on
/// the root's start element.
///
/// An explicitly passed `namespaces` snapshot takes precedence over one
/// attached to the fragment itself.
pub fn unmarshal<T: 'static>(
    registry: &FactoryRegistry,
    fragment: &Fragment,
    namespaces: Option<&NamespaceSnapshot>,
) -> Result<T, BindError> {
    let factory = registry.resolve::<T>()?;
    unmarshal_with(factory, fragment, namespaces)
}

/// Unmarshal with an explicit factory, bypassing registry lookup.
pub fn unmarshal_with<T>(
    factory: &dyn DeserializerFactory<T>,
    fragment: &Fragment,
    namespaces: Option<&NamespaceSnapshot>,
) -> Result<T, BindError> {
    trace_span!("unmarshal");
    let root = synthesize_root(fragment, namespaces);
    trace!(root = %root.name, children = root.children.len(), "synthesized subtree");

    let mut reader = TreeReader::new(root);
    reader.next_tag()?;
    factory.deserialize(&mut reader)
}

/// Rebuild a fragment into a synthetic root element.
///
/// Snapshot bindings are replayed in capture order. A default-prefix binding
/// of the null namespace is a no-op, and the reserved `xml`/`xmlns` prefixes
/// are never declared; everything else becomes an `xmlns` declaration on the
/// root. Attributes are copied as-is and children are imported in order.
pub(crate) fn synthesize_root(
    fragment: &Fragment,
    namespaces: Option<&NamespaceSnapshot>,
) -> Element {
    let name = fragment
        .name
        .clone()
        .unwrap_or_else(|| QName::local(PLACEHOLDER_NAME));
    let mut root = Element::new(name);

    if let Some(snapshot) = namespaces.or(fragment.namespaces.as_ref()) {
        for (prefix, uri) in snapshot.iter() {
            if prefix == DEFAULT_NS_PREFIX {
                // the null default namespace needs no declaration
                if uri != NULL_NS_URI {
                    root.ns_decls.push((String::new(), uri.to_string()));
                }
            } else if prefix != XML_NS_PREFIX && prefix != XMLNS_ATTRIBUTE {
                root.ns_decls.push((prefix.to_string(), uri.to_string()));
            }
        }
    }

    for (attr_name, attr_value) in &fragment.attributes {
        root.attributes.insert(attr_name.clone(), attr_value.clone());
    }
    root.children = fragment.children.clone();
    root
}
