//! The marshal adapter: typed value to generic fragment.

use xmlbind_node::{NamespaceSnapshot, Node};

use crate::error::BindError;
use crate::fragment::Fragment;
use crate::serializable::XmlSerializable;
use crate::tracing_macros::{trace, trace_span};
use crate::tree_writer::TreeWriter;

/// Marshal a value into a [`Fragment`].
///
/// The value serializes itself into a detached temporary container; the
/// resulting top-level children are then classified:
///
/// - no children: an empty fragment;
/// - a single element child: the element is unwrapped — its attributes become
///   the fragment's attribute map, its children the child list, and the outer
///   tag itself is discarded (the binding runtime already knows the logical
///   element name from type metadata);
/// - a single non-element child: the child list holds it verbatim;
/// - more than one child: a forest, kept in order with no unwrapping.
///
/// Any write failure aborts the call; no partial fragment is ever returned.
pub fn marshal(value: &dyn XmlSerializable) -> Result<Fragment, BindError> {
    trace_span!("marshal");
    let mut writer = TreeWriter::new();
    value.serialize(&mut writer)?;
    let children = writer.finish()?;

    trace!(top_level = children.len(), "classifying marshalled output");
    Ok(classify(children))
}

fn classify(mut nodes: Vec<Node>) -> Fragment {
    match nodes.len() {
        0 => Fragment::empty(),
        1 => match nodes.remove(0) {
            Node::Element(elem) => {
                // Bindings declared on the discarded wrapper survive as the
                // fragment's snapshot; they are scoping, not content.
                let namespaces = if elem.ns_decls.is_empty() {
                    None
                } else {
                    Some(NamespaceSnapshot::from_pairs(elem.ns_decls))
                };
                Fragment {
                    name: None,
                    attributes: elem.attributes,
                    children: elem.children,
                    namespaces,
                }
            }
            other => Fragment {
                children: vec![other],
                ..Fragment::default()
            },
        },
        _ => Fragment {
            children: nodes,
            ..Fragment::default()
        },
    }
}
