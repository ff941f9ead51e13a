//! Namespace snapshot capture and replay onto the synthetic subtree.

use indoc::indoc;
use xmlbind::{
    BindError, DeserializerFactory, Fragment, NamespaceSnapshot, QName, XmlRead, XmlSerializable,
    XmlWrite, marshal, unmarshal_with,
};

/// Records what the synthetic root actually carries.
#[derive(Debug, Default, PartialEq)]
struct Scope {
    decls: Vec<(String, String)>,
    root_local_name: String,
}

#[derive(Default)]
struct ScopeFactory;

impl DeserializerFactory<Scope> for ScopeFactory {
    fn deserialize(&self, reader: &mut dyn XmlRead) -> Result<Scope, BindError> {
        let mut scope = Scope {
            decls: Vec::new(),
            root_local_name: reader.name()?.local_name.clone(),
        };
        for index in 0..reader.namespace_count()? {
            scope.decls.push((
                reader.namespace_prefix(index)?.to_owned(),
                reader.namespace_uri(index)?.to_owned(),
            ));
        }
        Ok(scope)
    }
}

fn replay(snapshot: NamespaceSnapshot) -> Scope {
    let fragment = Fragment::empty().with_namespaces(snapshot);
    unmarshal_with(&ScopeFactory, &fragment, None).unwrap()
}

// ============================================================================
// Replay rules
// ============================================================================

#[test]
fn default_and_prefixed_bindings_are_declared_in_order() {
    let scope = replay(NamespaceSnapshot::from_pairs([
        ("", "urn:a"),
        ("p", "urn:b"),
    ]));
    assert_eq!(
        scope.decls,
        vec![
            ("".to_string(), "urn:a".to_string()),
            ("p".to_string(), "urn:b".to_string())
        ]
    );
}

#[test]
fn reserved_prefixes_are_omitted() {
    let scope = replay(NamespaceSnapshot::from_pairs([
        ("xml", "http://www.w3.org/XML/1998/namespace"),
        ("xmlns", "http://www.w3.org/2000/xmlns/"),
        ("p", "urn:b"),
    ]));
    assert_eq!(scope.decls, vec![("p".to_string(), "urn:b".to_string())]);
}

#[test]
fn null_default_namespace_is_a_no_op() {
    let scope = replay(NamespaceSnapshot::from_pairs([("", ""), ("p", "urn:b")]));
    assert_eq!(scope.decls, vec![("p".to_string(), "urn:b".to_string())]);
}

#[test]
fn nameless_fragment_uses_placeholder_root() {
    let scope = replay(NamespaceSnapshot::new());
    assert_eq!(scope.root_local_name, xmlbind::PLACEHOLDER_NAME);
}

#[test]
fn explicit_snapshot_wins_over_attached() {
    let fragment = Fragment::empty()
        .with_namespaces(NamespaceSnapshot::from_pairs([("old", "urn:old")]));
    let explicit = NamespaceSnapshot::from_pairs([("new", "urn:new")]);
    let scope = unmarshal_with(&ScopeFactory, &fragment, Some(&explicit)).unwrap();
    assert_eq!(scope.decls, vec![("new".to_string(), "urn:new".to_string())]);
}

// ============================================================================
// Bindings written during marshal
// ============================================================================

/// Writes a namespaced element with its own binding declarations.
struct Envelope;

impl XmlSerializable for Envelope {
    fn serialize(&self, out: &mut dyn XmlWrite) -> Result<(), BindError> {
        out.start_element(&QName::prefixed("urn:env", "env", "envelope"))?;
        out.namespace("env", "urn:env")?;
        out.namespace("", "urn:body")?;
        out.start_element(&QName::namespaced("urn:body", "payload"))?;
        out.end_element()?;
        out.end_element()
    }
}

#[test]
fn wrapper_bindings_survive_as_the_fragment_snapshot() {
    let fragment = marshal(&Envelope).unwrap();
    // unwrapped: the env wrapper is gone but its scoping is kept
    assert!(fragment.name.is_none());
    let snapshot = fragment.namespaces.as_ref().unwrap();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.namespace_uri("env"), Some("urn:env"));
    assert_eq!(snapshot.namespace_uri(""), Some("urn:body"));

    // children keep their resolved namespaces independently of the wrapper
    let payload = fragment.children[0].as_element().unwrap();
    assert_eq!(payload.name, QName::namespaced("urn:body", "payload"));
}

#[test]
fn marshalled_scoping_replays_onto_the_synthetic_root() {
    let fragment = marshal(&Envelope).unwrap();
    let scope = unmarshal_with(&ScopeFactory, &fragment, None).unwrap();
    assert_eq!(
        scope.decls,
        vec![
            ("env".to_string(), "urn:env".to_string()),
            ("".to_string(), "urn:body".to_string())
        ]
    );
}

// ============================================================================
// Text rendering of replayed scoping
// ============================================================================

#[test]
fn named_fragment_renders_snapshot_as_xmlns_attributes() {
    let fragment = Fragment::empty()
        .with_name("item")
        .with_namespaces(NamespaceSnapshot::from_pairs([
            ("", "urn:a"),
            ("p", "urn:b"),
        ]));
    assert_eq!(
        fragment.to_xml_string(),
        r#"<item xmlns="urn:a" xmlns:p="urn:b"/>"#
    );
}

#[test]
fn parsed_namespaced_text_resolves_child_names() {
    let fragment = Fragment::parse(indoc!(
        r#"
        <p:item xmlns:p="urn:b">
            <p:sub/>
        </p:item>
    "#
    ))
    .unwrap();
    let item = fragment.children[0].as_element().unwrap();
    assert_eq!(item.name, QName::namespaced("urn:b", "item"));
    let sub = item.child_elements().next().unwrap();
    assert_eq!(sub.name, QName::namespaced("urn:b", "sub"));
}

#[test]
fn parse_with_namespaces_attaches_the_surrounding_scope() {
    let fragment = Fragment::parse_with_namespaces(
        NamespaceSnapshot::from_pairs([("p", "urn:b")]),
        indoc!(
            r#"
            <p:first/>
            <p:second/>
        "#
        ),
    )
    .unwrap();
    assert!(fragment.is_forest());

    let scope = unmarshal_with(&ScopeFactory, &fragment, None).unwrap();
    assert_eq!(scope.decls, vec![("p".to_string(), "urn:b".to_string())]);
}
