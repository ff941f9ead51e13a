//! A pull cursor over a synthesized subtree.

use xmlbind_node::{Element, Node, QName, is_xml_whitespace};

use crate::error::{BindError, BindErrorKind};
use crate::event::{EventKind, XmlRead};

/// One event in the flattened subtree.
#[derive(Debug)]
enum TreeEvent {
    Start {
        name: QName,
        /// Sorted by (namespace, local name) so indexed access is stable.
        attrs: Vec<(QName, String)>,
        ns_decls: Vec<(String, String)>,
    },
    End {
        name: QName,
    },
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        data: String,
    },
    EndDocument,
}

impl TreeEvent {
    fn kind(&self) -> EventKind {
        match self {
            TreeEvent::Start { .. } => EventKind::StartElement,
            TreeEvent::End { .. } => EventKind::EndElement,
            TreeEvent::Text(_) => EventKind::Text,
            TreeEvent::CData(_) => EventKind::CData,
            TreeEvent::Comment(_) => EventKind::Comment,
            TreeEvent::ProcessingInstruction { .. } => EventKind::ProcessingInstruction,
            TreeEvent::EndDocument => EventKind::EndDocument,
        }
    }
}

/// Positioned pull cursor over a call-scoped subtree.
///
/// The subtree is flattened into an event sequence once, up front; the cursor
/// starts before the first event (`StartDocument`) and ends on a terminal
/// `EndDocument`.
#[derive(Debug)]
pub struct TreeReader {
    events: Vec<TreeEvent>,
    /// `None` before the first `next` call.
    pos: Option<usize>,
}

impl TreeReader {
    /// Create a cursor over a single root element.
    pub fn new(root: Element) -> Self {
        let mut events = Vec::new();
        flatten(root, &mut events);
        events.push(TreeEvent::EndDocument);
        TreeReader { events, pos: None }
    }

    /// Create a cursor over a forest of nodes.
    pub fn over_forest(nodes: Vec<Node>) -> Self {
        let mut events = Vec::new();
        for node in nodes {
            flatten_node(node, &mut events);
        }
        events.push(TreeEvent::EndDocument);
        TreeReader { events, pos: None }
    }

    fn current(&self) -> Option<&TreeEvent> {
        self.pos.map(|i| &self.events[i])
    }

    fn current_start(&self) -> Result<(&[(QName, String)], &[(String, String)]), BindError> {
        match self.current() {
            Some(TreeEvent::Start {
                attrs, ns_decls, ..
            }) => Ok((attrs, ns_decls)),
            _ => Err(self.unexpected("START_ELEMENT")),
        }
    }

    fn attr(&self, index: usize) -> Result<&(QName, String), BindError> {
        let (attrs, _) = self.current_start()?;
        attrs.get(index).ok_or_else(|| {
            BindError::new(BindErrorKind::UnexpectedEvent {
                expected: "attribute index in range",
                got: format!("index {index} of {}", attrs.len()),
            })
        })
    }

    fn ns_decl(&self, index: usize) -> Result<&(String, String), BindError> {
        let (_, decls) = self.current_start()?;
        decls.get(index).ok_or_else(|| {
            BindError::new(BindErrorKind::UnexpectedEvent {
                expected: "namespace index in range",
                got: format!("index {index} of {}", decls.len()),
            })
        })
    }

    fn unexpected(&self, expected: &'static str) -> BindError {
        BindError::new(BindErrorKind::UnexpectedEvent {
            expected,
            got: self.event().name().to_string(),
        })
    }
}

fn flatten(elem: Element, out: &mut Vec<TreeEvent>) {
    let Element {
        name,
        attributes,
        ns_decls,
        children,
    } = elem;

    let mut attrs: Vec<(QName, String)> = attributes.into_iter().collect();
    attrs.sort_by(|(a, _), (b, _)| {
        (a.namespace_or_null(), &a.local_name).cmp(&(b.namespace_or_null(), &b.local_name))
    });

    out.push(TreeEvent::Start {
        name: name.clone(),
        attrs,
        ns_decls,
    });
    for child in children {
        flatten_node(child, out);
    }
    out.push(TreeEvent::End { name });
}

fn flatten_node(node: Node, out: &mut Vec<TreeEvent>) {
    match node {
        Node::Element(e) => flatten(e, out),
        Node::Text(t) => out.push(TreeEvent::Text(t)),
        Node::CData(t) => out.push(TreeEvent::CData(t)),
        Node::Comment(t) => out.push(TreeEvent::Comment(t)),
        Node::ProcessingInstruction { target, data } => {
            out.push(TreeEvent::ProcessingInstruction { target, data })
        }
    }
}

impl XmlRead for TreeReader {
    fn event(&self) -> EventKind {
        match self.current() {
            None => EventKind::StartDocument,
            Some(e) => e.kind(),
        }
    }

    fn has_next(&self) -> bool {
        match self.pos {
            None => !self.events.is_empty(),
            Some(i) => i + 1 < self.events.len(),
        }
    }

    fn next(&mut self) -> Result<EventKind, BindError> {
        if !self.has_next() {
            return Err(BindError::new(BindErrorKind::UnexpectedEof));
        }
        let next = self.pos.map_or(0, |i| i + 1);
        self.pos = Some(next);
        Ok(self.events[next].kind())
    }

    fn next_tag(&mut self) -> Result<EventKind, BindError> {
        loop {
            match self.next()? {
                kind @ (EventKind::StartElement | EventKind::EndElement) => return Ok(kind),
                EventKind::Comment | EventKind::ProcessingInstruction => {}
                EventKind::Text | EventKind::CData => {
                    let text = self.text()?;
                    if !is_xml_whitespace(text) {
                        return Err(self.unexpected("START_ELEMENT or END_ELEMENT"));
                    }
                }
                EventKind::EndDocument => return Err(BindError::new(BindErrorKind::UnexpectedEof)),
                EventKind::StartDocument => unreachable!("next never yields StartDocument"),
            }
        }
    }

    fn name(&self) -> Result<&QName, BindError> {
        match self.current() {
            Some(TreeEvent::Start { name, .. }) | Some(TreeEvent::End { name }) => Ok(name),
            _ => Err(self.unexpected("START_ELEMENT or END_ELEMENT")),
        }
    }

    fn text(&self) -> Result<&str, BindError> {
        match self.current() {
            Some(TreeEvent::Text(t)) | Some(TreeEvent::CData(t)) | Some(TreeEvent::Comment(t)) => {
                Ok(t)
            }
            _ => Err(self.unexpected("TEXT, CDATA or COMMENT")),
        }
    }

    fn attribute_count(&self) -> Result<usize, BindError> {
        Ok(self.current_start()?.0.len())
    }

    fn attribute_namespace(&self, index: usize) -> Result<Option<&str>, BindError> {
        Ok(self.attr(index)?.0.namespace_uri.as_deref())
    }

    fn attribute_local_name(&self, index: usize) -> Result<&str, BindError> {
        Ok(&self.attr(index)?.0.local_name)
    }

    fn attribute_value(&self, index: usize) -> Result<&str, BindError> {
        Ok(&self.attr(index)?.1)
    }

    fn namespace_count(&self) -> Result<usize, BindError> {
        Ok(self.current_start()?.1.len())
    }

    fn namespace_prefix(&self, index: usize) -> Result<&str, BindError> {
        Ok(&self.ns_decl(index)?.0)
    }

    fn namespace_uri(&self, index: usize) -> Result<&str, BindError> {
        Ok(&self.ns_decl(index)?.1)
    }

    fn skip_element(&mut self) -> Result<(), BindError> {
        self.require(EventKind::StartElement, None)?;
        let mut depth = 0usize;
        loop {
            match self.next()? {
                EventKind::StartElement => depth += 1,
                EventKind::EndElement => {
                    if depth == 0 {
                        return Ok(());
                    }
                    depth -= 1;
                }
                EventKind::EndDocument => {
                    return Err(BindError::new(BindErrorKind::UnexpectedEof));
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new("root")
            .with_attr("id", "1")
            .with_attr(QName::namespaced("urn:a", "kind"), "k")
            .with_namespace("p", "urn:a")
            .with_child(Element::new("first").with_text("hello"))
            .with_child(Element::new("second"))
    }

    #[test]
    fn event_sequence_is_depth_first() {
        let mut r = TreeReader::new(sample());
        assert_eq!(r.event(), EventKind::StartDocument);
        assert_eq!(r.next().unwrap(), EventKind::StartElement);
        assert_eq!(r.name().unwrap().local_name, "root");
        assert_eq!(r.next().unwrap(), EventKind::StartElement);
        assert_eq!(r.name().unwrap().local_name, "first");
        assert_eq!(r.next().unwrap(), EventKind::Text);
        assert_eq!(r.text().unwrap(), "hello");
        assert_eq!(r.next().unwrap(), EventKind::EndElement);
        assert_eq!(r.next().unwrap(), EventKind::StartElement);
        assert_eq!(r.name().unwrap().local_name, "second");
        assert_eq!(r.next().unwrap(), EventKind::EndElement);
        assert_eq!(r.next().unwrap(), EventKind::EndElement);
        assert_eq!(r.next().unwrap(), EventKind::EndDocument);
        assert!(!r.has_next());
        assert!(r.next().is_err());
    }

    #[test]
    fn forest_cursor_walks_siblings_and_loose_text() {
        let mut r = TreeReader::over_forest(vec![
            Node::Element(Element::new("a")),
            Node::Text("between".into()),
            Node::Element(Element::new("b")),
        ]);
        assert_eq!(r.next().unwrap(), EventKind::StartElement);
        assert_eq!(r.name().unwrap().local_name, "a");
        assert_eq!(r.next().unwrap(), EventKind::EndElement);
        assert_eq!(r.next().unwrap(), EventKind::Text);
        assert_eq!(r.text().unwrap(), "between");
        assert_eq!(r.next_tag().unwrap(), EventKind::StartElement);
        assert_eq!(r.name().unwrap().local_name, "b");
        assert_eq!(r.next().unwrap(), EventKind::EndElement);
        assert_eq!(r.next().unwrap(), EventKind::EndDocument);
    }

    #[test]
    fn attribute_access_is_indexed_and_stable() {
        let mut r = TreeReader::new(sample());
        r.next_tag().unwrap();
        assert_eq!(r.attribute_count().unwrap(), 2);
        // null namespace sorts before urn:a
        assert_eq!(r.attribute_namespace(0).unwrap(), None);
        assert_eq!(r.attribute_local_name(0).unwrap(), "id");
        assert_eq!(r.attribute_value(0).unwrap(), "1");
        assert_eq!(r.attribute_namespace(1).unwrap(), Some("urn:a"));
        assert_eq!(r.attribute_local_name(1).unwrap(), "kind");
        assert_eq!(r.attribute_value(1).unwrap(), "k");
        assert!(r.attribute_value(2).is_err());
    }

    #[test]
    fn namespace_declarations_are_visible() {
        let mut r = TreeReader::new(sample());
        r.next_tag().unwrap();
        assert_eq!(r.namespace_count().unwrap(), 1);
        assert_eq!(r.namespace_prefix(0).unwrap(), "p");
        assert_eq!(r.namespace_uri(0).unwrap(), "urn:a");
    }

    #[test]
    fn next_tag_skips_whitespace_and_comments() {
        let mut root = Element::new("root").with_text("  \n ");
        root.children.push(Node::Comment("c".into()));
        root.children.push(Node::Element(Element::new("child")));
        let mut r = TreeReader::new(root);
        r.next_tag().unwrap();
        assert_eq!(r.next_tag().unwrap(), EventKind::StartElement);
        assert_eq!(r.name().unwrap().local_name, "child");
    }

    #[test]
    fn next_tag_rejects_real_text() {
        let root = Element::new("root").with_text("content");
        let mut r = TreeReader::new(root);
        r.next_tag().unwrap();
        assert!(r.next_tag().is_err());
    }

    #[test]
    fn skip_element_lands_on_matching_end() {
        let mut r = TreeReader::new(sample());
        r.next_tag().unwrap(); // root
        r.next_tag().unwrap(); // first
        r.skip_element().unwrap();
        assert_eq!(r.event(), EventKind::EndElement);
        assert_eq!(r.name().unwrap().local_name, "first");
        assert_eq!(r.next_tag().unwrap(), EventKind::StartElement);
        assert_eq!(r.name().unwrap().local_name, "second");
    }

    #[test]
    fn attribute_access_outside_start_element_fails() {
        let r = TreeReader::new(Element::new("e"));
        assert!(r.attribute_count().is_err());
    }
}
