//! A push sink that builds a detached, call-scoped node forest.

use xmlbind_node::{Element, Node, QName, XMLNS_ATTRIBUTE};

use crate::error::{BindError, BindErrorKind};
use crate::event::XmlWrite;
use crate::tracing_macros::trace;

/// Streaming writer over a detached temporary container.
///
/// Serialized output accumulates as a forest of top-level nodes; nothing is
/// attached to any document until the caller consumes [`TreeWriter::finish`].
/// Namespace declarations are routed to the owning element's binding list and
/// never appear among its attributes.
#[derive(Debug, Default)]
pub struct TreeWriter {
    roots: Vec<Node>,
    stack: Vec<Element>,
}

impl TreeWriter {
    /// Create a writer over an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the writer and return the written forest.
    ///
    /// Fails if any element is still open, so a partially written tree can
    /// never leak out.
    pub fn finish(self) -> Result<Vec<Node>, BindError> {
        if !self.stack.is_empty() {
            return Err(BindError::new(BindErrorKind::WriterUnbalanced));
        }
        Ok(self.roots)
    }

    fn append(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn append_text(&mut self, text: &str) {
        let siblings = match self.stack.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.roots,
        };
        if let Some(Node::Text(existing)) = siblings.last_mut() {
            existing.push_str(text);
        } else {
            siblings.push(Node::Text(text.to_string()));
        }
    }

    fn check_name(name: &QName) -> Result<(), BindError> {
        if name.local_name.is_empty() {
            return Err(BindError::new(BindErrorKind::InvalidName(name.to_string())));
        }
        Ok(())
    }
}

impl XmlWrite for TreeWriter {
    fn start_element(&mut self, name: &QName) -> Result<(), BindError> {
        Self::check_name(name)?;
        trace!(name = %name, "start element");
        self.stack.push(Element::new(name.clone()));
        Ok(())
    }

    fn namespace(&mut self, prefix: &str, uri: &str) -> Result<(), BindError> {
        let top = self
            .stack
            .last_mut()
            .ok_or(BindErrorKind::NoOpenElement {
                what: "namespace declaration",
            })?;
        top.ns_decls.push((prefix.to_string(), uri.to_string()));
        Ok(())
    }

    fn attribute(&mut self, name: &QName, value: &str) -> Result<(), BindError> {
        Self::check_name(name)?;
        let top = self
            .stack
            .last_mut()
            .ok_or(BindErrorKind::NoOpenElement { what: "attribute" })?;

        // xmlns written as a plain attribute is still a binding
        if name.prefix.as_deref() == Some(XMLNS_ATTRIBUTE) {
            top.ns_decls
                .push((name.local_name.clone(), value.to_string()));
        } else if name.prefix.is_none() && name.local_name == XMLNS_ATTRIBUTE {
            top.ns_decls.push((String::new(), value.to_string()));
        } else {
            top.attributes.insert(name.clone(), value.to_string());
        }
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), BindError> {
        self.append_text(text);
        Ok(())
    }

    fn cdata(&mut self, text: &str) -> Result<(), BindError> {
        self.append(Node::CData(text.to_string()));
        Ok(())
    }

    fn comment(&mut self, text: &str) -> Result<(), BindError> {
        self.append(Node::Comment(text.to_string()));
        Ok(())
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> Result<(), BindError> {
        self.append(Node::ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
        });
        Ok(())
    }

    fn end_element(&mut self) -> Result<(), BindError> {
        let elem = self
            .stack
            .pop()
            .ok_or(BindErrorKind::WriterUnbalanced)?;
        self.append(Node::Element(elem));
        Ok(())
    }

    fn end_document(&mut self) -> Result<(), BindError> {
        if !self.stack.is_empty() {
            return Err(BindError::new(BindErrorKind::WriterUnbalanced));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BindErrorKind;

    #[test]
    fn writes_nested_elements() {
        let mut w = TreeWriter::new();
        w.start_element(&QName::local("outer")).unwrap();
        w.attribute(&QName::local("id"), "1").unwrap();
        w.start_element(&QName::local("inner")).unwrap();
        w.text("hi").unwrap();
        w.end_element().unwrap();
        w.end_element().unwrap();

        let nodes = w.finish().unwrap();
        assert_eq!(nodes.len(), 1);
        let outer = nodes[0].as_element().unwrap();
        assert_eq!(outer.get_attr("id"), Some("1"));
        assert_eq!(outer.children.len(), 1);
        assert_eq!(outer.child_elements().next().unwrap().text_content(), "hi");
    }

    #[test]
    fn merges_consecutive_text() {
        let mut w = TreeWriter::new();
        w.start_element(&QName::local("e")).unwrap();
        w.text("a").unwrap();
        w.text("b").unwrap();
        w.end_element().unwrap();

        let nodes = w.finish().unwrap();
        let e = nodes[0].as_element().unwrap();
        assert_eq!(e.children, vec![Node::Text("ab".into())]);
    }

    #[test]
    fn xmlns_attribute_becomes_binding() {
        let mut w = TreeWriter::new();
        w.start_element(&QName::local("e")).unwrap();
        w.attribute(&QName::local("xmlns"), "urn:a").unwrap();
        w.attribute(
            &QName {
                namespace_uri: Some(xmlbind_node::XMLNS_ATTRIBUTE_NS_URI.into()),
                local_name: "p".into(),
                prefix: Some("xmlns".into()),
            },
            "urn:b",
        )
        .unwrap();
        w.end_element().unwrap();

        let nodes = w.finish().unwrap();
        let e = nodes[0].as_element().unwrap();
        assert!(e.attributes.is_empty());
        assert_eq!(
            e.ns_decls,
            vec![
                ("".to_string(), "urn:a".to_string()),
                ("p".to_string(), "urn:b".to_string())
            ]
        );
    }

    #[test]
    fn attribute_without_open_element_fails() {
        let mut w = TreeWriter::new();
        let err = w.attribute(&QName::local("a"), "v").unwrap_err();
        assert!(matches!(
            err.kind(),
            BindErrorKind::NoOpenElement { .. }
        ));
    }

    #[test]
    fn unbalanced_end_fails() {
        let mut w = TreeWriter::new();
        assert!(matches!(
            w.end_element().unwrap_err().kind(),
            BindErrorKind::WriterUnbalanced
        ));
    }

    #[test]
    fn finish_with_open_element_fails() {
        let mut w = TreeWriter::new();
        w.start_element(&QName::local("e")).unwrap();
        assert!(matches!(
            w.finish().unwrap_err().kind(),
            BindErrorKind::WriterUnbalanced
        ));
    }

    #[test]
    fn empty_local_name_is_rejected() {
        let mut w = TreeWriter::new();
        assert!(matches!(
            w.start_element(&QName::local("")).unwrap_err().kind(),
            BindErrorKind::InvalidName(_)
        ));
    }
}
