//! Serialization of node trees back to XML text.

use crate::escaping::{escape_attribute, escape_text};
use crate::{Element, Node, QName};

/// Write a node to a string buffer.
pub(crate) fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Element(e) => write_element(e, out),
        Node::Text(t) => out.push_str(&escape_text(t)),
        Node::CData(t) => {
            // "]]>" inside the content would close the section early; split it
            out.push_str("<![CDATA[");
            out.push_str(&t.replace("]]>", "]]]]><![CDATA[>"));
            out.push_str("]]>");
        }
        Node::Comment(t) => {
            out.push_str("<!--");
            out.push_str(t);
            out.push_str("-->");
        }
        Node::ProcessingInstruction { target, data } => {
            out.push_str("<?");
            out.push_str(target);
            if !data.is_empty() {
                out.push(' ');
                out.push_str(data);
            }
            out.push_str("?>");
        }
    }
}

/// Write an element (and its subtree) to a string buffer.
pub(crate) fn write_element(elem: &Element, out: &mut String) {
    let tag = elem.name.qualified();
    out.push('<');
    out.push_str(&tag);

    for (prefix, uri) in &elem.ns_decls {
        out.push(' ');
        if prefix.is_empty() {
            out.push_str("xmlns");
        } else {
            out.push_str("xmlns:");
            out.push_str(prefix);
        }
        out.push_str("=\"");
        out.push_str(&escape_attribute(uri));
        out.push('"');
    }

    // Sort attributes for deterministic output
    let mut attr_list: Vec<(&QName, &String)> = elem.attributes.iter().collect();
    attr_list.sort_by(|(a, _), (b, _)| {
        (a.namespace_or_null(), &a.local_name).cmp(&(b.namespace_or_null(), &b.local_name))
    });
    for (name, value) in attr_list {
        out.push(' ');
        out.push_str(&name.qualified());
        out.push_str("=\"");
        out.push_str(&escape_attribute(value));
        out.push('"');
    }

    if elem.children.is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    for child in &elem.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(&tag);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QName;

    #[test]
    fn writes_empty_element_self_closing() {
        assert_eq!(Element::new("e").to_xml(), "<e/>");
    }

    #[test]
    fn writes_attributes_sorted_and_escaped() {
        let e = Element::new("e")
            .with_attr("b", "2 > 1")
            .with_attr("a", "\"quoted\"");
        assert_eq!(e.to_xml(), r#"<e a="&quot;quoted&quot;" b="2 &gt; 1"/>"#);
    }

    #[test]
    fn writes_namespace_declarations_before_attributes() {
        let e = Element::new(QName::prefixed("urn:a", "p", "e"))
            .with_namespace("p", "urn:a")
            .with_attr("id", "1");
        assert_eq!(e.to_xml(), r#"<p:e xmlns:p="urn:a" id="1"/>"#);
    }

    #[test]
    fn writes_default_namespace_declaration() {
        let e = Element::new(QName::namespaced("urn:a", "e")).with_namespace("", "urn:a");
        assert_eq!(e.to_xml(), r#"<e xmlns="urn:a"/>"#);
    }

    #[test]
    fn writes_mixed_content_in_order() {
        let e = Element::new("p")
            .with_text("Hello ")
            .with_child(Element::new("b").with_text("world"))
            .with_text("!");
        assert_eq!(e.to_xml(), "<p>Hello <b>world</b>!</p>");
    }

    #[test]
    fn writes_cdata_unescaped() {
        let mut e = Element::new("e");
        e.children.push(Node::CData("a < b".into()));
        assert_eq!(e.to_xml(), "<e><![CDATA[a < b]]></e>");
    }

    #[test]
    fn splits_cdata_section_terminator() {
        let mut e = Element::new("e");
        e.children.push(Node::CData("a]]>b".into()));
        assert_eq!(e.to_xml(), "<e><![CDATA[a]]]]><![CDATA[>b]]></e>");
    }
}
