//! Parsing XML text into node forests using quick-xml.

use std::fmt;
use std::io::Cursor;

use quick_xml::NsReader;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;

use crate::tracing_macros::{trace, trace_span};
use crate::{Element, Node, QName};

/// XML parsing error.
#[derive(Debug, Clone)]
pub enum ParseError {
    /// Error from quick-xml.
    Parse(String),
    /// Unexpected end of input.
    UnexpectedEof,
    /// Unbalanced tags.
    UnbalancedTags,
    /// Invalid UTF-8.
    InvalidUtf8(core::str::Utf8Error),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Parse(msg) => write!(f, "XML parse error: {}", msg),
            ParseError::UnexpectedEof => write!(f, "Unexpected end of XML"),
            ParseError::UnbalancedTags => write!(f, "Unbalanced XML tags"),
            ParseError::InvalidUtf8(e) => write!(f, "Invalid UTF-8 in XML: {}", e),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse XML text into a forest of nodes.
///
/// The input need not have a single root element; sibling top-level elements
/// and text are all collected in document order. Text is preserved verbatim,
/// including inter-element whitespace; deciding whether whitespace is
/// ignorable is the consumer's call.
pub fn parse_forest(input: &str) -> Result<Vec<Node>, ParseError> {
    trace_span!("parse_forest");
    trace!(input_len = input.len(), "parsing XML forest");

    let mut reader = NsReader::from_reader(Cursor::new(input.as_bytes()));

    let mut buf = Vec::new();
    let mut roots: Vec<Node> = Vec::new();
    let mut stack: Vec<Element> = Vec::new();

    loop {
        buf.clear();
        let (resolve, event) = reader
            .read_resolved_event_into(&mut buf)
            .map_err(|e| ParseError::Parse(e.to_string()))?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let elem_ns = resolved_uri(resolve);

                let local = core::str::from_utf8(e.local_name().as_ref())
                    .map_err(ParseError::InvalidUtf8)?
                    .to_string();
                let prefix = match e.name().prefix() {
                    Some(p) => Some(
                        core::str::from_utf8(p.as_ref())
                            .map_err(ParseError::InvalidUtf8)?
                            .to_string(),
                    ),
                    None => None,
                };

                let mut elem = Element::new(QName {
                    namespace_uri: elem_ns,
                    local_name: local,
                    prefix,
                });

                for attr in e.attributes() {
                    let attr = attr.map_err(|e| ParseError::Parse(e.to_string()))?;
                    let key = attr.key;
                    let value = attr
                        .unescape_value()
                        .map_err(|e| ParseError::Parse(e.to_string()))?
                        .into_owned();

                    // xmlns declarations go to the binding list, not the map
                    if key.as_ref() == b"xmlns" {
                        elem.ns_decls.push((String::new(), value));
                        continue;
                    }
                    if let Some(prefix) = key.prefix()
                        && prefix.as_ref() == b"xmlns"
                    {
                        let bound = core::str::from_utf8(key.local_name().as_ref())
                            .map_err(ParseError::InvalidUtf8)?
                            .to_string();
                        elem.ns_decls.push((bound, value));
                        continue;
                    }

                    let (attr_resolve, _) = reader.resolver().resolve_attribute(key);
                    let attr_ns = resolved_uri(attr_resolve);
                    let attr_local = core::str::from_utf8(key.local_name().as_ref())
                        .map_err(ParseError::InvalidUtf8)?
                        .to_string();
                    let attr_prefix = match key.prefix() {
                        Some(p) => Some(
                            core::str::from_utf8(p.as_ref())
                                .map_err(ParseError::InvalidUtf8)?
                                .to_string(),
                        ),
                        None => None,
                    };

                    elem.attributes.insert(
                        QName {
                            namespace_uri: attr_ns,
                            local_name: attr_local,
                            prefix: attr_prefix,
                        },
                        value,
                    );
                }

                if is_empty {
                    append(&mut stack, &mut roots, Node::Element(elem));
                } else {
                    stack.push(elem);
                }
            }
            Event::End(_) => {
                let elem = stack.pop().ok_or(ParseError::UnbalancedTags)?;
                append(&mut stack, &mut roots, Node::Element(elem));
            }
            Event::Text(e) => {
                let text = e.decode().map_err(|e| ParseError::Parse(e.to_string()))?;
                if !text.is_empty() {
                    append_text(&mut stack, &mut roots, &text);
                }
            }
            Event::CData(e) => {
                let text = core::str::from_utf8(e.as_ref()).map_err(ParseError::InvalidUtf8)?;
                if !text.is_empty() {
                    append(&mut stack, &mut roots, Node::CData(text.to_string()));
                }
            }
            Event::Comment(e) => {
                let text = core::str::from_utf8(e.as_ref()).map_err(ParseError::InvalidUtf8)?;
                append(&mut stack, &mut roots, Node::Comment(text.to_string()));
            }
            Event::PI(e) => {
                let content = core::str::from_utf8(e.as_ref()).map_err(ParseError::InvalidUtf8)?;
                let (target, data) = content
                    .split_once(char::is_whitespace)
                    .unwrap_or((content, ""));
                append(
                    &mut stack,
                    &mut roots,
                    Node::ProcessingInstruction {
                        target: target.to_string(),
                        data: data.trim().to_string(),
                    },
                );
            }
            Event::GeneralRef(e) => {
                let raw = e.decode().map_err(|e| ParseError::Parse(e.to_string()))?;
                let resolved = resolve_entity(&raw)?;
                append_text(&mut stack, &mut roots, &resolved);
            }
            Event::Decl(_) | Event::DocType(_) => {
                // preamble, not part of the forest
            }
            Event::Eof => {
                if !stack.is_empty() {
                    return Err(ParseError::UnexpectedEof);
                }
                return Ok(roots);
            }
        }
    }
}

/// Parse XML text that must consist of exactly one root element.
pub fn parse_element(input: &str) -> Result<Element, ParseError> {
    let mut forest = parse_forest(input)?;
    let elements = forest.iter().filter(|n| n.as_element().is_some()).count();
    if elements != 1 {
        return Err(ParseError::Parse(format!(
            "expected exactly one root element, found {elements}"
        )));
    }
    let idx = forest
        .iter()
        .position(|n| n.as_element().is_some())
        .ok_or(ParseError::UnexpectedEof)?;
    match forest.swap_remove(idx) {
        Node::Element(e) => Ok(e),
        _ => unreachable!(),
    }
}

fn append(stack: &mut [Element], roots: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}

/// Append text, merging with a directly preceding text node so that entity
/// references do not split content.
fn append_text(stack: &mut [Element], roots: &mut Vec<Node>, text: &str) {
    let siblings = match stack.last_mut() {
        Some(parent) => &mut parent.children,
        None => roots,
    };
    if let Some(Node::Text(existing)) = siblings.last_mut() {
        existing.push_str(text);
    } else {
        siblings.push(Node::Text(text.to_string()));
    }
}

fn resolved_uri(resolve: ResolveResult<'_>) -> Option<String> {
    match resolve {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        ResolveResult::Unbound => None,
        ResolveResult::Unknown(_) => None,
    }
}

/// Resolve a general entity reference.
fn resolve_entity(raw: &str) -> Result<String, ParseError> {
    if let Some(resolved) = resolve_xml_entity(raw) {
        return Ok(resolved.into());
    }

    if let Some(rest) = raw.strip_prefix('#') {
        let code = if let Some(hex) = rest.strip_prefix('x').or_else(|| rest.strip_prefix('X')) {
            u32::from_str_radix(hex, 16)
                .map_err(|_| ParseError::Parse(format!("Invalid hex entity: #{}", rest)))?
        } else {
            rest.parse::<u32>()
                .map_err(|_| ParseError::Parse(format!("Invalid decimal entity: #{}", rest)))?
        };

        let ch = char::from_u32(code)
            .ok_or_else(|| ParseError::Parse(format!("Invalid Unicode: {}", code)))?;
        return Ok(ch.to_string());
    }

    Ok(format!("&{};", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn parse_simple_element() {
        let elem = parse_element(r#"<root><child>hello</child></root>"#).unwrap();
        assert_eq!(elem.name.local_name, "root");
        let child = elem.child_elements().next().unwrap();
        assert_eq!(child.name.local_name, "child");
        assert_eq!(child.text_content(), "hello");
    }

    #[test]
    fn parse_keeps_inter_element_whitespace() {
        let elem = parse_element(indoc!(
            r#"
            <root>
                <child>hello</child>
            </root>
        "#
        ))
        .unwrap();
        assert_eq!(elem.children.len(), 3);
        assert!(elem.children[0].is_ignorable_whitespace());
        assert_eq!(elem.child_elements().count(), 1);
        assert!(elem.children[2].is_ignorable_whitespace());
    }

    #[test]
    fn parse_attributes_and_namespaces() {
        let elem = parse_element(
            r#"<root xmlns:ex="http://example.com/ns" id="123" ex:kind="a"><ex:item/></root>"#,
        )
        .unwrap();
        assert_eq!(elem.get_attr("id"), Some("123"));
        assert_eq!(
            elem.attr(&QName::namespaced("http://example.com/ns", "kind")),
            Some("a")
        );
        assert_eq!(
            elem.ns_decls,
            vec![("ex".to_string(), "http://example.com/ns".to_string())]
        );

        let item = elem.child_elements().next().unwrap();
        assert_eq!(
            item.name,
            QName::namespaced("http://example.com/ns", "item")
        );
        assert_eq!(item.name.prefix.as_deref(), Some("ex"));
    }

    #[test]
    fn parse_default_namespace() {
        let elem = parse_element(r#"<root xmlns="urn:a"><child/></root>"#).unwrap();
        assert_eq!(elem.name, QName::namespaced("urn:a", "root"));
        let child = elem.child_elements().next().unwrap();
        assert_eq!(child.name, QName::namespaced("urn:a", "child"));
    }

    #[test]
    fn parse_forest_collects_siblings() {
        let forest = parse_forest(r#"<a/><b/>text"#).unwrap();
        assert_eq!(forest.len(), 3);
        assert_eq!(forest[0].as_element().unwrap().name.local_name, "a");
        assert_eq!(forest[1].as_element().unwrap().name.local_name, "b");
        assert_eq!(forest[2].as_text(), Some("text"));
    }

    #[test]
    fn parse_merges_entity_references_into_text() {
        let elem = parse_element(r#"<e>a &amp; b</e>"#).unwrap();
        assert_eq!(elem.children.len(), 1);
        assert_eq!(elem.text_content(), "a & b");
    }

    #[test]
    fn parse_element_rejects_forest() {
        assert!(parse_element(r#"<a/><b/>"#).is_err());
    }

    #[test]
    fn parse_unclosed_element_fails() {
        assert!(parse_forest(r#"<a><b></a>"#).is_err());
    }

    #[test]
    fn parse_preserves_cdata() {
        let elem = parse_element("<e><![CDATA[1 < 2]]></e>").unwrap();
        assert_eq!(elem.children, vec![Node::CData("1 < 2".into())]);
    }
}
