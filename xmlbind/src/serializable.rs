//! The typed capability contracts and the driving deserialization loop.

use xmlbind_node::{QName, is_xml_whitespace};

use crate::error::{BindError, BindErrorKind};
use crate::event::{EventKind, XmlRead, XmlWrite};
use crate::tracing_macros::trace;

/// A value that can write itself to a streaming sink.
///
/// The value must write exactly its own element(s) and text, including its
/// own element boundary; the marshal adapter classifies whatever the value
/// produced afterwards.
pub trait XmlSerializable {
    /// Write the value to the sink.
    fn serialize(&self, out: &mut dyn XmlWrite) -> Result<(), BindError>;
}

/// How a deserializable consumes its child content.
///
/// A concrete type uses exactly one calling convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChildHandling {
    /// [`deserialize_helper`] drives the loop, handing each child start
    /// element to `deserialize_child` and each text chunk to
    /// `deserialize_child_text`.
    #[default]
    PerChild,
    /// `deserialize_children` takes full control of the remaining content and
    /// must leave the reader at the element's own end event.
    Bulk,
}

/// A value that can populate itself from streaming events.
///
/// The contract only ever reports handled/unhandled; deciding whether
/// unhandled content is an error belongs to the loop driving the reader
/// (see [`deserialize_helper`]).
pub trait XmlDeserializable {
    /// The name of the element this value reads, used for validation.
    fn element_name(&self) -> QName;

    /// Handle one attribute. Returns `true` if handled.
    fn deserialize_attribute(
        &mut self,
        namespace: Option<&str>,
        local_name: &str,
        value: &str,
    ) -> Result<bool, BindError> {
        let _ = (namespace, local_name, value);
        Ok(false)
    }

    /// Called after attributes have been dispatched, before any child or
    /// text event.
    fn before_children(&mut self, reader: &mut dyn XmlRead) -> Result<(), BindError> {
        let _ = reader;
        Ok(())
    }

    /// Which child-content convention this type uses.
    fn child_handling(&self) -> ChildHandling {
        ChildHandling::PerChild
    }

    /// Handle one child element. Called with the reader on the child's start
    /// event; when returning `true` the implementation must have consumed up
    /// to and including the child's end event.
    fn deserialize_child(&mut self, reader: &mut dyn XmlRead) -> Result<bool, BindError> {
        let _ = reader;
        Ok(false)
    }

    /// Handle one chunk of text content. May be called several times per
    /// element. Returns `true` if handled.
    fn deserialize_child_text(&mut self, text: &str) -> Result<bool, BindError> {
        let _ = text;
        Ok(false)
    }

    /// Bulk convention: consume all remaining child content, leaving the
    /// reader at this element's own end event. Only invoked when
    /// [`XmlDeserializable::child_handling`] returns [`ChildHandling::Bulk`];
    /// the default consumes nothing.
    fn deserialize_children(&mut self, reader: &mut dyn XmlRead) -> Result<(), BindError> {
        let _ = reader;
        Ok(())
    }
}

/// Drive deserialization of `value` from `reader`.
///
/// This is the caller-side reader loop: attributes are dispatched before any
/// child or text event, then the type's child convention runs. An unhandled
/// child element or non-whitespace text chunk aborts with an unhandled
/// content error; an unhandled attribute does not — the original binding
/// runtimes leave that disposition to stricter outer validation.
///
/// On entry the reader may still be in the document preamble; it is advanced
/// to the first start element. On success the reader sits on the element's
/// end event.
pub fn deserialize_helper<T: XmlDeserializable>(
    mut value: T,
    reader: &mut dyn XmlRead,
) -> Result<T, BindError> {
    skip_preamble(reader)?;

    let element_name = reader.name()?.clone();
    if element_name != value.element_name() {
        // the synthetic root may carry a placeholder name; validation of the
        // real name happens wherever the fragment was embedded
        trace!(expected = %value.element_name(), found = %element_name, "element name mismatch");
    }

    let attribute_count = reader.attribute_count()?;
    for index in (0..attribute_count).rev() {
        let namespace = reader.attribute_namespace(index)?.map(str::to_owned);
        let local_name = reader.attribute_local_name(index)?.to_owned();
        let attr_value = reader.attribute_value(index)?.to_owned();
        let handled = value.deserialize_attribute(namespace.as_deref(), &local_name, &attr_value)?;
        if !handled {
            trace!(attribute = %local_name, "attribute not handled");
        }
    }

    value.before_children(reader)?;

    match value.child_handling() {
        ChildHandling::PerChild => loop {
            match reader.next()? {
                EventKind::EndElement => break,
                EventKind::StartElement => {
                    if !value.deserialize_child(reader)? {
                        let name = reader.name()?.to_string();
                        return Err(BindError::new(BindErrorKind::UnhandledChild { name }));
                    }
                }
                EventKind::Text | EventKind::CData => {
                    let text = reader.text()?.to_owned();
                    if !value.deserialize_child_text(&text)? && !is_xml_whitespace(&text) {
                        return Err(BindError::new(BindErrorKind::UnhandledText { text }));
                    }
                }
                EventKind::Comment | EventKind::ProcessingInstruction => {}
                EventKind::EndDocument => {
                    return Err(BindError::new(BindErrorKind::UnexpectedEof));
                }
                EventKind::StartDocument => {}
            }
        },
        ChildHandling::Bulk => {
            value.deserialize_children(reader)?;
            reader.require(EventKind::EndElement, Some(&element_name))?;
        }
    }

    Ok(value)
}

/// Advance past the document preamble to the first start element.
fn skip_preamble(reader: &mut dyn XmlRead) -> Result<(), BindError> {
    loop {
        match reader.event() {
            EventKind::StartElement => return Ok(()),
            EventKind::StartDocument
            | EventKind::Comment
            | EventKind::ProcessingInstruction => {
                reader.next()?;
            }
            EventKind::Text | EventKind::CData if is_xml_whitespace(reader.text()?) => {
                reader.next()?;
            }
            other => {
                return Err(BindError::new(BindErrorKind::UnexpectedEvent {
                    expected: "START_ELEMENT",
                    got: other.name().to_string(),
                }));
            }
        }
    }
}
