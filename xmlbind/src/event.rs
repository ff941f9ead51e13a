//! Streaming event kinds and the pull/push cursor abstractions.
//!
//! The bridge consumes these at its seams: a value's serialize capability
//! pushes into an [`XmlWrite`] sink, and deserializer factories pull from a
//! positioned [`XmlRead`] cursor. Both traits are dyn-compatible so the typed
//! contracts can take them as trait objects.

use xmlbind_node::QName;

use crate::error::BindError;

/// The kind of event a pull cursor is positioned on.
///
/// A fresh cursor sits on `StartDocument` before the first call to `next`.
/// The sequence for each element is `StartElement`, its children in document
/// order, then `EndElement`; the sequence ends with a terminal `EndDocument`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Before the first event.
    StartDocument,
    /// Start of an element; attributes are accessible while positioned here.
    StartElement,
    /// End of an element.
    EndElement,
    /// Text content.
    Text,
    /// A CDATA section.
    CData,
    /// A comment.
    Comment,
    /// A processing instruction.
    ProcessingInstruction,
    /// After the last event. Terminal.
    EndDocument,
}

impl EventKind {
    /// Short uppercase name, used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::StartDocument => "START_DOCUMENT",
            EventKind::StartElement => "START_ELEMENT",
            EventKind::EndElement => "END_ELEMENT",
            EventKind::Text => "TEXT",
            EventKind::CData => "CDATA",
            EventKind::Comment => "COMMENT",
            EventKind::ProcessingInstruction => "PROCESSING_INSTRUCTION",
            EventKind::EndDocument => "END_DOCUMENT",
        }
    }
}

/// A push-style streaming writer: the sink a value serializes itself into.
pub trait XmlWrite {
    /// Open an element.
    fn start_element(&mut self, name: &QName) -> Result<(), BindError>;

    /// Declare a namespace binding on the currently open element. The empty
    /// prefix binds the default namespace.
    fn namespace(&mut self, prefix: &str, uri: &str) -> Result<(), BindError>;

    /// Write an attribute on the currently open element.
    fn attribute(&mut self, name: &QName, value: &str) -> Result<(), BindError>;

    /// Write text content.
    fn text(&mut self, text: &str) -> Result<(), BindError>;

    /// Write a CDATA section.
    fn cdata(&mut self, text: &str) -> Result<(), BindError>;

    /// Write a comment.
    fn comment(&mut self, text: &str) -> Result<(), BindError>;

    /// Write a processing instruction.
    fn processing_instruction(&mut self, target: &str, data: &str) -> Result<(), BindError>;

    /// Close the innermost open element.
    fn end_element(&mut self) -> Result<(), BindError>;

    /// Finish the document; fails if element boundaries are unbalanced.
    fn end_document(&mut self) -> Result<(), BindError>;
}

/// A pull-style positioned cursor over an XML event sequence.
pub trait XmlRead {
    /// The kind of event the cursor is currently positioned on.
    fn event(&self) -> EventKind;

    /// True if `next` can advance without running off the end.
    fn has_next(&self) -> bool;

    /// Advance to the next event and return its kind.
    fn next(&mut self) -> Result<EventKind, BindError>;

    /// Advance to the next `StartElement` or `EndElement`, skipping ignorable
    /// whitespace, comments and processing instructions. Non-whitespace text
    /// encountered on the way is a structural error.
    fn next_tag(&mut self) -> Result<EventKind, BindError>;

    /// The name of the current element. Valid on `StartElement`/`EndElement`.
    fn name(&self) -> Result<&QName, BindError>;

    /// The current text content. Valid on `Text`, `CData` and `Comment`.
    fn text(&self) -> Result<&str, BindError>;

    /// Number of attributes on the current start element.
    fn attribute_count(&self) -> Result<usize, BindError>;

    /// Namespace URI of the attribute at `index`, if any.
    fn attribute_namespace(&self, index: usize) -> Result<Option<&str>, BindError>;

    /// Local name of the attribute at `index`.
    fn attribute_local_name(&self, index: usize) -> Result<&str, BindError>;

    /// Value of the attribute at `index`.
    fn attribute_value(&self, index: usize) -> Result<&str, BindError>;

    /// Number of namespace declarations on the current start element.
    fn namespace_count(&self) -> Result<usize, BindError>;

    /// Prefix of the namespace declaration at `index`; empty for the default
    /// namespace.
    fn namespace_prefix(&self, index: usize) -> Result<&str, BindError>;

    /// URI of the namespace declaration at `index`.
    fn namespace_uri(&self, index: usize) -> Result<&str, BindError>;

    /// Skip the current element and all its descendants. The cursor must be
    /// on `StartElement` and ends positioned on the matching `EndElement`.
    fn skip_element(&mut self) -> Result<(), BindError>;

    /// Fail unless the cursor is on `kind` (and, when given, an element named
    /// `name`).
    fn require(&self, kind: EventKind, name: Option<&QName>) -> Result<(), BindError> {
        use crate::error::BindErrorKind;

        if self.event() != kind {
            return Err(BindError::new(BindErrorKind::UnexpectedEvent {
                expected: kind.name(),
                got: self.event().name().to_string(),
            }));
        }
        if let Some(expected) = name {
            let actual = self.name()?;
            if actual != expected {
                return Err(BindError::new(BindErrorKind::UnexpectedEvent {
                    expected: kind.name(),
                    got: format!("{} named {}", kind.name(), actual),
                }));
            }
        }
        Ok(())
    }
}
