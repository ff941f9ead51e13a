//! Error types for the marshal/unmarshal bridge.

use std::{
    error::Error,
    fmt::{self, Display},
};

use xmlbind_node::ParseError;

/// Error type for marshal, unmarshal and factory resolution.
#[derive(Debug)]
pub struct BindError {
    /// The specific kind of error
    kind: BindErrorKind,
}

impl BindError {
    /// Returns a reference to the error kind for detailed error inspection.
    pub fn kind(&self) -> &BindErrorKind {
        &self.kind
    }

    /// Create a new error with the given kind.
    pub(crate) fn new(kind: impl Into<BindErrorKind>) -> Self {
        BindError { kind: kind.into() }
    }

    /// True if this is a wiring defect (missing or duplicate factory
    /// registration) rather than a document or stream problem.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self.kind,
            BindErrorKind::MissingFactory { .. } | BindErrorKind::DuplicateFactory { .. }
        )
    }
}

impl Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = &self.kind;
        write!(f, "{kind}")
    }
}

impl Error for BindError {}

impl<K: Into<BindErrorKind>> From<K> for BindError {
    fn from(value: K) -> Self {
        BindError::new(value)
    }
}

/// Detailed classification of bridge errors.
#[derive(Debug)]
#[non_exhaustive]
pub enum BindErrorKind {
    // Configuration errors: wiring defects, never retried
    /// No deserializer factory is registered for the target type.
    MissingFactory {
        /// The target type.
        type_name: &'static str,
    },
    /// A factory for the target type is already registered.
    DuplicateFactory {
        /// The target type.
        type_name: &'static str,
    },

    // Structural errors: invalid document construction or traversal
    /// A qualified name was malformed (e.g. empty local name).
    InvalidName(String),
    /// End of an element was written without a matching start.
    WriterUnbalanced,
    /// An attribute or namespace declaration was written with no open element.
    NoOpenElement {
        /// What was being written.
        what: &'static str,
    },
    /// The cursor was not positioned on the expected event.
    UnexpectedEvent {
        /// What was expected.
        expected: &'static str,
        /// What was found.
        got: String,
    },

    // Stream failures: reported by the reader/writer collaborators
    /// Failed to parse XML text.
    Parse(String),
    /// Unexpected end of the event sequence.
    UnexpectedEof,

    // Unhandled content: reported by a deserializable, raised by the caller loop
    /// A child element was not handled.
    UnhandledChild {
        /// The element name.
        name: String,
    },
    /// Non-whitespace text content was not handled.
    UnhandledText {
        /// The text content.
        text: String,
    },
}

impl BindErrorKind {
    /// Returns an error code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            BindErrorKind::MissingFactory { .. } => "bind::missing_factory",
            BindErrorKind::DuplicateFactory { .. } => "bind::duplicate_factory",
            BindErrorKind::InvalidName(_) => "bind::invalid_name",
            BindErrorKind::WriterUnbalanced => "bind::writer_unbalanced",
            BindErrorKind::NoOpenElement { .. } => "bind::no_open_element",
            BindErrorKind::UnexpectedEvent { .. } => "bind::unexpected_event",
            BindErrorKind::Parse(_) => "bind::parse",
            BindErrorKind::UnexpectedEof => "bind::unexpected_eof",
            BindErrorKind::UnhandledChild { .. } => "bind::unhandled_child",
            BindErrorKind::UnhandledText { .. } => "bind::unhandled_text",
        }
    }
}

impl Display for BindErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindErrorKind::MissingFactory { type_name } => {
                write!(f, "no deserializer factory registered for '{type_name}'")
            }
            BindErrorKind::DuplicateFactory { type_name } => {
                write!(f, "a deserializer factory for '{type_name}' is already registered")
            }
            BindErrorKind::InvalidName(name) => write!(f, "malformed qualified name: '{name}'"),
            BindErrorKind::WriterUnbalanced => {
                write!(f, "unbalanced element boundaries in written output")
            }
            BindErrorKind::NoOpenElement { what } => {
                write!(f, "cannot write {what}: no element is open")
            }
            BindErrorKind::UnexpectedEvent { expected, got } => {
                write!(f, "expected {expected}, found {got}")
            }
            BindErrorKind::Parse(msg) => write!(f, "XML parse error: {msg}"),
            BindErrorKind::UnexpectedEof => write!(f, "unexpected end of XML event sequence"),
            BindErrorKind::UnhandledChild { name } => {
                write!(f, "child element <{name}> was not handled")
            }
            BindErrorKind::UnhandledText { text } => {
                write!(f, "text content was not handled: '{text}'")
            }
        }
    }
}

impl From<ParseError> for BindErrorKind {
    fn from(value: ParseError) -> Self {
        match value {
            ParseError::UnexpectedEof => BindErrorKind::UnexpectedEof,
            other => BindErrorKind::Parse(other.to_string()),
        }
    }
}
