//! Error types for document reading and writing.

use thiserror::Error;

/// Result type alias for fieldmark-doctree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing document markup.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Malformed XML reported by quick-xml.
    #[error("XML syntax error: {message} at byte {position}")]
    Syntax { message: String, position: u64 },

    /// A well-formed element that does not belong where it appeared.
    #[error("Unexpected element <{found}> inside <{context}>")]
    UnexpectedElement { found: String, context: String },

    /// Non-whitespace character data outside a text element.
    #[error("Unexpected text content inside <{context}>")]
    UnexpectedText { context: String },

    /// Input ended while an element was still open.
    #[error("Unexpected end of input, expected closing tag </{expected}>")]
    UnexpectedEof { expected: String },

    /// A required attribute was absent.
    #[error("Missing required attribute '{name}' on <{element}>")]
    MissingAttribute { element: String, name: String },

    /// An attribute value that could not be interpreted.
    #[error("Invalid value '{value}' for attribute '{name}' on <{element}>")]
    InvalidAttribute {
        element: String,
        name: String,
        value: String,
    },

    /// No `<document>` root element was found.
    #[error("Document has no <document> root element")]
    MissingRoot,

    /// Failure while serializing a document tree.
    #[error("Failed to write document: {message}")]
    Write { message: String },
}
