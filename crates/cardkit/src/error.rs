//! Public error types for the read and write APIs.

use thiserror::Error;

use crate::text::ParseError;

/// An error surfaced by `read_next()`.
///
/// Any of these moves the reader into its terminal state; subsequent
/// calls report end-of-stream.
#[derive(Error, Debug)]
pub enum ReadError {
    /// The underlying byte source failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The textual tokenizer hit an unrecoverable syntax failure.
    #[error("malformed vCard syntax: {0}")]
    MalformedSyntax(#[from] ParseError),

    /// The XML tokenizer reported malformed input.
    #[error("malformed xCard document: {0}")]
    MalformedXml(#[from] quick_xml::Error),

    /// xCard input was not valid UTF-8 / declared encoding.
    #[error("encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),
}

/// An error surfaced by `write()`.
#[derive(Error, Debug)]
pub enum WriteError {
    /// The underlying byte sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML serialization failed.
    #[error("XML write error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The card holds properties whose kinds have no registered scribe.
    ///
    /// The writer stays usable; register the missing scribes and retry.
    /// No bytes were written for the offending card.
    #[error("no scribe registered for property kinds: {}", .0.join(", "))]
    UnregisteredProperty(Vec<String>),
}

/// Result alias for read operations.
pub type ReadResult<T> = Result<T, ReadError>;

/// Result alias for write operations.
pub type WriteResult<T> = Result<T, WriteError>;
