//! Textual parse error types.

use std::fmt;

/// Result type for tokenizer-level operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// An unrecoverable textual parse error.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// Logical line number where the error occurred (1-based).
    pub line: usize,
    /// Additional context.
    pub message: String,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(kind: ParseErrorKind, line: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}: {}", self.line, self.kind, self.message)
    }
}

impl std::error::Error for ParseError {}

/// The kind of textual parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Input ended inside a record.
    UnexpectedEof,
    /// A content line is missing its colon separator.
    MissingColon,
    /// A property name holds characters outside the allowed set.
    InvalidPropertyName,
    /// A parameter could not be parsed.
    InvalidParameter,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected end of input"),
            Self::MissingColon => write!(f, "missing colon separator"),
            Self::InvalidPropertyName => write!(f, "invalid property name"),
            Self::InvalidParameter => write!(f, "invalid parameter"),
        }
    }
}
