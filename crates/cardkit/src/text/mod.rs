//! The textual vCard syntaxes (2.1, 3.0, 4.0).

pub mod encoding;
mod error;
mod lexer;
mod reader;
mod writer;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use lexer::{ContentLine, LineScanner, parse_content_line};
pub use reader::VCardReader;
pub use writer::VCardWriter;
