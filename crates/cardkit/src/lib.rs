//! vCard codec for the 2.1, 3.0, and 4.0 textual syntaxes and the
//! xCard XML syntax (RFC 6351).
//!
//! Reading is pull-based and lenient: [`VCardReader`] and
//! [`XCardReader`] hand out one [`VCard`] per call and surface
//! recoverable problems as warnings rather than errors. Writing goes
//! through a shared output planner that handles version filtering,
//! PRODID stamping, and LABEL companion synthesis before
//! [`VCardWriter`] or [`XCardWriter`] serialize.
//!
//! Per-property codecs ("scribes") are pluggable through
//! [`ScribeIndex`]; unknown properties survive round trips as raw or
//! XML payloads.

pub mod core;
pub mod error;
pub mod plan;
pub mod scribe;
pub mod text;
pub mod xml;

pub use crate::core::{
    ParseWarning, Parameters, PropertyKind, PropertyValue, VCard, VCardDataType, VCardProperty,
    VCardVersion, WarningCode,
};
pub use crate::error::{ReadError, ReadResult, WriteError, WriteResult};
pub use crate::plan::WriterConfig;
pub use crate::scribe::{PropertyScribe, ScribeError, ScribeIndex, ScribeResult};
pub use crate::text::{VCardReader, VCardWriter};
pub use crate::xml::{XCardReader, XCardWriter};

/// Parses every card in a textual vCard string.
///
/// ## Errors
/// Fails on input truncated inside an embedded AGENT card.
pub fn parse(input: &str) -> ReadResult<Vec<VCard>> {
    let mut reader = VCardReader::new(input.as_bytes());
    let mut cards = Vec::new();
    while let Some(card) = reader.read_next()? {
        cards.push(card);
    }
    Ok(cards)
}

/// Parses every card in an xCard document string.
///
/// ## Errors
/// Fails when the document is malformed.
pub fn parse_xml(input: &str) -> ReadResult<Vec<VCard>> {
    let mut reader = XCardReader::new(input.as_bytes());
    let mut cards = Vec::new();
    while let Some(card) = reader.read_next()? {
        cards.push(card);
    }
    Ok(cards)
}

/// Writes cards as a textual vCard string at the given version.
///
/// ## Errors
/// Fails when a card holds property kinds with no registered scribe.
pub fn write_string(cards: &[VCard], version: VCardVersion) -> WriteResult<String> {
    let mut writer = VCardWriter::new(Vec::new(), version);
    for card in cards {
        writer.write(card)?;
    }
    let bytes = writer.into_inner();
    String::from_utf8(bytes).map_err(|_| {
        WriteError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "invalid UTF-8 in vCard output",
        ))
    })
}

/// Writes cards as one xCard document string.
///
/// ## Errors
/// Fails when a card holds property kinds with no registered scribe.
pub fn write_xml_string(cards: &[VCard]) -> WriteResult<String> {
    let mut writer = XCardWriter::new(Vec::new());
    for card in cards {
        writer.write(card)?;
    }
    let bytes = writer.finish()?;
    String::from_utf8(bytes).map_err(|_| {
        WriteError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "invalid UTF-8 in xCard output",
        ))
    })
}
