//! Streaming reader for the textual vCard syntaxes.

use std::io::BufRead;

use crate::core::{
    ParseWarning, VCard, VCardDataType, VCardProperty, VCardVersion, WarningCode,
};
use crate::error::{ReadError, ReadResult};
use crate::scribe::{ScribeError, ScribeIndex};

use super::encoding::decode_quoted_printable;
use super::error::{ParseError, ParseErrorKind};
use super::lexer::{ContentLine, LineScanner, parse_content_line};

/// Pull reader producing one [`VCard`] per `read_next()` call.
///
/// The reader is lenient: malformed lines, unknown properties, and
/// values a scribe rejects are surfaced through [`warnings`], never as
/// errors. Errors are reserved for I/O failures and truncated input;
/// any error moves the reader to its terminal state.
///
/// [`warnings`]: VCardReader::warnings
pub struct VCardReader<R: BufRead> {
    scanner: LineScanner<R>,
    index: ScribeIndex,
    warnings: Vec<ParseWarning>,
    done: bool,
}

impl<R: BufRead> VCardReader<R> {
    /// Creates a reader with the built-in scribe catalog.
    pub fn new(reader: R) -> Self {
        Self::with_index(reader, ScribeIndex::default())
    }

    /// Creates a reader dispatching through the given index.
    pub fn with_index(reader: R, index: ScribeIndex) -> Self {
        Self {
            scanner: LineScanner::new(reader),
            index,
            warnings: Vec::new(),
            done: false,
        }
    }

    /// The warnings accumulated by the most recent `read_next()` call.
    #[must_use]
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// Reads the next card, or `None` at end of input.
    ///
    /// A card missing its VERSION property is read with 2.1 grammar and
    /// flagged. Input ending inside an open card yields the partial
    /// card.
    ///
    /// ## Errors
    /// Fails on I/O errors and on input truncated inside an embedded
    /// AGENT card. The reader then reports end-of-stream.
    pub fn read_next(&mut self) -> ReadResult<Option<VCard>> {
        self.warnings.clear();
        if self.done {
            return Ok(None);
        }

        let mut in_card = false;
        let mut version = VCardVersion::V2_1;
        let mut seen_version = false;
        let mut props: Vec<VCardProperty> = Vec::new();

        loop {
            let next = match self.scanner.next_logical() {
                Ok(next) => next,
                Err(err) => {
                    self.done = true;
                    return Err(err.into());
                }
            };
            let Some((line, line_num)) = next else {
                self.done = true;
                if !in_card {
                    return Ok(None);
                }
                tracing::debug!("input ended inside an open card");
                if !seen_version {
                    self.warnings.push(ParseWarning::new(
                        WarningCode::MissingVersion,
                        "no VERSION property; 2.1 assumed",
                    ));
                }
                return Ok(Some(build_card(version, props)));
            };

            let content = match parse_content_line(&line, line_num, version) {
                Ok(content) => content,
                Err(err) => {
                    self.warnings.push(ParseWarning::at_line(
                        line_num,
                        WarningCode::MalformedLine,
                        err.to_string(),
                    ));
                    continue;
                }
            };

            if is_delimiter(&content, "BEGIN") {
                if in_card {
                    self.capture_embedded(line_num, &mut props)?;
                } else {
                    in_card = true;
                }
                continue;
            }

            if is_delimiter(&content, "END") {
                if !in_card {
                    self.warnings.push(ParseWarning::at_line(
                        line_num,
                        WarningCode::UnmatchedEnd,
                        "END:VCARD without a matching BEGIN",
                    ));
                    continue;
                }
                if !seen_version {
                    self.warnings.push(ParseWarning::at_line(
                        line_num,
                        WarningCode::MissingVersion,
                        "no VERSION property; 2.1 assumed",
                    ));
                }
                return Ok(Some(build_card(version, props)));
            }

            if !in_card {
                self.warnings.push(ParseWarning::at_line(
                    line_num,
                    WarningCode::PropertyOutsideCard,
                    format!("{} outside BEGIN:VCARD", content.name),
                ));
                continue;
            }

            if content.name == "VERSION" {
                match VCardVersion::from_str_opt(content.value.trim()) {
                    Some(v) => {
                        version = v;
                        seen_version = true;
                    }
                    None => {
                        self.warnings.push(ParseWarning::at_line(
                            line_num,
                            WarningCode::UnrecognizedVersion,
                            format!("unrecognized version: {}", content.value),
                        ));
                    }
                }
                continue;
            }

            if let Some(prop) = self.parse_property(content, line_num, version)? {
                props.push(prop);
            }
        }
    }

    /// Turns one content line into a property, or `None` when skipped.
    fn parse_property(
        &mut self,
        content: ContentLine,
        line_num: usize,
        version: VCardVersion,
    ) -> ReadResult<Option<VCardProperty>> {
        let ContentLine {
            group,
            name,
            mut params,
            mut value,
        } = content;

        if params.is_quoted_printable() {
            // `=` at the end of a line is a soft break; the rest of the
            // value continues on the following physical line, unfolded.
            while value.ends_with('=') {
                value.pop();
                match self.scanner.next_physical()? {
                    Some(next) => value.push_str(&next),
                    None => break,
                }
            }
            let (decoded, clean) = decode_quoted_printable(&value);
            if !clean {
                self.warnings.push(ParseWarning::at_line(
                    line_num,
                    WarningCode::QuotedPrintableError,
                    format!("invalid quoted-printable data in {name}"),
                ));
            }
            value = decoded;
            params.remove("ENCODING");
            params.remove("CHARSET");
        }

        let declared = params.value_type();
        params.remove("VALUE");

        let Some(scribe) = self.index.for_name(&name, version).cloned() else {
            tracing::debug!(property = %name, "no scribe; keeping raw");
            let data_type = declared.unwrap_or(VCardDataType::TEXT);
            let mut prop = VCardProperty::raw(name, value, data_type);
            prop.set_group(group);
            prop.params = params;
            return Ok(Some(prop));
        };

        let data_type = declared
            .or_else(|| scribe.default_data_type(version))
            .unwrap_or(VCardDataType::TEXT);

        match scribe.parse_text(&value, data_type, &mut params, version) {
            Ok(payload) => {
                let mut prop = VCardProperty::new(name, payload);
                prop.set_group(group);
                prop.params = params;
                Ok(Some(prop))
            }
            Err(ScribeError::SkipMe(reason)) => {
                self.warnings.push(ParseWarning::at_line(
                    line_num,
                    WarningCode::PropertySkipped,
                    format!("{name} skipped: {reason}"),
                ));
                Ok(None)
            }
            Err(ScribeError::CannotParse(reason)) => {
                self.warnings.push(ParseWarning::at_line(
                    line_num,
                    WarningCode::PropertyDemoted,
                    format!("{name} kept as raw: {reason}"),
                ));
                let mut prop = VCardProperty::raw(name, value, data_type);
                prop.set_group(group);
                prop.params = params;
                Ok(Some(prop))
            }
        }
    }

    /// Consumes a nested BEGIN:VCARD..END:VCARD block.
    ///
    /// 2.1 AGENT embeds a complete card after an empty-valued AGENT
    /// line. The block is re-attached to that property verbatim, lines
    /// joined with `\n`.
    fn capture_embedded(
        &mut self,
        start_line: usize,
        props: &mut [VCardProperty],
    ) -> ReadResult<()> {
        let mut lines = vec!["BEGIN:VCARD".to_string()];
        let mut depth = 1usize;

        loop {
            let Some((line, _)) = self.scanner.next_logical()? else {
                self.done = true;
                return Err(ReadError::MalformedSyntax(ParseError::new(
                    ParseErrorKind::UnexpectedEof,
                    start_line,
                    "input ended inside an embedded card",
                )));
            };
            if delimiter_line(&line, "BEGIN") {
                depth += 1;
            } else if delimiter_line(&line, "END") {
                depth -= 1;
                if depth == 0 {
                    lines.push(line);
                    break;
                }
            }
            lines.push(line);
        }

        let embedded = lines.join("\n");
        let target = props.last_mut().filter(|p| {
            p.name == "AGENT" && p.as_text().is_some_and(|t| t.trim().is_empty())
        });
        match target {
            Some(agent) => {
                agent.value = crate::core::PropertyValue::Raw(crate::core::RawValue::new(
                    embedded,
                    VCardDataType::get("vcard"),
                ));
                self.warnings.push(ParseWarning::at_line(
                    start_line,
                    WarningCode::EmbeddedCard,
                    "embedded card captured as raw AGENT value",
                ));
            }
            None => {
                self.warnings.push(ParseWarning::at_line(
                    start_line,
                    WarningCode::EmbeddedCard,
                    "embedded card without a preceding AGENT discarded",
                ));
            }
        }
        Ok(())
    }
}

fn is_delimiter(content: &ContentLine, name: &str) -> bool {
    content.name == name
        && content.group.is_none()
        && content.value.trim().eq_ignore_ascii_case("VCARD")
}

/// Delimiter test on a raw logical line, used inside embedded capture
/// where lines are preserved rather than tokenized.
fn delimiter_line(line: &str, name: &str) -> bool {
    line.split_once(':').is_some_and(|(n, v)| {
        n.trim().eq_ignore_ascii_case(name) && v.trim().eq_ignore_ascii_case("VCARD")
    })
}

fn build_card(version: VCardVersion, props: Vec<VCardProperty>) -> VCard {
    let mut card = VCard::new(version);
    for prop in props {
        card.add_property(prop);
    }
    card
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PropertyKind, PropertyValue};
    use test_log::test;

    fn read_all(input: &str) -> Vec<VCard> {
        let mut reader = VCardReader::new(input.as_bytes());
        let mut cards = Vec::new();
        while let Some(card) = reader.read_next().unwrap() {
            cards.push(card);
        }
        cards
    }

    #[test]
    fn reads_simple_v4_card() {
        let cards = read_all(
            "BEGIN:VCARD\r\nVERSION:4.0\r\nFN:John Doe\r\nEMAIL:jd@example.com\r\nEND:VCARD\r\n",
        );
        assert_eq!(cards.len(), 1);
        let card = &cards[0];
        assert_eq!(card.version(), VCardVersion::V4_0);
        assert_eq!(card.formatted_name(), Some("John Doe"));
        assert_eq!(card.email(), Some("jd@example.com"));
    }

    #[test]
    fn missing_version_defaults_to_v21_with_warning() {
        let mut reader = VCardReader::new(&b"BEGIN:VCARD\r\nFN:X\r\nEND:VCARD\r\n"[..]);
        let card = reader.read_next().unwrap().unwrap();
        assert_eq!(card.version(), VCardVersion::V2_1);
        assert!(
            reader
                .warnings()
                .iter()
                .any(|w| w.code == WarningCode::MissingVersion)
        );
    }

    #[test]
    fn unknown_property_kept_raw() {
        let cards = read_all(
            "BEGIN:VCARD\r\nVERSION:4.0\r\nX-SPIN:clockwise\r\nEND:VCARD\r\n",
        );
        let raw: Vec<_> = cards[0].properties_of(PropertyKind::Raw).collect();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].name, "X-SPIN");
        assert_eq!(raw[0].as_text(), Some("clockwise"));
    }

    #[test]
    fn unparsable_value_demoted_with_warning() {
        let mut reader = VCardReader::new(
            &b"BEGIN:VCARD\r\nVERSION:4.0\r\nGEO:nowhere\r\nEND:VCARD\r\n"[..],
        );
        let card = reader.read_next().unwrap().unwrap();
        assert!(
            reader
                .warnings()
                .iter()
                .any(|w| w.code == WarningCode::PropertyDemoted)
        );
        let raw: Vec<_> = card.properties_of(PropertyKind::Raw).collect();
        assert_eq!(raw[0].name, "GEO");
        assert_eq!(raw[0].as_text(), Some("nowhere"));
    }

    #[test]
    fn folded_line_spanning_multibyte() {
        // Folding may split anywhere between octets of the wire form,
        // but the reader joins before interpreting.
        let input = "BEGIN:VCARD\r\nVERSION:4.0\r\nNOTE:first part \r\n and the rest\r\nEND:VCARD\r\n";
        let cards = read_all(input);
        let note: Vec<_> = cards[0].properties_of(PropertyKind::Note).collect();
        assert_eq!(
            note[0].value,
            PropertyValue::Note("first part and the rest".into())
        );
    }

    #[test]
    fn quoted_printable_with_soft_break() {
        let input = "BEGIN:VCARD\r\nVERSION:2.1\r\nNOTE;ENCODING=QUOTED-PRINTABLE:caf=\r\n=C3=A9\r\nEND:VCARD\r\n";
        let cards = read_all(input);
        let note: Vec<_> = cards[0].properties_of(PropertyKind::Note).collect();
        assert_eq!(note[0].value, PropertyValue::Note("café".into()));
        // Transfer-encoding params are consumed by the decode.
        assert!(note[0].params.encoding().is_none());
    }

    #[test]
    fn version_line_consumed_not_stored() {
        let cards = read_all("BEGIN:VCARD\r\nVERSION:3.0\r\nFN:X\r\nEND:VCARD\r\n");
        assert_eq!(cards[0].properties().len(), 1);
    }

    #[test]
    fn multiple_cards_in_one_stream() {
        let input = "BEGIN:VCARD\r\nVERSION:4.0\r\nFN:A\r\nEND:VCARD\r\nBEGIN:VCARD\r\nVERSION:3.0\r\nFN:B\r\nEND:VCARD\r\n";
        let cards = read_all(input);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].formatted_name(), Some("A"));
        assert_eq!(cards[1].version(), VCardVersion::V3_0);
    }

    #[test]
    fn property_outside_card_warns() {
        let mut reader =
            VCardReader::new(&b"FN:stray\r\nBEGIN:VCARD\r\nVERSION:4.0\r\nEND:VCARD\r\n"[..]);
        let card = reader.read_next().unwrap().unwrap();
        assert!(card.properties().is_empty());
        assert!(
            reader
                .warnings()
                .iter()
                .any(|w| w.code == WarningCode::PropertyOutsideCard)
        );
    }

    #[test]
    fn unmatched_end_warns_and_continues() {
        let mut reader = VCardReader::new(
            &b"END:VCARD\r\nBEGIN:VCARD\r\nVERSION:4.0\r\nFN:X\r\nEND:VCARD\r\n"[..],
        );
        let card = reader.read_next().unwrap().unwrap();
        assert_eq!(card.formatted_name(), Some("X"));
        assert!(
            reader
                .warnings()
                .iter()
                .any(|w| w.code == WarningCode::UnmatchedEnd)
        );
    }

    #[test]
    fn embedded_agent_card_captured() {
        let input = "BEGIN:VCARD\r\nVERSION:2.1\r\nFN:Boss\r\nAGENT:\r\nBEGIN:VCARD\r\nVERSION:2.1\r\nFN:Assistant\r\nEND:VCARD\r\nEND:VCARD\r\n";
        let mut reader = VCardReader::new(input.as_bytes());
        let card = reader.read_next().unwrap().unwrap();

        let agent = card
            .properties()
            .iter()
            .find(|p| p.name == "AGENT")
            .unwrap();
        let text = agent.as_text().unwrap();
        assert!(text.starts_with("BEGIN:VCARD"));
        assert!(text.contains("FN:Assistant"));
        assert!(text.ends_with("END:VCARD"));
        assert!(
            reader
                .warnings()
                .iter()
                .any(|w| w.code == WarningCode::EmbeddedCard)
        );
        // The outer card still closed normally.
        assert_eq!(card.formatted_name(), Some("Boss"));
    }

    #[test]
    fn truncated_embedded_card_is_an_error() {
        let input = "BEGIN:VCARD\r\nVERSION:2.1\r\nAGENT:\r\nBEGIN:VCARD\r\nFN:Assistant\r\n";
        let mut reader = VCardReader::new(input.as_bytes());
        let err = reader.read_next().unwrap_err();
        assert!(matches!(err, ReadError::MalformedSyntax(_)));
        // Terminal state after an error.
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn eof_inside_card_yields_partial() {
        let mut reader = VCardReader::new(&b"BEGIN:VCARD\r\nVERSION:4.0\r\nFN:Half\r\n"[..]);
        let card = reader.read_next().unwrap().unwrap();
        assert_eq!(card.formatted_name(), Some("Half"));
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn malformed_line_skipped_with_warning() {
        let mut reader = VCardReader::new(
            &b"BEGIN:VCARD\r\nVERSION:4.0\r\nNO-COLON-HERE\r\nFN:X\r\nEND:VCARD\r\n"[..],
        );
        let card = reader.read_next().unwrap().unwrap();
        assert_eq!(card.formatted_name(), Some("X"));
        assert!(
            reader
                .warnings()
                .iter()
                .any(|w| w.code == WarningCode::MalformedLine)
        );
    }

    #[test]
    fn warnings_reset_between_cards() {
        let input = "BEGIN:VCARD\r\nFN:A\r\nEND:VCARD\r\nBEGIN:VCARD\r\nVERSION:4.0\r\nFN:B\r\nEND:VCARD\r\n";
        let mut reader = VCardReader::new(input.as_bytes());
        reader.read_next().unwrap().unwrap();
        assert!(!reader.warnings().is_empty());
        reader.read_next().unwrap().unwrap();
        assert!(reader.warnings().is_empty());
    }

    #[test]
    fn group_and_params_preserved() {
        let cards = read_all(
            "BEGIN:VCARD\r\nVERSION:4.0\r\nitem1.TEL;TYPE=home;PREF=1:tel:+15551234\r\nEND:VCARD\r\n",
        );
        let tel = &cards[0].properties()[0];
        assert!(tel.in_group("ITEM1"));
        assert_eq!(tel.params.pref(), Some(1));
    }
}
