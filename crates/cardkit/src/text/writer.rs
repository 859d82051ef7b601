//! Streaming writer for the textual vCard syntaxes.

use std::io::Write;

use crate::core::{
    DateAndOrTime, Parameters, PropertyKind, PropertyValue, VCard, VCardDataType, VCardProperty,
    VCardVersion,
};
use crate::error::WriteResult;
use crate::plan::{self, WriterConfig};
use crate::scribe::ScribeIndex;

use super::encoding::encode_quoted_printable;

/// Octet budget of one physical line, line terminator excluded.
const FOLD_LIMIT: usize = 75;

/// Writes cards in the textual syntax of a fixed target version.
///
/// Lines are CRLF-terminated and folded at 75 octets on UTF-8 character
/// boundaries. At 2.1, values carrying newlines or non-ASCII text are
/// emitted quoted-printable instead of folded.
pub struct VCardWriter<W: Write> {
    sink: W,
    version: VCardVersion,
    config: WriterConfig,
    index: ScribeIndex,
}

impl<W: Write> VCardWriter<W> {
    /// Creates a writer targeting the given version.
    pub fn new(sink: W, version: VCardVersion) -> Self {
        Self {
            sink,
            version,
            config: WriterConfig::default(),
            index: ScribeIndex::default(),
        }
    }

    /// Replaces the writer configuration.
    #[must_use]
    pub fn with_config(mut self, config: WriterConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the scribe index.
    #[must_use]
    pub fn with_index(mut self, index: ScribeIndex) -> Self {
        self.index = index;
        self
    }

    /// The target version.
    #[must_use]
    pub const fn version(&self) -> VCardVersion {
        self.version
    }

    /// Writes one card.
    ///
    /// ## Errors
    /// `UnregisteredProperty` before any bytes are written when the
    /// card holds kinds the index does not cover; I/O errors otherwise.
    pub fn write(&mut self, card: &VCard) -> WriteResult<()> {
        let props = plan::prepare(card, self.version, &self.config, &self.index)?;

        let mut buf = String::new();
        buf.push_str("BEGIN:VCARD\r\n");
        buf.push_str("VERSION:");
        buf.push_str(self.version.as_str());
        buf.push_str("\r\n");
        for prop in &props {
            self.format_property(prop, &mut buf);
        }
        buf.push_str("END:VCARD\r\n");

        self.sink.write_all(buf.as_bytes())?;
        Ok(())
    }

    /// Flushes the underlying sink.
    ///
    /// ## Errors
    /// Fails when the sink fails.
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.sink.flush()
    }

    /// Unwraps the writer, returning the sink.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.sink
    }

    fn format_property(&self, prop: &VCardProperty, buf: &mut String) {
        let Some(scribe) = self.index.for_kind(prop.kind()) else {
            return;
        };
        let value = scribe.write_text(prop, self.version);

        let mut line = String::new();
        if let Some(group) = &prop.group {
            line.push_str(group);
            line.push('.');
        }
        line.push_str(&prop.name);
        push_params(&mut line, &prop.params, self.version);
        if let Some(data_type) = declared_value_type(prop, self.version) {
            line.push_str(";VALUE=");
            line.push_str(data_type.name());
        }

        if self.version == VCardVersion::V2_1 && needs_quoted_printable(&value) {
            line.push_str(";ENCODING=QUOTED-PRINTABLE;CHARSET=UTF-8:");
            buf.push_str(&line);
            buf.push_str(&encode_quoted_printable(&value, line.len()));
            buf.push_str("\r\n");
            return;
        }

        line.push(':');
        line.push_str(&value);
        fold_into(buf, &line);
    }
}

/// The VALUE parameter to re-declare, when the payload's wire form
/// would otherwise be read back under a different default.
fn declared_value_type(prop: &VCardProperty, version: VCardVersion) -> Option<VCardDataType> {
    match &prop.value {
        PropertyValue::Birthday(DateAndOrTime::Text(_))
        | PropertyValue::Anniversary(DateAndOrTime::Text(_))
            if version == VCardVersion::V4_0 =>
        {
            Some(VCardDataType::TEXT)
        }
        PropertyValue::Raw(raw)
            if prop.kind() == PropertyKind::Raw
                && raw.data_type != VCardDataType::TEXT
                && version.supports(raw.data_type) =>
        {
            Some(raw.data_type)
        }
        _ => None,
    }
}

fn push_params(line: &mut String, params: &Parameters, version: VCardVersion) {
    for param in params {
        if version == VCardVersion::V2_1 {
            // No quoting mechanism; one name=value pair per value.
            for value in &param.values {
                line.push(';');
                line.push_str(&param.name);
                line.push('=');
                line.push_str(&value.replace(['\r', '\n'], " "));
            }
        } else {
            line.push(';');
            line.push_str(&param.name);
            line.push('=');
            for (i, value) in param.values.iter().enumerate() {
                if i > 0 {
                    line.push(',');
                }
                line.push_str(&encode_param_value(value));
            }
        }
    }
}

/// Applies RFC 6868 caret encoding and quotes values holding
/// structural characters.
fn encode_param_value(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '^' => encoded.push_str("^^"),
            '"' => encoded.push_str("^'"),
            '\n' => encoded.push_str("^n"),
            '\r' => {}
            _ => encoded.push(c),
        }
    }
    if encoded.contains([';', ':', ',']) {
        format!("\"{encoded}\"")
    } else {
        encoded
    }
}

fn needs_quoted_printable(value: &str) -> bool {
    value
        .bytes()
        .any(|b| b == b'\r' || b == b'\n' || !b.is_ascii() || b.is_ascii_control())
}

/// Appends the line folded at [`FOLD_LIMIT`] octets, splitting only on
/// character boundaries. Continuation lines start with a single space
/// that counts toward their budget.
fn fold_into(buf: &mut String, line: &str) {
    if line.len() <= FOLD_LIMIT {
        buf.push_str(line);
        buf.push_str("\r\n");
        return;
    }

    let mut used = 0;
    for c in line.chars() {
        let width = c.len_utf8();
        if used + width > FOLD_LIMIT {
            buf.push_str("\r\n ");
            used = 1;
        }
        buf.push(c);
        used += width;
    }
    buf.push_str("\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Address, StructuredName};
    use test_log::test;

    fn plain_config() -> WriterConfig {
        WriterConfig {
            add_prod_id: false,
            version_strict: true,
        }
    }

    fn write_card(card: &VCard, version: VCardVersion) -> String {
        let mut writer = VCardWriter::new(Vec::new(), version).with_config(plain_config());
        writer.write(card).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn writes_envelope_and_version() {
        let card = VCard::new(VCardVersion::V4_0);
        let out = write_card(&card, VCardVersion::V4_0);
        assert_eq!(out, "BEGIN:VCARD\r\nVERSION:4.0\r\nEND:VCARD\r\n");
    }

    #[test]
    fn writes_structured_name() {
        let mut card = VCard::new(VCardVersion::V4_0);
        card.add_property(VCardProperty::new(
            "N",
            PropertyValue::StructuredName(StructuredName {
                family: vec!["House".into()],
                given: vec!["Gregory".into()],
                ..StructuredName::new()
            }),
        ));
        let out = write_card(&card, VCardVersion::V4_0);
        assert!(out.contains("N:House;Gregory;;;\r\n"));
    }

    #[test]
    fn folds_long_lines_at_75_octets() {
        let mut card = VCard::new(VCardVersion::V4_0);
        card.add_property(VCardProperty::new(
            "NOTE",
            PropertyValue::Note("x".repeat(200)),
        ));
        let out = write_card(&card, VCardVersion::V4_0);
        for line in out.split("\r\n") {
            assert!(line.len() <= 75, "physical line too long: {}", line.len());
        }
        // Unfolds back to the original.
        let unfolded = out.replace("\r\n ", "");
        assert!(unfolded.contains(&format!("NOTE:{}", "x".repeat(200))));
    }

    #[test]
    fn folding_respects_utf8_boundaries() {
        let mut card = VCard::new(VCardVersion::V4_0);
        card.add_property(VCardProperty::new(
            "NOTE",
            PropertyValue::Note("é".repeat(100)),
        ));
        let out = write_card(&card, VCardVersion::V4_0);
        for line in out.split("\r\n") {
            assert!(line.len() <= 75);
            // Would panic on a split inside a code point.
            let _ = line.chars().count();
        }
    }

    #[test]
    fn v21_non_ascii_goes_quoted_printable() {
        let mut card = VCard::new(VCardVersion::V2_1);
        card.add_property(VCardProperty::new(
            "NOTE",
            PropertyValue::Note("café".into()),
        ));
        let out = write_card(&card, VCardVersion::V2_1);
        assert!(out.contains("NOTE;ENCODING=QUOTED-PRINTABLE;CHARSET=UTF-8:caf=C3=A9"));
    }

    #[test]
    fn v4_param_quoted_when_structural() {
        let mut card = VCard::new(VCardVersion::V4_0);
        let mut adr = VCardProperty::new(
            "ADR",
            PropertyValue::Address(Address {
                street: vec!["123 Main St".into()],
                ..Address::new()
            }),
        );
        adr.params.put("LABEL", "a;b:c,d");
        card.add_property(adr);
        let out = write_card(&card, VCardVersion::V4_0);
        assert!(out.contains(";LABEL=\"a;b:c,d\":"));
    }

    #[test]
    fn param_newline_caret_encoded() {
        let mut card = VCard::new(VCardVersion::V4_0);
        let mut adr = VCardProperty::new(
            "ADR",
            PropertyValue::Address(Address::new()),
        );
        adr.params.put("LABEL", "line1\nline2");
        card.add_property(adr);
        let out = write_card(&card, VCardVersion::V4_0);
        assert!(out.contains("LABEL=line1^nline2"));
    }

    #[test]
    fn group_prefix_written() {
        let mut card = VCard::new(VCardVersion::V4_0);
        let mut prop = VCardProperty::new("FN", PropertyValue::FormattedName("X".into()));
        prop.set_group(Some("item1".into()));
        card.add_property(prop);
        let out = write_card(&card, VCardVersion::V4_0);
        assert!(out.contains("item1.FN:X\r\n"));
    }

    #[test]
    fn text_bday_redeclares_value_type() {
        let mut card = VCard::new(VCardVersion::V4_0);
        card.add_property(VCardProperty::new(
            "BDAY",
            PropertyValue::Birthday(DateAndOrTime::Text("circa 1800".into())),
        ));
        let out = write_card(&card, VCardVersion::V4_0);
        assert!(out.contains("BDAY;VALUE=text:circa 1800\r\n"));
    }

    #[test]
    fn unregistered_kind_writes_nothing() {
        let mut card = VCard::new(VCardVersion::V4_0);
        card.add_property(VCardProperty::new(
            "FN",
            PropertyValue::FormattedName("X".into()),
        ));
        let mut writer = VCardWriter::new(Vec::new(), VCardVersion::V4_0)
            .with_index(ScribeIndex::empty())
            .with_config(plain_config());
        assert!(writer.write(&card).is_err());
        assert!(writer.into_inner().is_empty());
    }

    #[test]
    fn round_trip_through_reader() {
        let mut card = VCard::new(VCardVersion::V4_0);
        card.add_property(VCardProperty::new(
            "FN",
            PropertyValue::FormattedName("John, Jr.; Esq.".into()),
        ));
        card.add_property(VCardProperty::new(
            "NOTE",
            PropertyValue::Note("line1\nline2".into()),
        ));
        let out = write_card(&card, VCardVersion::V4_0);

        let mut reader = crate::text::VCardReader::new(out.as_bytes());
        let back = reader.read_next().unwrap().unwrap();
        assert_eq!(back.formatted_name(), Some("John, Jr.; Esq."));
        let note: Vec<_> = back.properties_of(PropertyKind::Note).collect();
        assert_eq!(note[0].value, PropertyValue::Note("line1\nline2".into()));
    }
}
