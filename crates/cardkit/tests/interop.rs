//! Cross-format and cross-version round trips through the public API.

use cardkit::core::{Address, DateAndOrTime, Gender, GeoUri, Sex};
use cardkit::{
    PropertyKind, PropertyValue, VCard, VCardProperty, VCardReader, VCardVersion, VCardWriter,
    WriterConfig, XCardReader,
};
use test_log::test;

fn plain_config() -> WriterConfig {
    WriterConfig {
        add_prod_id: false,
        version_strict: true,
    }
}

fn write_plain(cards: &[VCard], version: VCardVersion) -> String {
    let mut writer = VCardWriter::new(Vec::new(), version).with_config(plain_config());
    for card in cards {
        writer.write(card).unwrap();
    }
    String::from_utf8(writer.into_inner()).unwrap()
}

#[test]
fn prodid_stamped_by_default() {
    let mut card = VCard::new(VCardVersion::V4_0);
    card.add_property(VCardProperty::new(
        "FN",
        PropertyValue::FormattedName("X".into()),
    ));
    let out = cardkit::write_string(&[card], VCardVersion::V4_0).unwrap();
    assert!(out.contains("PRODID:cardkit "));

    let cards = cardkit::parse(&out).unwrap();
    assert_eq!(cards[0].properties_of(PropertyKind::ProductId).count(), 1);
}

#[test]
fn v21_gets_x_prodid_instead() {
    let card = VCard::new(VCardVersion::V2_1);
    let out = cardkit::write_string(&[card], VCardVersion::V2_1).unwrap();
    assert!(out.contains("X-PRODID:cardkit "));
    assert!(!out.contains("\r\nPRODID:"));
}

#[test]
fn geo_changes_form_across_versions() {
    let input = "BEGIN:VCARD\r\nVERSION:4.0\r\nGEO:geo:12.5,-45.25\r\nEND:VCARD\r\n";
    let cards = cardkit::parse(input).unwrap();

    let v3 = write_plain(&cards, VCardVersion::V3_0);
    assert!(v3.contains("GEO:12.5;-45.25\r\n"));

    let v4 = write_plain(&cards, VCardVersion::V4_0);
    assert!(v4.contains("GEO:geo:12.5,-45.25\r\n"));
}

#[test]
fn label_param_becomes_companion_property_at_v3() {
    let mut card = VCard::new(VCardVersion::V4_0);
    let mut adr = VCardProperty::new(
        "ADR",
        PropertyValue::Address(Address {
            street: vec!["123 Main St".into()],
            locality: vec!["Anytown".into()],
            ..Address::new()
        }),
    );
    adr.params.put("TYPE", "home");
    adr.params.put("LABEL", "123 Main St\nAnytown");
    card.add_property(adr);

    let out = write_plain(&[card.clone()], VCardVersion::V3_0);
    assert!(out.contains("ADR;TYPE=home:;;123 Main St;Anytown;;;\r\n"));
    assert!(out.contains("LABEL;TYPE=home:123 Main St\\nAnytown\r\n"));

    // At 4.0 the parameter stays on the ADR, caret-encoded.
    let out = write_plain(&[card], VCardVersion::V4_0);
    assert!(out.contains("LABEL=123 Main St^nAnytown"));
    assert!(!out.contains("\r\nLABEL:"));
}

#[test]
fn version_strict_filters_on_downgrade() {
    let input = "BEGIN:VCARD\r\nVERSION:4.0\r\nFN:X\r\nLANG:en\r\nGENDER:F\r\nEND:VCARD\r\n";
    let cards = cardkit::parse(input).unwrap();

    let v3 = write_plain(&cards, VCardVersion::V3_0);
    assert!(v3.contains("FN:X\r\n"));
    assert!(!v3.contains("LANG"));
    assert!(!v3.contains("GENDER"));
}

#[test]
fn quoted_printable_round_trip_at_v21() {
    let mut card = VCard::new(VCardVersion::V2_1);
    card.add_property(VCardProperty::new(
        "NOTE",
        PropertyValue::Note("héllo\nwörld".into()),
    ));
    let out = write_plain(&[card], VCardVersion::V2_1);
    assert!(out.contains("ENCODING=QUOTED-PRINTABLE"));

    let cards = cardkit::parse(&out).unwrap();
    let note: Vec<_> = cards[0].properties_of(PropertyKind::Note).collect();
    assert_eq!(note[0].value, PropertyValue::Note("héllo\nwörld".into()));
}

#[test]
fn unknown_property_round_trips_verbatim() {
    let input = "BEGIN:VCARD\r\nVERSION:4.0\r\nX-SPIN;X-RATE=33:what,ever;here\r\nEND:VCARD\r\n";
    let cards = cardkit::parse(input).unwrap();
    let out = write_plain(&cards, VCardVersion::V4_0);
    assert!(out.contains("X-SPIN;X-RATE=33:what,ever;here\r\n"));
}

#[test]
fn caret_encoded_params_round_trip() {
    let mut card = VCard::new(VCardVersion::V4_0);
    let mut prop = VCardProperty::new("FN", PropertyValue::FormattedName("X".into()));
    prop.params.put("X-NOTE", "he said \"hi\"\nthen ^ left");
    card.add_property(prop);

    let out = write_plain(&[card], VCardVersion::V4_0);
    let cards = cardkit::parse(&out).unwrap();
    assert_eq!(
        cards[0].properties()[0].params.first("X-NOTE"),
        Some("he said \"hi\"\nthen ^ left")
    );
}

#[test]
fn text_to_xcard_conversion() {
    let input = "BEGIN:VCARD\r\nVERSION:4.0\r\nFN:John Doe\r\nTEL;TYPE=home:tel:+15551234\r\nEND:VCARD\r\n";
    let cards = cardkit::parse(input).unwrap();

    let xml = cardkit::write_xml_string(&cards).unwrap();
    assert!(xml.contains("<fn><text>John Doe</text></fn>"));
    assert!(xml.contains("<uri>tel:+15551234</uri>"));
    assert!(xml.contains("<parameters><type><text>home</text></type></parameters>"));

    let back = cardkit::parse_xml(&xml).unwrap();
    assert_eq!(back[0].formatted_name(), Some("John Doe"));
}

#[test]
fn xcard_to_text_conversion() {
    let ns = "urn:ietf:params:xml:ns:vcard-4.0";
    let xml = format!(
        r#"<vcards xmlns="{ns}"><vcard><fn><text>Jane</text></fn><bday><date-and-or-time>19840302</date-and-or-time></bday></vcard></vcards>"#
    );
    let cards = cardkit::parse_xml(&xml).unwrap();

    let out = write_plain(&cards, VCardVersion::V4_0);
    assert!(out.contains("FN:Jane\r\n"));
    assert!(out.contains("BDAY:19840302\r\n"));

    // Downgrading re-renders the date in extended form.
    let out = write_plain(&cards, VCardVersion::V3_0);
    assert!(out.contains("BDAY:1984-03-02\r\n"));
}

#[test]
fn typed_payloads_survive_a_full_cycle() {
    let mut card = VCard::new(VCardVersion::V4_0);
    card.add_property(VCardProperty::new(
        "GENDER",
        PropertyValue::Gender(Gender {
            sex: Some(Sex::Other),
            identity: Some("fluid".into()),
        }),
    ));
    card.add_property(VCardProperty::new(
        "ANNIVERSARY",
        PropertyValue::Anniversary(DateAndOrTime::Text("sometime in spring".into())),
    ));
    card.add_property(VCardProperty::new(
        "GEO",
        PropertyValue::Geo(GeoUri::new(48.85, 2.35)),
    ));

    let out = write_plain(&[card.clone()], VCardVersion::V4_0);
    let back = cardkit::parse(&out).unwrap();
    assert_eq!(back[0].properties(), card.properties());
}

#[test]
fn embedded_agent_survives_reading() {
    let input = "BEGIN:VCARD\r\nVERSION:2.1\r\nFN:Boss\r\nAGENT:\r\nBEGIN:VCARD\r\nVERSION:2.1\r\nFN:Helper\r\nEND:VCARD\r\nEND:VCARD\r\n";
    let mut reader = VCardReader::new(input.as_bytes());
    let card = reader.read_next().unwrap().unwrap();
    assert_eq!(card.formatted_name(), Some("Boss"));

    let agent = card
        .properties()
        .iter()
        .find(|p| p.name == "AGENT")
        .unwrap();
    assert!(agent.as_text().unwrap().contains("FN:Helper"));

    // Nothing left in the stream; the embedded card is not a record.
    assert!(reader.read_next().unwrap().is_none());
}

#[test]
fn warnings_locate_their_source() {
    let input = "BEGIN:VCARD\r\nVERSION:4.0\r\nGEO:nowhere\r\nEND:VCARD\r\n";
    let mut reader = VCardReader::new(input.as_bytes());
    reader.read_next().unwrap().unwrap();
    let warning = &reader.warnings()[0];
    assert_eq!(
        warning.locator,
        cardkit::core::WarningLocator::Line(3)
    );

    let ns = "urn:ietf:params:xml:ns:vcard-4.0";
    let xml =
        format!(r#"<vcards xmlns="{ns}"><vcard><geo><uri>nowhere</uri></geo></vcard></vcards>"#);
    let mut reader = XCardReader::new(xml.as_bytes());
    reader.read_next().unwrap().unwrap();
    let warning = &reader.warnings()[0];
    assert_eq!(
        warning.locator,
        cardkit::core::WarningLocator::Element("geo".into())
    );
}
