//! xCard (RFC 6351) reading.

use std::collections::VecDeque;
use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::core::version::XCARD_NAMESPACE;
use crate::core::{
    ParseWarning, Parameters, PropertyValue, VCard, VCardDataType, VCardProperty, VCardVersion,
    WarningCode,
};
use crate::error::{ReadError, ReadResult};
use crate::scribe::{ScribeError, ScribeIndex};

use super::element::{XmlElement, XmlName};

/// Pull reader producing one [`VCard`] per `<vcard>` element.
///
/// The document is tokenized in full on the first `read_next()` call;
/// subsequent calls hand out the remaining cards without touching the
/// source. All cards read as 4.0. Elements outside the xCard namespace
/// are preserved verbatim as XML-payload properties.
pub struct XCardReader<R: BufRead> {
    source: Option<R>,
    cards: VecDeque<XmlElement>,
    index: ScribeIndex,
    warnings: Vec<ParseWarning>,
}

impl<R: BufRead> XCardReader<R> {
    /// Creates a reader with the built-in scribe catalog.
    pub fn new(source: R) -> Self {
        Self::with_index(source, ScribeIndex::default())
    }

    /// Creates a reader dispatching through the given index.
    pub fn with_index(source: R, index: ScribeIndex) -> Self {
        Self {
            source: Some(source),
            cards: VecDeque::new(),
            index,
            warnings: Vec::new(),
        }
    }

    /// The warnings accumulated by the most recent `read_next()` call.
    #[must_use]
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// Reads the next card, or `None` when the document is exhausted.
    ///
    /// ## Errors
    /// Fails on malformed XML or I/O failure; the reader then reports
    /// end-of-stream.
    pub fn read_next(&mut self) -> ReadResult<Option<VCard>> {
        self.warnings.clear();
        if let Some(source) = self.source.take() {
            let root = read_document(source)?;
            if let Some(root) = root {
                collect_vcards(&root, &mut self.cards);
            }
        }
        let Some(element) = self.cards.pop_front() else {
            return Ok(None);
        };
        Ok(Some(self.convert_card(&element)))
    }

    fn convert_card(&mut self, element: &XmlElement) -> VCard {
        let mut card = VCard::new(VCardVersion::V4_0);
        for child in element.elements() {
            if child.name.namespace == XCARD_NAMESPACE && child.name.local == "group" {
                let group = child.attribute("name").map(String::from);
                for nested in child.elements() {
                    if let Some(mut prop) = self.convert_property(nested) {
                        prop.set_group(group.clone());
                        card.add_property(prop);
                    }
                }
            } else if let Some(prop) = self.convert_property(child) {
                card.add_property(prop);
            }
        }
        card
    }

    fn convert_property(&mut self, element: &XmlElement) -> Option<VCardProperty> {
        let mut params = extract_parameters(element);

        // VERSION may legally appear; the element itself implies 4.0.
        if element.name.namespace == XCARD_NAMESPACE && element.name.local == "version" {
            return None;
        }

        // Dispatch by full qualified name, so a scribe registered under
        // a foreign QName still gets its elements.
        let Some(scribe) = self.index.for_qname(&element.name).cloned() else {
            if element.name.namespace != XCARD_NAMESPACE {
                // Foreign subtree, preserved for round-tripping.
                tracing::debug!(
                    namespace = %element.name.namespace,
                    local = %element.name.local,
                    "preserving foreign property element"
                );
                let mut prop = VCardProperty::new("XML", PropertyValue::Xml(element.clone()));
                prop.params = params;
                return Some(prop);
            }
            return Some(raw_property(element, params));
        };

        match scribe.parse_xml(element, &mut params) {
            Ok(payload) => {
                let mut prop = VCardProperty::new(scribe.property_name(), payload);
                prop.params = params;
                Some(prop)
            }
            Err(ScribeError::SkipMe(reason)) => {
                self.warnings.push(ParseWarning::at_element(
                    element.name.local.clone(),
                    WarningCode::PropertySkipped,
                    reason,
                ));
                None
            }
            Err(ScribeError::CannotParse(reason)) => {
                self.warnings.push(ParseWarning::at_element(
                    element.name.local.clone(),
                    WarningCode::PropertyDemoted,
                    reason,
                ));
                // The subtree survives as an XML payload.
                let mut prop = VCardProperty::new("XML", PropertyValue::Xml(element.clone()));
                prop.params = params;
                Some(prop)
            }
        }
    }
}

/// Reads `<parameters>` into a map; value elements become the values.
/// Elements outside the xCard namespace carry no meaning here and are
/// dropped, at both the parameter and the value level.
fn extract_parameters(element: &XmlElement) -> Parameters {
    let mut params = Parameters::new();
    let Some(container) = element.child(XCARD_NAMESPACE, "parameters") else {
        return params;
    };
    for param in container.elements() {
        if param.name.namespace != XCARD_NAMESPACE {
            continue;
        }
        let name = param.name.local.to_ascii_uppercase();
        let mut had_children = false;
        for value in param.elements() {
            if value.name.namespace != XCARD_NAMESPACE {
                continue;
            }
            had_children = true;
            params.put(&name, value.text());
        }
        if !had_children {
            let text = param.text();
            if !text.trim().is_empty() {
                params.put(&name, text);
            }
        }
    }
    params
}

/// Builds a raw property from an unregistered xCard-namespace element.
fn raw_property(element: &XmlElement, params: Parameters) -> VCardProperty {
    let value_child = element
        .elements()
        .find(|e| e.name.namespace == XCARD_NAMESPACE && e.name.local != "parameters");
    let (value, data_type) = match value_child {
        Some(child) if child.name.local == "unknown" => (child.text(), VCardDataType::TEXT),
        Some(child) => (child.text(), VCardDataType::get(&child.name.local)),
        None => (element.text(), VCardDataType::TEXT),
    };
    let mut prop = VCardProperty::raw(element.name.local.to_ascii_uppercase(), value, data_type);
    prop.params = params;
    prop
}

/// Gathers `<vcard>` elements from anywhere in the document: a
/// `<vcards>` collection, a bare card, or either nested under foreign
/// wrapper elements.
fn collect_vcards(element: &XmlElement, out: &mut VecDeque<XmlElement>) {
    if element.name.namespace == XCARD_NAMESPACE {
        match element.name.local.as_str() {
            "vcard" => {
                out.push_back(element.clone());
                return;
            }
            "vcards" => {
                for child in element.elements() {
                    if child.name.namespace == XCARD_NAMESPACE && child.name.local == "vcard" {
                        out.push_back(child.clone());
                    }
                }
                return;
            }
            _ => {}
        }
    }
    for child in element.elements() {
        collect_vcards(child, out);
    }
}

/// Materializes the document into an element tree.
///
/// Namespace declarations are tracked by scope and resolved into the
/// qualified names; the declarations themselves are not kept as
/// attributes. Prefixes carry no meaning beyond resolution.
fn read_document<R: BufRead>(source: R) -> ReadResult<Option<XmlElement>> {
    let mut reader = Reader::from_reader(source);
    let mut buf = Vec::new();
    let mut namespaces: Vec<(String, String)> = Vec::new();
    let mut marks: Vec<usize> = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root = None;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let element = open_element(&reader, e, &mut namespaces, &mut marks)?;
                stack.push(element);
            }
            Ok(Event::Empty(ref e)) => {
                let element = open_element(&reader, e, &mut namespaces, &mut marks)?;
                namespaces.truncate(marks.pop().unwrap_or(0));
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::End(_)) => {
                namespaces.truncate(marks.pop().unwrap_or(0));
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(parent) = stack.last_mut() {
                    let decoded = reader.decoder().decode(e.as_ref())?;
                    parent.push_text(decoded.into_owned());
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(parent) = stack.last_mut() {
                    let decoded = reader.decoder().decode(e.as_ref())?;
                    parent.push_text(decoded.into_owned());
                }
            }
            Ok(Event::GeneralRef(ref e)) => {
                if let Some(parent) = stack.last_mut() {
                    let name = reader.decoder().decode(e.as_ref())?;
                    if let Some(resolved) = resolve_entity(&name) {
                        parent.push_text(resolved);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(err.into()),
            _ => {}
        }
    }

    Ok(root)
}

fn open_element<R: BufRead>(
    reader: &Reader<R>,
    e: &BytesStart<'_>,
    namespaces: &mut Vec<(String, String)>,
    marks: &mut Vec<usize>,
) -> ReadResult<XmlElement> {
    marks.push(namespaces.len());

    let mut attributes = Vec::new();
    for attr in e.attributes().flatten() {
        let key = reader.decoder().decode(attr.key.as_ref())?.into_owned();
        let value = unescape_entities(&reader.decoder().decode(&attr.value)?);
        if let Some(prefix) = key.strip_prefix("xmlns:") {
            namespaces.push((prefix.to_string(), value));
        } else if key == "xmlns" {
            namespaces.push((String::new(), value));
        } else {
            attributes.push((key, value));
        }
    }

    let name = reader.decoder().decode(e.name().as_ref())?.into_owned();
    let (prefix, local) = match name.split_once(':') {
        Some((prefix, local)) => (prefix, local),
        None => ("", name.as_str()),
    };
    let namespace = namespaces
        .iter()
        .rev()
        .find(|(p, _)| p == prefix)
        .map_or_else(String::new, |(_, uri)| uri.clone());

    Ok(XmlElement {
        name: XmlName::new(namespace, local),
        attributes,
        children: Vec::new(),
    })
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => {
            parent.push_element(element);
        }
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

/// Resolves a general entity reference to its replacement text.
fn resolve_entity(name: &str) -> Option<String> {
    match name {
        "amp" => Some("&".to_string()),
        "lt" => Some("<".to_string()),
        "gt" => Some(">".to_string()),
        "quot" => Some("\"".to_string()),
        "apos" => Some("'".to_string()),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value).map(String::from)
        }
    }
}

/// Expands the predefined entities in attribute values.
fn unescape_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 1..];
        match rest.find(';') {
            Some(end) => {
                match resolve_entity(&rest[..end]) {
                    Some(resolved) => out.push_str(&resolved),
                    None => {
                        out.push('&');
                        out.push_str(&rest[..=end]);
                    }
                }
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
            }
        }
    }
    out.push_str(rest);
    out
}

/// Parses a standalone XML fragment into an element tree.
///
/// ## Errors
/// Fails when the fragment is malformed or holds no root element.
pub fn parse_fragment(input: &str) -> ReadResult<XmlElement> {
    read_document(input.as_bytes())?.ok_or_else(|| {
        ReadError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "XML fragment holds no element",
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Key, PropertyKind, Telephone};
    use test_log::test;

    const NS: &str = "urn:ietf:params:xml:ns:vcard-4.0";

    fn read_all(input: &str) -> Vec<VCard> {
        let mut reader = XCardReader::new(input.as_bytes());
        let mut cards = Vec::new();
        while let Some(card) = reader.read_next().unwrap() {
            cards.push(card);
        }
        cards
    }

    #[test]
    fn reads_basic_document() {
        let xml = format!(
            r#"<vcards xmlns="{NS}"><vcard><fn><text>John Doe</text></fn><n><surname>Doe</surname><given>John</given></n></vcard></vcards>"#
        );
        let cards = read_all(&xml);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].version(), VCardVersion::V4_0);
        assert_eq!(cards[0].formatted_name(), Some("John Doe"));
        let name = cards[0].structured_name().unwrap();
        assert_eq!(name.family, vec!["Doe"]);
        assert_eq!(name.given, vec!["John"]);
    }

    #[test]
    fn vcards_collections_under_wrapper_root() {
        // Cards must surface even when <vcards> elements sit below a
        // foreign wrapper root, and a document may hold several.
        let xml = format!(
            r#"<wrapper xmlns="urn:example:envelope"><vcards xmlns="{NS}"><vcard><fn><text>Dr. Gregory House M.D.</text></fn></vcard></vcards><vcards xmlns="{NS}"><vcard><fn><text>Dr. Lisa Cuddy M.D.</text></fn></vcard></vcards></wrapper>"#
        );
        let cards = read_all(&xml);
        let names: Vec<_> = cards.iter().filter_map(VCard::formatted_name).collect();
        assert_eq!(
            names,
            vec!["Dr. Gregory House M.D.", "Dr. Lisa Cuddy M.D."]
        );
    }

    #[test]
    fn single_vcard_root_accepted() {
        let xml = format!(r#"<vcard xmlns="{NS}"><fn><text>Solo</text></fn></vcard>"#);
        let cards = read_all(&xml);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].formatted_name(), Some("Solo"));
    }

    #[test]
    fn parameters_extracted() {
        let xml = format!(
            r#"<vcards xmlns="{NS}"><vcard><tel><parameters><type><text>home</text><text>voice</text></type><pref><integer>1</integer></pref></parameters><uri>tel:+15551234</uri></tel></vcard></vcards>"#
        );
        let cards = read_all(&xml);
        let tel = &cards[0].properties()[0];
        let types: Vec<_> = tel.params.types().collect();
        assert_eq!(types, vec!["home", "voice"]);
        assert_eq!(tel.params.pref(), Some(1));
        assert!(matches!(
            tel.value,
            PropertyValue::Telephone(Telephone::Uri(_))
        ));
    }

    #[test]
    fn foreign_elements_inside_parameters_dropped() {
        // Only xCard-namespace elements are significant inside
        // <parameters>: a foreign parameter element and a foreign value
        // child must both be ignored.
        let xml = format!(
            r#"<vcards xmlns="{NS}"><vcard><tel><parameters><ignore xmlns="urn:example:other">bar</ignore><pref><junk xmlns="urn:example:other">bar</junk><integer>1</integer><integer>2</integer></pref></parameters><uri>tel:+15551234</uri></tel></vcard></vcards>"#
        );
        let cards = read_all(&xml);
        let tel = &cards[0].properties()[0];
        assert!(tel.params.get("IGNORE").is_none());
        assert_eq!(tel.params.get("PREF").unwrap().values, vec!["1", "2"]);
    }

    #[test]
    fn group_element_assigns_group() {
        let xml = format!(
            r#"<vcards xmlns="{NS}"><vcard><group name="item1"><fn><text>Grouped</text></fn></group></vcard></vcards>"#
        );
        let cards = read_all(&xml);
        let prop = &cards[0].properties()[0];
        assert!(prop.in_group("item1"));
    }

    #[test]
    fn namespace_prefixes_resolve() {
        let xml = format!(
            r#"<v:vcards xmlns:v="{NS}"><v:vcard><v:fn><v:text>Prefixed</v:text></v:fn></v:vcard></v:vcards>"#
        );
        let cards = read_all(&xml);
        assert_eq!(cards[0].formatted_name(), Some("Prefixed"));
    }

    #[test]
    fn wrong_namespace_is_not_dispatched() {
        // An <fn> outside the xCard namespace must not parse as FN.
        let xml = format!(
            r#"<vcards xmlns="{NS}"><vcard><fn xmlns="urn:example:other"><text>Impostor</text></fn></vcard></vcards>"#
        );
        let cards = read_all(&xml);
        assert!(cards[0].formatted_name().is_none());
        let xml_props: Vec<_> = cards[0].properties_of(PropertyKind::Xml).collect();
        assert_eq!(xml_props.len(), 1);
        match &xml_props[0].value {
            PropertyValue::Xml(element) => {
                assert_eq!(element.name.namespace, "urn:example:other");
            }
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn scribe_registered_under_foreign_qname_dispatched() {
        struct SaluteScribe;

        impl crate::scribe::PropertyScribe for SaluteScribe {
            fn property_name(&self) -> &'static str {
                "X-SALUTE"
            }

            fn kind(&self) -> crate::core::PropertyKind {
                crate::core::PropertyKind::Raw
            }

            fn qname(&self) -> XmlName {
                XmlName::new("urn:example:salute", "salute")
            }

            fn default_data_type(&self, _version: VCardVersion) -> Option<VCardDataType> {
                Some(VCardDataType::TEXT)
            }

            fn parse_text(
                &self,
                value: &str,
                data_type: VCardDataType,
                _params: &mut Parameters,
                _version: VCardVersion,
            ) -> crate::scribe::ScribeResult<PropertyValue> {
                Ok(PropertyValue::Raw(crate::core::RawValue::new(
                    value, data_type,
                )))
            }

            fn write_text(&self, property: &VCardProperty, _version: VCardVersion) -> String {
                property.as_text().unwrap_or_default().to_string()
            }

            fn parse_xml(
                &self,
                element: &XmlElement,
                _params: &mut Parameters,
            ) -> crate::scribe::ScribeResult<PropertyValue> {
                Ok(PropertyValue::Raw(crate::core::RawValue::new(
                    element.text(),
                    VCardDataType::TEXT,
                )))
            }

            fn build_xml(&self, property: &VCardProperty) -> XmlElement {
                let mut element = XmlElement::new(self.qname());
                element.push_text(property.as_text().unwrap_or_default().to_string());
                element
            }
        }

        let xml = format!(
            r#"<vcards xmlns="{NS}"><vcard><salute xmlns="urn:example:salute">ahoy</salute></vcard></vcards>"#
        );
        let mut index = ScribeIndex::default();
        index.register(std::sync::Arc::new(SaluteScribe));
        let mut reader = XCardReader::with_index(xml.as_bytes(), index);
        let card = reader.read_next().unwrap().unwrap();

        let prop = &card.properties()[0];
        assert_eq!(prop.name, "X-SALUTE");
        assert_eq!(prop.as_text(), Some("ahoy"));
        assert_eq!(card.properties_of(PropertyKind::Xml).count(), 0);
    }

    #[test]
    fn unknown_xcard_property_kept_raw() {
        let xml = format!(
            r#"<vcards xmlns="{NS}"><vcard><x-spin><text>clockwise</text></x-spin></vcard></vcards>"#
        );
        let cards = read_all(&xml);
        let raw: Vec<_> = cards[0].properties_of(PropertyKind::Raw).collect();
        assert_eq!(raw[0].name, "X-SPIN");
        assert_eq!(raw[0].as_text(), Some("clockwise"));
    }

    #[test]
    fn unparsable_value_demoted_to_xml_with_warning() {
        let xml = format!(
            r#"<vcards xmlns="{NS}"><vcard><geo><uri>not-a-geo</uri></geo></vcard></vcards>"#
        );
        let mut reader = XCardReader::new(xml.as_bytes());
        let card = reader.read_next().unwrap().unwrap();
        assert!(
            reader
                .warnings()
                .iter()
                .any(|w| w.code == WarningCode::PropertyDemoted)
        );
        assert_eq!(card.properties_of(PropertyKind::Xml).count(), 1);
    }

    #[test]
    fn multiple_cards_pulled_one_at_a_time() {
        let xml = format!(
            r#"<vcards xmlns="{NS}"><vcard><fn><text>A</text></fn></vcard><vcard><fn><text>B</text></fn></vcard></vcards>"#
        );
        let mut reader = XCardReader::new(xml.as_bytes());
        assert_eq!(
            reader.read_next().unwrap().unwrap().formatted_name(),
            Some("A")
        );
        assert_eq!(
            reader.read_next().unwrap().unwrap().formatted_name(),
            Some("B")
        );
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn key_data_uri_from_xml() {
        let xml = format!(
            r#"<vcards xmlns="{NS}"><vcard><key><uri>data:application/pgp-keys;base64,AQID</uri></key></vcard></vcards>"#
        );
        let cards = read_all(&xml);
        let key = &cards[0].properties()[0];
        assert_eq!(key.value, PropertyValue::Key(Key::Binary(vec![1, 2, 3])));
    }

    #[test]
    fn entities_in_text_resolved() {
        let xml = format!(
            r#"<vcards xmlns="{NS}"><vcard><fn><text>A &amp; B &lt;C&gt;</text></fn></vcard></vcards>"#
        );
        let cards = read_all(&xml);
        assert_eq!(cards[0].formatted_name(), Some("A & B <C>"));
    }

    #[test]
    fn malformed_document_is_an_error() {
        let mut reader = XCardReader::new(&b"<vcards><vcard></vcards>"[..]);
        assert!(reader.read_next().is_err());
        // Terminal after the error.
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn parse_fragment_returns_root() {
        let element = parse_fragment(r#"<a xmlns="urn:x" id="1"><b>hi</b></a>"#).unwrap();
        assert_eq!(element.name.namespace, "urn:x");
        assert_eq!(element.attribute("id"), Some("1"));
        assert_eq!(element.child_text("urn:x", "b"), Some("hi".into()));
    }
}
