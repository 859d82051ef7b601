//! The built-in property scribe catalog.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::core::version::XCARD_NAMESPACE;
use crate::core::{
    Address, DateAndOrTime, Gender, GeoUri, Key, Organization, Parameters, PropertyKind,
    PropertyValue, RawValue, Sex, StructuredName, TelUri, Telephone, TimeZone, UtcOffset,
    VCardDataType, VCardProperty, VCardVersion,
};
use crate::text::encoding::{
    escape_component, escape_text, split_component, split_structured, unescape_text,
};
use crate::xml::{self, XmlElement};

use super::{PropertyScribe, ScribeError, ScribeResult};

/// Returns one instance of every built-in scribe.
#[must_use]
pub fn all() -> Vec<Arc<dyn PropertyScribe>> {
    vec![
        Arc::new(SimpleTextScribe {
            name: "FN",
            kind: PropertyKind::FormattedName,
            versions: &VCardVersion::ALL,
            make: PropertyValue::FormattedName,
        }),
        Arc::new(StructuredNameScribe),
        Arc::new(TelephoneScribe),
        Arc::new(AddressScribe),
        Arc::new(SimpleTextScribe {
            name: "EMAIL",
            kind: PropertyKind::Email,
            versions: &VCardVersion::ALL,
            make: PropertyValue::Email,
        }),
        Arc::new(OrganizationScribe),
        Arc::new(SimpleTextScribe {
            name: "NOTE",
            kind: PropertyKind::Note,
            versions: &VCardVersion::ALL,
            make: PropertyValue::Note,
        }),
        Arc::new(UrlScribe),
        Arc::new(LanguageScribe),
        Arc::new(GeoScribe),
        Arc::new(KeyScribe),
        Arc::new(TimeZoneScribe),
        Arc::new(DateScribe {
            name: "BDAY",
            kind: PropertyKind::Birthday,
            versions: &VCardVersion::ALL,
            make: PropertyValue::Birthday,
        }),
        Arc::new(DateScribe {
            name: "ANNIVERSARY",
            kind: PropertyKind::Anniversary,
            versions: &[VCardVersion::V4_0],
            make: PropertyValue::Anniversary,
        }),
        Arc::new(GenderScribe),
        Arc::new(SimpleTextScribe {
            name: "PRODID",
            kind: PropertyKind::ProductId,
            versions: &[VCardVersion::V3_0, VCardVersion::V4_0],
            make: PropertyValue::ProductId,
        }),
        Arc::new(SimpleTextScribe {
            name: "LABEL",
            kind: PropertyKind::Label,
            versions: &[VCardVersion::V2_1, VCardVersion::V3_0],
            make: PropertyValue::Label,
        }),
        Arc::new(RawScribe),
        Arc::new(XmlScribe),
    ]
}

/// Reads the first value child in the xCard namespace, skipping the
/// `<parameters>` element.
fn first_value_child(element: &XmlElement) -> Option<&XmlElement> {
    element
        .elements()
        .find(|e| e.name.namespace == XCARD_NAMESPACE && e.name.local != "parameters")
}

/// Reads `<text>` content, falling back to the element's own text runs.
fn xml_text_value(element: &XmlElement) -> String {
    element
        .child_text(XCARD_NAMESPACE, "text")
        .unwrap_or_else(|| element.text())
}

fn collect_component(element: &XmlElement, local: &str) -> Vec<String> {
    element
        .elements()
        .filter(|e| e.name.namespace == XCARD_NAMESPACE && e.name.local == local)
        .map(XmlElement::text)
        .collect()
}

fn push_component(element: &mut XmlElement, local: &str, values: &[String]) {
    for value in values {
        element.push_text_element(XCARD_NAMESPACE, local, value.clone());
    }
}

// --- Simple text-valued properties (FN, EMAIL, NOTE, PRODID, LABEL) ---

struct SimpleTextScribe {
    name: &'static str,
    kind: PropertyKind,
    versions: &'static [VCardVersion],
    make: fn(String) -> PropertyValue,
}

impl PropertyScribe for SimpleTextScribe {
    fn property_name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> PropertyKind {
        self.kind
    }

    fn supported_versions(&self) -> &'static [VCardVersion] {
        self.versions
    }

    fn default_data_type(&self, _version: VCardVersion) -> Option<VCardDataType> {
        Some(VCardDataType::TEXT)
    }

    fn parse_text(
        &self,
        value: &str,
        _data_type: VCardDataType,
        _params: &mut Parameters,
        version: VCardVersion,
    ) -> ScribeResult<PropertyValue> {
        Ok((self.make)(unescape_text(value, version)))
    }

    fn write_text(&self, property: &VCardProperty, version: VCardVersion) -> String {
        escape_text(property.as_text().unwrap_or_default(), version)
    }

    fn parse_xml(
        &self,
        element: &XmlElement,
        _params: &mut Parameters,
    ) -> ScribeResult<PropertyValue> {
        Ok((self.make)(xml_text_value(element)))
    }

    fn build_xml(&self, property: &VCardProperty) -> XmlElement {
        let mut element = XmlElement::new(self.qname());
        element.push_text_element(
            XCARD_NAMESPACE,
            "text",
            property.as_text().unwrap_or_default(),
        );
        element
    }
}

// --- N ---

struct StructuredNameScribe;

impl PropertyScribe for StructuredNameScribe {
    fn property_name(&self) -> &'static str {
        "N"
    }

    fn kind(&self) -> PropertyKind {
        PropertyKind::StructuredName
    }

    fn default_data_type(&self, _version: VCardVersion) -> Option<VCardDataType> {
        Some(VCardDataType::TEXT)
    }

    fn parse_text(
        &self,
        value: &str,
        _data_type: VCardDataType,
        _params: &mut Parameters,
        _version: VCardVersion,
    ) -> ScribeResult<PropertyValue> {
        let parts = split_structured(value);
        let component = |i: usize| parts.get(i).map_or_else(Vec::new, |s| split_component(s));

        Ok(PropertyValue::StructuredName(StructuredName {
            family: component(0),
            given: component(1),
            additional: component(2),
            prefixes: component(3),
            suffixes: component(4),
        }))
    }

    fn write_text(&self, property: &VCardProperty, _version: VCardVersion) -> String {
        let PropertyValue::StructuredName(name) = &property.value else {
            return String::new();
        };
        [
            &name.family,
            &name.given,
            &name.additional,
            &name.prefixes,
            &name.suffixes,
        ]
        .map(|component| {
            component
                .iter()
                .map(|v| escape_component(v))
                .collect::<Vec<_>>()
                .join(",")
        })
        .join(";")
    }

    fn parse_xml(
        &self,
        element: &XmlElement,
        _params: &mut Parameters,
    ) -> ScribeResult<PropertyValue> {
        Ok(PropertyValue::StructuredName(StructuredName {
            family: collect_component(element, "surname"),
            given: collect_component(element, "given"),
            additional: collect_component(element, "additional"),
            prefixes: collect_component(element, "prefix"),
            suffixes: collect_component(element, "suffix"),
        }))
    }

    fn build_xml(&self, property: &VCardProperty) -> XmlElement {
        let mut element = XmlElement::new(self.qname());
        if let PropertyValue::StructuredName(name) = &property.value {
            push_component(&mut element, "surname", &name.family);
            push_component(&mut element, "given", &name.given);
            push_component(&mut element, "additional", &name.additional);
            push_component(&mut element, "prefix", &name.prefixes);
            push_component(&mut element, "suffix", &name.suffixes);
        }
        element
    }
}

// --- TEL ---

struct TelephoneScribe;

impl PropertyScribe for TelephoneScribe {
    fn property_name(&self) -> &'static str {
        "TEL"
    }

    fn kind(&self) -> PropertyKind {
        PropertyKind::Telephone
    }

    fn default_data_type(&self, _version: VCardVersion) -> Option<VCardDataType> {
        Some(VCardDataType::TEXT)
    }

    fn parse_text(
        &self,
        value: &str,
        data_type: VCardDataType,
        _params: &mut Parameters,
        version: VCardVersion,
    ) -> ScribeResult<PropertyValue> {
        if data_type == VCardDataType::URI {
            let uri = TelUri::parse(value)
                .ok_or_else(|| ScribeError::CannotParse(format!("invalid tel URI: {value}")))?;
            return Ok(PropertyValue::Telephone(Telephone::Uri(uri)));
        }
        if let Some(uri) = TelUri::parse(value) {
            return Ok(PropertyValue::Telephone(Telephone::Uri(uri)));
        }
        Ok(PropertyValue::Telephone(Telephone::Text(unescape_text(
            value, version,
        ))))
    }

    fn write_text(&self, property: &VCardProperty, version: VCardVersion) -> String {
        match &property.value {
            PropertyValue::Telephone(Telephone::Uri(uri)) => uri.to_uri(),
            PropertyValue::Telephone(Telephone::Text(text)) => escape_text(text, version),
            _ => String::new(),
        }
    }

    fn parse_xml(
        &self,
        element: &XmlElement,
        _params: &mut Parameters,
    ) -> ScribeResult<PropertyValue> {
        if let Some(uri_text) = element.child_text(XCARD_NAMESPACE, "uri") {
            let uri = TelUri::parse(&uri_text)
                .ok_or_else(|| ScribeError::CannotParse(format!("invalid tel URI: {uri_text}")))?;
            return Ok(PropertyValue::Telephone(Telephone::Uri(uri)));
        }
        Ok(PropertyValue::Telephone(Telephone::Text(xml_text_value(
            element,
        ))))
    }

    fn build_xml(&self, property: &VCardProperty) -> XmlElement {
        let mut element = XmlElement::new(self.qname());
        match &property.value {
            PropertyValue::Telephone(Telephone::Uri(uri)) => {
                element.push_text_element(XCARD_NAMESPACE, "uri", uri.to_uri());
            }
            PropertyValue::Telephone(Telephone::Text(text)) => {
                element.push_text_element(XCARD_NAMESPACE, "text", text.clone());
            }
            _ => {}
        }
        element
    }
}

// --- ADR ---

struct AddressScribe;

impl PropertyScribe for AddressScribe {
    fn property_name(&self) -> &'static str {
        "ADR"
    }

    fn kind(&self) -> PropertyKind {
        PropertyKind::Address
    }

    fn default_data_type(&self, _version: VCardVersion) -> Option<VCardDataType> {
        Some(VCardDataType::TEXT)
    }

    fn parse_text(
        &self,
        value: &str,
        _data_type: VCardDataType,
        _params: &mut Parameters,
        _version: VCardVersion,
    ) -> ScribeResult<PropertyValue> {
        let parts = split_structured(value);
        let component = |i: usize| parts.get(i).map_or_else(Vec::new, |s| split_component(s));

        Ok(PropertyValue::Address(Address {
            po_box: component(0),
            extended: component(1),
            street: component(2),
            locality: component(3),
            region: component(4),
            postal_code: component(5),
            country: component(6),
        }))
    }

    fn write_text(&self, property: &VCardProperty, _version: VCardVersion) -> String {
        let PropertyValue::Address(adr) = &property.value else {
            return String::new();
        };
        [
            &adr.po_box,
            &adr.extended,
            &adr.street,
            &adr.locality,
            &adr.region,
            &adr.postal_code,
            &adr.country,
        ]
        .map(|component| {
            component
                .iter()
                .map(|v| escape_component(v))
                .collect::<Vec<_>>()
                .join(",")
        })
        .join(";")
    }

    fn parse_xml(
        &self,
        element: &XmlElement,
        _params: &mut Parameters,
    ) -> ScribeResult<PropertyValue> {
        Ok(PropertyValue::Address(Address {
            po_box: collect_component(element, "pobox"),
            extended: collect_component(element, "ext"),
            street: collect_component(element, "street"),
            locality: collect_component(element, "locality"),
            region: collect_component(element, "region"),
            postal_code: collect_component(element, "code"),
            country: collect_component(element, "country"),
        }))
    }

    fn build_xml(&self, property: &VCardProperty) -> XmlElement {
        let mut element = XmlElement::new(self.qname());
        if let PropertyValue::Address(adr) = &property.value {
            push_component(&mut element, "pobox", &adr.po_box);
            push_component(&mut element, "ext", &adr.extended);
            push_component(&mut element, "street", &adr.street);
            push_component(&mut element, "locality", &adr.locality);
            push_component(&mut element, "region", &adr.region);
            push_component(&mut element, "code", &adr.postal_code);
            push_component(&mut element, "country", &adr.country);
        }
        element
    }
}

// --- ORG ---

struct OrganizationScribe;

impl PropertyScribe for OrganizationScribe {
    fn property_name(&self) -> &'static str {
        "ORG"
    }

    fn kind(&self) -> PropertyKind {
        PropertyKind::Organization
    }

    fn default_data_type(&self, _version: VCardVersion) -> Option<VCardDataType> {
        Some(VCardDataType::TEXT)
    }

    fn parse_text(
        &self,
        value: &str,
        _data_type: VCardDataType,
        _params: &mut Parameters,
        version: VCardVersion,
    ) -> ScribeResult<PropertyValue> {
        let parts = split_structured(value);
        let name = parts
            .first()
            .map_or_else(String::new, |s| unescape_text(s, version));
        let units = parts
            .iter()
            .skip(1)
            .map(|s| unescape_text(s, version))
            .collect();
        Ok(PropertyValue::Organization(Organization { name, units }))
    }

    fn write_text(&self, property: &VCardProperty, _version: VCardVersion) -> String {
        let PropertyValue::Organization(org) = &property.value else {
            return String::new();
        };
        let mut parts = vec![escape_component(&org.name)];
        parts.extend(org.units.iter().map(|u| escape_component(u)));
        parts.join(";")
    }

    fn parse_xml(
        &self,
        element: &XmlElement,
        _params: &mut Parameters,
    ) -> ScribeResult<PropertyValue> {
        let mut texts = collect_component(element, "text").into_iter();
        let name = texts.next().unwrap_or_default();
        Ok(PropertyValue::Organization(Organization {
            name,
            units: texts.collect(),
        }))
    }

    fn build_xml(&self, property: &VCardProperty) -> XmlElement {
        let mut element = XmlElement::new(self.qname());
        if let PropertyValue::Organization(org) = &property.value {
            element.push_text_element(XCARD_NAMESPACE, "text", org.name.clone());
            push_component(&mut element, "text", &org.units);
        }
        element
    }
}

// --- URL ---

struct UrlScribe;

impl PropertyScribe for UrlScribe {
    fn property_name(&self) -> &'static str {
        "URL"
    }

    fn kind(&self) -> PropertyKind {
        PropertyKind::Url
    }

    fn default_data_type(&self, version: VCardVersion) -> Option<VCardDataType> {
        match version {
            VCardVersion::V2_1 => Some(VCardDataType::URL),
            VCardVersion::V3_0 | VCardVersion::V4_0 => Some(VCardDataType::URI),
        }
    }

    fn parse_text(
        &self,
        value: &str,
        _data_type: VCardDataType,
        _params: &mut Parameters,
        _version: VCardVersion,
    ) -> ScribeResult<PropertyValue> {
        // URIs are not subject to text escaping.
        Ok(PropertyValue::Url(value.to_string()))
    }

    fn write_text(&self, property: &VCardProperty, _version: VCardVersion) -> String {
        match &property.value {
            PropertyValue::Url(url) => url.clone(),
            _ => String::new(),
        }
    }

    fn parse_xml(
        &self,
        element: &XmlElement,
        _params: &mut Parameters,
    ) -> ScribeResult<PropertyValue> {
        let uri = element
            .child_text(XCARD_NAMESPACE, "uri")
            .unwrap_or_else(|| element.text());
        Ok(PropertyValue::Url(uri))
    }

    fn build_xml(&self, property: &VCardProperty) -> XmlElement {
        let mut element = XmlElement::new(self.qname());
        if let PropertyValue::Url(url) = &property.value {
            element.push_text_element(XCARD_NAMESPACE, "uri", url.clone());
        }
        element
    }
}

// --- LANG ---

struct LanguageScribe;

impl PropertyScribe for LanguageScribe {
    fn property_name(&self) -> &'static str {
        "LANG"
    }

    fn kind(&self) -> PropertyKind {
        PropertyKind::Language
    }

    fn supported_versions(&self) -> &'static [VCardVersion] {
        &[VCardVersion::V4_0]
    }

    fn default_data_type(&self, _version: VCardVersion) -> Option<VCardDataType> {
        Some(VCardDataType::LANGUAGE_TAG)
    }

    fn parse_text(
        &self,
        value: &str,
        _data_type: VCardDataType,
        _params: &mut Parameters,
        _version: VCardVersion,
    ) -> ScribeResult<PropertyValue> {
        Ok(PropertyValue::Language(value.to_string()))
    }

    fn write_text(&self, property: &VCardProperty, _version: VCardVersion) -> String {
        match &property.value {
            PropertyValue::Language(tag) => tag.clone(),
            _ => String::new(),
        }
    }

    fn parse_xml(
        &self,
        element: &XmlElement,
        _params: &mut Parameters,
    ) -> ScribeResult<PropertyValue> {
        let tag = element
            .child_text(XCARD_NAMESPACE, "language-tag")
            .unwrap_or_else(|| element.text());
        Ok(PropertyValue::Language(tag))
    }

    fn build_xml(&self, property: &VCardProperty) -> XmlElement {
        let mut element = XmlElement::new(self.qname());
        if let PropertyValue::Language(tag) = &property.value {
            element.push_text_element(XCARD_NAMESPACE, "language-tag", tag.clone());
        }
        element
    }
}

// --- GEO ---

struct GeoScribe;

impl GeoScribe {
    fn parse_value(value: &str) -> Option<GeoUri> {
        if let Some(geo) = GeoUri::parse(value) {
            return Some(geo);
        }
        // 2.1/3.0 form: latitude;longitude
        let (lat, lon) = value.split_once(';')?;
        Some(GeoUri::new(
            lat.trim().parse().ok()?,
            lon.trim().parse().ok()?,
        ))
    }
}

impl PropertyScribe for GeoScribe {
    fn property_name(&self) -> &'static str {
        "GEO"
    }

    fn kind(&self) -> PropertyKind {
        PropertyKind::Geo
    }

    fn default_data_type(&self, version: VCardVersion) -> Option<VCardDataType> {
        match version {
            VCardVersion::V4_0 => Some(VCardDataType::URI),
            VCardVersion::V2_1 | VCardVersion::V3_0 => None,
        }
    }

    fn parse_text(
        &self,
        value: &str,
        _data_type: VCardDataType,
        _params: &mut Parameters,
        _version: VCardVersion,
    ) -> ScribeResult<PropertyValue> {
        Self::parse_value(value)
            .map(PropertyValue::Geo)
            .ok_or_else(|| ScribeError::CannotParse(format!("invalid geo value: {value}")))
    }

    fn write_text(&self, property: &VCardProperty, version: VCardVersion) -> String {
        let PropertyValue::Geo(geo) = &property.value else {
            return String::new();
        };
        match version {
            VCardVersion::V4_0 => geo.to_uri(),
            VCardVersion::V2_1 | VCardVersion::V3_0 => {
                format!("{};{}", geo.latitude, geo.longitude)
            }
        }
    }

    fn parse_xml(
        &self,
        element: &XmlElement,
        _params: &mut Parameters,
    ) -> ScribeResult<PropertyValue> {
        let uri = element
            .child_text(XCARD_NAMESPACE, "uri")
            .unwrap_or_else(|| element.text());
        GeoUri::parse(&uri)
            .map(PropertyValue::Geo)
            .ok_or_else(|| ScribeError::CannotParse(format!("invalid geo URI: {uri}")))
    }

    fn build_xml(&self, property: &VCardProperty) -> XmlElement {
        let mut element = XmlElement::new(self.qname());
        if let PropertyValue::Geo(geo) = &property.value {
            element.push_text_element(XCARD_NAMESPACE, "uri", geo.to_uri());
        }
        element
    }
}

// --- KEY ---

struct KeyScribe;

impl KeyScribe {
    fn decode_base64(data: &str) -> ScribeResult<Vec<u8>> {
        let compact: String = data.chars().filter(|c| !c.is_whitespace()).collect();
        BASE64
            .decode(compact)
            .map_err(|err| ScribeError::CannotParse(format!("invalid base64 data: {err}")))
    }

    fn parse_data_uri(value: &str) -> ScribeResult<Key> {
        let Some((header, data)) = value.split_once(',') else {
            return Err(ScribeError::CannotParse("malformed data URI".into()));
        };
        if header.to_ascii_lowercase().ends_with(";base64") {
            Ok(Key::Binary(Self::decode_base64(data)?))
        } else {
            Ok(Key::Uri(value.to_string()))
        }
    }
}

impl PropertyScribe for KeyScribe {
    fn property_name(&self) -> &'static str {
        "KEY"
    }

    fn kind(&self) -> PropertyKind {
        PropertyKind::Key
    }

    fn default_data_type(&self, version: VCardVersion) -> Option<VCardDataType> {
        match version {
            VCardVersion::V4_0 => Some(VCardDataType::URI),
            VCardVersion::V2_1 | VCardVersion::V3_0 => None,
        }
    }

    fn parse_text(
        &self,
        value: &str,
        data_type: VCardDataType,
        params: &mut Parameters,
        _version: VCardVersion,
    ) -> ScribeResult<PropertyValue> {
        let base64_declared = params.encoding().is_some_and(|e| {
            e.eq_ignore_ascii_case("BASE64") || e.eq_ignore_ascii_case("B")
        });

        let key = if base64_declared || data_type == VCardDataType::BINARY {
            Key::Binary(Self::decode_base64(value)?)
        } else if value.len() >= 5 && value[..5].eq_ignore_ascii_case("data:") {
            Self::parse_data_uri(value)?
        } else {
            Key::Uri(value.to_string())
        };
        Ok(PropertyValue::Key(key))
    }

    fn write_text(&self, property: &VCardProperty, version: VCardVersion) -> String {
        match &property.value {
            PropertyValue::Key(Key::Uri(uri)) => uri.clone(),
            PropertyValue::Key(Key::Binary(data)) => {
                let encoded = BASE64.encode(data);
                if version == VCardVersion::V4_0 {
                    format!("data:application/octet-stream;base64,{encoded}")
                } else {
                    encoded
                }
            }
            _ => String::new(),
        }
    }

    fn parse_xml(
        &self,
        element: &XmlElement,
        _params: &mut Parameters,
    ) -> ScribeResult<PropertyValue> {
        let value = element
            .child_text(XCARD_NAMESPACE, "uri")
            .or_else(|| element.child_text(XCARD_NAMESPACE, "text"))
            .unwrap_or_else(|| element.text());
        if value.len() >= 5 && value[..5].eq_ignore_ascii_case("data:") {
            return Ok(PropertyValue::Key(Self::parse_data_uri(&value)?));
        }
        Ok(PropertyValue::Key(Key::Uri(value)))
    }

    fn build_xml(&self, property: &VCardProperty) -> XmlElement {
        let mut element = XmlElement::new(self.qname());
        match &property.value {
            PropertyValue::Key(Key::Uri(uri)) => {
                element.push_text_element(XCARD_NAMESPACE, "uri", uri.clone());
            }
            PropertyValue::Key(Key::Binary(data)) => {
                element.push_text_element(
                    XCARD_NAMESPACE,
                    "uri",
                    format!("data:application/octet-stream;base64,{}", BASE64.encode(data)),
                );
            }
            _ => {}
        }
        element
    }
}

// --- TZ ---

struct TimeZoneScribe;

impl PropertyScribe for TimeZoneScribe {
    fn property_name(&self) -> &'static str {
        "TZ"
    }

    fn kind(&self) -> PropertyKind {
        PropertyKind::TimeZone
    }

    fn default_data_type(&self, version: VCardVersion) -> Option<VCardDataType> {
        match version {
            VCardVersion::V4_0 => Some(VCardDataType::TEXT),
            VCardVersion::V2_1 | VCardVersion::V3_0 => Some(VCardDataType::UTC_OFFSET),
        }
    }

    fn parse_text(
        &self,
        value: &str,
        data_type: VCardDataType,
        _params: &mut Parameters,
        version: VCardVersion,
    ) -> ScribeResult<PropertyValue> {
        if let Some(offset) = UtcOffset::parse(value) {
            return Ok(PropertyValue::TimeZone(TimeZone::Offset(offset)));
        }
        if data_type == VCardDataType::UTC_OFFSET {
            return Err(ScribeError::CannotParse(format!(
                "invalid UTC offset: {value}"
            )));
        }
        Ok(PropertyValue::TimeZone(TimeZone::Text(unescape_text(
            value, version,
        ))))
    }

    fn write_text(&self, property: &VCardProperty, version: VCardVersion) -> String {
        match &property.value {
            PropertyValue::TimeZone(TimeZone::Offset(offset)) => match version {
                VCardVersion::V4_0 => offset.to_basic(),
                VCardVersion::V2_1 | VCardVersion::V3_0 => offset.to_extended(),
            },
            PropertyValue::TimeZone(TimeZone::Text(text)) => escape_text(text, version),
            _ => String::new(),
        }
    }

    fn parse_xml(
        &self,
        element: &XmlElement,
        _params: &mut Parameters,
    ) -> ScribeResult<PropertyValue> {
        if let Some(offset_text) = element.child_text(XCARD_NAMESPACE, "utc-offset") {
            let offset = UtcOffset::parse(&offset_text).ok_or_else(|| {
                ScribeError::CannotParse(format!("invalid UTC offset: {offset_text}"))
            })?;
            return Ok(PropertyValue::TimeZone(TimeZone::Offset(offset)));
        }
        Ok(PropertyValue::TimeZone(TimeZone::Text(xml_text_value(
            element,
        ))))
    }

    fn build_xml(&self, property: &VCardProperty) -> XmlElement {
        let mut element = XmlElement::new(self.qname());
        match &property.value {
            PropertyValue::TimeZone(TimeZone::Offset(offset)) => {
                element.push_text_element(XCARD_NAMESPACE, "utc-offset", offset.to_basic());
            }
            PropertyValue::TimeZone(TimeZone::Text(text)) => {
                element.push_text_element(XCARD_NAMESPACE, "text", text.clone());
            }
            _ => {}
        }
        element
    }
}

// --- BDAY / ANNIVERSARY ---

struct DateScribe {
    name: &'static str,
    kind: PropertyKind,
    versions: &'static [VCardVersion],
    make: fn(DateAndOrTime) -> PropertyValue,
}

impl DateScribe {
    fn date_of<'a>(&self, property: &'a VCardProperty) -> Option<&'a DateAndOrTime> {
        match &property.value {
            PropertyValue::Birthday(d) | PropertyValue::Anniversary(d) => Some(d),
            _ => None,
        }
    }
}

impl PropertyScribe for DateScribe {
    fn property_name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> PropertyKind {
        self.kind
    }

    fn supported_versions(&self) -> &'static [VCardVersion] {
        self.versions
    }

    fn default_data_type(&self, version: VCardVersion) -> Option<VCardDataType> {
        match version {
            VCardVersion::V4_0 => Some(VCardDataType::DATE_AND_OR_TIME),
            VCardVersion::V2_1 | VCardVersion::V3_0 => Some(VCardDataType::DATE),
        }
    }

    fn parse_text(
        &self,
        value: &str,
        data_type: VCardDataType,
        _params: &mut Parameters,
        version: VCardVersion,
    ) -> ScribeResult<PropertyValue> {
        if data_type == VCardDataType::TEXT && version == VCardVersion::V4_0 {
            return Ok((self.make)(DateAndOrTime::Text(unescape_text(value, version))));
        }
        // A nested date parse failure is recovered as CannotParse.
        DateAndOrTime::parse(value)
            .map(self.make)
            .ok_or_else(|| ScribeError::CannotParse(format!("invalid date value: {value}")))
    }

    fn write_text(&self, property: &VCardProperty, version: VCardVersion) -> String {
        match (self.date_of(property), version) {
            (Some(DateAndOrTime::Text(text)), _) => escape_text(text, version),
            (Some(date), VCardVersion::V4_0) => date.to_basic(),
            (Some(date), _) => date.to_extended(),
            (None, _) => String::new(),
        }
    }

    fn parse_xml(
        &self,
        element: &XmlElement,
        _params: &mut Parameters,
    ) -> ScribeResult<PropertyValue> {
        if let Some(text) = element.child_text(XCARD_NAMESPACE, "text") {
            return Ok((self.make)(DateAndOrTime::Text(text)));
        }
        let value =
            first_value_child(element).map_or_else(|| element.text(), XmlElement::text);
        DateAndOrTime::parse(&value)
            .map(self.make)
            .ok_or_else(|| ScribeError::CannotParse(format!("invalid date value: {value}")))
    }

    fn build_xml(&self, property: &VCardProperty) -> XmlElement {
        let mut element = XmlElement::new(self.qname());
        match self.date_of(property) {
            Some(DateAndOrTime::Text(text)) => {
                element.push_text_element(XCARD_NAMESPACE, "text", text.clone());
            }
            Some(date) => {
                element.push_text_element(XCARD_NAMESPACE, "date-and-or-time", date.to_basic());
            }
            None => {}
        }
        element
    }
}

// --- GENDER ---

struct GenderScribe;

impl PropertyScribe for GenderScribe {
    fn property_name(&self) -> &'static str {
        "GENDER"
    }

    fn kind(&self) -> PropertyKind {
        PropertyKind::Gender
    }

    fn supported_versions(&self) -> &'static [VCardVersion] {
        &[VCardVersion::V4_0]
    }

    fn default_data_type(&self, _version: VCardVersion) -> Option<VCardDataType> {
        Some(VCardDataType::TEXT)
    }

    fn parse_text(
        &self,
        value: &str,
        _data_type: VCardDataType,
        _params: &mut Parameters,
        version: VCardVersion,
    ) -> ScribeResult<PropertyValue> {
        let parts = split_structured(value);
        let sex = parts
            .first()
            .and_then(|s| s.chars().next())
            .and_then(Sex::from_char);
        let identity = parts
            .get(1)
            .filter(|s| !s.is_empty())
            .map(|s| unescape_text(s, version));
        Ok(PropertyValue::Gender(Gender { sex, identity }))
    }

    fn write_text(&self, property: &VCardProperty, _version: VCardVersion) -> String {
        let PropertyValue::Gender(gender) = &property.value else {
            return String::new();
        };
        let sex = gender
            .sex
            .map_or_else(String::new, |s| s.as_char().to_string());
        match &gender.identity {
            Some(identity) => format!("{sex};{}", escape_component(identity)),
            None => sex,
        }
    }

    fn parse_xml(
        &self,
        element: &XmlElement,
        _params: &mut Parameters,
    ) -> ScribeResult<PropertyValue> {
        let sex = element
            .child_text(XCARD_NAMESPACE, "sex")
            .and_then(|s| s.chars().next())
            .and_then(Sex::from_char);
        let identity = element
            .child_text(XCARD_NAMESPACE, "identity")
            .filter(|s| !s.is_empty());
        Ok(PropertyValue::Gender(Gender { sex, identity }))
    }

    fn build_xml(&self, property: &VCardProperty) -> XmlElement {
        let mut element = XmlElement::new(self.qname());
        if let PropertyValue::Gender(gender) = &property.value {
            if let Some(sex) = gender.sex {
                element.push_text_element(XCARD_NAMESPACE, "sex", sex.as_char().to_string());
            }
            if let Some(identity) = &gender.identity {
                element.push_text_element(XCARD_NAMESPACE, "identity", identity.clone());
            }
        }
        element
    }
}

// --- Raw fallback ---

/// Emit-side codec for properties with no registered scribe match.
///
/// Never dispatched by name; the readers construct raw payloads
/// directly on a lookup miss.
struct RawScribe;

impl PropertyScribe for RawScribe {
    fn property_name(&self) -> &'static str {
        ""
    }

    fn kind(&self) -> PropertyKind {
        PropertyKind::Raw
    }

    fn default_data_type(&self, _version: VCardVersion) -> Option<VCardDataType> {
        None
    }

    fn parse_text(
        &self,
        value: &str,
        data_type: VCardDataType,
        _params: &mut Parameters,
        _version: VCardVersion,
    ) -> ScribeResult<PropertyValue> {
        Ok(PropertyValue::Raw(RawValue::new(value, data_type)))
    }

    fn write_text(&self, property: &VCardProperty, _version: VCardVersion) -> String {
        match &property.value {
            // Preserved verbatim; the original escaping is kept.
            PropertyValue::Raw(raw) => raw.value.clone(),
            _ => String::new(),
        }
    }

    fn parse_xml(
        &self,
        element: &XmlElement,
        _params: &mut Parameters,
    ) -> ScribeResult<PropertyValue> {
        Ok(PropertyValue::Raw(RawValue::new(
            element.text(),
            VCardDataType::TEXT,
        )))
    }

    fn build_xml(&self, property: &VCardProperty) -> XmlElement {
        let mut element = XmlElement::in_ns(XCARD_NAMESPACE, property.name.to_ascii_lowercase());
        if let PropertyValue::Raw(raw) = &property.value {
            element.push_text_element(
                XCARD_NAMESPACE,
                raw.data_type.name().to_string(),
                raw.value.clone(),
            );
        }
        element
    }
}

// --- XML property / foreign subtree fallback ---

/// Handles the 4.0 XML property and preserved foreign xCard subtrees.
struct XmlScribe;

impl PropertyScribe for XmlScribe {
    fn property_name(&self) -> &'static str {
        "XML"
    }

    fn kind(&self) -> PropertyKind {
        PropertyKind::Xml
    }

    fn supported_versions(&self) -> &'static [VCardVersion] {
        &[VCardVersion::V4_0]
    }

    fn default_data_type(&self, _version: VCardVersion) -> Option<VCardDataType> {
        Some(VCardDataType::TEXT)
    }

    fn parse_text(
        &self,
        value: &str,
        _data_type: VCardDataType,
        _params: &mut Parameters,
        version: VCardVersion,
    ) -> ScribeResult<PropertyValue> {
        let unescaped = unescape_text(value, version);
        xml::parse_fragment(&unescaped)
            .map(PropertyValue::Xml)
            .map_err(|err| ScribeError::CannotParse(format!("invalid XML payload: {err}")))
    }

    fn write_text(&self, property: &VCardProperty, version: VCardVersion) -> String {
        match &property.value {
            PropertyValue::Xml(element) => match xml::write_fragment(element) {
                Ok(serialized) => escape_text(&serialized, version),
                Err(_) => String::new(),
            },
            _ => String::new(),
        }
    }

    fn parse_xml(
        &self,
        element: &XmlElement,
        _params: &mut Parameters,
    ) -> ScribeResult<PropertyValue> {
        // An <xml> wrapper carries one payload element; a foreign
        // subtree arrives here whole.
        let payload = if element.name.local == "xml" && element.name.namespace == XCARD_NAMESPACE {
            element
                .elements()
                .find(|e| !(e.name.namespace == XCARD_NAMESPACE && e.name.local == "parameters"))
                .cloned()
                .unwrap_or_else(|| element.clone())
        } else {
            element.clone()
        };
        Ok(PropertyValue::Xml(payload))
    }

    fn build_xml(&self, property: &VCardProperty) -> XmlElement {
        match &property.value {
            // The stored subtree root keeps its own qualified name.
            PropertyValue::Xml(element) => element.clone(),
            _ => XmlElement::new(self.qname()),
        }
    }
}
