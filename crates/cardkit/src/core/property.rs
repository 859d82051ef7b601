//! Property objects and their typed payloads.

use super::data_type::VCardDataType;
use super::datetime::{DateAndOrTime, UtcOffset};
use super::parameter::Parameters;
use super::structured::{Address, Gender, GeoUri, Organization, StructuredName, TelUri};
use super::version::VCardVersion;
use crate::xml::XmlElement;

/// A telephone number: free text or a `tel:` URI (4.0).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Telephone {
    /// Plain text number.
    Text(String),
    /// Parsed `tel:` URI.
    Uri(TelUri),
}

/// A cryptographic key: a URI reference or inline binary data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// URI reference (including data: URIs left unexpanded).
    Uri(String),
    /// Inline binary data, decoded from base64.
    Binary(Vec<u8>),
}

/// A time zone: a UTC offset or descriptive text (4.0).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeZone {
    /// Fixed UTC offset.
    Offset(UtcOffset),
    /// Olson name or other descriptive text.
    Text(String),
}

/// An uninterpreted property payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RawValue {
    /// The payload exactly as it appeared on the wire (unescaped).
    pub value: String,
    /// The declared or defaulted data type.
    pub data_type: VCardDataType,
}

impl RawValue {
    /// Creates a raw value.
    #[must_use]
    pub fn new(value: impl Into<String>, data_type: VCardDataType) -> Self {
        Self {
            value: value.into(),
            data_type,
        }
    }
}

/// The typed payload of a property.
///
/// One variant per built-in property, plus `Raw` for properties with no
/// registered scribe and `Xml` for preserved foreign xCard subtrees.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// FN.
    FormattedName(String),
    /// N.
    StructuredName(StructuredName),
    /// TEL.
    Telephone(Telephone),
    /// ADR.
    Address(Address),
    /// EMAIL.
    Email(String),
    /// ORG.
    Organization(Organization),
    /// NOTE.
    Note(String),
    /// URL.
    Url(String),
    /// LANG (4.0 only).
    Language(String),
    /// GEO.
    Geo(GeoUri),
    /// KEY.
    Key(Key),
    /// TZ.
    TimeZone(TimeZone),
    /// BDAY.
    Birthday(DateAndOrTime),
    /// ANNIVERSARY (4.0 only).
    Anniversary(DateAndOrTime),
    /// GENDER (4.0 only).
    Gender(Gender),
    /// PRODID (3.0/4.0).
    ProductId(String),
    /// LABEL (2.1/3.0), also synthesized from ADR label parameters.
    Label(String),
    /// Fallback for properties with no registered scribe.
    Raw(RawValue),
    /// Preserved foreign xCard subtree.
    Xml(XmlElement),
}

/// The payload tag of a property, used for emit-side scribe dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// FN.
    FormattedName,
    /// N.
    StructuredName,
    /// TEL.
    Telephone,
    /// ADR.
    Address,
    /// EMAIL.
    Email,
    /// ORG.
    Organization,
    /// NOTE.
    Note,
    /// URL.
    Url,
    /// LANG.
    Language,
    /// GEO.
    Geo,
    /// KEY.
    Key,
    /// TZ.
    TimeZone,
    /// BDAY.
    Birthday,
    /// ANNIVERSARY.
    Anniversary,
    /// GENDER.
    Gender,
    /// PRODID.
    ProductId,
    /// LABEL.
    Label,
    /// Raw fallback.
    Raw,
    /// XML fallback.
    Xml,
}

impl PropertyKind {
    /// A stable display name for error reporting.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FormattedName => "FormattedName",
            Self::StructuredName => "StructuredName",
            Self::Telephone => "Telephone",
            Self::Address => "Address",
            Self::Email => "Email",
            Self::Organization => "Organization",
            Self::Note => "Note",
            Self::Url => "Url",
            Self::Language => "Language",
            Self::Geo => "Geo",
            Self::Key => "Key",
            Self::TimeZone => "TimeZone",
            Self::Birthday => "Birthday",
            Self::Anniversary => "Anniversary",
            Self::Gender => "Gender",
            Self::ProductId => "ProductId",
            Self::Label => "Label",
            Self::Raw => "Raw",
            Self::Xml => "Xml",
        }
    }

    /// Returns the versions this property kind may be written to.
    #[must_use]
    pub const fn supported_versions(self) -> &'static [VCardVersion] {
        use VCardVersion::{V2_1, V3_0, V4_0};
        match self {
            Self::Language | Self::Gender | Self::Anniversary => &[V4_0],
            Self::Label => &[V2_1, V3_0],
            Self::ProductId => &[V3_0, V4_0],
            Self::Xml => &[V4_0],
            _ => &[V2_1, V3_0, V4_0],
        }
    }

    /// Returns whether this kind may be written to the given version.
    #[must_use]
    pub fn is_supported_by(self, version: VCardVersion) -> bool {
        self.supported_versions().contains(&version)
    }
}

/// A single vCard property: name, optional group, parameters, payload.
#[derive(Debug, Clone, PartialEq)]
pub struct VCardProperty {
    /// Optional property group (e.g., "item1" in "item1.TEL").
    /// Non-empty when present; case preserved, comparison insensitive.
    pub group: Option<String>,
    /// Property name (normalized to uppercase).
    pub name: String,
    /// Parameters in order of appearance.
    pub params: Parameters,
    /// Typed payload.
    pub value: PropertyValue,
}

impl VCardProperty {
    /// Creates a property with no group or parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            group: None,
            name: name.into().to_ascii_uppercase(),
            params: Parameters::new(),
            value,
        }
    }

    /// Creates a raw property.
    #[must_use]
    pub fn raw(
        name: impl Into<String>,
        value: impl Into<String>,
        data_type: VCardDataType,
    ) -> Self {
        Self::new(name, PropertyValue::Raw(RawValue::new(value, data_type)))
    }

    /// Returns the payload tag of this property.
    #[must_use]
    pub const fn kind(&self) -> PropertyKind {
        match &self.value {
            PropertyValue::FormattedName(_) => PropertyKind::FormattedName,
            PropertyValue::StructuredName(_) => PropertyKind::StructuredName,
            PropertyValue::Telephone(_) => PropertyKind::Telephone,
            PropertyValue::Address(_) => PropertyKind::Address,
            PropertyValue::Email(_) => PropertyKind::Email,
            PropertyValue::Organization(_) => PropertyKind::Organization,
            PropertyValue::Note(_) => PropertyKind::Note,
            PropertyValue::Url(_) => PropertyKind::Url,
            PropertyValue::Language(_) => PropertyKind::Language,
            PropertyValue::Geo(_) => PropertyKind::Geo,
            PropertyValue::Key(_) => PropertyKind::Key,
            PropertyValue::TimeZone(_) => PropertyKind::TimeZone,
            PropertyValue::Birthday(_) => PropertyKind::Birthday,
            PropertyValue::Anniversary(_) => PropertyKind::Anniversary,
            PropertyValue::Gender(_) => PropertyKind::Gender,
            PropertyValue::ProductId(_) => PropertyKind::ProductId,
            PropertyValue::Label(_) => PropertyKind::Label,
            PropertyValue::Raw(_) => PropertyKind::Raw,
            PropertyValue::Xml(_) => PropertyKind::Xml,
        }
    }

    /// Returns whether this property may be written to the version.
    #[must_use]
    pub fn is_supported_by(&self, version: VCardVersion) -> bool {
        self.kind().is_supported_by(version)
    }

    /// Sets the group, normalizing empty to `None`.
    pub fn set_group(&mut self, group: Option<String>) {
        self.group = group.filter(|g| !g.is_empty());
    }

    /// Returns whether this property belongs to the named group
    /// (case-insensitive).
    #[must_use]
    pub fn in_group(&self, group: &str) -> bool {
        self.group
            .as_deref()
            .is_some_and(|g| g.eq_ignore_ascii_case(group))
    }

    /// Returns the payload as text for the simple text-valued kinds.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            PropertyValue::FormattedName(s)
            | PropertyValue::Email(s)
            | PropertyValue::Note(s)
            | PropertyValue::Url(s)
            | PropertyValue::Language(s)
            | PropertyValue::ProductId(s)
            | PropertyValue::Label(s) => Some(s),
            PropertyValue::Raw(raw) => Some(&raw.value),
            _ => None,
        }
    }
}
