//! vCard version model.

use super::data_type::VCardDataType;

/// The xCard XML namespace (RFC 6351 §4).
pub const XCARD_NAMESPACE: &str = "urn:ietf:params:xml:ns:vcard-4.0";

/// A vCard specification version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VCardVersion {
    /// vCard 2.1 (imc/Versit specification).
    V2_1,
    /// vCard 3.0 (RFC 2426).
    V3_0,
    /// vCard 4.0 (RFC 6350).
    V4_0,
}

impl VCardVersion {
    /// All versions, oldest first.
    pub const ALL: [Self; 3] = [Self::V2_1, Self::V3_0, Self::V4_0];

    /// Returns the version string as it appears on the VERSION property.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V2_1 => "2.1",
            Self::V3_0 => "3.0",
            Self::V4_0 => "4.0",
        }
    }

    /// Parses a VERSION property value.
    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s.trim() {
            "2.1" => Some(Self::V2_1),
            "3.0" => Some(Self::V3_0),
            "4.0" => Some(Self::V4_0),
            _ => None,
        }
    }

    /// Returns the XML namespace this version serializes under.
    ///
    /// Only 4.0 has an XML binding (xCard, RFC 6351).
    #[must_use]
    pub const fn xml_namespace(self) -> Option<&'static str> {
        match self {
            Self::V4_0 => Some(XCARD_NAMESPACE),
            Self::V2_1 | Self::V3_0 => None,
        }
    }

    /// Returns whether this version defines the given data type.
    ///
    /// `url` and `content-id` are 2.1-only, `binary` is 3.0-only,
    /// the date/number/language kinds are restricted per RFC 2426 and
    /// RFC 6350. Data types outside the predefined set are accepted by
    /// every version.
    #[must_use]
    pub fn supports(self, data_type: VCardDataType) -> bool {
        use VCardDataType as T;

        if data_type == T::URL || data_type == T::CONTENT_ID {
            return self == Self::V2_1;
        }
        if data_type == T::BINARY {
            return self == Self::V3_0;
        }
        if data_type == T::URI
            || data_type == T::TEXT
            || data_type == T::DATE
            || data_type == T::TIME
            || data_type == T::DATE_TIME
        {
            return matches!(self, Self::V3_0 | Self::V4_0);
        }
        if data_type == T::DATE_AND_OR_TIME
            || data_type == T::TIMESTAMP
            || data_type == T::BOOLEAN
            || data_type == T::INTEGER
            || data_type == T::FLOAT
            || data_type == T::UTC_OFFSET
            || data_type == T::LANGUAGE_TAG
        {
            return self == Self::V4_0;
        }

        // Ad-hoc data types are not version gated.
        true
    }
}

impl std::fmt::Display for VCardVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
