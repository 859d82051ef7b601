//! Structured property value types.
//!
//! These types represent the compound payloads of N, ADR, ORG, GENDER,
//! and the URI shapes used by TEL and GEO.

/// Structured name (the N property).
///
/// All components are optional; each holds zero or more values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredName {
    /// Family names (surnames).
    pub family: Vec<String>,
    /// Given names (first names).
    pub given: Vec<String>,
    /// Additional names (middle names).
    pub additional: Vec<String>,
    /// Honorific prefixes (e.g., "Mr.", "Dr.").
    pub prefixes: Vec<String>,
    /// Honorific suffixes (e.g., "Jr.", "M.D.").
    pub suffixes: Vec<String>,
}

impl StructuredName {
    /// Creates an empty structured name.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a structured name with family and given names.
    #[must_use]
    pub fn simple(family: impl Into<String>, given: impl Into<String>) -> Self {
        Self {
            family: vec![family.into()],
            given: vec![given.into()],
            ..Self::default()
        }
    }

    /// Returns whether all components are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.family.is_empty()
            && self.given.is_empty()
            && self.additional.is_empty()
            && self.prefixes.is_empty()
            && self.suffixes.is_empty()
    }
}

/// Delivery address (the ADR property).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    /// Post office box.
    pub po_box: Vec<String>,
    /// Extended address (e.g., apartment or suite number).
    pub extended: Vec<String>,
    /// Street address.
    pub street: Vec<String>,
    /// Locality (city).
    pub locality: Vec<String>,
    /// Region (state or province).
    pub region: Vec<String>,
    /// Postal code.
    pub postal_code: Vec<String>,
    /// Country name.
    pub country: Vec<String>,
}

impl Address {
    /// Creates an empty address.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether all components are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.po_box.is_empty()
            && self.extended.is_empty()
            && self.street.is_empty()
            && self.locality.is_empty()
            && self.region.is_empty()
            && self.postal_code.is_empty()
            && self.country.is_empty()
    }
}

/// Organization (the ORG property).
///
/// First component is the organizational name, subsequent components
/// are units in decreasing specificity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Organization {
    /// Organization name.
    pub name: String,
    /// Organizational units (department, division, etc.).
    pub units: Vec<String>,
}

impl Organization {
    /// Creates an organization with just a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            units: Vec::new(),
        }
    }

    /// Creates an organization with name and units.
    #[must_use]
    pub fn with_units(name: impl Into<String>, units: Vec<String>) -> Self {
        Self {
            name: name.into(),
            units,
        }
    }
}

/// Gender (the GENDER property, 4.0 only).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gender {
    /// Sex component: M, F, O, N, or U.
    pub sex: Option<Sex>,
    /// Gender identity text (free-form).
    pub identity: Option<String>,
}

impl Gender {
    /// Creates a gender with just the sex component.
    #[must_use]
    pub fn sex(sex: Sex) -> Self {
        Self {
            sex: Some(sex),
            identity: None,
        }
    }

    /// Creates a gender with just identity text.
    #[must_use]
    pub fn identity(text: impl Into<String>) -> Self {
        Self {
            sex: None,
            identity: Some(text.into()),
        }
    }
}

/// Sex component of the GENDER property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    /// Male.
    Male,
    /// Female.
    Female,
    /// Other.
    Other,
    /// None or not applicable.
    None,
    /// Unknown.
    Unknown,
}

impl Sex {
    /// Parses from the single-character code.
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'M' | 'm' => Some(Self::Male),
            'F' | 'f' => Some(Self::Female),
            'O' | 'o' => Some(Self::Other),
            'N' | 'n' => Some(Self::None),
            'U' | 'u' => Some(Self::Unknown),
            _ => Option::None,
        }
    }

    /// Returns the single-character code.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Male => 'M',
            Self::Female => 'F',
            Self::Other => 'O',
            Self::None => 'N',
            Self::Unknown => 'U',
        }
    }
}

/// Telephone URI (RFC 3966).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelUri {
    /// The telephone number (global or local).
    pub number: String,
    /// Extension, if any.
    pub extension: Option<String>,
}

impl TelUri {
    /// Creates a tel URI from a phone number.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            extension: None,
        }
    }

    /// Parses a `tel:` URI string.
    #[must_use]
    pub fn parse(uri: &str) -> Option<Self> {
        let rest = strip_prefix_ignore_case(uri, "tel:")?;
        let mut parts = rest.splitn(2, ';');
        let number = parts.next()?.to_string();
        if number.is_empty() {
            return None;
        }
        let extension = parts
            .next()
            .and_then(|p| p.strip_prefix("ext="))
            .map(String::from);
        Some(Self { number, extension })
    }

    /// Formats as a `tel:` URI string.
    #[must_use]
    pub fn to_uri(&self) -> String {
        if let Some(ext) = &self.extension {
            format!("tel:{};ext={}", self.number, ext)
        } else {
            format!("tel:{}", self.number)
        }
    }
}

/// Geographic position (the GEO property).
#[derive(Debug, Clone, PartialEq)]
pub struct GeoUri {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

impl GeoUri {
    /// Creates a position from coordinates.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Parses a `geo:` URI string (RFC 5870).
    #[must_use]
    pub fn parse(uri: &str) -> Option<Self> {
        let rest = strip_prefix_ignore_case(uri, "geo:")?;
        let coords = rest.split(';').next()?;
        let mut parts = coords.split(',');
        let latitude = parts.next()?.parse().ok()?;
        let longitude = parts.next()?.parse().ok()?;
        Some(Self {
            latitude,
            longitude,
        })
    }

    /// Formats as a `geo:` URI string.
    #[must_use]
    pub fn to_uri(&self) -> String {
        format!("geo:{},{}", self.latitude, self.longitude)
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}
