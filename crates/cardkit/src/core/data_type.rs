//! Value data-type tags (the VALUE parameter).

use std::collections::HashSet;
use std::sync::{OnceLock, RwLock};

/// A property value data type, e.g. `text` or `uri`.
///
/// This is an open enumeration: the RFC-defined kinds exist as
/// constants, and unrecognized tags are interned into a process-wide
/// append-only table instead of being rejected. Two data types compare
/// equal when their names are equal under ASCII case folding.
#[derive(Debug, Clone, Copy, Eq)]
pub struct VCardDataType {
    name: &'static str,
}

/// Intern table for ad-hoc data-type names, lower-cased.
static INTERNED: OnceLock<RwLock<HashSet<&'static str>>> = OnceLock::new();

impl VCardDataType {
    /// Supported by 2.1 only.
    pub const URL: Self = Self { name: "url" };
    /// Supported by 2.1 only.
    pub const CONTENT_ID: Self = Self { name: "content-id" };
    /// Supported by 3.0 only.
    pub const BINARY: Self = Self { name: "binary" };
    /// Supported by 3.0 and 4.0.
    pub const URI: Self = Self { name: "uri" };
    /// Supported by 3.0 and 4.0.
    pub const TEXT: Self = Self { name: "text" };
    /// Supported by 3.0 and 4.0.
    pub const DATE: Self = Self { name: "date" };
    /// Supported by 3.0 and 4.0.
    pub const TIME: Self = Self { name: "time" };
    /// Supported by 3.0 and 4.0.
    pub const DATE_TIME: Self = Self { name: "date-time" };
    /// Supported by 4.0 only.
    pub const DATE_AND_OR_TIME: Self = Self {
        name: "date-and-or-time",
    };
    /// Supported by 4.0 only.
    pub const TIMESTAMP: Self = Self { name: "timestamp" };
    /// Supported by 4.0 only.
    pub const BOOLEAN: Self = Self { name: "boolean" };
    /// Supported by 4.0 only.
    pub const INTEGER: Self = Self { name: "integer" };
    /// Supported by 4.0 only.
    pub const FLOAT: Self = Self { name: "float" };
    /// Supported by 4.0 only.
    pub const UTC_OFFSET: Self = Self { name: "utc-offset" };
    /// Supported by 4.0 only.
    pub const LANGUAGE_TAG: Self = Self {
        name: "language-tag",
    };

    const PREDEFINED: [Self; 15] = [
        Self::URL,
        Self::CONTENT_ID,
        Self::BINARY,
        Self::URI,
        Self::TEXT,
        Self::DATE,
        Self::TIME,
        Self::DATE_TIME,
        Self::DATE_AND_OR_TIME,
        Self::TIMESTAMP,
        Self::BOOLEAN,
        Self::INTEGER,
        Self::FLOAT,
        Self::UTC_OFFSET,
        Self::LANGUAGE_TAG,
    ];

    /// Returns the data type name, e.g. `"uri"`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }

    /// Looks up a predefined data type by name (case-insensitive).
    #[must_use]
    pub fn find(name: &str) -> Option<Self> {
        Self::PREDEFINED
            .into_iter()
            .find(|dt| dt.name.eq_ignore_ascii_case(name))
    }

    /// Looks up a data type by name, interning it if unknown.
    ///
    /// Interned names are lower-cased and live for the rest of the
    /// process; the table is append-only and safe for concurrent use.
    #[must_use]
    pub fn get(name: &str) -> Self {
        if let Some(found) = Self::find(name) {
            return found;
        }

        let lower = name.to_ascii_lowercase();
        let table = INTERNED.get_or_init(|| RwLock::new(HashSet::new()));

        if let Ok(guard) = table.read()
            && let Some(&existing) = guard.get(lower.as_str())
        {
            return Self { name: existing };
        }

        let mut guard = match table.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(&existing) = guard.get(lower.as_str()) {
            return Self { name: existing };
        }
        let leaked: &'static str = Box::leak(lower.into_boxed_str());
        guard.insert(leaked);
        Self { name: leaked }
    }

    /// Returns all predefined data types.
    #[must_use]
    pub fn all() -> impl Iterator<Item = Self> {
        Self::PREDEFINED.into_iter()
    }
}

impl PartialEq for VCardDataType {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(other.name)
    }
}

impl std::hash::Hash for VCardDataType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for b in self.name.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl std::fmt::Display for VCardDataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_is_case_insensitive() {
        assert_eq!(VCardDataType::find("URI"), Some(VCardDataType::URI));
        assert_eq!(VCardDataType::find("uri"), Some(VCardDataType::URI));
        assert_eq!(VCardDataType::find("bogus"), None);
    }

    #[test]
    fn get_matches_constant() {
        assert_eq!(VCardDataType::get("URI"), VCardDataType::URI);
        assert_eq!(VCardDataType::get("uri"), VCardDataType::URI);
    }

    #[test]
    fn get_interns_unknown_names() {
        let a = VCardDataType::get("X-Secret");
        let b = VCardDataType::get("x-secret");
        assert_eq!(a, b);
        assert_eq!(a.name(), "x-secret");
    }

    #[test]
    fn all_contains_predefined() {
        assert_eq!(VCardDataType::all().count(), 15);
    }
}
