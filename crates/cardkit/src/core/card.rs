//! The vCard record type.

use super::property::{PropertyKind, PropertyValue, VCardProperty};
use super::version::VCardVersion;

/// A single vCard record.
///
/// The version is fixed at construction; properties are kept in the
/// order they were added (which, for parsed cards, is input order).
#[derive(Debug, Clone, PartialEq)]
pub struct VCard {
    version: VCardVersion,
    properties: Vec<VCardProperty>,
}

impl VCard {
    /// Creates an empty card with the given version.
    #[must_use]
    pub fn new(version: VCardVersion) -> Self {
        Self {
            version,
            properties: Vec::new(),
        }
    }

    /// The version this card was read as or will be written as.
    #[must_use]
    pub const fn version(&self) -> VCardVersion {
        self.version
    }

    /// The properties in declaration order.
    #[must_use]
    pub fn properties(&self) -> &[VCardProperty] {
        &self.properties
    }

    /// Appends a property.
    pub fn add_property(&mut self, property: VCardProperty) {
        self.properties.push(property);
    }

    /// Iterates properties of the given kind.
    pub fn properties_of(&self, kind: PropertyKind) -> impl Iterator<Item = &VCardProperty> {
        self.properties.iter().filter(move |p| p.kind() == kind)
    }

    /// The first FN value, if present.
    #[must_use]
    pub fn formatted_name(&self) -> Option<&str> {
        self.properties.iter().find_map(|p| match &p.value {
            PropertyValue::FormattedName(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// The first EMAIL value, if present.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.properties.iter().find_map(|p| match &p.value {
            PropertyValue::Email(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// The first N payload, if present.
    #[must_use]
    pub fn structured_name(&self) -> Option<&super::structured::StructuredName> {
        self.properties.iter().find_map(|p| match &p.value {
            PropertyValue::StructuredName(n) => Some(n),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_order_preserved() {
        let mut card = VCard::new(VCardVersion::V4_0);
        card.add_property(VCardProperty::new(
            "FN",
            PropertyValue::FormattedName("A".into()),
        ));
        card.add_property(VCardProperty::new("NOTE", PropertyValue::Note("B".into())));
        card.add_property(VCardProperty::new(
            "FN",
            PropertyValue::FormattedName("C".into()),
        ));

        let names: Vec<_> = card.properties().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["FN", "NOTE", "FN"]);
        assert_eq!(card.formatted_name(), Some("A"));
    }

    #[test]
    fn properties_of_filters_by_kind() {
        let mut card = VCard::new(VCardVersion::V3_0);
        card.add_property(VCardProperty::new(
            "FN",
            PropertyValue::FormattedName("A".into()),
        ));
        card.add_property(VCardProperty::new("NOTE", PropertyValue::Note("B".into())));

        assert_eq!(card.properties_of(PropertyKind::Note).count(), 1);
        assert_eq!(card.properties_of(PropertyKind::Address).count(), 0);
    }
}
