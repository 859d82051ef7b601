//! The scribe layer: pluggable per-property codecs.
//!
//! A scribe handles one property kind in both the textual and XML
//! syntaxes. Scribes are stateless and shared; readers and writers
//! dispatch through a [`ScribeIndex`].

pub mod builtin;
mod index;

pub use index::ScribeIndex;

use crate::core::{Parameters, PropertyKind, PropertyValue, VCardDataType, VCardVersion};
use crate::core::version::XCARD_NAMESPACE;
use crate::core::VCardProperty;
use crate::xml::{XmlElement, XmlName};

/// Result of a scribe parse callback.
pub type ScribeResult<T> = Result<T, ScribeError>;

/// Recoverable outcomes a scribe parser may signal.
///
/// Neither aborts the read: `SkipMe` drops the property with a
/// warning, `CannotParse` demotes it to a raw payload with a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScribeError {
    /// Drop the property entirely.
    SkipMe(String),
    /// Keep the property with its original value, uninterpreted.
    CannotParse(String),
}

impl ScribeError {
    /// The human-readable reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::SkipMe(reason) | Self::CannotParse(reason) => reason,
        }
    }
}

/// A bidirectional codec for one property kind.
///
/// `parse_text` receives the raw value with folding already undone and
/// quoted-printable already decoded; it is responsible for unescaping.
/// `write_text` returns the escaped wire value; the writer handles
/// parameters, folding, and encoding around it.
pub trait PropertyScribe: Send + Sync {
    /// The canonical property name, uppercase (e.g. `"FN"`).
    fn property_name(&self) -> &'static str;

    /// The payload tag this scribe handles.
    fn kind(&self) -> PropertyKind;

    /// The versions whose readers dispatch to this scribe by name.
    fn supported_versions(&self) -> &'static [VCardVersion] {
        &VCardVersion::ALL
    }

    /// The qualified name this scribe serializes under in xCard.
    fn qname(&self) -> XmlName {
        XmlName::new(XCARD_NAMESPACE, self.property_name().to_ascii_lowercase())
    }

    /// The data type assumed when no VALUE parameter is present.
    fn default_data_type(&self, version: VCardVersion) -> Option<VCardDataType>;

    /// Parses a textual value into a typed payload.
    ///
    /// ## Errors
    /// `SkipMe` to drop the property, `CannotParse` to demote it.
    fn parse_text(
        &self,
        value: &str,
        data_type: VCardDataType,
        params: &mut Parameters,
        version: VCardVersion,
    ) -> ScribeResult<PropertyValue>;

    /// Produces the escaped textual wire value.
    fn write_text(&self, property: &VCardProperty, version: VCardVersion) -> String;

    /// Parses an xCard property element into a typed payload.
    ///
    /// The element's `<parameters>` child has already been consumed by
    /// the reader into `params`.
    ///
    /// ## Errors
    /// `SkipMe` to drop the property, `CannotParse` to demote it.
    fn parse_xml(
        &self,
        element: &XmlElement,
        params: &mut Parameters,
    ) -> ScribeResult<PropertyValue>;

    /// Builds the full xCard property element (value children included,
    /// parameters excluded — the writer adds those).
    fn build_xml(&self, property: &VCardProperty) -> XmlElement;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy;

    impl PropertyScribe for Dummy {
        fn property_name(&self) -> &'static str {
            "X-DUMMY"
        }

        fn kind(&self) -> PropertyKind {
            PropertyKind::Raw
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
        ) -> ScribeResult<PropertyValue> {
            Ok(PropertyValue::Raw(crate::core::RawValue::new(
                value, data_type,
            )))
        }

        fn write_text(&self, _property: &VCardProperty, _version: VCardVersion) -> String {
            String::new()
        }

        fn parse_xml(
            &self,
            _element: &XmlElement,
            _params: &mut Parameters,
        ) -> ScribeResult<PropertyValue> {
            Err(ScribeError::CannotParse("dummy".into()))
        }

        fn build_xml(&self, _property: &VCardProperty) -> XmlElement {
            XmlElement::new(self.qname())
        }
    }

    #[test]
    fn default_qname_lowercases_name() {
        let scribe = Dummy;
        let qname = scribe.qname();
        assert_eq!(qname.local, "x-dummy");
        assert_eq!(qname.namespace, XCARD_NAMESPACE);
    }

    #[test]
    fn default_supported_versions_is_all() {
        assert_eq!(Dummy.supported_versions(), &VCardVersion::ALL);
    }
}
