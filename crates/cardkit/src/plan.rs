//! Output planning shared by the text and XML writers.
//!
//! `prepare` turns a card into the exact property list a writer emits,
//! applying version filtering, PRODID stamping, and LABEL companion
//! synthesis. It is pure: the input card is never modified, and the
//! same card, version, and configuration always produce the same list.

use std::collections::BTreeSet;

use crate::core::{
    Parameter, PropertyKind, PropertyValue, VCard, VCardDataType, VCardProperty, VCardVersion,
};
use crate::error::{WriteError, WriteResult};
use crate::scribe::ScribeIndex;

/// Identifies this library in generated PRODID properties.
const PRODUCT_ID: &str = concat!("cardkit ", env!("CARGO_PKG_VERSION"));

/// Knobs shared by both writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    /// Stamp a PRODID identifying this library, replacing any existing
    /// one. 2.1 has no PRODID, so an X-PRODID raw property is stamped
    /// instead.
    pub add_prod_id: bool,
    /// Silently drop properties the target version cannot express.
    pub version_strict: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            add_prod_id: true,
            version_strict: true,
        }
    }
}

/// Plans the property list for one card at the target version.
///
/// LABEL synthesis: at 2.1/3.0 an ADR carrying a LABEL parameter is
/// emitted without it, immediately followed by a companion LABEL
/// property holding the text and inheriting the ADR's TYPE parameters.
/// At 4.0 the parameter is left in place.
///
/// ## Errors
/// `UnregisteredProperty` when any surviving property's kind has no
/// scribe in the index; nothing should be written for the card.
pub fn prepare(
    card: &VCard,
    version: VCardVersion,
    config: &WriterConfig,
    index: &ScribeIndex,
) -> WriteResult<Vec<VCardProperty>> {
    let mut out = Vec::with_capacity(card.properties().len() + 1);
    let mut unregistered = BTreeSet::new();

    for prop in card.properties() {
        if config.add_prod_id && prop.kind() == PropertyKind::ProductId {
            continue;
        }
        if config.version_strict && !prop.is_supported_by(version) {
            tracing::debug!(
                property = %prop.name,
                version = version.as_str(),
                "dropping property unsupported at target version"
            );
            continue;
        }
        if !index.has_kind(prop.kind()) {
            unregistered.insert(prop.kind().name().to_string());
            continue;
        }

        if version != VCardVersion::V4_0
            && prop.kind() == PropertyKind::Address
            && prop.params.label().is_some()
            && index.has_kind(PropertyKind::Label)
        {
            let label_text = prop.params.label().unwrap_or_default().to_string();
            let mut address = prop.clone();
            address.params.remove("LABEL");

            let mut label = VCardProperty::new("LABEL", PropertyValue::Label(label_text));
            label.group.clone_from(&prop.group);
            let types: Vec<String> = prop.params.types().map(String::from).collect();
            if !types.is_empty() {
                label.params.push(Parameter::multi("TYPE", types));
            }

            out.push(address);
            out.push(label);
            continue;
        }

        out.push(prop.clone());
    }

    if !unregistered.is_empty() {
        return Err(WriteError::UnregisteredProperty(
            unregistered.into_iter().collect(),
        ));
    }

    if config.add_prod_id {
        let stamp = match version {
            VCardVersion::V2_1 => {
                VCardProperty::raw("X-PRODID", PRODUCT_ID, VCardDataType::TEXT)
            }
            VCardVersion::V3_0 | VCardVersion::V4_0 => {
                VCardProperty::new("PRODID", PropertyValue::ProductId(PRODUCT_ID.to_string()))
            }
        };
        if index.has_kind(stamp.kind()) {
            out.push(stamp);
        }
    }

    Ok(out)
}
