//! The scribe registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{PropertyKind, VCardVersion};
use crate::xml::XmlName;

use super::PropertyScribe;
use super::builtin;

/// Registry of scribes, keyed three ways:
///
/// 1. `(lower-cased name, version)` for read-side dispatch;
/// 2. xCard qualified name for the XML reader (4.0 only);
/// 3. property kind for emit-side dispatch.
///
/// Registering a scribe for an already-indexed key replaces the prior
/// binding. The default index carries the built-in property catalog.
#[derive(Clone)]
pub struct ScribeIndex {
    by_name: HashMap<(String, VCardVersion), Arc<dyn PropertyScribe>>,
    by_qname: HashMap<XmlName, Arc<dyn PropertyScribe>>,
    by_kind: HashMap<PropertyKind, Arc<dyn PropertyScribe>>,
}

impl ScribeIndex {
    /// Creates an empty index with no scribes at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            by_name: HashMap::new(),
            by_qname: HashMap::new(),
            by_kind: HashMap::new(),
        }
    }

    /// Registers a scribe under every key it declares.
    pub fn register(&mut self, scribe: Arc<dyn PropertyScribe>) {
        let name = scribe.property_name().to_ascii_lowercase();
        if !name.is_empty() {
            for &version in scribe.supported_versions() {
                self.by_name
                    .insert((name.clone(), version), Arc::clone(&scribe));
            }
            if scribe
                .supported_versions()
                .contains(&VCardVersion::V4_0)
            {
                self.by_qname.insert(scribe.qname(), Arc::clone(&scribe));
            }
        }
        self.by_kind.insert(scribe.kind(), scribe);
    }

    /// Looks up the scribe for a property name at a version.
    #[must_use]
    pub fn for_name(&self, name: &str, version: VCardVersion) -> Option<&Arc<dyn PropertyScribe>> {
        self.by_name.get(&(name.to_ascii_lowercase(), version))
    }

    /// Looks up the scribe for an xCard qualified name.
    #[must_use]
    pub fn for_qname(&self, qname: &XmlName) -> Option<&Arc<dyn PropertyScribe>> {
        self.by_qname.get(qname)
    }

    /// Looks up the scribe for a property kind (emit side).
    #[must_use]
    pub fn for_kind(&self, kind: PropertyKind) -> Option<&Arc<dyn PropertyScribe>> {
        self.by_kind.get(&kind)
    }

    /// Returns whether a scribe is registered for the kind.
    #[must_use]
    pub fn has_kind(&self, kind: PropertyKind) -> bool {
        self.by_kind.contains_key(&kind)
    }
}

impl Default for ScribeIndex {
    /// An index pre-populated with the built-in property scribes.
    fn default() -> Self {
        let mut index = Self::empty();
        for scribe in builtin::all() {
            index.register(scribe);
        }
        index
    }
}

impl std::fmt::Debug for ScribeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScribeIndex")
            .field("names", &self.by_name.len())
            .field("qnames", &self.by_qname.len())
            .field("kinds", &self.by_kind.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::version::XCARD_NAMESPACE;

    #[test]
    fn default_index_knows_builtins() {
        let index = ScribeIndex::default();
        assert!(index.for_name("FN", VCardVersion::V4_0).is_some());
        assert!(index.for_name("fn", VCardVersion::V2_1).is_some());
        assert!(index.for_name("ADR", VCardVersion::V3_0).is_some());
        assert!(index.has_kind(PropertyKind::Raw));
        assert!(index.has_kind(PropertyKind::Xml));
    }

    #[test]
    fn version_gating_in_name_lookup() {
        let index = ScribeIndex::default();
        // LANG is 4.0-only.
        assert!(index.for_name("LANG", VCardVersion::V4_0).is_some());
        assert!(index.for_name("LANG", VCardVersion::V3_0).is_none());
        // LABEL is 2.1/3.0-only.
        assert!(index.for_name("LABEL", VCardVersion::V3_0).is_some());
        assert!(index.for_name("LABEL", VCardVersion::V4_0).is_none());
    }

    #[test]
    fn qname_lookup() {
        let index = ScribeIndex::default();
        let qname = XmlName::new(XCARD_NAMESPACE, "fn");
        assert!(index.for_qname(&qname).is_some());
        let foreign = XmlName::new("urn:example:other", "fn");
        assert!(index.for_qname(&foreign).is_none());
    }

    #[test]
    fn register_replaces_existing_binding() {
        let mut index = ScribeIndex::default();
        let replacement = builtin::all()
            .into_iter()
            .find(|s| s.property_name() == "FN")
            .unwrap();
        let before = Arc::as_ptr(index.for_name("FN", VCardVersion::V4_0).unwrap());
        index.register(Arc::clone(&replacement));
        let after = Arc::as_ptr(index.for_name("FN", VCardVersion::V4_0).unwrap());
        assert_ne!(before, after);
    }
}
