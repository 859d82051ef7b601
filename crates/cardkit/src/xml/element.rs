//! DOM-lite XML tree used for xCard property payloads.
//!
//! The xCard reader materializes each property element into this tree
//! before scribe dispatch, and foreign subtrees are preserved in it
//! verbatim. Text node whitespace is never trimmed.

/// A namespace-qualified element name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct XmlName {
    /// Namespace URI; empty for no namespace.
    pub namespace: String,
    /// Local element name.
    pub local: String,
}

impl XmlName {
    /// Creates a qualified name.
    #[must_use]
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }
}

/// A child node: a nested element or a text run.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    /// Nested element.
    Element(XmlElement),
    /// Text content, whitespace preserved verbatim.
    Text(String),
}

/// An XML element subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// Qualified element name.
    pub name: XmlName,
    /// Attributes in document order, namespace declarations excluded.
    pub attributes: Vec<(String, String)>,
    /// Child nodes in document order.
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Creates an empty element.
    #[must_use]
    pub fn new(name: XmlName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates an empty element in the given namespace.
    #[must_use]
    pub fn in_ns(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self::new(XmlName::new(namespace, local))
    }

    /// Returns an attribute value by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Concatenates the direct text children.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            if let XmlNode::Text(t) = child {
                out.push_str(t);
            }
        }
        out
    }

    /// Iterates the direct element children.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Returns the first direct child with the given qualified name.
    #[must_use]
    pub fn child(&self, namespace: &str, local: &str) -> Option<&XmlElement> {
        self.elements()
            .find(|e| e.name.namespace == namespace && e.name.local == local)
    }

    /// Returns the text of the first child with the qualified name.
    #[must_use]
    pub fn child_text(&self, namespace: &str, local: &str) -> Option<String> {
        self.child(namespace, local).map(XmlElement::text)
    }

    /// Appends a nested element and returns a handle to it.
    pub fn push_element(&mut self, element: XmlElement) -> &mut XmlElement {
        self.children.push(XmlNode::Element(element));
        match self.children.last_mut() {
            Some(XmlNode::Element(e)) => e,
            _ => unreachable!("just pushed an element"),
        }
    }

    /// Appends a text child.
    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(XmlNode::Text(text.into()));
    }

    /// Appends `<local>text</local>` in the given namespace.
    pub fn push_text_element(
        &mut self,
        namespace: impl Into<String>,
        local: impl Into<String>,
        text: impl Into<String>,
    ) {
        let mut element = XmlElement::in_ns(namespace, local);
        element.push_text(text);
        self.children.push(XmlNode::Element(element));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_concatenates_direct_children_only() {
        let mut elem = XmlElement::in_ns("ns", "fn");
        elem.push_text("Dr. ");
        let mut nested = XmlElement::in_ns("ns", "x");
        nested.push_text("ignored");
        elem.push_element(nested);
        elem.push_text("House");

        assert_eq!(elem.text(), "Dr. House");
    }

    #[test]
    fn child_lookup_is_namespace_aware() {
        let mut elem = XmlElement::in_ns("ns-a", "root");
        elem.push_text_element("ns-b", "item", "wrong");
        elem.push_text_element("ns-a", "item", "right");

        assert_eq!(elem.child_text("ns-a", "item"), Some("right".into()));
        assert!(elem.child("ns-c", "item").is_none());
    }

    #[test]
    fn whitespace_preserved() {
        let mut elem = XmlElement::in_ns("ns", "text");
        elem.push_text("  padded  ");
        assert_eq!(elem.text(), "  padded  ");
    }
}
