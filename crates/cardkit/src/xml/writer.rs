//! xCard (RFC 6351) writing.

use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::core::version::XCARD_NAMESPACE;
use crate::core::{VCard, VCardProperty, VCardVersion};
use crate::error::WriteResult;
use crate::plan::{self, WriterConfig};
use crate::scribe::ScribeIndex;

use super::element::{XmlElement, XmlNode};

/// Writes cards into one `<vcards>` document.
///
/// The root element opens on the first card and closes on [`finish`];
/// dropping the writer closes it on a best-effort basis. Parameters
/// are serialized as `<parameters>` ahead of the value elements, and
/// grouped properties are wrapped in `<group name="...">`.
///
/// [`finish`]: XCardWriter::finish
pub struct XCardWriter<W: Write> {
    writer: Option<Writer<W>>,
    config: WriterConfig,
    index: ScribeIndex,
    started: bool,
}

impl<W: Write> XCardWriter<W> {
    /// Creates a writer over the sink.
    pub fn new(sink: W) -> Self {
        Self {
            writer: Some(Writer::new(sink)),
            config: WriterConfig::default(),
            index: ScribeIndex::default(),
            started: false,
        }
    }

    /// Replaces the writer configuration.
    #[must_use]
    pub fn with_config(mut self, config: WriterConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the scribe index.
    #[must_use]
    pub fn with_index(mut self, index: ScribeIndex) -> Self {
        self.index = index;
        self
    }

    /// Writes one card as a `<vcard>` element.
    ///
    /// ## Errors
    /// `UnregisteredProperty` before any bytes are written for the card
    /// when its kinds are not covered; serialization errors otherwise.
    pub fn write(&mut self, card: &VCard) -> WriteResult<()> {
        let props = plan::prepare(card, VCardVersion::V4_0, &self.config, &self.index)?;

        if !self.started {
            if let Some(writer) = self.writer.as_mut() {
                writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
                let mut root = BytesStart::new("vcards");
                root.push_attribute(("xmlns", XCARD_NAMESPACE));
                writer.write_event(Event::Start(root))?;
            }
            self.started = true;
        }

        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        writer.write_event(Event::Start(BytesStart::new("vcard")))?;

        // One <group> per distinct name, placed where its first member
        // appears; members keep their relative order.
        let mut emitted_groups: Vec<&str> = Vec::new();
        for prop in &props {
            match prop.group.as_deref() {
                None => write_property(writer, &self.index, prop)?,
                Some(group) => {
                    if emitted_groups.contains(&group) {
                        continue;
                    }
                    emitted_groups.push(group);
                    let mut start = BytesStart::new("group");
                    start.push_attribute(("name", group));
                    writer.write_event(Event::Start(start))?;
                    for member in props.iter().filter(|p| p.group.as_deref() == Some(group)) {
                        write_property(writer, &self.index, member)?;
                    }
                    writer.write_event(Event::End(BytesEnd::new("group")))?;
                }
            }
        }

        writer.write_event(Event::End(BytesEnd::new("vcard")))?;
        Ok(())
    }

    /// Closes the root element and returns the sink.
    ///
    /// ## Errors
    /// Fails when the closing tag or the final flush cannot be written.
    pub fn finish(mut self) -> WriteResult<W> {
        let Some(mut writer) = self.writer.take() else {
            unreachable!("writer only vacated by finish and drop");
        };
        if self.started {
            writer.write_event(Event::End(BytesEnd::new("vcards")))?;
        }
        let mut sink = writer.into_inner();
        sink.flush()?;
        Ok(sink)
    }
}

impl<W: Write> Drop for XCardWriter<W> {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take()
            && self.started
        {
            let _ = writer.write_event(Event::End(BytesEnd::new("vcards")));
            let _ = writer.into_inner().flush();
        }
    }
}

fn write_property<W: Write>(
    writer: &mut Writer<W>,
    index: &ScribeIndex,
    prop: &VCardProperty,
) -> WriteResult<()> {
    let Some(scribe) = index.for_kind(prop.kind()) else {
        return Ok(());
    };
    let mut element = scribe.build_xml(prop);
    if !prop.params.is_empty() {
        let mut container = XmlElement::in_ns(XCARD_NAMESPACE, "parameters");
        for param in &prop.params {
            let local = param.name.to_ascii_lowercase();
            let value_tag = parameter_value_tag(&local);
            let mut entry = XmlElement::in_ns(XCARD_NAMESPACE, local);
            for value in &param.values {
                entry.push_text_element(XCARD_NAMESPACE, value_tag, value.clone());
            }
            container.push_element(entry);
        }
        element.children.insert(0, XmlNode::Element(container));
    }
    write_element(writer, &element, XCARD_NAMESPACE)
}

/// RFC 6351 types a few parameter values; everything else is `<text>`.
fn parameter_value_tag(param: &str) -> &'static str {
    match param {
        "pref" => "integer",
        "language" => "language-tag",
        _ => "text",
    }
}

/// Serializes an element tree, declaring a default namespace wherever
/// an element's namespace differs from its parent's.
fn write_element<W: Write>(
    writer: &mut Writer<W>,
    element: &XmlElement,
    parent_ns: &str,
) -> WriteResult<()> {
    let mut start = BytesStart::new(element.name.local.as_str());
    if element.name.namespace != parent_ns && !element.name.namespace.is_empty() {
        start.push_attribute(("xmlns", element.name.namespace.as_str()));
    }
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            XmlNode::Element(nested) => write_element(writer, nested, &element.name.namespace)?,
            XmlNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.local.as_str())))?;
    Ok(())
}

/// Serializes a standalone element tree to a string.
///
/// ## Errors
/// Fails when serialization fails or produces invalid UTF-8.
pub fn write_fragment(element: &XmlElement) -> WriteResult<String> {
    let mut writer = Writer::new(Vec::new());
    write_element(&mut writer, element, "")?;
    let bytes = writer.into_inner();
    String::from_utf8(bytes).map_err(|_| {
        crate::error::WriteError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "invalid UTF-8 in XML output",
        ))
    })
}
