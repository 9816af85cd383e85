use std::io::Write;

use log::error;
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::{Document, Element, Node};
use crate::error::BindingError;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// How namespaces are rendered when writing an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceMode {
    /// Emit default-namespace declarations wherever an element's namespace
    /// differs from its parent's, and prefixed declarations for namespaced
    /// attributes.
    Declare,
    /// Write local names only, with no namespace declarations at all.
    /// Attributes that carry a namespace are left out.
    Strip,
}

fn io_error<E: std::fmt::Display>(e: E) -> BindingError {
    error!("Failed to write XML: {}", e);
    BindingError::Io(format!("Failed to write XML: {}", e))
}

/// Writes `document`, preceded by an XML declaration, to `sink`.
pub fn write_document<W: Write>(document: &Document, sink: W) -> Result<(), BindingError> {
    let mut writer = Writer::new(sink);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(io_error)?;
    write_element(&mut writer, document.root(), None, NamespaceMode::Declare)?;
    writer.get_mut().flush().map_err(io_error)
}

/// Renders `element` as a standalone XML fragment.
pub fn element_to_string(element: &Element, mode: NamespaceMode) -> Result<String, BindingError> {
    let mut writer = Writer::new(Vec::new());
    write_element(&mut writer, element, None, mode)?;
    String::from_utf8(writer.into_inner()).map_err(|e| BindingError::Serialization(e.to_string()))
}

/// Writes `element` and its subtree.
///
/// `inherited` is the default namespace in scope at the element's position.
pub fn write_element<W: Write>(
    writer: &mut Writer<W>,
    element: &Element,
    inherited: Option<&str>,
    mode: NamespaceMode,
) -> Result<(), BindingError> {
    let mut declarations: Vec<(String, String)> = Vec::new();
    let mut attributes: Vec<(String, String)> = Vec::with_capacity(element.attributes().len());

    if mode == NamespaceMode::Declare && element.namespace() != inherited {
        declarations.push((
            "xmlns".to_string(),
            element.namespace().unwrap_or_default().to_string(),
        ));
    }

    let mut prefixes: Vec<(String, String)> = Vec::new();
    for (index, attr) in element.attributes().iter().enumerate() {
        let local_name = attr.name().local_name();
        let key = match (mode, attr.name().namespace()) {
            (NamespaceMode::Declare, Some(XML_NAMESPACE)) => format!("xml:{}", local_name),
            (NamespaceMode::Declare, Some(namespace)) => {
                let mut prefix = attr
                    .prefix()
                    .map_or_else(|| format!("ns{}", index), str::to_string);
                if prefixes
                    .iter()
                    .any(|(p, bound)| *p == prefix && bound != namespace)
                {
                    prefix = format!("ns{}", index);
                }
                if !prefixes.iter().any(|(p, _)| *p == prefix) {
                    declarations.push((format!("xmlns:{}", prefix), namespace.to_string()));
                    prefixes.push((prefix.clone(), namespace.to_string()));
                }
                format!("{}:{}", prefix, local_name)
            }
            // Qualified attributes have no unqualified spelling
            (NamespaceMode::Strip, Some(_)) => continue,
            (_, None) => local_name.to_string(),
        };
        attributes.push((key, attr.value().to_string()));
    }

    let mut start = BytesStart::new(element.local_name());
    for (key, value) in declarations.iter().chain(attributes.iter()) {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children().is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(io_error);
    }

    writer.write_event(Event::Start(start)).map_err(io_error)?;
    let scope = match mode {
        NamespaceMode::Declare => element.namespace(),
        NamespaceMode::Strip => None,
    };
    for child in element.children() {
        match child {
            Node::Element(child) => write_element(writer, child, scope, mode)?,
            Node::CData(text) if !text.contains("]]>") => writer
                .write_event(Event::CData(BytesCData::new(text.as_str())))
                .map_err(io_error)?,
            Node::CData(text) | Node::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(io_error)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.local_name())))
        .map_err(io_error)
}
