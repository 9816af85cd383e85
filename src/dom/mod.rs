/// In-memory XML document trees.
///
/// This module provides the parsed form the binding registry works on. Text is
/// turned into a [`Document`] with `quick-xml`'s namespace-aware reader, every
/// element and attribute name is resolved to a [`QualifiedName`], and the tree
/// can be written back to XML text.
///
/// # Examples
///
/// ## Parsing
///
/// ```
/// use xml_binding_rs::dom::Document;
///
/// let xml = r#"
/// <ial:Run xmlns:ial="http://euclid.esa.org/schema/sys/ial-schema" state="done">
///   <id>7</id>
///   <note>a &amp; b</note>
/// </ial:Run>
/// "#;
///
/// let document = Document::parse(xml).unwrap();
/// let root = document.root();
///
/// assert_eq!(root.local_name(), "Run");
/// assert_eq!(root.namespace(), Some("http://euclid.esa.org/schema/sys/ial-schema"));
/// assert_eq!(root.attribute("state"), Some("done"));
/// assert_eq!(root.child("id").unwrap().text(), "7");
/// assert_eq!(root.child("note").unwrap().text(), "a & b");
/// ```
///
/// ## Building and writing
///
/// ```
/// use xml_binding_rs::core::name::QualifiedName;
/// use xml_binding_rs::dom::Element;
///
/// let run = Element::new(QualifiedName::new("urn:x", "Run"))
///     .with_child(Element::new(QualifiedName::new("urn:x", "id")).with_text("7"));
///
/// assert_eq!(run.to_xml().unwrap(), r#"<Run xmlns="urn:x"><id>7</id></Run>"#);
/// ```
pub mod dom_reader;
pub mod dom_writer;

use std::io::{Read, Write};

use log::error;

use crate::core::name::QualifiedName;
use crate::error::BindingError;

pub use dom_reader::DocumentOptions;

/// A parsed XML document: one root element.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Element,
}

impl Document {
    /// Wraps an element as the root of a new document.
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Parses XML text with default options.
    pub fn parse(text: &str) -> Result<Self, BindingError> {
        Self::parse_with(text, &DocumentOptions::default(), None)
    }

    /// Parses XML text.
    ///
    /// `location_base`, typically a file name, prefixes the position reported
    /// by parse errors.
    pub fn parse_with(
        text: &str,
        options: &DocumentOptions,
        location_base: Option<&str>,
    ) -> Result<Self, BindingError> {
        dom_reader::read_document(text, options, location_base)
    }

    /// Parses raw bytes. The encoding is taken from a byte order mark or
    /// from the XML declaration, and defaults to UTF-8. Bytes that do not
    /// decode are reported as parse errors.
    pub fn parse_bytes(
        bytes: &[u8],
        options: &DocumentOptions,
        location_base: Option<&str>,
    ) -> Result<Self, BindingError> {
        dom_reader::read_document_bytes(bytes, options, location_base)
    }

    /// Reads the whole of `reader` and parses it, see [`Document::parse_bytes`].
    pub fn from_reader<R: Read>(
        mut reader: R,
        options: &DocumentOptions,
    ) -> Result<Self, BindingError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(|e| {
            error!("Failed to read XML document: {}", e);
            BindingError::Io(format!("Failed to read XML document: {}", e))
        })?;
        Self::parse_bytes(&bytes, options, None)
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn into_root(self) -> Element {
        self.root
    }

    /// Writes the document, with an XML declaration, to `writer`.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), BindingError> {
        dom_writer::write_document(self, writer)
    }

    /// Renders the document, with an XML declaration, as a string.
    pub fn to_xml(&self) -> Result<String, BindingError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| BindingError::Serialization(e.to_string()))
    }
}

/// A child of an [`Element`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
}

/// An attribute with its resolved name and unescaped value.
///
/// Namespace declarations (`xmlns`, `xmlns:*`) are consumed while parsing and
/// never appear as attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: QualifiedName,
    prefix: Option<String>,
    value: String,
}

impl Attribute {
    pub fn new<V: Into<String>>(name: QualifiedName, value: V) -> Self {
        Self {
            name,
            prefix: None,
            value: value.into(),
        }
    }

    pub(crate) fn with_prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    /// The prefix the attribute was written with in the source, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// An element node with its resolved name, attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: QualifiedName,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: QualifiedName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Adds an attribute with no namespace.
    pub fn with_attribute<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.attributes
            .push(Attribute::new(QualifiedName::unqualified(name), value));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_text<T: Into<String>>(mut self, text: T) -> Self {
        self.push_text(text.into());
        self
    }

    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.name.namespace()
    }

    pub fn local_name(&self) -> &str {
        self.name.local_name()
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Value of the first attribute with the given local name.
    pub fn attribute(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name.local_name() == local_name)
            .map(Attribute::value)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// First child element with the given local name.
    pub fn child(&self, local_name: &str) -> Option<&Element> {
        self.child_elements()
            .find(|element| element.local_name() == local_name)
    }

    /// Concatenated text and CDATA content of the direct children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) | Node::CData(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Writes the element alone, declaring the namespaces it needs.
    pub fn to_xml(&self) -> Result<String, BindingError> {
        dom_writer::element_to_string(self, dom_writer::NamespaceMode::Declare)
    }

    pub(crate) fn push_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    pub(crate) fn push_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub(crate) fn push_cdata(&mut self, text: String) {
        self.children.push(Node::CData(text));
    }

    /// Appends text, merging it with a preceding text node.
    pub(crate) fn push_text(&mut self, text: String) {
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(&text);
        } else {
            self.children.push(Node::Text(text));
        }
    }

    /// Drops a trailing text node made only of whitespace.
    pub(crate) fn trim_trailing_whitespace(&mut self) {
        if let Some(Node::Text(last)) = self.children.last() {
            if last.trim().is_empty() {
                self.children.pop();
            }
        }
    }

    /// Copy of the subtree with names of `namespace` made unqualified, ready
    /// to be written without namespaces.
    ///
    /// Attributes of any other namespace (`xsi:*`, `xml:*`, foreign ones) are
    /// dropped. A descendant element of another namespace is returned as the
    /// error. The element's own name is not checked.
    pub(crate) fn localized(&self, namespace: Option<&str>) -> Result<Element, QualifiedName> {
        let attributes = self
            .attributes
            .iter()
            .filter(|attr| in_namespace(attr.name.namespace(), namespace))
            .map(|attr| {
                Attribute::new(
                    QualifiedName::unqualified(attr.name.local_name()),
                    attr.value.as_str(),
                )
            })
            .collect();

        let mut children = Vec::with_capacity(self.children.len());
        for node in &self.children {
            match node {
                Node::Element(child) if !in_namespace(child.namespace(), namespace) => {
                    return Err(child.name.clone());
                }
                Node::Element(child) => children.push(Node::Element(child.localized(namespace)?)),
                other => children.push(other.clone()),
            }
        }

        Ok(Element {
            name: QualifiedName::unqualified(self.local_name()),
            attributes,
            children,
        })
    }

    /// Places this element and every unqualified descendant in `namespace`.
    pub(crate) fn qualify(&mut self, namespace: &str) {
        if self.name.namespace().is_none() {
            self.name = self.name.with_namespace(namespace);
        }
        for child in &mut self.children {
            if let Node::Element(element) = child {
                element.qualify(namespace);
            }
        }
    }
}

fn in_namespace(found: Option<&str>, namespace: Option<&str>) -> bool {
    found.is_none() || found == namespace
}
