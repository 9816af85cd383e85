use std::borrow::Cow;

use log::debug;
use quick_xml::NsReader;
use quick_xml::encoding::Decoder;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;

use super::{Attribute, Document, Element};
use crate::core::name::QualifiedName;
use crate::error::BindingError;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Options controlling how XML text becomes a [`Document`].
///
/// # Examples
///
/// ```
/// use xml_binding_rs::dom::{Document, DocumentOptions};
///
/// let options = DocumentOptions::new().max_depth(2);
/// assert!(Document::parse_with("<a><b/></a>", &options, None).is_ok());
/// assert!(Document::parse_with("<a><b><c/></b></a>", &options, None).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOptions {
    max_depth: usize,
    preserve_whitespace: bool,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            max_depth: 256,
            preserve_whitespace: false,
        }
    }
}

impl DocumentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the deepest element nesting accepted. The root is at depth 1.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Keeps text nodes made only of whitespace instead of dropping them.
    pub fn preserve_whitespace(mut self, preserve_whitespace: bool) -> Self {
        self.preserve_whitespace = preserve_whitespace;
        self
    }

    pub fn get_max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn get_preserve_whitespace(&self) -> bool {
        self.preserve_whitespace
    }
}

/// Builds parse errors pointing at a byte offset of the source.
struct Locator<'a> {
    source: &'a [u8],
    base: Option<&'a str>,
}

impl Locator<'_> {
    fn error<M: ToString>(&self, offset: usize, message: M) -> BindingError {
        let offset = offset.min(self.source.len());
        let before = &self.source[..offset];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |pos| pos + 1);
        let column = offset - line_start + 1;

        let location = match self.base {
            Some(base) => format!("{}:{}:{}", base, line, column),
            None => format!("{}:{}", line, column),
        };
        BindingError::Parse {
            location,
            message: message.to_string(),
        }
    }
}

/// Parses already decoded `text` into a document tree. An encoding named in
/// the XML declaration is ignored.
pub(crate) fn read_document(
    text: &str,
    options: &DocumentOptions,
    location_base: Option<&str>,
) -> Result<Document, BindingError> {
    read_events(NsReader::from_str(text), text.as_bytes(), options, location_base)
}

/// Parses raw bytes into a document tree, decoding them per the byte order
/// mark or the encoding named in the XML declaration (UTF-8 otherwise).
pub(crate) fn read_document_bytes(
    bytes: &[u8],
    options: &DocumentOptions,
    location_base: Option<&str>,
) -> Result<Document, BindingError> {
    read_events(NsReader::from_reader(bytes), bytes, options, location_base)
}

fn read_events(
    mut reader: NsReader<&[u8]>,
    source: &[u8],
    options: &DocumentOptions,
    location_base: Option<&str>,
) -> Result<Document, BindingError> {
    let locator = Locator {
        source,
        base: location_base,
    };
    let mut buffer = Vec::with_capacity(1024);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        buffer.clear();
        let event = match reader.read_event_into(&mut buffer) {
            Ok(event) => event,
            Err(e) => return Err(locator.error(reader.buffer_position() as usize, e)),
        };
        let position = reader.buffer_position() as usize;
        // The declaration may switch the encoding, so fetch it per event
        let decoder = reader.decoder();

        match event {
            Event::Start(ref start) => {
                if stack.len() >= options.max_depth {
                    return Err(locator.error(
                        position,
                        format!("elements nested deeper than {}", options.max_depth),
                    ));
                }
                let element =
                    open_element(&reader, start).map_err(|m| locator.error(position, m))?;
                if let Some(parent) = stack.last_mut() {
                    if !options.preserve_whitespace {
                        parent.trim_trailing_whitespace();
                    }
                }
                stack.push(element);
            }
            Event::Empty(ref start) => {
                if stack.len() >= options.max_depth {
                    return Err(locator.error(
                        position,
                        format!("elements nested deeper than {}", options.max_depth),
                    ));
                }
                let element =
                    open_element(&reader, start).map_err(|m| locator.error(position, m))?;
                attach(&mut stack, &mut root, element, options)
                    .map_err(|m| locator.error(position, m))?;
            }
            Event::End(ref end) => {
                let mut element = stack.pop().ok_or_else(|| {
                    let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                    locator.error(position, format!("unexpected closing tag </{}>", name))
                })?;
                // Whitespace-only content of a leaf element is its value
                if !options.preserve_whitespace && element.child_elements().next().is_some() {
                    element.trim_trailing_whitespace();
                }
                attach(&mut stack, &mut root, element, options)
                    .map_err(|m| locator.error(position, m))?;
            }
            Event::Text(ref text) => {
                let raw = decoder
                    .decode(text)
                    .map_err(|e| locator.error(position, e))?;
                let content = unescape(&raw).map_err(|e| locator.error(position, e))?;
                push_text(&mut stack, content).map_err(|m| locator.error(position, m))?;
            }
            Event::GeneralRef(ref reference) => {
                let name = decoder
                    .decode(reference)
                    .map_err(|e| locator.error(position, e))?;
                let entity = format!("&{};", name);
                let content = unescape(&entity).map_err(|e| locator.error(position, e))?;
                push_text(&mut stack, content).map_err(|m| locator.error(position, m))?;
            }
            Event::CData(ref cdata) => {
                let content = decoder
                    .decode(cdata)
                    .map_err(|e| locator.error(position, e))?;
                match stack.last_mut() {
                    Some(parent) => parent.push_cdata(content.into_owned()),
                    None => {
                        return Err(
                            locator.error(position, "CDATA section outside the root element")
                        );
                    }
                }
            }
            Event::Eof => {
                if let Some(open) = stack.last() {
                    return Err(locator.error(
                        position,
                        format!("unexpected end of document inside <{}>", open.local_name()),
                    ));
                }
                break;
            }
            _ => { /* Ignore declarations, comments and processing instructions */ }
        }
    }

    let root = root.ok_or_else(|| locator.error(source.len(), "document has no root element"))?;
    debug!(
        "Parsed XML document with root {} ({})",
        root.name(),
        reader.decoder().encoding().name()
    );
    Ok(Document::new(root))
}

/// Resolves the element name and attributes of a start tag.
fn open_element<R>(reader: &NsReader<R>, start: &BytesStart) -> Result<Element, String> {
    let decoder = reader.decoder();
    let resolver = reader.resolver();
    let (resolved, local) = resolver.resolve_element(start.name());
    let namespace = resolved_namespace(resolved, decoder)?;
    let local_name = decode(decoder, local.into_inner())?.into_owned();
    let mut element = Element::new(QualifiedName::from_parts(namespace, local_name));

    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let prefix = key
            .iter()
            .position(|&b| b == b':')
            .map(|pos| decode(decoder, &key[..pos]).map(Cow::into_owned))
            .transpose()?;
        let (resolved, local) = resolver.resolve_attribute(attr.key);
        let namespace = match prefix.as_deref() {
            Some("xml") => Some(XML_NAMESPACE.to_string()),
            _ => resolved_namespace(resolved, decoder)?,
        };
        let local_name = decode(decoder, local.into_inner())?.into_owned();
        let raw = decode(decoder, &attr.value)?;
        let value = unescape(&raw).map_err(|e| e.to_string())?.into_owned();

        element.push_attribute(
            Attribute::new(QualifiedName::from_parts(namespace, local_name), value)
                .with_prefix(prefix),
        );
    }

    Ok(element)
}

fn resolved_namespace(
    resolved: ResolveResult,
    decoder: Decoder,
) -> Result<Option<String>, String> {
    match resolved {
        ResolveResult::Bound(namespace) => {
            let namespace = decode(decoder, namespace.into_inner())?;
            // `xmlns=""` undeclares the default namespace
            if namespace.is_empty() {
                Ok(None)
            } else {
                Ok(Some(namespace.into_owned()))
            }
        }
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(format!(
            "undeclared namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        )),
    }
}

fn decode<'b>(decoder: Decoder, bytes: &'b [u8]) -> Result<Cow<'b, str>, String> {
    decoder.decode(bytes).map_err(|e| e.to_string())
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
    options: &DocumentOptions,
) -> Result<(), String> {
    match stack.last_mut() {
        Some(parent) => {
            if !options.preserve_whitespace {
                parent.trim_trailing_whitespace();
            }
            parent.push_child(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(format!(
            "second root element <{}> after the document element",
            element.local_name()
        )),
    }
}

fn push_text(stack: &mut [Element], content: Cow<'_, str>) -> Result<(), String> {
    match stack.last_mut() {
        Some(parent) => {
            parent.push_text(content.into_owned());
            Ok(())
        }
        None if content.trim().is_empty() => Ok(()),
        None => Err(format!("text '{}' outside the root element", content.trim())),
    }
}
