//! Owned XML element tree built on `quick-xml`.
//!
//! Element names are stored by *local* name (`tei:origDate` becomes
//! `origDate`); attributes keep their qualified name so `xml:id` stays
//! distinguishable from a plain `id`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("XML parse error at byte {position}: {source}")]
    Parse {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },
    #[error("XML document has no root element")]
    Empty,
    #[error("XML document ended with unclosed element `{name}`")]
    Unclosed { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Attribute value by qualified name (`"n"`, `"xml:id"`, ...).
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn xml_id(&self) -> Option<&str> {
        self.attr("xml:id")
    }

    /// Child elements in document order (text nodes skipped).
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }

    /// Text that precedes the first child element.
    pub fn leading_text(&self) -> Option<&str> {
        match self.children.first() {
            Some(XmlNode::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// All descendant elements (excluding `self`) with the given local name,
    /// in document order.
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut out = Vec::new();
        collect_named(self, name, &mut out);
        out
    }

    /// First descendant element with the given local name.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        for child in self.elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }
}

fn collect_named<'a>(el: &'a XmlElement, name: &str, out: &mut Vec<&'a XmlElement>) {
    for child in el.elements() {
        if child.name == name {
            out.push(child);
        }
        collect_named(child, name, out);
    }
}

/// Split a whitespace-separated pointer list (`wit`, `target`, `active`, ...)
/// and strip `#` URI prefixes.
pub fn split_pointers(value: &str) -> Vec<String> {
    value
        .split_whitespace()
        .map(|token| token.trim_matches('#').to_string())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Parse an XML document into its root element.
pub fn parse_document(input: &str) -> Result<XmlElement, XmlError> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader.read_event().map_err(|source| XmlError::Parse {
            position: reader.buffer_position(),
            source,
        })?;
        match event {
            Event::Start(start) => {
                let el = open_element(&start).map_err(|source| XmlError::Parse {
                    position: reader.buffer_position(),
                    source,
                })?;
                stack.push(el);
            }
            Event::Empty(start) => {
                let el = open_element(&start).map_err(|source| XmlError::Parse {
                    position: reader.buffer_position(),
                    source,
                })?;
                attach(&mut stack, &mut root, el);
            }
            Event::End(_) => {
                if let Some(el) = stack.pop() {
                    attach(&mut stack, &mut root, el);
                }
            }
            Event::Text(text) => {
                if let Some(parent) = stack.last_mut() {
                    let text = text.unescape().map_err(|source| XmlError::Parse {
                        position: reader.buffer_position(),
                        source,
                    })?;
                    push_text(parent, &text);
                }
            }
            Event::CData(data) => {
                if let Some(parent) = stack.last_mut() {
                    let bytes = data.into_inner();
                    push_text(parent, &String::from_utf8_lossy(&bytes));
                }
            }
            Event::Eof => break,
            // Comments, processing instructions, declarations and doctypes
            // carry no apparatus content.
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unclosed { name: open.name });
    }
    root.ok_or(XmlError::Empty)
}

fn open_element(start: &BytesStart<'_>) -> Result<XmlElement, quick_xml::Error> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, el: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(el)),
        None => {
            if root.is_none() {
                *root = Some(el);
            }
        }
    }
}

fn push_text(parent: &mut XmlElement, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(XmlNode::Text(existing)) = parent.children.last_mut() {
        existing.push_str(text);
    } else {
        parent.children.push(XmlNode::Text(text.to_string()));
    }
}
