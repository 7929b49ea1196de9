/*!
 * Small owned XML tree shared by the XML based parsers.
 *
 * Strict mode is for real XML (Final Draft, Office, KIT Scenarist): any
 * syntax error, unclosed element or stray content fails the parse. Lenient
 * mode is for the HTML Celtx writes: unknown entities, void elements and
 * unbalanced tags are tolerated.
 */

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::errors::ParseError;
use crate::formats::signature::strip_bom;

const HTML_VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "wbr",
];

/// A node of the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An element with its qualified name, attributes and children
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

fn local_part(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

impl XmlElement {
    /// Name without namespace prefix
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    pub fn is(&self, local: &str) -> bool {
        self.local_name() == local
    }

    /// Attribute by local name
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| local_part(key) == local)
            .map(|(_, value)| value.as_str())
    }

    /// Attribute by exact qualified name
    pub fn attr_qualified(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Child elements in order
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// First child element with this local name
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.is(local))
    }

    /// Child elements with this local name, in order
    pub fn children_named<'s>(&'s self, local: &'s str) -> impl Iterator<Item = &'s XmlElement> + 's {
        self.elements().filter(move |e| e.is(local))
    }

    /// First descendant (depth first, document order) with this local name
    pub fn find(&self, local: &str) -> Option<&XmlElement> {
        for element in self.elements() {
            if element.is(local) {
                return Some(element);
            }
            if let Some(found) = element.find(local) {
                return Some(found);
            }
        }
        None
    }

    /// Text of the direct text children only
    pub fn direct_text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(text) => Some(text.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// All descendant text in document order
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(element) => element.collect_text(out),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Strict,
    Lenient,
}

/// Parse well-formed XML
pub(crate) fn parse_document(bytes: &[u8]) -> Result<XmlElement, ParseError> {
    build(bytes, Mode::Strict)
}

/// Parse HTML-flavoured markup leniently
pub(crate) fn parse_html(bytes: &[u8]) -> Result<XmlElement, ParseError> {
    build(bytes, Mode::Lenient)
}

fn html_entity(entity: &str) -> Option<&'static str> {
    Some(match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201C}",
        "rdquo" => "\u{201D}",
        "copy" => "\u{00A9}",
        _ => return None,
    })
}

fn start_element(start: &BytesStart<'_>, mode: Mode) -> Result<XmlElement, ParseError> {
    let name = String::from_utf8(start.name().as_ref().to_vec())?;
    let mut attributes = Vec::new();
    match mode {
        Mode::Strict => {
            for attr in start.attributes() {
                let attr = attr.map_err(|e| ParseError::corrupt(format!("malformed attribute: {}", e)))?;
                let key = String::from_utf8(attr.key.as_ref().to_vec())?;
                let value = attr.unescape_value()?.into_owned();
                attributes.push((key, value));
            }
        }
        Mode::Lenient => {
            for attr in start.html_attributes().flatten() {
                let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                let value = attr
                    .unescape_value()
                    .map(Cow::into_owned)
                    .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
                attributes.push((key, value));
            }
        }
    }
    Ok(XmlElement { name, attributes, children: Vec::new() })
}

/// Attach a finished element to its parent, or make it the root
fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement, mode: Mode) -> Result<(), ParseError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(element));
        return Ok(());
    }
    if root.is_some() {
        return match mode {
            Mode::Strict => Err(ParseError::corrupt("content after the root element")),
            Mode::Lenient => Ok(()),
        };
    }
    *root = Some(element);
    Ok(())
}

fn build(bytes: &[u8], mode: Mode) -> Result<XmlElement, ParseError> {
    let mut reader = Reader::from_reader(strip_bom(bytes));
    reader.config_mut().trim_text(false);
    if mode == Mode::Lenient {
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
    }

    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(quick_xml::Error::IllFormed(_)) if mode == Mode::Lenient => {
                buf.clear();
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        match event {
            Event::Start(start) => {
                let element = start_element(&start, mode)?;
                let lower = element.local_name().to_ascii_lowercase();
                // A new paragraph implicitly closes an open one
                let closes_paragraph = mode == Mode::Lenient
                    && lower == "p"
                    && stack.last().is_some_and(|open| open.local_name().eq_ignore_ascii_case("p"));
                if closes_paragraph {
                    if let Some(open) = stack.pop() {
                        attach(&mut stack, &mut root, open, mode)?;
                    }
                }
                let is_void = mode == Mode::Lenient && HTML_VOID_ELEMENTS.contains(&lower.as_str());
                if is_void {
                    attach(&mut stack, &mut root, element, mode)?;
                } else {
                    stack.push(element);
                }
            }
            Event::Empty(start) => {
                let element = start_element(&start, mode)?;
                attach(&mut stack, &mut root, element, mode)?;
            }
            Event::End(end) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                match mode {
                    Mode::Strict => {
                        let Some(element) = stack.pop() else {
                            return Err(ParseError::corrupt(format!("unexpected closing tag </{}>", name)));
                        };
                        attach(&mut stack, &mut root, element, mode)?;
                    }
                    Mode::Lenient => {
                        // Close everything up to the matching open element; ignore strays
                        if let Some(position) = stack.iter().rposition(|e| e.name.eq_ignore_ascii_case(&name)) {
                            while stack.len() > position {
                                if let Some(element) = stack.pop() {
                                    attach(&mut stack, &mut root, element, mode)?;
                                }
                            }
                        }
                    }
                }
            }
            Event::Text(text) => {
                let text = match mode {
                    Mode::Strict => text.unescape()?.into_owned(),
                    Mode::Lenient => text
                        .unescape_with(html_entity)
                        .map(Cow::into_owned)
                        .unwrap_or_else(|_| String::from_utf8_lossy(&text).into_owned()),
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Text(text)),
                    None if text.trim().is_empty() || mode == Mode::Lenient => {}
                    None => return Err(ParseError::corrupt("text outside the root element")),
                }
            }
            Event::CData(data) => {
                let text = String::from_utf8(data.into_inner().into_owned())?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::Text(text));
                }
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        match mode {
            Mode::Strict => {
                return Err(ParseError::corrupt(format!(
                    "document ends inside <{}>",
                    open.name
                )));
            }
            Mode::Lenient => {
                while let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element, mode)?;
                }
            }
        }
    }

    root.ok_or_else(|| ParseError::corrupt("document has no root element"))
}
