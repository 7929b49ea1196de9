/*!
 * OpenDocument text, packaged (`.odt`) or flat (`.fodt`, `.xml`).
 *
 * A package splits the document over `content.xml`, `styles.xml` and
 * `meta.xml`; a flat file keeps everything under one `office:document`
 * root. Both are read into the same paragraph list.
 */

use std::collections::HashMap;
use std::io::{Read, Seek};

use log::debug;

use super::archive::Archive;
use super::text_shape::{
    is_parenthetical_shape, is_transition_shape, is_upper_case, looks_like_scene_heading, style_key,
};
use super::xml::{parse_document, XmlElement, XmlNode};
use super::SourceFile;
use crate::document::{DocumentBuilder, ElementKind};
use crate::errors::{NormalizationError, ParseError};

const ZIP_LOCAL_HEADER: &[u8] = b"PK\x03\x04";

/// Left margin from which a short upper-case paragraph reads as a cue (1.5in)
const CUE_INDENT_PT: f64 = 108.0;
const MAX_CUE_CHARS: usize = 50;
const MAX_STYLE_DEPTH: usize = 16;

// @skip: body children that hold no running text
const SKIPPED_CONTAINERS: &[&str] = &[
    "tracked-changes",
    "sequence-decls",
    "variable-decls",
    "user-field-decls",
    "forms",
];

/// One `text:p` or `text:h`
#[derive(Debug, Clone, PartialEq)]
struct Paragraph {
    /// Display name of the nearest named style
    style: Option<String>,
    /// Left margin in points
    indent: Option<f64>,
    heading: bool,
    text: String,
}

/// Parse tree of an OpenDocument text
#[derive(Debug)]
pub(super) struct OdtTree {
    title: Option<String>,
    paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, Default)]
struct StyleInfo {
    display_name: Option<String>,
    parent: Option<String>,
    margin_left: Option<f64>,
    automatic: bool,
}

/// Paragraph styles by internal name
#[derive(Debug, Default)]
struct StyleSheet {
    styles: HashMap<String, StyleInfo>,
}

impl StyleSheet {
    /// Register every `style:style` under a `styles` or `automatic-styles` element
    fn add_from(&mut self, container: &XmlElement) {
        let automatic = container.is("automatic-styles");
        for style in container.children_named("style") {
            let Some(name) = style.attr("name") else {
                continue;
            };
            let margin_left = style
                .child("paragraph-properties")
                .and_then(|properties| properties.attr("margin-left"))
                .and_then(length_in_points);
            self.styles.insert(
                name.to_string(),
                StyleInfo {
                    display_name: style.attr("display-name").map(str::to_string),
                    parent: style.attr("parent-style-name").map(str::to_string),
                    margin_left,
                    automatic,
                },
            );
        }
    }

    /// Add the style sections found directly under a document root
    fn add_document(&mut self, root: &XmlElement) {
        for local in ["styles", "automatic-styles"] {
            if let Some(container) = root.child(local) {
                self.add_from(container);
            }
        }
    }

    /// Display name of the first named style in the chain, and the nearest margin
    fn resolve(&self, name: &str) -> (Option<String>, Option<f64>) {
        let mut current = name.to_string();
        let mut margin = None;
        for _ in 0..MAX_STYLE_DEPTH {
            let Some(info) = self.styles.get(&current) else {
                // Unknown styles still carry a usable name
                return (Some(current.replace("_20_", " ")), margin);
            };
            margin = margin.or(info.margin_left);
            if !info.automatic {
                let display = info.display_name.clone().unwrap_or_else(|| current.replace("_20_", " "));
                return (Some(display), margin);
            }
            match &info.parent {
                Some(parent) => current = parent.clone(),
                None => return (None, margin),
            }
        }
        (None, margin)
    }
}

/// Convert an ODF length (`1.5in`, `3.81cm`, `108pt`, ...) to points
fn length_in_points(value: &str) -> Option<f64> {
    let value = value.trim();
    let split = value.find(|c: char| c.is_ascii_alphabetic())?;
    let (number, unit) = value.split_at(split);
    let number: f64 = number.trim().parse().ok()?;
    let factor = match unit {
        "pt" => 1.0,
        "in" => 72.0,
        "cm" => 72.0 / 2.54,
        "mm" => 72.0 / 25.4,
        "pc" => 12.0,
        "px" => 0.75,
        _ => return None,
    };
    Some(number * factor)
}

pub(super) fn parse(source: &mut SourceFile) -> Result<OdtTree, ParseError> {
    let prefix = source.read_prefix(ZIP_LOCAL_HEADER.len())?;
    if prefix.starts_with(ZIP_LOCAL_HEADER) {
        parse_package(source.reader()?)
    } else {
        parse_flat(&source.read_all()?)
    }
}

fn parse_package<R: Read + Seek>(reader: R) -> Result<OdtTree, ParseError> {
    let mut archive = Archive::open(reader)?;
    let content = parse_document(&archive.read_required("content.xml")?)?;

    let mut sheet = StyleSheet::default();
    if let Some(bytes) = archive.read_member("styles.xml")? {
        sheet.add_document(&parse_document(&bytes)?);
    }
    sheet.add_document(&content);

    let title = match archive.read_member("meta.xml")? {
        Some(bytes) => {
            let meta = parse_document(&bytes)?;
            meta.child("meta").and_then(read_title)
        }
        None => None,
    };

    build_tree(&content, &sheet, title)
}

fn parse_flat(bytes: &[u8]) -> Result<OdtTree, ParseError> {
    let root = parse_document(bytes)?;
    if !root.is("document") {
        return Err(ParseError::corrupt(format!(
            "root element is <{}>, expected <office:document>",
            root.name
        )));
    }
    let mut sheet = StyleSheet::default();
    sheet.add_document(&root);
    let title = root.child("meta").and_then(read_title);
    build_tree(&root, &sheet, title)
}

fn read_title(meta: &XmlElement) -> Option<String> {
    meta.child("title")
        .map(XmlElement::text)
        .filter(|title| !title.trim().is_empty())
}

fn build_tree(root: &XmlElement, sheet: &StyleSheet, title: Option<String>) -> Result<OdtTree, ParseError> {
    let text = root
        .child("body")
        .and_then(|body| body.child("text"))
        .ok_or_else(|| ParseError::corrupt("document has no office:body/office:text"))?;

    let mut paragraphs = Vec::new();
    collect_paragraphs(text, sheet, &mut paragraphs);
    debug!("OpenDocument text with {} paragraphs", paragraphs.len());
    Ok(OdtTree { title, paragraphs })
}

fn collect_paragraphs(parent: &XmlElement, sheet: &StyleSheet, out: &mut Vec<Paragraph>) {
    for element in parent.elements() {
        match element.local_name() {
            local @ ("p" | "h") => {
                let (style, indent) = match element.attr("style-name") {
                    Some(name) => sheet.resolve(name),
                    None => (None, None),
                };
                let mut text = String::new();
                collect_text(element, &mut text);
                out.push(Paragraph { style, indent, heading: local == "h", text });
            }
            local if SKIPPED_CONTAINERS.contains(&local) => {}
            // Lists, sections and tables nest paragraphs
            _ => collect_paragraphs(element, sheet, out),
        }
    }
}

fn collect_text(element: &XmlElement, out: &mut String) {
    for node in &element.children {
        match node {
            XmlNode::Text(text) => {
                // ODF collapses runs of white space in character data
                let mut last_space = out.ends_with(' ');
                for c in text.chars() {
                    if c.is_whitespace() {
                        if !last_space {
                            out.push(' ');
                        }
                        last_space = true;
                    } else {
                        out.push(c);
                        last_space = false;
                    }
                }
            }
            XmlNode::Element(child) => match child.local_name() {
                "s" => {
                    let count = child.attr("c").and_then(|c| c.parse::<usize>().ok()).unwrap_or(1);
                    out.extend(std::iter::repeat_n(' ', count));
                }
                "tab" => out.push('\t'),
                "line-break" => out.push('\n'),
                "note" | "annotation" => {}
                _ => collect_text(child, out),
            },
        }
    }
}

fn classify_style(name: &str) -> Option<ElementKind> {
    Some(match style_key(name).as_str() {
        "sceneheading" | "sceneheader" => ElementKind::SceneHeading,
        "scenecharacters" => ElementKind::SceneCharacters,
        "action" => ElementKind::Action,
        "character" => ElementKind::Character,
        "parenthetical" => ElementKind::Parenthetical,
        "dialogue" | "dialog" => ElementKind::Dialogue,
        "lyrics" => ElementKind::Lyrics,
        "transition" => ElementKind::Transition,
        "shot" => ElementKind::Shot,
        "note" => ElementKind::Note,
        _ => return None,
    })
}

fn classify_shape(paragraph: &Paragraph, previous: Option<ElementKind>, next: Option<&Paragraph>) -> ElementKind {
    let text = paragraph.text.trim();
    let after_cue = matches!(previous, Some(ElementKind::Character | ElementKind::Parenthetical));

    if looks_like_scene_heading(text) {
        return ElementKind::SceneHeading;
    }
    if paragraph.heading {
        return ElementKind::Section;
    }
    if is_transition_shape(text) {
        return ElementKind::Transition;
    }
    if is_parenthetical_shape(text) && (after_cue || previous == Some(ElementKind::Dialogue)) {
        return ElementKind::Parenthetical;
    }
    if is_upper_case(text) && text.chars().count() <= MAX_CUE_CHARS {
        let indented = paragraph.indent.is_some_and(|indent| indent >= CUE_INDENT_PT);
        let followed_by_speech = next.is_some_and(|next| {
            let next = next.text.trim();
            !next.is_empty() && !is_upper_case(next)
        });
        if indented || followed_by_speech {
            return ElementKind::Character;
        }
    }
    if after_cue {
        return ElementKind::Dialogue;
    }
    ElementKind::Action
}

pub(super) fn normalize(tree: OdtTree) -> Result<DocumentBuilder, NormalizationError> {
    let mut builder = DocumentBuilder::new();
    if let Some(title) = &tree.title {
        builder.set_title(title);
    }

    let mut previous: Option<ElementKind> = None;
    for (index, paragraph) in tree.paragraphs.iter().enumerate() {
        if paragraph.text.trim().is_empty() {
            previous = None;
            continue;
        }
        let kind = paragraph
            .style
            .as_deref()
            .and_then(classify_style)
            .unwrap_or_else(|| classify_shape(paragraph, previous, tree.paragraphs.get(index + 1)));
        builder.push(kind, &paragraph.text);
        previous = Some(kind);
    }
    Ok(builder)
}
