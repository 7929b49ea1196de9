/*!
 * Word documents (`.docx`).
 *
 * The package holds `word/document.xml` (body), `word/styles.xml` (style
 * display names) and `docProps/core.xml` (title). Screenplays written in
 * Word either use named styles ("Scene Heading", "Character", ...) or plain
 * paragraphs laid out with indents; the normalizer handles both.
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
use crate::formats::WORD_BINARY_LEGACY;

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";
const CORE_PROPERTIES_PART: &str = "docProps/core.xml";

/// Left indent from which a short upper-case paragraph reads as a cue (1.5in)
const CUE_INDENT_TWIPS: i64 = 2160;
const MAX_CUE_CHARS: usize = 50;

/// One body paragraph
#[derive(Debug, Clone, PartialEq, Eq)]
struct Paragraph {
    /// Display name of the paragraph style
    style: Option<String>,
    /// Left indent in twips
    indent: Option<i64>,
    text: String,
}

/// Parse tree of a Word document
#[derive(Debug)]
pub(super) struct DocxTree {
    title: Option<String>,
    paragraphs: Vec<Paragraph>,
}

pub(super) fn parse(source: &mut SourceFile) -> Result<DocxTree, ParseError> {
    let prefix = source.read_prefix(8)?;
    if WORD_BINARY_LEGACY.matches(source.extension(), &prefix) {
        return Err(ParseError::UnsupportedVariant {
            variant: WORD_BINARY_LEGACY.file_type.to_string(),
            hint: WORD_BINARY_LEGACY.hint.to_string(),
        });
    }
    parse_package(source.reader()?)
}

fn parse_package<R: Read + Seek>(reader: R) -> Result<DocxTree, ParseError> {
    let mut archive = Archive::open(reader)?;
    let document = parse_document(&archive.read_required(DOCUMENT_PART)?)?;

    let style_names = match archive.read_member(STYLES_PART)? {
        Some(bytes) => read_style_names(&parse_document(&bytes)?),
        None => HashMap::new(),
    };
    let title = match archive.read_member(CORE_PROPERTIES_PART)? {
        Some(bytes) => parse_document(&bytes)?
            .child("title")
            .map(XmlElement::text)
            .filter(|title| !title.trim().is_empty()),
        None => None,
    };

    let body = document
        .child("body")
        .ok_or_else(|| ParseError::corrupt("document part has no body"))?;
    let mut paragraphs = Vec::new();
    collect_paragraphs(body, &style_names, &mut paragraphs);

    debug!("Word document with {} paragraphs and {} styles", paragraphs.len(), style_names.len());
    Ok(DocxTree { title, paragraphs })
}

/// Style id -> display name
fn read_style_names(styles: &XmlElement) -> HashMap<String, String> {
    styles
        .children_named("style")
        .filter_map(|style| {
            let id = style.attr("styleId")?;
            let name = style.child("name").and_then(|name| name.attr("val")).unwrap_or(id);
            Some((id.to_string(), name.to_string()))
        })
        .collect()
}

fn collect_paragraphs(parent: &XmlElement, style_names: &HashMap<String, String>, out: &mut Vec<Paragraph>) {
    for element in parent.elements() {
        match element.local_name() {
            "p" => out.push(read_paragraph(element, style_names)),
            "sectPr" => {}
            // Tables, content controls and custom XML wrap paragraphs
            _ => collect_paragraphs(element, style_names, out),
        }
    }
}

fn read_paragraph(paragraph: &XmlElement, style_names: &HashMap<String, String>) -> Paragraph {
    let properties = paragraph.child("pPr");
    let style = properties
        .and_then(|p| p.child("pStyle"))
        .and_then(|s| s.attr("val"))
        .map(|id| style_names.get(id).cloned().unwrap_or_else(|| id.to_string()));

    // Strict and 2010+ documents write `start`, transitional ones `left`
    let indent = properties.and_then(|p| p.child("ind")).and_then(|ind| {
        ind.attr("start")
            .or_else(|| ind.attr("left"))
            .and_then(|value| value.trim().parse::<i64>().ok())
    });

    let mut text = String::new();
    collect_run_text(paragraph, &mut text);
    Paragraph { style, indent, text }
}

fn collect_run_text(element: &XmlElement, out: &mut String) {
    for node in &element.children {
        let XmlNode::Element(child) = node else {
            continue;
        };
        match child.local_name() {
            "t" => out.push_str(&child.text()),
            "tab" => out.push('\t'),
            "br" | "cr" => out.push('\n'),
            "pPr" | "rPr" | "del" | "delText" | "instrText" | "moveFrom" => {}
            _ => collect_run_text(child, out),
        }
    }
}

fn classify_style(name: &str) -> Option<ElementKind> {
    Some(match style_key(name).as_str() {
        "sceneheading" | "sceneheader" => ElementKind::SceneHeading,
        "scenecharacters" => ElementKind::SceneCharacters,
        "action" | "general" => ElementKind::Action,
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
    if is_transition_shape(text) {
        return ElementKind::Transition;
    }
    if is_parenthetical_shape(text) && (after_cue || previous == Some(ElementKind::Dialogue)) {
        return ElementKind::Parenthetical;
    }
    if is_upper_case(text) && text.chars().count() <= MAX_CUE_CHARS {
        let indented = paragraph.indent.is_some_and(|indent| indent >= CUE_INDENT_TWIPS);
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

pub(super) fn normalize(tree: DocxTree) -> Result<DocumentBuilder, NormalizationError> {
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
