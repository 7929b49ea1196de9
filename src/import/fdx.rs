/*!
 * Final Draft screenplays and templates (`.fdx`, `.fdxt`).
 *
 * Both share one XML schema: a `FinalDraft` root whose `Content` holds
 * `Paragraph` elements with a `Type` attribute. Anything else under
 * `Content` (scene properties, script notes, settings) is metadata.
 */

use log::{debug, warn};

use super::text_shape::single_spaced_lower;
use super::xml::{parse_document, XmlElement};
use super::SourceFile;
use crate::document::{DocumentBuilder, ElementKind};
use crate::errors::{NormalizationError, ParseError};
use crate::formats::signature::xml_root;
use crate::formats::FINAL_DRAFT_LEGACY;

/// One `Paragraph` with its type name normalized
#[derive(Debug, Clone, PartialEq, Eq)]
struct Paragraph {
    kind: String,
    text: String,
}

/// Parse tree of a Final Draft document
#[derive(Debug)]
pub(super) struct FdxTree {
    title: Option<String>,
    paragraphs: Vec<Paragraph>,
}

pub(super) fn parse(source: &mut SourceFile) -> Result<FdxTree, ParseError> {
    let bytes = source.read_all()?;
    parse_bytes(&bytes, source.extension())
}

fn parse_bytes(bytes: &[u8], extension: Option<&str>) -> Result<FdxTree, ParseError> {
    if FINAL_DRAFT_LEGACY.matches_extension(extension) && xml_root(bytes).is_none() {
        return Err(ParseError::UnsupportedVariant {
            variant: FINAL_DRAFT_LEGACY.file_type.to_string(),
            hint: FINAL_DRAFT_LEGACY.hint.to_string(),
        });
    }

    let root = parse_document(bytes)?;
    if !root.is("FinalDraft") {
        return Err(ParseError::corrupt(format!(
            "root element is <{}>, expected <FinalDraft>",
            root.name
        )));
    }
    let content = root
        .child("Content")
        .ok_or_else(|| ParseError::corrupt("document has no Content element"))?;

    let mut paragraphs = Vec::new();
    collect_paragraphs(content, &mut paragraphs);

    let title = root
        .child("TitlePage")
        .and_then(|page| page.child("Content"))
        .and_then(|page| {
            page.children_named("Paragraph")
                .map(paragraph_text)
                .find(|text| !text.trim().is_empty())
        });

    debug!("Final Draft document with {} paragraphs", paragraphs.len());
    Ok(FdxTree { title, paragraphs })
}

fn collect_paragraphs(parent: &XmlElement, out: &mut Vec<Paragraph>) {
    for element in parent.elements() {
        match element.local_name() {
            "Paragraph" => out.push(Paragraph {
                kind: single_spaced_lower(element.attr("Type").unwrap_or("General")),
                text: paragraph_text(element),
            }),
            "DualDialogue" => collect_paragraphs(element, out),
            other => debug!("Skipping <{}> in Content", other),
        }
    }
}

/// Joined `Text` runs; older revisions keep the text directly in the paragraph
fn paragraph_text(paragraph: &XmlElement) -> String {
    let mut runs = paragraph.children_named("Text").peekable();
    if runs.peek().is_none() {
        return paragraph.direct_text();
    }
    runs.map(XmlElement::text).collect()
}

fn classify(kind: &str) -> Option<ElementKind> {
    Some(match kind {
        "scene heading" => ElementKind::SceneHeading,
        "action" | "general" => ElementKind::Action,
        "character" => ElementKind::Character,
        "dialogue" => ElementKind::Dialogue,
        "parenthetical" => ElementKind::Parenthetical,
        "transition" => ElementKind::Transition,
        "shot" => ElementKind::Shot,
        "cast list" => ElementKind::SceneCharacters,
        "new act" | "end of act" => ElementKind::Section,
        "lyrics" | "singing" => ElementKind::Lyrics,
        _ => return None,
    })
}

pub(super) fn normalize(tree: FdxTree) -> Result<DocumentBuilder, NormalizationError> {
    let mut builder = DocumentBuilder::new();
    if let Some(title) = &tree.title {
        builder.set_title(title);
    }
    for paragraph in tree.paragraphs {
        let kind = classify(&paragraph.kind).unwrap_or_else(|| {
            warn!("Unknown Final Draft paragraph type '{}', importing as action", paragraph.kind);
            ElementKind::Action
        });
        builder.push(kind, &paragraph.text);
    }
    Ok(builder)
}
