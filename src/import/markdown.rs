/*!
 * Plain text and Markdown notes (`.md`, `.markdown`).
 *
 * Markup is not interpreted: every non-blank line becomes one text
 * paragraph as written. The file carries no title of its own, so the
 * importer names the document after the file.
 */

use log::debug;

use super::SourceFile;
use crate::document::{DocumentBuilder, ElementKind};
use crate::errors::{NormalizationError, ParseError};
use crate::formats::signature::strip_bom;

/// Parse tree of a notes file
#[derive(Debug)]
pub(super) struct MarkdownTree {
    /// Non-blank lines, carriage returns removed
    paragraphs: Vec<String>,
}

pub(super) fn parse(source: &mut SourceFile) -> Result<MarkdownTree, ParseError> {
    let bytes = source.read_all()?;
    parse_bytes(&bytes)
}

fn parse_bytes(bytes: &[u8]) -> Result<MarkdownTree, ParseError> {
    let text = String::from_utf8(strip_bom(bytes).to_vec())?;
    let paragraphs: Vec<String> = text
        .split('\n')
        .map(|line| line.replace('\r', ""))
        .filter(|line| !line.trim().is_empty())
        .collect();

    debug!("Markdown text with {} paragraphs", paragraphs.len());
    Ok(MarkdownTree { paragraphs })
}

pub(super) fn normalize(tree: MarkdownTree) -> Result<DocumentBuilder, NormalizationError> {
    let mut builder = DocumentBuilder::new();
    for paragraph in &tree.paragraphs {
        builder.push(ElementKind::Text, paragraph);
    }
    Ok(builder)
}
