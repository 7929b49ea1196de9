/*!
 * Fountain plain-text screenplays (`.fountain`, `.spmd`, `.txt`).
 *
 * The parser only cleans the text up (encoding, line endings, boneyard,
 * title page). Fountain's meaning lives in blank lines and capitalization,
 * so all classification happens in the normalizer.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::text_shape::{is_parenthetical_shape, is_upper_case, looks_like_scene_heading};
use super::SourceFile;
use crate::document::{DocumentBuilder, ElementKind};
use crate::errors::{NormalizationError, ParseError};
use crate::formats::signature::{strip_bom, FOUNTAIN_TITLE_KEYS};

const MAX_CHARACTER_CUE_CHARS: usize = 50;

static BONEYARD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("Invalid boneyard regex"));

// @const: `Key: value` line of a title page
static TITLE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z ]*):\s*(.*)$").expect("Invalid title key regex"));

static SCENE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*#[\w.\-]+#\s*$").expect("Invalid scene number regex"));

static INLINE_NOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[\[.*?\]\]").expect("Invalid note regex"));

static PAGE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^={3,}$").expect("Invalid page break regex"));

/// Parse tree of a Fountain file
#[derive(Debug)]
pub(super) struct FountainTree {
    /// Title page entries with lowercase keys
    title_page: Vec<(String, String)>,
    /// Body lines, leading whitespace intact
    lines: Vec<String>,
}

pub(super) fn parse(source: &mut SourceFile) -> Result<FountainTree, ParseError> {
    let bytes = source.read_all()?;
    parse_bytes(&bytes)
}

fn parse_bytes(bytes: &[u8]) -> Result<FountainTree, ParseError> {
    let text = String::from_utf8(strip_bom(bytes).to_vec())?;
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = BONEYARD.replace_all(&text, "");

    let mut lines: Vec<&str> = text.split('\n').collect();
    let title_page = split_title_page(&mut lines);

    debug!("Fountain text with {} title entries and {} lines", title_page.len(), lines.len());
    Ok(FountainTree {
        title_page,
        lines: lines.into_iter().map(str::to_string).collect(),
    })
}

/// `(key, value)` of a title page line, when the key is a known one
fn title_entry(line: &str) -> Option<(String, String)> {
    let captures = TITLE_KEY.captures(line)?;
    let key = captures[1].trim().to_lowercase();
    FOUNTAIN_TITLE_KEYS
        .contains(&key.as_str())
        .then(|| (key, captures[2].trim().to_string()))
}

/// Remove a leading title page from `lines` and return its entries.
///
/// The page ends at the first blank line, or at the first line that is
/// neither an indented continuation nor another known key.
fn split_title_page(lines: &mut Vec<&str>) -> Vec<(String, String)> {
    let Some(first) = lines.first() else {
        return Vec::new();
    };
    if title_entry(first).is_none() {
        return Vec::new();
    }

    let mut entries: Vec<(String, String)> = Vec::new();
    let mut consumed = 0;
    for line in lines.iter() {
        if line.trim().is_empty() {
            break;
        }
        let indented = line.starts_with("   ") || line.starts_with('\t');
        if indented {
            if let Some((_, value)) = entries.last_mut() {
                if !value.is_empty() {
                    value.push('\n');
                }
                value.push_str(line.trim());
            }
        } else if let Some(entry) = title_entry(line) {
            entries.push(entry);
        } else {
            break;
        }
        consumed += 1;
    }
    lines.drain(..consumed);
    entries
}

fn is_blank(line: Option<&&str>) -> bool {
    line.is_none_or(|l| l.trim().is_empty())
}

/// Character cue shape: upper case outside a trailing `(extension)`
fn is_character_cue(line: &str) -> bool {
    let line = line.trim_end_matches('^').trim_end();
    if line.chars().count() > MAX_CHARACTER_CUE_CHARS {
        return false;
    }
    let head = match line.rfind('(') {
        Some(open) if line.ends_with(')') => &line[..open],
        _ => line,
    };
    is_upper_case(head)
}

fn strip_scene_number(text: &str) -> String {
    SCENE_NUMBER.replace(text, "").into_owned()
}

fn strip_inline_notes(text: &str) -> String {
    INLINE_NOTE.replace_all(text, "").into_owned()
}

/// Pending action lines, joined with newlines when flushed
#[derive(Default)]
struct ActionBlock {
    lines: Vec<String>,
}

impl ActionBlock {
    fn push(&mut self, line: &str) {
        self.lines.push(strip_inline_notes(line.trim_end()));
    }

    fn flush(&mut self, builder: &mut DocumentBuilder) {
        if !self.lines.is_empty() {
            builder.push(ElementKind::Action, self.lines.join("\n"));
            self.lines.clear();
        }
    }
}

pub(super) fn normalize(tree: FountainTree) -> Result<DocumentBuilder, NormalizationError> {
    let mut builder = DocumentBuilder::new();
    if let Some((_, title)) = tree.title_page.iter().find(|(key, _)| key == "title") {
        builder.set_title(title.replace('\n', " "));
    }

    let lines: Vec<&str> = tree.lines.iter().map(String::as_str).collect();
    let mut action = ActionBlock::default();
    let mut i = 0;

    while i < lines.len() {
        let raw = lines[i];
        let line = raw.trim();
        let previous_blank = i == 0 || is_blank(lines.get(i - 1));
        let next_blank = is_blank(lines.get(i + 1));

        if line.is_empty() || PAGE_BREAK.is_match(line) {
            action.flush(&mut builder);
            i += 1;
            continue;
        }

        if line.starts_with("[[") && line.ends_with("]]") && line.len() >= 4 {
            action.flush(&mut builder);
            builder.push(ElementKind::Note, &line[2..line.len() - 2]);
            i += 1;
            continue;
        }

        if let Some(forced) = line.strip_prefix('!') {
            action.push(forced);
            i += 1;
            continue;
        }

        let single = if let Some(section) = line.strip_prefix('#') {
            Some((ElementKind::Section, section.trim_start_matches('#').to_string()))
        } else if let Some(synopsis) = line.strip_prefix('=') {
            Some((ElementKind::Synopsis, synopsis.to_string()))
        } else if line.starts_with('.') && !line.starts_with("..") {
            Some((ElementKind::SceneHeading, strip_scene_number(&line[1..])))
        } else if previous_blank && next_blank && looks_like_scene_heading(line) {
            Some((ElementKind::SceneHeading, strip_scene_number(line)))
        } else if line.starts_with('>') && line.ends_with('<') && line.len() >= 2 {
            Some((ElementKind::Action, line[1..line.len() - 1].to_string()))
        } else if let Some(transition) = line.strip_prefix('>') {
            Some((ElementKind::Transition, transition.to_string()))
        } else if previous_blank && next_blank && is_upper_case(line) && line.ends_with("TO:") {
            Some((ElementKind::Transition, line.to_string()))
        } else if let Some(lyrics) = line.strip_prefix('~') {
            Some((ElementKind::Lyrics, lyrics.to_string()))
        } else {
            None
        };
        if let Some((kind, text)) = single {
            action.flush(&mut builder);
            builder.push(kind, strip_inline_notes(&text));
            i += 1;
            continue;
        }

        let forced_character = line.strip_prefix('@');
        if forced_character.is_some() || (previous_blank && !next_blank && is_character_cue(line)) {
            action.flush(&mut builder);
            let cue = forced_character.unwrap_or(line).trim_end_matches('^');
            builder.push(ElementKind::Character, cue);
            i = dialogue_block(&lines, i + 1, &mut builder);
            continue;
        }

        action.push(raw);
        i += 1;
    }
    action.flush(&mut builder);

    Ok(builder)
}

/// Consume the lines after a cue; returns the index of the first line after the block
fn dialogue_block(lines: &[&str], mut i: usize, builder: &mut DocumentBuilder) -> usize {
    let mut speech: Vec<String> = Vec::new();
    while let Some(raw) = lines.get(i) {
        let line = raw.trim();
        if line.is_empty() {
            break;
        }
        if is_parenthetical_shape(line) {
            if !speech.is_empty() {
                builder.push(ElementKind::Dialogue, speech.join("\n"));
                speech.clear();
            }
            builder.push(ElementKind::Parenthetical, line);
        } else {
            speech.push(strip_inline_notes(line));
        }
        i += 1;
    }
    if !speech.is_empty() {
        builder.push(ElementKind::Dialogue, speech.join("\n"));
    }
    i
}
