/*!
 * Trelby screenplays (`.trelby`).
 *
 * Line-oriented text: a `#Version` header, `#` directives (the config block
 * among them) up to `#Start-Script`, then one script line per text line.
 * Each script line starts with a line-break code and a type code:
 *
 * ```text
 * .\INT. HOUSE - DAY
 * >.Jane opens the door and
 * ..steps inside.
 * ```
 *
 * The line-break code says how the line joins the next one; `.` closes the
 * paragraph.
 */

use log::debug;

use super::SourceFile;
use crate::document::{DocumentBuilder, ElementKind};
use crate::errors::{NormalizationError, ParseError};
use crate::formats::signature::strip_bom;

const NEWEST_VERSION: u32 = 3;

const TYPE_CODES: &[char] = &['\\', '.', '_', ':', '(', '/', '=', '@', '%'];

/// One rebuilt paragraph
#[derive(Debug, Clone, PartialEq, Eq)]
struct Paragraph {
    type_code: char,
    text: String,
}

/// Parse tree of a Trelby script
#[derive(Debug)]
pub(super) struct TrelbyTree {
    version: u32,
    paragraphs: Vec<Paragraph>,
}

pub(super) fn parse(source: &mut SourceFile) -> Result<TrelbyTree, ParseError> {
    let bytes = source.read_all()?;
    parse_bytes(&bytes)
}

fn parse_version(line: Option<&str>) -> Result<u32, ParseError> {
    let line = line.ok_or_else(|| ParseError::corrupt("empty file"))?;
    let number = line
        .strip_prefix("#Version ")
        .ok_or_else(|| ParseError::corrupt("missing #Version header"))?;
    let version: u32 = number
        .trim()
        .parse()
        .map_err(|_| ParseError::corrupt(format!("invalid version '{}'", number.trim())))?;
    match version {
        0 => Err(ParseError::corrupt("invalid version 0")),
        v if v > NEWEST_VERSION => Err(ParseError::UnsupportedVariant {
            variant: format!("Trelby format version {}", v),
            hint: "Export the script from Trelby as Fountain or Final Draft and repeat the import.".to_string(),
        }),
        v => Ok(v),
    }
}

fn parse_bytes(bytes: &[u8]) -> Result<TrelbyTree, ParseError> {
    let text = String::from_utf8(strip_bom(bytes).to_vec())?;
    let mut lines = text.lines().map(|line| line.trim_end_matches('\r'));

    let version = parse_version(lines.next())?;

    let mut in_config = false;
    let mut started = false;
    for line in lines.by_ref() {
        match line {
            "#Begin-Config" => in_config = true,
            "#End-Config" => in_config = false,
            "#Start-Script" if !in_config => {
                started = true;
                break;
            }
            _ => {}
        }
    }
    if !started {
        return Err(ParseError::corrupt("missing #Start-Script"));
    }
    // Trelby terminates every line it writes
    if !text.ends_with('\n') {
        return Err(ParseError::corrupt("script ends in the middle of a line"));
    }

    let mut paragraphs = Vec::new();
    let mut open: Option<Paragraph> = None;
    for (index, line) in lines.enumerate() {
        if line.is_empty() {
            continue;
        }
        let mut chars = line.chars();
        let (Some(line_break), Some(type_code)) = (chars.next(), chars.next()) else {
            return Err(ParseError::corrupt(format!("script line {} is too short", index + 1)));
        };
        if !TYPE_CODES.contains(&type_code) {
            return Err(ParseError::corrupt(format!(
                "unknown type code '{}' on script line {}",
                type_code,
                index + 1
            )));
        }

        let paragraph = open.get_or_insert_with(|| Paragraph { type_code, text: String::new() });
        paragraph.text.push_str(chars.as_str());
        match line_break {
            '>' => paragraph.text.push(' '),
            '+' => paragraph.text.push_str("  "),
            '&' => {}
            '|' => paragraph.text.push('\n'),
            '.' => {
                if let Some(done) = open.take() {
                    paragraphs.push(done);
                }
            }
            other => {
                return Err(ParseError::corrupt(format!(
                    "unknown line break code '{}' on script line {}",
                    other,
                    index + 1
                )));
            }
        }
    }
    if open.is_some() {
        return Err(ParseError::corrupt("last paragraph is not terminated"));
    }

    debug!("Trelby v{} script with {} paragraphs", version, paragraphs.len());
    Ok(TrelbyTree { version, paragraphs })
}

fn classify(type_code: char) -> Option<ElementKind> {
    Some(match type_code {
        '\\' => ElementKind::SceneHeading,
        '.' => ElementKind::Action,
        '_' => ElementKind::Character,
        ':' => ElementKind::Dialogue,
        '(' => ElementKind::Parenthetical,
        '/' => ElementKind::Transition,
        '=' => ElementKind::Shot,
        '@' => ElementKind::Section,
        '%' => ElementKind::Note,
        _ => return None,
    })
}

pub(super) fn normalize(tree: TrelbyTree) -> Result<DocumentBuilder, NormalizationError> {
    debug!("Normalizing Trelby v{} script", tree.version);
    let mut builder = DocumentBuilder::new();
    for paragraph in tree.paragraphs {
        let kind = classify(paragraph.type_code)
            .ok_or_else(|| NormalizationError::Unmappable(format!("type code '{}'", paragraph.type_code)))?;
        builder.push(kind, &paragraph.text);
    }
    Ok(builder)
}
