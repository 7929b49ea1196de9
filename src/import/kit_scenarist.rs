/*!
 * KIT Scenarist projects (`.kitsp`).
 *
 * A project is an SQLite database. The screenplay lives as XML in the
 * `scenario` table (the row that is not a draft), the project name in
 * `scenario_data`. Every direct child of the `<scenario>` root is one block;
 * its tag is the block type.
 */

use std::path::Path;

use log::{debug, warn};
use rusqlite::{Connection, OpenFlags, OptionalExtension};

use super::xml::{parse_document, XmlElement};
use super::SourceFile;
use crate::document::{DocumentBuilder, ElementKind};
use crate::errors::{NormalizationError, ParseError};
use crate::formats::signature::is_sqlite_database;

const SQLITE_HEADER_BYTES: usize = 100;

/// One scenario block
#[derive(Debug, Clone, PartialEq, Eq)]
struct Block {
    tag: String,
    text: String,
}

/// Parse tree of a KIT Scenarist project
#[derive(Debug)]
pub(super) struct ScenarioTree {
    name: Option<String>,
    blocks: Vec<Block>,
}

pub(super) fn parse(source: &mut SourceFile) -> Result<ScenarioTree, ParseError> {
    let header = source.read_prefix(SQLITE_HEADER_BYTES)?;
    check_header(&header, source.size()?)?;
    let (name, scenario) = read_project(source.path())?;
    parse_scenario(name, &scenario)
}

/// Reject files that are not SQLite or are shorter than their header says
fn check_header(header: &[u8], file_size: u64) -> Result<(), ParseError> {
    if !is_sqlite_database(header) || header.len() < SQLITE_HEADER_BYTES {
        return Err(ParseError::corrupt("not an SQLite database"));
    }
    let page_size = match u16::from_be_bytes([header[16], header[17]]) {
        1 => 65_536,
        size => u64::from(size),
    };
    let page_count = u64::from(u32::from_be_bytes([header[28], header[29], header[30], header[31]]));
    if page_count > 0 && file_size < page_size * page_count {
        return Err(ParseError::corrupt(format!(
            "project database is truncated ({} of {} bytes)",
            file_size,
            page_size * page_count
        )));
    }
    Ok(())
}

fn table_columns(connection: &Connection, table: &str) -> Result<Vec<String>, ParseError> {
    let mut statement = connection.prepare(&format!("PRAGMA table_info({})", table))?;
    let columns = statement
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// Project name and scenario XML
fn read_project(path: &Path) -> Result<(Option<String>, String), ParseError> {
    let connection = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;

    let columns = table_columns(&connection, "scenario")?;
    if columns.is_empty() {
        return Err(ParseError::corrupt("project has no scenario table"));
    }
    // Older schemas have no draft flag and a single scenario row
    let query = if columns.iter().any(|c| c == "is_draft") {
        "SELECT text FROM scenario WHERE is_draft = 0 ORDER BY id LIMIT 1"
    } else {
        "SELECT text FROM scenario ORDER BY id LIMIT 1"
    };
    let scenario: String = connection
        .query_row(query, [], |row| row.get(0))
        .optional()?
        .ok_or_else(|| ParseError::corrupt("project has no scenario"))?;

    let name = if table_columns(&connection, "scenario_data")?.is_empty() {
        None
    } else {
        connection
            .query_row(
                "SELECT data_value FROM scenario_data WHERE data_name = 'name' LIMIT 1",
                [],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .flatten()
    };

    debug!("Read scenario of {} bytes from {:?}", scenario.len(), path);
    Ok((name, scenario))
}

/// Block text: `<v>` wrappers in newer revisions, CDATA directly in older ones
fn block_text(block: &XmlElement) -> String {
    match block.child("v") {
        Some(value) => value.text(),
        None => block.direct_text(),
    }
}

fn parse_scenario(name: Option<String>, scenario: &str) -> Result<ScenarioTree, ParseError> {
    let root = parse_document(scenario.as_bytes())?;
    if !root.is("scenario") {
        return Err(ParseError::corrupt(format!(
            "scenario root is <{}>, expected <scenario>",
            root.name
        )));
    }
    let blocks = root
        .elements()
        .map(|block| Block {
            tag: block.local_name().to_string(),
            text: block_text(block),
        })
        .collect();
    Ok(ScenarioTree { name, blocks })
}

enum BlockRole {
    Element(ElementKind),
    /// Group and folder footers only close a structure
    Closer,
}

fn classify(tag: &str) -> Option<BlockRole> {
    let kind = match tag {
        "scene_heading" => ElementKind::SceneHeading,
        "scene_characters" => ElementKind::SceneCharacters,
        "action" => ElementKind::Action,
        "character" => ElementKind::Character,
        "parenthetical" => ElementKind::Parenthetical,
        "dialog" | "dialogue" => ElementKind::Dialogue,
        "transition" => ElementKind::Transition,
        "note" | "noprintable_text" => ElementKind::Note,
        "lyrics" => ElementKind::Lyrics,
        "title_header" | "title" => ElementKind::Action,
        "scene_group_header" | "folder_header" => ElementKind::Section,
        "scene_group_footer" | "folder_footer" => return Some(BlockRole::Closer),
        _ => return None,
    };
    Some(BlockRole::Element(kind))
}

pub(super) fn normalize(tree: ScenarioTree) -> Result<DocumentBuilder, NormalizationError> {
    let mut builder = DocumentBuilder::new();
    if let Some(name) = &tree.name {
        builder.set_title(name);
    }
    for block in tree.blocks {
        let kind = match classify(&block.tag) {
            Some(BlockRole::Element(kind)) => kind,
            Some(BlockRole::Closer) => continue,
            None => {
                warn!("Unknown scenario block <{}>, importing as action", block.tag);
                ElementKind::Action
            }
        };
        builder.push(kind, &block.text);
    }
    Ok(builder)
}
