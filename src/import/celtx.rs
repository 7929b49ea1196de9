/*!
 * Celtx projects (`.celtx`).
 *
 * A Celtx project is a ZIP whose `project.rdf` lists the project documents.
 * Screenplays are stored as HTML members with one `<p class="...">` per
 * script element. Celtx writes HTML, not XHTML, so those members are read
 * leniently.
 */

use std::io::{Read, Seek};

use log::{debug, warn};

use super::archive::Archive;
use super::text_shape::style_key;
use super::xml::{parse_document, parse_html, XmlElement, XmlNode};
use super::SourceFile;
use crate::document::{DocumentBuilder, ElementKind};
use crate::errors::{NormalizationError, ParseError};

const PROJECT_MANIFEST: &str = "project.rdf";
const SCRIPT_DOCTYPE_SUFFIX: &str = "ScriptDocument";

/// One `<p>` of a script document
#[derive(Debug, Clone, PartialEq, Eq)]
struct Paragraph {
    /// Normalized class name (`scene-heading` -> `sceneheading`)
    class: Option<String>,
    text: String,
}

/// Parse tree of a Celtx project
#[derive(Debug)]
pub(super) struct CeltxTree {
    title: Option<String>,
    paragraphs: Vec<Paragraph>,
}

pub(super) fn parse(source: &mut SourceFile) -> Result<CeltxTree, ParseError> {
    parse_package(source.reader()?)
}

/// `cx:doctype` and `cx:localFile` may be attributes or child elements
fn description_value(description: &XmlElement, local: &str) -> Option<String> {
    if let Some(value) = description.attr(local) {
        return Some(value.to_string());
    }
    let child = description.child(local)?;
    child
        .attr("resource")
        .map(str::to_string)
        .or_else(|| Some(child.text().trim().to_string()))
        .filter(|value| !value.is_empty())
}

/// Local files of the script documents, in manifest order
fn script_members(manifest: &XmlElement) -> Vec<String> {
    manifest
        .children_named("Description")
        .filter(|description| {
            description_value(description, "doctype").is_some_and(|doctype| doctype.ends_with(SCRIPT_DOCTYPE_SUFFIX))
        })
        .filter_map(|description| description_value(description, "localFile"))
        .collect()
}

fn parse_package<R: Read + Seek>(reader: R) -> Result<CeltxTree, ParseError> {
    let mut archive = Archive::open(reader)?;
    let manifest = parse_document(&archive.read_required(PROJECT_MANIFEST)?)?;

    let mut members = script_members(&manifest);
    if members.is_empty() {
        members = archive
            .member_names()?
            .into_iter()
            .filter(|name| name.starts_with("script") && name.ends_with(".html"))
            .collect();
        debug!("Manifest lists no script, found {} script members by name", members.len());
    }
    if members.is_empty() {
        return Err(ParseError::corrupt("project contains no script document"));
    }

    let mut title = None;
    let mut paragraphs = Vec::new();
    for member in &members {
        let html = parse_html(&archive.read_required(member)?)?;
        if title.is_none() {
            title = html
                .find("title")
                .map(|t| collapse_whitespace(&t.text()))
                .filter(|t| !t.is_empty());
        }
        let body = html.find("body").unwrap_or(&html);
        collect_paragraphs(body, &mut paragraphs);
    }

    debug!("Celtx project with {} script documents, {} paragraphs", members.len(), paragraphs.len());
    Ok(CeltxTree { title, paragraphs })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_paragraphs(parent: &XmlElement, out: &mut Vec<Paragraph>) {
    for element in parent.elements() {
        if element.local_name().eq_ignore_ascii_case("p") {
            let class = element
                .attr("class")
                .and_then(|class| class.split_whitespace().next())
                .map(style_key);
            let mut text = String::new();
            collect_text(element, &mut text);
            out.push(Paragraph { class, text });
        } else {
            collect_paragraphs(element, out);
        }
    }
}

fn collect_text(element: &XmlElement, out: &mut String) {
    for node in &element.children {
        match node {
            XmlNode::Text(text) => {
                // HTML white space collapses, except right after a <br>
                let mut last_space = out.is_empty() || out.ends_with([' ', '\n']);
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
            XmlNode::Element(child) if child.local_name().eq_ignore_ascii_case("br") => {
                while out.ends_with(' ') {
                    out.pop();
                }
                out.push('\n');
            }
            XmlNode::Element(child) => collect_text(child, out),
        }
    }
}

fn classify(class: &str) -> Option<ElementKind> {
    Some(match class {
        "sceneheading" => ElementKind::SceneHeading,
        "action" => ElementKind::Action,
        "character" => ElementKind::Character,
        "dialog" | "dialogue" => ElementKind::Dialogue,
        "parenthetical" => ElementKind::Parenthetical,
        "transition" => ElementKind::Transition,
        "shot" => ElementKind::Shot,
        "act" => ElementKind::Section,
        "text" => ElementKind::Text,
        _ => return None,
    })
}

pub(super) fn normalize(tree: CeltxTree) -> Result<DocumentBuilder, NormalizationError> {
    let mut builder = DocumentBuilder::new();
    if let Some(title) = &tree.title {
        builder.set_title(title);
    }
    for paragraph in tree.paragraphs {
        let kind = match paragraph.class.as_deref() {
            Some(class) => classify(class).unwrap_or_else(|| {
                warn!("Unknown Celtx paragraph class '{}', importing as action", class);
                ElementKind::Action
            }),
            None => ElementKind::Action,
        };
        builder.push(kind, &paragraph.text);
    }
    Ok(builder)
}
