/*!
 * Core document model types.
 *
 * These types are JSON-serializable so callers can persist or inspect an
 * imported document without knowing which format it came from.
 */

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::NormalizationError;
use crate::formats::SourceFormat;

/// Kind of a document element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    SceneHeading,
    SceneCharacters,
    Action,
    Character,
    Parenthetical,
    Dialogue,
    Lyrics,
    Transition,
    Shot,
    /// Act, sequence or folder heading
    Section,
    Synopsis,
    Note,
    /// Plain prose paragraph
    Text,
}

impl ElementKind {
    // @returns: Human readable name
    pub fn label(&self) -> &'static str {
        match self {
            Self::SceneHeading => "Scene Heading",
            Self::SceneCharacters => "Scene Characters",
            Self::Action => "Action",
            Self::Character => "Character",
            Self::Parenthetical => "Parenthetical",
            Self::Dialogue => "Dialogue",
            Self::Lyrics => "Lyrics",
            Self::Transition => "Transition",
            Self::Shot => "Shot",
            Self::Section => "Section",
            Self::Synopsis => "Synopsis",
            Self::Note => "Note",
            Self::Text => "Text",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One typed paragraph of the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentElement {
    pub kind: ElementKind,
    pub text: String,
}

impl DocumentElement {
    pub fn new(kind: ElementKind, text: impl Into<String>) -> Self {
        Self { kind, text: text.into() }
    }
}

impl fmt::Display for DocumentElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.text)
    }
}

/// Format-independent imported document.
///
/// Only [`DocumentBuilder::finish`] creates one, so a document always has
/// at least one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalDocument {
    /// Format the document was imported from
    pub source_format: SourceFormat,

    /// Title, when the source carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    elements: Vec<DocumentElement>,
}

impl CanonicalDocument {
    /// Elements in reading order
    pub fn elements(&self) -> &[DocumentElement] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DocumentElement> {
        self.elements.iter()
    }

    /// Number of elements (never zero)
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element kinds in order
    pub fn kinds(&self) -> Vec<ElementKind> {
        self.elements.iter().map(|e| e.kind).collect()
    }

    /// Elements of one kind, in order
    pub fn elements_of(&self, kind: ElementKind) -> impl Iterator<Item = &DocumentElement> {
        self.elements.iter().filter(move |e| e.kind == kind)
    }

    /// Hex SHA-256 over the element sequence.
    ///
    /// Two documents with the same kinds and texts in the same order have
    /// the same digest regardless of source format or title.
    pub fn content_digest(&self) -> String {
        let mut hasher = Sha256::new();
        for element in &self.elements {
            hasher.update(element.kind.label().as_bytes());
            hasher.update([0u8]);
            hasher.update(element.text.as_bytes());
            hasher.update([0u8]);
        }
        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect()
    }

    /// Consume the document, returning its elements
    pub fn into_elements(self) -> Vec<DocumentElement> {
        self.elements
    }
}

impl<'a> IntoIterator for &'a CanonicalDocument {
    type Item = &'a DocumentElement;
    type IntoIter = std::slice::Iter<'a, DocumentElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl fmt::Display for CanonicalDocument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(title) = &self.title {
            writeln!(f, "Title: {}", title)?;
        }
        writeln!(f, "Source format: {}", self.source_format)?;
        writeln!(f, "Elements: {}", self.elements.len())?;
        for element in &self.elements {
            writeln!(f, "{}", element)?;
        }
        Ok(())
    }
}

/// Accumulates elements during normalization.
///
/// Text is trimmed at both ends; blank text is dropped instead of becoming
/// an empty element. Nothing is reordered or merged.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    title: Option<String>,
    elements: Vec<DocumentElement>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element; returns false when the text was blank and dropped
    pub fn push(&mut self, kind: ElementKind, text: impl AsRef<str>) -> bool {
        let text = text.as_ref().trim();
        if text.is_empty() {
            return false;
        }
        self.elements.push(DocumentElement::new(kind, text));
        true
    }

    /// Set the title if it is not blank
    pub fn set_title(&mut self, title: impl AsRef<str>) {
        let title = title.as_ref().trim();
        if !title.is_empty() {
            self.title = Some(title.to_string());
        }
    }

    pub fn has_title(&self) -> bool {
        self.title.is_some()
    }

    /// Kind of the most recent element
    pub fn last_kind(&self) -> Option<ElementKind> {
        self.elements.last().map(|e| e.kind)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Seal the document; fails when nothing was pushed
    pub fn finish(self, source_format: SourceFormat) -> Result<CanonicalDocument, NormalizationError> {
        if self.elements.is_empty() {
            return Err(NormalizationError::NoContent);
        }
        Ok(CanonicalDocument {
            source_format,
            title: self.title,
            elements: self.elements,
        })
    }
}
