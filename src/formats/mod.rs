/*!
 * Catalog of supported source formats.
 *
 * The catalog is a plain immutable value: it is built once with
 * [`FormatCatalog::standard`] and handed by reference to the detector and
 * the importer. Nothing in it can be changed after construction.
 */

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

pub mod detector;
pub mod signature;

pub use detector::{Detection, FormatDetector};

/// Closed set of formats the importer can read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    // @format: KIT Scenarist project (SQLite)
    #[serde(rename = "kitsp")]
    KitScenarist,
    // @format: Final Draft XML screenplay
    #[serde(rename = "fdx")]
    FinalDraft,
    // @format: Final Draft XML template
    #[serde(rename = "fdxt")]
    FinalDraftTemplate,
    // @format: Trelby screenplay
    Trelby,
    // @format: Word document
    #[serde(rename = "docx")]
    OfficeOpenXml,
    // @format: OpenDocument text (packaged or flat)
    #[serde(rename = "odt")]
    OpenDocumentText,
    // @format: Fountain plain-text markup
    Fountain,
    // @format: Celtx project archive
    Celtx,
    // @format: Plain text or Markdown notes
    #[serde(rename = "md")]
    Markdown,
}

impl SourceFormat {
    /// Every format, in catalog order
    pub const ALL: [SourceFormat; 9] = [
        Self::KitScenarist,
        Self::FinalDraft,
        Self::FinalDraftTemplate,
        Self::Trelby,
        Self::OfficeOpenXml,
        Self::OpenDocumentText,
        Self::Fountain,
        Self::Celtx,
        Self::Markdown,
    ];

    // @returns: Stable short identifier
    pub fn id(&self) -> &'static str {
        match self {
            Self::KitScenarist => "kitsp",
            Self::FinalDraft => "fdx",
            Self::FinalDraftTemplate => "fdxt",
            Self::Trelby => "trelby",
            Self::OfficeOpenXml => "docx",
            Self::OpenDocumentText => "odt",
            Self::Fountain => "fountain",
            Self::Celtx => "celtx",
            Self::Markdown => "md",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for SourceFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().trim_start_matches('.').to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|format| format.id() == wanted)
            .ok_or_else(|| anyhow!("Unknown source format: {}", s))
    }
}

/// A sibling variant of a format family that is recognized but not read
#[derive(Debug)]
pub struct LegacyVariant {
    /// Human readable name of the variant
    pub name: &'static str,
    /// Short file type users know the variant by, e.g. "DOC"
    pub file_type: &'static str,
    /// Extensions that identify the variant
    pub extensions: &'static [&'static str],
    /// Magic bytes check, when the variant has a recognizable header
    pub magic: Option<fn(&[u8]) -> bool>,
    /// What the user should do to import the file anyway
    pub hint: &'static str,
}

impl LegacyVariant {
    /// Does the extension name this variant?
    pub fn matches_extension(&self, extension: Option<&str>) -> bool {
        extension.is_some_and(|ext| self.extensions.contains(&ext))
    }

    /// Do the leading bytes carry this variant's header?
    pub fn matches_content(&self, prefix: &[u8]) -> bool {
        self.magic.is_some_and(|magic| magic(prefix))
    }

    /// Either signal
    pub fn matches(&self, extension: Option<&str>, prefix: &[u8]) -> bool {
        self.matches_extension(extension) || self.matches_content(prefix)
    }
}

/// Pre-XML Final Draft documents
pub static FINAL_DRAFT_LEGACY: LegacyVariant = LegacyVariant {
    name: "Final Draft 7 document",
    file_type: "FDR",
    extensions: &["fdr", "fdt"],
    magic: None,
    hint: "Open the file in Final Draft 8 or later, save it in FDX format and repeat the import.",
};

/// Binary Word documents
pub static WORD_BINARY_LEGACY: LegacyVariant = LegacyVariant {
    name: "Word 97-2003 document",
    file_type: "DOC",
    extensions: &["doc"],
    magic: Some(signature::is_ole_compound_file),
    hint: "You need to save the file in DOCX format and repeat the import.",
};

/// Static description of one supported source format
#[derive(Debug, Clone, Copy)]
pub struct FormatDescriptor {
    /// Which format this describes
    pub format: SourceFormat,
    /// Label shown in file pickers
    pub label: &'static str,
    /// Lowercase extensions without the dot; the first one is canonical
    pub extensions: &'static [&'static str],
    /// Content check over a short prefix of the file
    pub signature: fn(&[u8]) -> bool,
    /// Recognized but unsupported sibling variant
    pub legacy: Option<&'static LegacyVariant>,
}

impl FormatDescriptor {
    /// Is the extension one of ours (legacy extensions included)?
    pub fn claims_extension(&self, extension: &str) -> bool {
        self.extensions.contains(&extension)
            || self.legacy.is_some_and(|legacy| legacy.extensions.contains(&extension))
    }

    /// Does the prefix look like this format or its legacy variant?
    pub fn matches_content(&self, prefix: &[u8]) -> bool {
        (self.signature)(prefix) || self.legacy.is_some_and(|legacy| legacy.matches_content(prefix))
    }

    /// File picker filter for this format alone
    pub fn file_filter(&self) -> FileFilter {
        FileFilter {
            label: self.label.to_string(),
            extensions: self.extensions.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Label plus extension list, as used by file-selection dialogs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFilter {
    pub label: String,
    pub extensions: Vec<String>,
}

impl FileFilter {
    /// Label of the aggregate filter
    pub const ALL_SUPPORTED: &'static str = "All supported files";

    /// Glob patterns, e.g. `*.fdx`
    pub fn patterns(&self) -> Vec<String> {
        self.extensions.iter().map(|e| format!("*.{}", e)).collect()
    }
}

impl fmt::Display for FileFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.patterns().join(" "))
    }
}

static KIT_SCENARIST: FormatDescriptor = FormatDescriptor {
    format: SourceFormat::KitScenarist,
    label: "KIT Scenarist project",
    extensions: &["kitsp"],
    signature: signature::is_sqlite_database,
    legacy: None,
};

static FINAL_DRAFT: FormatDescriptor = FormatDescriptor {
    format: SourceFormat::FinalDraft,
    label: "Final Draft screenplay",
    extensions: &["fdx", "xml"],
    signature: signature::is_final_draft_xml,
    legacy: Some(&FINAL_DRAFT_LEGACY),
};

static FINAL_DRAFT_TEMPLATE: FormatDescriptor = FormatDescriptor {
    format: SourceFormat::FinalDraftTemplate,
    label: "Final Draft template",
    extensions: &["fdxt"],
    signature: signature::is_final_draft_template,
    legacy: None,
};

static TRELBY: FormatDescriptor = FormatDescriptor {
    format: SourceFormat::Trelby,
    label: "Trelby screenplay",
    extensions: &["trelby"],
    signature: signature::is_trelby_text,
    legacy: None,
};

static OFFICE_OPEN_XML: FormatDescriptor = FormatDescriptor {
    format: SourceFormat::OfficeOpenXml,
    label: "Office Open XML",
    extensions: &["docx"],
    signature: signature::is_office_open_xml_package,
    legacy: Some(&WORD_BINARY_LEGACY),
};

static OPEN_DOCUMENT_TEXT: FormatDescriptor = FormatDescriptor {
    format: SourceFormat::OpenDocumentText,
    label: "OpenDocument text",
    extensions: &["odt", "fodt", "xml"],
    signature: signature::is_open_document_text,
    legacy: None,
};

static FOUNTAIN: FormatDescriptor = FormatDescriptor {
    format: SourceFormat::Fountain,
    label: "Fountain text",
    extensions: &["fountain", "spmd", "txt"],
    signature: signature::is_fountain_text,
    legacy: None,
};

static CELTX: FormatDescriptor = FormatDescriptor {
    format: SourceFormat::Celtx,
    label: "Celtx project",
    extensions: &["celtx"],
    signature: signature::is_celtx_package,
    legacy: None,
};

static MARKDOWN: FormatDescriptor = FormatDescriptor {
    format: SourceFormat::Markdown,
    label: "Markdown text",
    extensions: &["md", "markdown"],
    signature: signature::is_markdown_text,
    legacy: None,
};

// @returns: The one descriptor of a format
fn describe(format: SourceFormat) -> &'static FormatDescriptor {
    match format {
        SourceFormat::KitScenarist => &KIT_SCENARIST,
        SourceFormat::FinalDraft => &FINAL_DRAFT,
        SourceFormat::FinalDraftTemplate => &FINAL_DRAFT_TEMPLATE,
        SourceFormat::Trelby => &TRELBY,
        SourceFormat::OfficeOpenXml => &OFFICE_OPEN_XML,
        SourceFormat::OpenDocumentText => &OPEN_DOCUMENT_TEXT,
        SourceFormat::Fountain => &FOUNTAIN,
        SourceFormat::Celtx => &CELTX,
        SourceFormat::Markdown => &MARKDOWN,
    }
}

/// Read-only, ordered set of format descriptors
#[derive(Debug)]
pub struct FormatCatalog {
    descriptors: Vec<FormatDescriptor>,
}

impl FormatCatalog {
    /// Build the catalog of every supported format
    pub fn standard() -> Self {
        let descriptors = SourceFormat::ALL.iter().map(|format| *describe(*format)).collect();
        Self { descriptors }
    }

    /// All descriptors, in stable catalog order
    pub fn list_supported_formats(&self) -> &[FormatDescriptor] {
        &self.descriptors
    }

    /// Descriptor for a format
    pub fn descriptor(&self, format: SourceFormat) -> &FormatDescriptor {
        describe(format)
    }

    /// Every primary extension, deduplicated, in catalog order
    pub fn all_extensions(&self) -> Vec<&'static str> {
        let mut extensions: Vec<&'static str> = Vec::new();
        for ext in self.descriptors.iter().flat_map(|d| d.extensions.iter()) {
            if !extensions.contains(ext) {
                extensions.push(ext);
            }
        }
        extensions
    }

    /// "All supported files" first, then one filter per descriptor
    pub fn file_filters(&self) -> Vec<FileFilter> {
        let mut filters = Vec::with_capacity(self.descriptors.len() + 1);
        filters.push(FileFilter {
            label: FileFilter::ALL_SUPPORTED.to_string(),
            extensions: self.all_extensions().iter().map(|e| e.to_string()).collect(),
        });
        filters.extend(self.descriptors.iter().map(FormatDescriptor::file_filter));
        filters
    }
}
