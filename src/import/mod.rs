/*!
 * Import pipeline.
 *
 * `Importer::import` is the single entry point: it resolves the format
 * (explicitly or through the detector), runs the matching structural
 * parser, then that format's normalizer. Each step either succeeds or ends
 * the call; there is no retry with another format and no partial result.
 *
 * Per-format modules keep their parse tree private. Only the parser and
 * the normalizer of the same module ever see it.
 */

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::document::{CanonicalDocument, DocumentBuilder};
use crate::errors::{ImportError, NormalizationError, ParseError};
use crate::formats::detector::extension_of;
use crate::formats::{Detection, FormatCatalog, FormatDetector, SourceFormat};

mod archive;
mod celtx;
mod docx;
mod fdx;
mod fountain;
mod kit_scenarist;
mod markdown;
mod odt;
mod text_shape;
mod trelby;
mod xml;

/// Default number of leading bytes read for format detection
pub const DEFAULT_SNIFF_PREFIX_BYTES: usize = 4096;

/// Result of one import call: a document or a failure, never both
pub type ImportOutcome = Result<CanonicalDocument, ImportError>;

/// A user-initiated import of one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    /// File to import
    pub path: PathBuf,
    /// Skip detection and use this format
    pub format: Option<SourceFormat>,
}

impl ImportRequest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), format: None }
    }

    /// Force a format instead of detecting one
    pub fn with_format(mut self, format: SourceFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// Tunables for the importer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSettings {
    /// Bytes read from the start of the file for detection
    pub sniff_prefix_bytes: usize,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self { sniff_prefix_bytes: DEFAULT_SNIFF_PREFIX_BYTES }
    }
}

/// How a finished import ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    Succeeded,
    Failed,
}

/// States an import passes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPhase {
    Idle,
    Detecting,
    ParsingAndNormalizing(SourceFormat),
    Done(ImportStatus),
}

/// Read-only handle on the file being imported.
///
/// Owned by one import call and closed when that call returns, whichever
/// way it returns.
#[derive(Debug)]
pub struct SourceFile {
    path: PathBuf,
    extension: Option<String>,
    file: File,
}

impl SourceFile {
    pub(crate) fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            extension: extension_of(path),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lowercase extension without the dot
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Length of the file in bytes
    pub fn size(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Up to `limit` bytes from the start of the file
    pub fn read_prefix(&mut self, limit: usize) -> io::Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut prefix = Vec::with_capacity(limit.min(64 * 1024));
        (&mut self.file).take(limit as u64).read_to_end(&mut prefix)?;
        Ok(prefix)
    }

    /// The whole file
    pub fn read_all(&mut self) -> io::Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut bytes = Vec::new();
        self.file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Seekable reader positioned at the start, for container formats
    pub fn reader(&mut self) -> io::Result<&mut File> {
        self.file.seek(SeekFrom::Start(0))?;
        Ok(&mut self.file)
    }
}

/// Failure inside the parse/normalize stage, before it gets a format label
#[derive(Debug)]
enum StageError {
    Parse(ParseError),
    Normalize(NormalizationError),
}

impl From<ParseError> for StageError {
    fn from(error: ParseError) -> Self {
        Self::Parse(error)
    }
}

impl From<NormalizationError> for StageError {
    fn from(error: NormalizationError) -> Self {
        Self::Normalize(error)
    }
}

impl StageError {
    fn into_import_error(self, format: &'static str) -> ImportError {
        match self {
            Self::Parse(ParseError::Corrupt(message)) => ImportError::Corrupt { format, message },
            Self::Parse(ParseError::UnsupportedVariant { variant, hint }) => {
                ImportError::UnsupportedVariant { format, variant, hint }
            }
            Self::Normalize(error) => ImportError::NormalizationFailure {
                format,
                reason: error.to_string(),
            },
        }
    }
}

/// Run the structural parser and normalizer registered for a format
fn convert(format: SourceFormat, source: &mut SourceFile) -> Result<DocumentBuilder, StageError> {
    let builder = match format {
        SourceFormat::KitScenarist => kit_scenarist::normalize(kit_scenarist::parse(source)?)?,
        SourceFormat::FinalDraft | SourceFormat::FinalDraftTemplate => fdx::normalize(fdx::parse(source)?)?,
        SourceFormat::Trelby => trelby::normalize(trelby::parse(source)?)?,
        SourceFormat::OfficeOpenXml => docx::normalize(docx::parse(source)?)?,
        SourceFormat::OpenDocumentText => odt::normalize(odt::parse(source)?)?,
        SourceFormat::Fountain => fountain::normalize(fountain::parse(source)?)?,
        SourceFormat::Celtx => celtx::normalize(celtx::parse(source)?)?,
        SourceFormat::Markdown => markdown::normalize(markdown::parse(source)?)?,
    };
    Ok(builder)
}

/// Orchestrates detection, parsing and normalization for one file at a time
#[derive(Debug, Clone, Copy)]
pub struct Importer<'a> {
    catalog: &'a FormatCatalog,
    settings: ImportSettings,
}

impl<'a> Importer<'a> {
    pub fn new(catalog: &'a FormatCatalog) -> Self {
        Self::with_settings(catalog, ImportSettings::default())
    }

    pub fn with_settings(catalog: &'a FormatCatalog, settings: ImportSettings) -> Self {
        Self { catalog, settings }
    }

    pub fn catalog(&self) -> &'a FormatCatalog {
        self.catalog
    }

    /// Import one file
    pub fn import(&self, request: &ImportRequest) -> ImportOutcome {
        self.import_observed(request, |_| {})
    }

    /// Import one file, reporting each phase as it is entered.
    ///
    /// The observer sees `Idle` first, then the working phases, then
    /// `Done` followed by `Idle` again once the importer is free.
    pub fn import_observed<F>(&self, request: &ImportRequest, mut observer: F) -> ImportOutcome
    where
        F: FnMut(ImportPhase),
    {
        observer(ImportPhase::Idle);
        let outcome = self.run(request, &mut observer);
        let status = match &outcome {
            Ok(_) => ImportStatus::Succeeded,
            Err(_) => ImportStatus::Failed,
        };
        observer(ImportPhase::Done(status));
        observer(ImportPhase::Idle);
        outcome
    }

    fn run(&self, request: &ImportRequest, observer: &mut dyn FnMut(ImportPhase)) -> ImportOutcome {
        let io_error = |source: io::Error| ImportError::Io {
            path: request.path.clone(),
            source,
        };
        let mut source = SourceFile::open(&request.path).map_err(io_error)?;

        let format = match request.format {
            Some(format) => {
                debug!("Using requested format {} for {:?}", format, request.path);
                format
            }
            None => {
                observer(ImportPhase::Detecting);
                let prefix = source.read_prefix(self.settings.sniff_prefix_bytes).map_err(io_error)?;
                match FormatDetector::new(self.catalog).detect(&request.path, &prefix) {
                    Detection::Matched(descriptor) => descriptor.format,
                    Detection::Unsupported { extension } => {
                        debug!("No format matches {:?}", request.path);
                        return Err(ImportError::FormatNotRecognized { extension });
                    }
                }
            }
        };

        let label = self.catalog.descriptor(format).label;
        observer(ImportPhase::ParsingAndNormalizing(format));
        let mut builder = convert(format, &mut source).map_err(|e| e.into_import_error(label))?;
        if !builder.has_title() {
            // Untitled documents are named after the file
            if let Some(stem) = request.path.file_stem() {
                builder.set_title(stem.to_string_lossy());
            }
        }
        let document = builder
            .finish(format)
            .map_err(|e| StageError::from(e).into_import_error(label))?;

        info!("Imported {:?} as {} ({} elements)", request.path, label, document.len());
        Ok(document)
    }
}
