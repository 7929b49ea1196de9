/*!
 * Error types for the storyport application.
 *
 * This module contains custom error types for the different stages of an
 * import, using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by a structural parser
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The file claims to be the format but could not be decoded
    #[error("{0}")]
    Corrupt(String),

    /// The file belongs to the format family but is a variant we do not read
    #[error("{variant} is not supported: {hint}")]
    UnsupportedVariant {
        /// File type of the variant (e.g. "DOC")
        variant: String,
        /// What the user should do instead
        hint: String,
    },
}

impl ParseError {
    /// Shorthand for a corrupt-file error
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt(message.into())
    }
}

impl From<quick_xml::Error> for ParseError {
    fn from(error: quick_xml::Error) -> Self {
        Self::Corrupt(format!("malformed XML: {}", error))
    }
}

impl From<zip::result::ZipError> for ParseError {
    fn from(error: zip::result::ZipError) -> Self {
        Self::Corrupt(format!("unreadable archive: {}", error))
    }
}

impl From<rusqlite::Error> for ParseError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Corrupt(format!("unreadable project database: {}", error))
    }
}

impl From<std::io::Error> for ParseError {
    fn from(error: std::io::Error) -> Self {
        Self::Corrupt(format!("read failed: {}", error))
    }
}

impl From<std::string::FromUtf8Error> for ParseError {
    fn from(error: std::string::FromUtf8Error) -> Self {
        Self::Corrupt(format!("text is not valid UTF-8: {}", error))
    }
}

/// Errors produced while mapping a parse tree onto the canonical model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    /// Nothing usable was left after classification
    #[error("the document contains no usable content")]
    NoContent,

    /// The tree holds something the canonical model cannot represent
    #[error("cannot map content: {0}")]
    Unmappable(String),
}

/// Discriminant of [`ImportError`], handy for matching in callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportErrorKind {
    FormatNotRecognized,
    UnsupportedVariant,
    Corrupt,
    NormalizationFailure,
    Io,
}

/// Failure of a single import call
#[derive(Error, Debug)]
pub enum ImportError {
    /// Neither extension nor content matched any catalog entry
    #[error("file format not recognized{}", extension.as_ref().map(|e| format!(" (.{})", e)).unwrap_or_default())]
    FormatNotRecognized {
        /// Raw lowercase extension, if the file had one
        extension: Option<String>,
    },

    /// Recognized family, declined variant
    #[error("{format}: {variant} is not supported. {hint}")]
    UnsupportedVariant {
        /// Label of the descriptor the file was matched to
        format: &'static str,
        variant: String,
        hint: String,
    },

    /// Structural decoding failed
    #[error("{format}: the file is damaged: {message}")]
    Corrupt {
        format: &'static str,
        message: String,
    },

    /// Well-formed file without content the document model can hold
    #[error("{format}: {reason}")]
    NormalizationFailure {
        format: &'static str,
        reason: String,
    },

    /// The source file could not be opened or read
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ImportError {
    /// Which of the failure kinds this is
    pub fn kind(&self) -> ImportErrorKind {
        match self {
            Self::FormatNotRecognized { .. } => ImportErrorKind::FormatNotRecognized,
            Self::UnsupportedVariant { .. } => ImportErrorKind::UnsupportedVariant,
            Self::Corrupt { .. } => ImportErrorKind::Corrupt,
            Self::NormalizationFailure { .. } => ImportErrorKind::NormalizationFailure,
            Self::Io { .. } => ImportErrorKind::Io,
        }
    }

    /// Title and body for a user-facing message box
    pub fn user_message(&self) -> (String, String) {
        match self {
            Self::FormatNotRecognized { .. } => (
                "File format not supported".to_string(),
                "Choose a file in one of the supported formats and repeat the import.".to_string(),
            ),
            Self::UnsupportedVariant { variant, hint, .. } => (
                "File format not supported".to_string(),
                format!("Importing from {} files is not supported. {}", variant, hint),
            ),
            Self::Corrupt { format, message } => (
                "Import failed".to_string(),
                format!("The {} file is damaged and cannot be imported: {}", format, message),
            ),
            Self::NormalizationFailure { format, reason } => (
                "Import failed".to_string(),
                format!("Nothing could be imported from the {} file: {}", format, reason),
            ),
            Self::Io { path, source } => (
                "Import failed".to_string(),
                format!("Cannot read {}: {}", path.display(), source),
            ),
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from an import
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
