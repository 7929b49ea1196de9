/*!
 * Tests for error types
 */

use std::io;
use std::path::PathBuf;
use storyport::errors::{AppError, ImportError, ImportErrorKind, NormalizationError, ParseError};

/// Test that every import error kind has a user-facing title and body
#[test]
fn test_user_message_forEveryKind_shouldBeNonEmpty() {
    let errors = vec![
        ImportError::FormatNotRecognized { extension: None },
        ImportError::UnsupportedVariant {
            format: "Final Draft screenplay",
            variant: "FDR".to_string(),
            hint: "Save it as FDX.".to_string(),
        },
        ImportError::Corrupt {
            format: "Celtx project",
            message: "unreadable archive".to_string(),
        },
        ImportError::NormalizationFailure {
            format: "Trelby screenplay",
            reason: NormalizationError::NoContent.to_string(),
        },
        ImportError::Io {
            path: PathBuf::from("/missing.fdx"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        },
    ];

    for error in &errors {
        let (title, body) = error.user_message();
        assert!(!title.is_empty(), "{:?} has no title", error.kind());
        assert!(!body.is_empty(), "{:?} has no body", error.kind());
    }
}

/// Test that corrupt errors name the detected format
#[test]
fn test_display_forCorrupt_shouldIncludeFormatLabel() {
    let error = ImportError::Corrupt {
        format: "Office Open XML",
        message: "package has no word/document.xml member".to_string(),
    };
    assert_eq!(error.kind(), ImportErrorKind::Corrupt);
    assert!(error.to_string().starts_with("Office Open XML:"));
}

/// Test that import errors convert into the application error
#[test]
fn test_app_error_fromImportError_shouldWrapIt() {
    let error: AppError = ImportError::FormatNotRecognized { extension: Some("xyz".to_string()) }.into();
    assert!(matches!(error, AppError::Import(_)));
    assert!(error.to_string().contains(".xyz"));
}

/// Test that the unsupported variant message carries the hint
#[test]
fn test_parse_error_forUnsupportedVariant_shouldMentionHint() {
    let error = ParseError::UnsupportedVariant {
        variant: "DOC".to_string(),
        hint: "Save it as DOCX.".to_string(),
    };
    assert_eq!(error.to_string(), "DOC is not supported: Save it as DOCX.");
}
