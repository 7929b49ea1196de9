/*!
 * Integration tests for the failure kinds an import can end with
 */

use anyhow::Result;
use storyport::{FormatCatalog, ImportError, ImportErrorKind, ImportRequest, Importer, SourceFormat};

use crate::common;

fn import_bytes(name: &str, bytes: &[u8]) -> Result<Result<storyport::CanonicalDocument, ImportError>> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), name, bytes)?;
    let catalog = FormatCatalog::standard();
    Ok(Importer::new(&catalog).import(&ImportRequest::new(&path)))
}

fn error_kind(name: &str, bytes: &[u8]) -> Result<ImportErrorKind> {
    match import_bytes(name, bytes)? {
        Ok(document) => panic!("{} imported {} elements", name, document.len()),
        Err(error) => Ok(error.kind()),
    }
}

/// Test that half of a structured sample is reported as corrupt
#[test]
fn test_import_withHalfTruncatedSample_shouldBeCorrupt() -> Result<()> {
    common::init_test_logging();
    for (format, name, bytes) in common::samples()? {
        // Plain text has no structure that could reveal a cut
        if matches!(format, SourceFormat::Fountain | SourceFormat::Markdown) {
            continue;
        }
        let half = common::truncated(&bytes);
        assert_eq!(error_kind(name, &half)?, ImportErrorKind::Corrupt, "{}", name);
    }

    let half = common::truncated(&common::fodt_sample());
    assert_eq!(error_kind("greenhouse.fodt", &half)?, ImportErrorKind::Corrupt);
    Ok(())
}

/// Test that corrupt errors carry the detected format's label
#[test]
fn test_import_withTruncatedFinalDraft_shouldNameFormat() -> Result<()> {
    let half = common::truncated(&common::fdx_sample());
    match import_bytes("night-sky.fdx", &half)? {
        Err(ImportError::Corrupt { format, .. }) => assert_eq!(format, "Final Draft screenplay"),
        other => panic!("unexpected outcome: {:?}", other.map(|d| d.len())),
    }
    Ok(())
}

/// Test that an unknown file is not recognized
#[test]
fn test_import_withUnknownFile_shouldBeFormatNotRecognized() -> Result<()> {
    assert_eq!(
        error_kind("slides.key", b"\x00\x00\x00\x14ftypqt  ")?,
        ImportErrorKind::FormatNotRecognized
    );
    match import_bytes("slides.key", b"binary\x00data")? {
        Err(ImportError::FormatNotRecognized { extension }) => assert_eq!(extension.as_deref(), Some("key")),
        other => panic!("unexpected outcome: {:?}", other.map(|d| d.len())),
    }
    Ok(())
}

/// Test that legacy binary saves are declined with a hint
#[test]
fn test_import_withLegacyBinary_shouldBeUnsupportedVariant() -> Result<()> {
    let mut ole = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
    ole.resize(1024, 0);

    assert_eq!(error_kind("old.doc", &ole)?, ImportErrorKind::UnsupportedVariant);
    assert_eq!(error_kind("renamed.docx", &ole)?, ImportErrorKind::UnsupportedVariant);
    assert_eq!(error_kind("old.fdr", b"\x00\x01\x02binary final draft")?, ImportErrorKind::UnsupportedVariant);

    match import_bytes("old.doc", &ole)? {
        Err(error @ ImportError::UnsupportedVariant { .. }) => {
            let (title, body) = error.user_message();
            assert_eq!(title, "File format not supported");
            assert_eq!(
                body,
                "Importing from DOC files is not supported. \
                 You need to save the file in DOCX format and repeat the import."
            );
        }
        other => panic!("unexpected outcome: {:?}", other.map(|d| d.len())),
    }
    Ok(())
}

/// Test that a newer Trelby version is declined, not treated as damage
#[test]
fn test_import_withNewerTrelbyVersion_shouldBeUnsupportedVariant() -> Result<()> {
    let script = b"#Version 9\n#Start-Script\n.\\INT. FUTURE - DAY\n";
    assert_eq!(error_kind("future.trelby", script)?, ImportErrorKind::UnsupportedVariant);
    Ok(())
}

/// Test that well-formed files without content fail normalization
#[test]
fn test_import_withNoUsableContent_shouldBeNormalizationFailure() -> Result<()> {
    assert_eq!(error_kind("empty.fountain", b"\n\n   \n")?, ImportErrorKind::NormalizationFailure);
    assert_eq!(
        error_kind("empty.fdx", b"<FinalDraft DocumentType=\"Script\"><Content/></FinalDraft>")?,
        ImportErrorKind::NormalizationFailure
    );
    Ok(())
}

/// Test that a package missing its main part is corrupt
#[test]
fn test_import_withDocxMissingDocumentPart_shouldBeCorrupt() -> Result<()> {
    let package = common::zip_package(&[("[Content_Types].xml", b"<Types/>".as_slice())])?;
    match import_bytes("hollow.docx", &package)? {
        Err(ImportError::Corrupt { message, .. }) => assert!(message.contains("word/document.xml")),
        other => panic!("unexpected outcome: {:?}", other.map(|d| d.len())),
    }
    Ok(())
}

/// Test that a missing file is an I/O failure
#[test]
fn test_import_withMissingFile_shouldBeIo() {
    let catalog = FormatCatalog::standard();
    let error = Importer::new(&catalog)
        .import(&ImportRequest::new("/definitely/not/here.fountain"))
        .unwrap_err();
    assert_eq!(error.kind(), ImportErrorKind::Io);
}
