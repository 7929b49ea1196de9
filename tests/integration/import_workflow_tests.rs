/*!
 * Integration tests importing every supported format end to end
 */

use anyhow::Result;
use storyport::{ElementKind, FormatCatalog, ImportRequest, Importer, SourceFormat};

use crate::common;

/// Test that a minimal sample of every format imports to a non-empty document
#[test]
fn test_import_withEverySample_shouldProduceDocument() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let catalog = FormatCatalog::standard();
    let importer = Importer::new(&catalog);

    for (format, name, bytes) in common::samples()? {
        let path = common::create_test_file(temp_dir.path(), name, &bytes)?;
        let document = importer
            .import(&ImportRequest::new(&path))
            .unwrap_or_else(|e| panic!("{} failed: {}", name, e));

        assert_eq!(document.source_format, format, "{}", name);
        assert!(!document.is_empty(), "{}", name);
        assert!(document.iter().all(|e| !e.text.trim().is_empty()), "{}", name);
    }
    Ok(())
}

/// Test that importing the same file twice gives identical documents
#[test]
fn test_import_calledTwice_shouldBeIdempotent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let catalog = FormatCatalog::standard();
    let importer = Importer::new(&catalog);

    for (_, name, bytes) in common::samples()? {
        let path = common::create_test_file(temp_dir.path(), name, &bytes)?;
        let first = importer.import(&ImportRequest::new(&path))?;
        let second = importer.import(&ImportRequest::new(&path))?;

        assert_eq!(first, second, "{}", name);
        assert_eq!(first.content_digest(), second.content_digest(), "{}", name);
    }
    Ok(())
}

/// Test the Fountain character cue convention
#[test]
fn test_import_fountainCharacterCue_shouldYieldCharacterAndDialogue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "jane.fountain", b"JANE\n  Hello there.\n")?;
    let catalog = FormatCatalog::standard();

    let document = Importer::new(&catalog).import(&ImportRequest::new(&path))?;

    let elements = document.elements();
    assert_eq!(elements.len(), 2);
    assert_eq!(elements[0].kind, ElementKind::Character);
    assert_eq!(elements[0].text, "JANE");
    assert_eq!(elements[1].kind, ElementKind::Dialogue);
    assert_eq!(elements[1].text, "Hello there.");
    Ok(())
}

/// Test that Final Draft scenes keep their order around metadata nodes
#[test]
fn test_import_finalDraftWithInterleavedMetadata_shouldKeepSceneOrder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "night-sky.fdx", &common::fdx_sample())?;
    let catalog = FormatCatalog::standard();

    let document = Importer::new(&catalog).import(&ImportRequest::new(&path))?;

    let scenes: Vec<&str> = document
        .elements_of(ElementKind::SceneHeading)
        .map(|e| e.text.as_str())
        .collect();
    assert_eq!(scenes, common::FDX_SAMPLE_SCENES.to_vec());
    assert_eq!(document.title.as_deref(), Some("Night Sky"));
    assert!(!document.iter().any(|e| e.text.contains("lens flare")));
    Ok(())
}

/// Test that the same screenplay reads alike from different formats
#[test]
fn test_import_styledOfficeFormats_shouldMapStylesToKinds() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let catalog = FormatCatalog::standard();
    let importer = Importer::new(&catalog);
    let expected = vec![
        ElementKind::SceneHeading,
        ElementKind::Action,
        ElementKind::Character,
        ElementKind::Dialogue,
    ];

    let docx = common::create_test_file(temp_dir.path(), "library.docx", &common::docx_sample()?)?;
    let odt = common::create_test_file(temp_dir.path(), "greenhouse.odt", &common::odt_sample()?)?;
    let fodt = common::create_test_file(temp_dir.path(), "greenhouse.fodt", &common::fodt_sample())?;
    let celtx = common::create_test_file(temp_dir.path(), "orchard.celtx", &common::celtx_sample()?)?;
    let kitsp = common::create_test_file(temp_dir.path(), "workshop.kitsp", &common::kitsp_sample()?)?;

    for path in [&docx, &odt, &fodt, &celtx, &kitsp] {
        let document = importer.import(&ImportRequest::new(path))?;
        assert_eq!(document.kinds(), expected, "{}", path.display());
    }

    let packaged = importer.import(&ImportRequest::new(&odt))?;
    let flat = importer.import(&ImportRequest::new(&fodt))?;
    assert_eq!(packaged.content_digest(), flat.content_digest());
    Ok(())
}

/// Test that KIT Scenarist imports the final scenario and project name
#[test]
fn test_import_kitScenarist_shouldSkipDraftAndReadName() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "workshop.kitsp", &common::kitsp_sample()?)?;
    let catalog = FormatCatalog::standard();

    let document = Importer::new(&catalog).import(&ImportRequest::new(&path))?;

    assert_eq!(document.title.as_deref(), Some("Workshop"));
    assert_eq!(document.elements()[0].text, "INT. WORKSHOP - NIGHT");
    assert!(!document.iter().any(|e| e.text.contains("draft only")));
    Ok(())
}

/// Test that an explicit format overrides detection
#[test]
fn test_import_withExplicitFormat_shouldIgnoreExtension() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "harbor.dat", &common::fountain_sample())?;
    let catalog = FormatCatalog::standard();

    let request = ImportRequest::new(&path).with_format(SourceFormat::Fountain);
    let document = Importer::new(&catalog).import(&request)?;

    assert_eq!(document.source_format, SourceFormat::Fountain);
    assert_eq!(document.title.as_deref(), Some("Harbor Lights"));
    assert_eq!(
        document.kinds(),
        vec![
            ElementKind::SceneHeading,
            ElementKind::Action,
            ElementKind::Character,
            ElementKind::Parenthetical,
            ElementKind::Dialogue,
            ElementKind::Transition,
        ]
    );
    Ok(())
}

/// Test that Trelby paragraphs are rebuilt across continuation lines
#[test]
fn test_import_trelby_shouldJoinContinuationLines() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "bakery.trelby", &common::trelby_sample())?;
    let catalog = FormatCatalog::standard();

    let document = Importer::new(&catalog).import(&ImportRequest::new(&path))?;

    let actions: Vec<&str> = document.elements_of(ElementKind::Action).map(|e| e.text.as_str()).collect();
    assert_eq!(actions, vec!["Flour everywhere. OTTO kneads dough with great care.", "Crowds."]);
    Ok(())
}

fn import_fountain(name: &str, text: &str) -> Result<storyport::CanonicalDocument> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), name, text.as_bytes())?;
    let catalog = FormatCatalog::standard();
    Ok(Importer::new(&catalog).import(&ImportRequest::new(&path))?)
}

/// Test that a title page followed directly by the script ends at the script
#[test]
fn test_import_fountainTitlePageWithoutBlankLine_shouldKeepSceneHeading() -> Result<()> {
    let document = import_fountain(
        "tides.fountain",
        "Title: Tide Tables\nAuthor: Ana Ruiz\nEXT. PIER - DAY\n\nWaves slap the posts.\n",
    )?;

    assert_eq!(document.title.as_deref(), Some("Tide Tables"));
    assert_eq!(document.kinds(), vec![ElementKind::SceneHeading, ElementKind::Action]);
    assert_eq!(document.elements()[0].text, "EXT. PIER - DAY");
    Ok(())
}

/// Test that a script opening with a transition keeps its first line
#[test]
fn test_import_fountainOpeningWithTransition_shouldKeepFirstLine() -> Result<()> {
    let document = import_fountain(
        "pier.fountain",
        "FADE IN:\n\nEXT. PIER - DAY\n\nWaves.\n\nCUT TO:\n\nINT. SHED - NIGHT\n",
    )?;

    assert_eq!(
        document.kinds(),
        vec![
            ElementKind::Action,
            ElementKind::SceneHeading,
            ElementKind::Action,
            ElementKind::Transition,
            ElementKind::SceneHeading,
        ]
    );
    assert_eq!(document.elements()[0].text, "FADE IN:");
    assert_eq!(document.title.as_deref(), Some("pier"));
    Ok(())
}

/// Test that forced markers win over the shape of the line
#[test]
fn test_import_fountainForcedElements_shouldOverrideShape() -> Result<()> {
    let document = import_fountain(
        "forced.fountain",
        ".FLASHBACK\n\n!INT. WHAT A DAY\n\n@McCLANE\nYippee ki-yay.\n\n> LATER\n\n>THE END<\n",
    )?;

    assert_eq!(
        document.kinds(),
        vec![
            ElementKind::SceneHeading,
            ElementKind::Action,
            ElementKind::Character,
            ElementKind::Dialogue,
            ElementKind::Transition,
            ElementKind::Action,
        ]
    );
    let texts: Vec<&str> = document.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["FLASHBACK", "INT. WHAT A DAY", "McCLANE", "Yippee ki-yay.", "LATER", "THE END"]
    );
    Ok(())
}

/// Test that dual dialogue keeps both speakers without the caret
#[test]
fn test_import_fountainDualDialogue_shouldStripCaret() -> Result<()> {
    let document = import_fountain(
        "dual.fountain",
        "BRICK\nScrew retirement.\n\nSTEEL ^\nScrew retirement.\n",
    )?;

    assert_eq!(
        document.kinds(),
        vec![
            ElementKind::Character,
            ElementKind::Dialogue,
            ElementKind::Character,
            ElementKind::Dialogue,
        ]
    );
    assert_eq!(document.elements()[2].text, "STEEL");
    Ok(())
}

/// Test that Markdown notes become text paragraphs named after the file
#[test]
fn test_import_markdown_shouldYieldTextNamedAfterFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "harbor-notes.md", &common::markdown_sample())?;
    let catalog = FormatCatalog::standard();

    let document = Importer::new(&catalog).import(&ImportRequest::new(&path))?;

    assert_eq!(document.source_format, SourceFormat::Markdown);
    assert_eq!(document.title.as_deref(), Some("harbor-notes"));
    assert_eq!(document.kinds(), vec![ElementKind::Text; 3]);
    assert_eq!(document.elements()[0].text, "# Harbor notes");
    Ok(())
}
