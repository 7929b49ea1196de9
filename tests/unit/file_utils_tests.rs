/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::path::Path;
use storyport::file_utils::FileManager;
use storyport::FormatCatalog;

use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "scene.fountain", b"INT. HOUSE - DAY\n")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::dir_exists(&test_file));

    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.fdx"));
}

/// Test that generate_output_path keeps the sub-directory and full file name
#[test]
fn test_generate_output_path_withNestedInput_shouldMirrorTree() {
    let output_path = FileManager::generate_output_path(
        Path::new("/scripts/season1/pilot.fdx"),
        Path::new("/scripts"),
        Path::new("/imported"),
        "json",
    );

    assert_eq!(output_path, Path::new("/imported/season1/pilot.fdx.json"));
}

/// Test that the catalog extensions find every importable file and nothing else
#[test]
fn test_find_files_with_extensions_withCatalogExtensions_shouldSkipOtherFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_file(root, "a.fdx", b"")?;
    common::create_test_file(root, "b.Fountain", b"")?;
    common::create_test_file(root, "drafts/c.docx", b"")?;
    common::create_test_file(root, "drafts/d.celtx", b"")?;
    common::create_test_file(root, "e.pdf", b"")?;
    common::create_test_file(root, "f.doc", b"")?;

    let catalog = FormatCatalog::standard();
    let files = FileManager::find_files_with_extensions(root, &catalog.all_extensions(), None)?;

    let mut names: Vec<String> = files
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["a.fdx", "b.Fountain", "c.docx", "d.celtx"]);

    Ok(())
}

/// Test that write_to_file creates missing parent directories
#[test]
fn test_write_to_file_withMissingParent_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("out/deep/doc.json");

    FileManager::write_to_file(&path, "{}")?;

    assert_eq!(std::fs::read_to_string(&path)?, "{}");
    assert_eq!(FileManager::file_size(&path)?, 2);

    Ok(())
}

/// Test that log entries are appended with a timestamp
#[test]
fn test_append_to_log_file_calledTwice_shouldKeepBothEntries() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("issues.log");

    FileManager::append_to_log_file(&path, "first")?;
    FileManager::append_to_log_file(&path, "second")?;

    let content = std::fs::read_to_string(&path)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with('[') && lines[0].ends_with("first"));
    assert!(lines[1].ends_with("second"));

    Ok(())
}
