/*!
 * Tests for application configuration
 */

use anyhow::Result;
use storyport::app_config::{Config, LogLevel, OutputFormat};

use crate::common;

/// Test that a saved configuration loads back unchanged
#[test]
fn test_save_and_from_file_withCustomValues_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("storyport.json");

    let mut config = Config::default();
    config.log_level = LogLevel::Warn;
    config.import.batch_concurrency = 8;
    config.output.format = OutputFormat::Text;
    config.save(&path)?;

    let loaded = Config::from_file(&path)?;
    assert_eq!(loaded, config);

    Ok(())
}

/// Test that an empty JSON object yields the defaults
#[test]
fn test_from_file_withEmptyObject_shouldUseDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "storyport.json", b"{}")?;

    let config = Config::from_file(&path)?;
    assert_eq!(config, Config::default());
    assert!(config.validate().is_ok());

    Ok(())
}

/// Test that malformed JSON is reported with the file name
#[test]
fn test_from_file_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "broken.json", b"{ log_level: ")?;

    let error = Config::from_file(&path).unwrap_err();
    assert!(format!("{:#}", error).contains("broken.json"));

    Ok(())
}

/// Test that validation rejects a zero size limit
#[test]
fn test_validate_withZeroMaxFileSize_shouldFail() {
    let mut config = Config::default();
    config.import.max_file_size_mb = 0;
    assert!(config.validate().is_err());
}

/// Test that import settings follow the configuration
#[test]
fn test_import_settings_shouldCarrySniffPrefix() {
    let mut config = Config::default();
    config.import.sniff_prefix_bytes = 512;
    assert_eq!(config.import_settings().sniff_prefix_bytes, 512);
    assert_eq!(config.import.max_file_size_bytes(), 200 * 1024 * 1024);
}
