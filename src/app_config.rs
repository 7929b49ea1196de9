use anyhow::{anyhow, Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::import::{ImportSettings, DEFAULT_SNIFF_PREFIX_BYTES};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "storyport.json";

/// Smallest detection prefix that still holds every content signature
pub const MIN_SNIFF_PREFIX_BYTES: usize = 64;

/// Largest detection prefix (1 MiB)
pub const MAX_SNIFF_PREFIX_BYTES: usize = 1024 * 1024;

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Import settings
    #[serde(default)]
    pub import: ImportConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Import tuning
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ImportConfig {
    // @field: Leading bytes read for format detection
    #[serde(default = "default_sniff_prefix_bytes")]
    pub sniff_prefix_bytes: usize,

    // @field: Files above this size are refused before import
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    // @field: Parallel imports in batch mode
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            sniff_prefix_bytes: default_sniff_prefix_bytes(),
            max_file_size_mb: default_max_file_size_mb(),
            batch_concurrency: default_batch_concurrency(),
        }
    }
}

impl ImportConfig {
    /// Size guard in bytes
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

/// How imported documents are written
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OutputConfig {
    // @field: Output encoding
    #[serde(default)]
    pub format: OutputFormat,

    // @field: Indent JSON output
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            pretty: true,
        }
    }
}

/// Output encoding of an imported document
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    // @format: Serialized document model
    #[default]
    Json,
    // @format: One line per element
    Text,
}

impl OutputFormat {
    // @returns: File extension for this encoding
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "txt",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Text => write!(f, "text"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "txt" => Ok(Self::Text),
            _ => Err(anyhow!("Invalid output format: {}", s)),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching `log` filter
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

fn default_sniff_prefix_bytes() -> usize {
    DEFAULT_SNIFF_PREFIX_BYTES
}

fn default_max_file_size_mb() -> u64 {
    200
}

fn default_batch_concurrency() -> usize {
    4
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open config file: {:?}", path))?;
        let reader = BufReader::new(file);
        let config: Config =
            serde_json::from_reader(reader).with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write config to file: {:?}", path))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let prefix = self.import.sniff_prefix_bytes;
        if !(MIN_SNIFF_PREFIX_BYTES..=MAX_SNIFF_PREFIX_BYTES).contains(&prefix) {
            return Err(anyhow!(
                "import.sniff_prefix_bytes must be between {} and {}, got {}",
                MIN_SNIFF_PREFIX_BYTES,
                MAX_SNIFF_PREFIX_BYTES,
                prefix
            ));
        }

        if self.import.max_file_size_mb == 0 {
            return Err(anyhow!("import.max_file_size_mb must be at least 1"));
        }

        if self.import.batch_concurrency == 0 {
            return Err(anyhow!("import.batch_concurrency must be at least 1"));
        }

        Ok(())
    }

    /// Settings handed to the importer
    pub fn import_settings(&self) -> ImportSettings {
        ImportSettings {
            sniff_prefix_bytes: self.import.sniff_prefix_bytes,
        }
    }
}
