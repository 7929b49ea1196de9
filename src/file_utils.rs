use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Output path for an imported document
    // @params: input_file, input_root, output_dir, extension
    // Keeps the input's position below `input_root` and its full file name,
    // so `act1/scene.fdx` becomes `<output_dir>/act1/scene.fdx.json`.
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>, P3: AsRef<Path>>(
        input_file: P1,
        input_root: P2,
        output_dir: P3,
        extension: &str,
    ) -> PathBuf {
        let input_file = input_file.as_ref();
        let relative_dir = input_file
            .parent()
            .and_then(|parent| parent.strip_prefix(input_root.as_ref()).ok())
            .unwrap_or_else(|| Path::new(""));

        let mut output_filename = input_file.file_name().unwrap_or_default().to_string_lossy().to_string();
        output_filename.push('.');
        output_filename.push_str(extension);

        output_dir.as_ref().join(relative_dir).join(output_filename)
    }

    /// Find files whose extension is in `extensions` (case-insensitive), skipping `exclude`
    pub fn find_files_with_extensions<P: AsRef<Path>>(
        dir: P,
        extensions: &[&str],
        exclude: Option<&Path>,
    ) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        let walker = WalkDir::new(dir.as_ref())
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| exclude.is_none_or(|excluded| entry.path() != excluded));

        for entry in walker {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(ext) = path.extension() {
                let ext = ext.to_string_lossy();
                if extensions.iter().any(|wanted| ext.eq_ignore_ascii_case(wanted)) {
                    result.push(path.to_path_buf());
                }
            }
        }

        Ok(result)
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content).with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Append content to a log file with timestamp
    pub fn append_to_log_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {:?}", path.as_ref()))?;

        writeln!(file, "[{}] {}", timestamp, content)
            .with_context(|| format!("Failed to write to log file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Size of a file in bytes
    pub fn file_size<P: AsRef<Path>>(path: P) -> Result<u64> {
        let metadata = fs::metadata(&path).with_context(|| format!("Failed to stat file: {:?}", path.as_ref()))?;
        Ok(metadata.len())
    }
}
