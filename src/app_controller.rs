use anyhow::{anyhow, Context, Result};
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

use crate::app_config::{Config, OutputFormat};
use crate::document::CanonicalDocument;
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::formats::{FormatCatalog, SourceFormat};
use crate::import::{ImportRequest, ImportSettings, Importer};

// @module: Application controller for screenplay imports

/// Directory created inside the input folder when batch mode gets no output directory
pub const DEFAULT_BATCH_OUTPUT_DIR: &str = "storyport-output";

/// File in the batch output directory that collects failures
pub const ISSUES_LOG_FILE: &str = "storyport.issues.log";

/// Outcome of a folder import
#[derive(Debug, Default)]
pub struct BatchSummary {
    // @field: Written output files, in input order
    pub written: Vec<PathBuf>,
    // @field: Inputs that failed, with the reason
    pub failed: Vec<(PathBuf, String)>,
    // @field: Wall time of the whole batch
    pub duration: Duration,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.written.len() + self.failed.len()
    }
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Shared with import tasks
    catalog: Arc<FormatCatalog>,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self {
            config,
            catalog: Arc::new(FormatCatalog::standard()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &FormatCatalog {
        &self.catalog
    }

    /// Import one file on the current thread
    pub fn import_file(&self, path: &Path, format: Option<SourceFormat>) -> Result<CanonicalDocument, AppError> {
        Self::import_guarded(
            &self.catalog,
            self.config.import_settings(),
            self.config.import.max_file_size_bytes(),
            path,
            format,
        )
    }

    // Size guard, then the importer
    fn import_guarded(
        catalog: &FormatCatalog,
        settings: ImportSettings,
        max_file_size: u64,
        path: &Path,
        format: Option<SourceFormat>,
    ) -> Result<CanonicalDocument, AppError> {
        if let Ok(size) = FileManager::file_size(path) {
            if size > max_file_size {
                return Err(AppError::File(format!(
                    "{} is {} bytes, above the {} byte limit",
                    path.display(),
                    size,
                    max_file_size
                )));
            }
        }

        let mut request = ImportRequest::new(path);
        if let Some(format) = format {
            request = request.with_format(format);
        }
        Ok(Importer::with_settings(catalog, settings).import(&request)?)
    }

    /// Encode a document for output
    pub fn render(&self, document: &CanonicalDocument, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json if self.config.output.pretty => {
                serde_json::to_string_pretty(document).context("Failed to serialize document to JSON")
            }
            OutputFormat::Json => serde_json::to_string(document).context("Failed to serialize document to JSON"),
            OutputFormat::Text => Ok(document.to_string()),
        }
    }

    /// Import a single file and write it to `output`, or to stdout when there is none
    pub async fn run_import(
        &self,
        input_file: PathBuf,
        format: Option<SourceFormat>,
        output: Option<PathBuf>,
    ) -> Result<()> {
        let start_time = Instant::now();

        if !FileManager::file_exists(&input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let catalog = Arc::clone(&self.catalog);
        let settings = self.config.import_settings();
        let max_file_size = self.config.import.max_file_size_bytes();
        let task_path = input_file.clone();
        let document = tokio::task::spawn_blocking(move || {
            Self::import_guarded(&catalog, settings, max_file_size, &task_path, format)
        })
        .await
        .context("Import task panicked")?
        .map_err(|e| {
            if let AppError::Import(import_error) = &e {
                let (title, body) = import_error.user_message();
                error!("{}: {}", title, body);
            }
            anyhow::Error::from(e)
        })?;

        let rendered = self.render(&document, self.config.output.format)?;
        match output {
            Some(path) => {
                FileManager::write_to_file(&path, &rendered)?;
                info!("Success: {}", path.display());
            }
            None => println!("{}", rendered),
        }

        debug!(
            "Imported {} elements in {}",
            document.len(),
            Self::format_duration(start_time.elapsed())
        );
        Ok(())
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }

    fn progress_bar(len: usize) -> ProgressBar {
        let progress = ProgressBar::new(len as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress.set_style(style.progress_chars("█▓▒░"));
        progress
    }

    /// Import every file under `input_dir` whose extension a catalog format claims.
    ///
    /// Imports run on the blocking pool, at most `import.batch_concurrency`
    /// at a time. One file failing does not stop the others; failures are
    /// collected in the summary and in the issues log.
    pub async fn run_batch(&self, input_dir: PathBuf, output_dir: Option<PathBuf>) -> Result<BatchSummary> {
        let start_time = Instant::now();

        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }
        let output_dir = output_dir.unwrap_or_else(|| input_dir.join(DEFAULT_BATCH_OUTPUT_DIR));

        let files =
            FileManager::find_files_with_extensions(&input_dir, &self.catalog.all_extensions(), Some(&output_dir))?;
        if files.is_empty() {
            return Err(anyhow!("No importable files found in directory: {:?}", input_dir));
        }
        info!("Importing {} files from {:?}", files.len(), input_dir);

        let progress = Self::progress_bar(files.len());
        progress.set_message("Importing files");

        let semaphore = Arc::new(Semaphore::new(self.config.import.batch_concurrency));
        let settings = self.config.import_settings();
        let max_file_size = self.config.import.max_file_size_bytes();

        let tasks = files.into_iter().map(|path| {
            let semaphore = Arc::clone(&semaphore);
            let catalog = Arc::clone(&self.catalog);
            let progress = progress.clone();
            async move {
                let outcome = async {
                    let _permit = semaphore.acquire().await.context("Import semaphore closed")?;
                    let task_path = path.clone();
                    let document = tokio::task::spawn_blocking(move || {
                        Self::import_guarded(&catalog, settings, max_file_size, &task_path, None)
                    })
                    .await
                    .context("Import task panicked")??;
                    Ok::<_, anyhow::Error>(document)
                }
                .await;
                progress.inc(1);
                (path, outcome)
            }
        });
        let results = join_all(tasks).await;
        progress.finish_with_message("Batch import complete");

        let extension = self.config.output.format.extension();
        let mut summary = BatchSummary::default();
        for (path, outcome) in results {
            let written = outcome.and_then(|document| {
                let output_path = FileManager::generate_output_path(&path, &input_dir, &output_dir, extension);
                FileManager::write_to_file(&output_path, &self.render(&document, self.config.output.format)?)?;
                Ok(output_path)
            });
            match written {
                Ok(output_path) => {
                    debug!("{} -> {}", path.display(), output_path.display());
                    summary.written.push(output_path);
                }
                Err(e) => {
                    error!("Error importing file {}: {}", path.display(), e);
                    summary.failed.push((path, e.to_string()));
                }
            }
        }
        summary.duration = start_time.elapsed();

        let summary_message = format!(
            "Batch import completed: {} imported, {} failed",
            summary.written.len(),
            summary.failed.len()
        );
        info!("{} in {}", summary_message, Self::format_duration(summary.duration));

        if !summary.failed.is_empty() {
            let log_path = output_dir.join(ISSUES_LOG_FILE);
            let mut entry = format!("{} ({})", summary_message, input_dir.display());
            for (path, reason) in &summary.failed {
                let _ = write!(entry, "\n  {}: {}", path.display(), reason);
            }
            if let Err(e) = FileManager::append_to_log_file(&log_path, &entry) {
                warn!("Failed to write batch issues to file: {}", e);
            } else {
                info!("Batch issues written to {}", log_path.display());
            }
        }

        Ok(summary)
    }

    /// One line per supported format, then the recognized-but-refused variants
    pub fn describe_formats(&self) -> String {
        let mut out = String::new();
        for descriptor in self.catalog.list_supported_formats() {
            let filter = descriptor.file_filter();
            let _ = writeln!(out, "{:<10} {}", descriptor.format.id(), filter);
            if let Some(legacy) = descriptor.legacy {
                let _ = writeln!(
                    out,
                    "{:<10}   not supported: {} (.{})",
                    "",
                    legacy.name,
                    legacy.extensions.join(", .")
                );
            }
        }
        out
    }
}
