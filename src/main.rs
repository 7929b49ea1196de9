// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{debug, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use storyport::app_config::{self, Config, OutputFormat, DEFAULT_CONFIG_FILE};
use storyport::app_controller::Controller;
use storyport::formats::SourceFormat;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for OutputFormat to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliOutputFormat {
    Json,
    Text,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(cli_format: CliOutputFormat) -> Self {
        match cli_format {
            CliOutputFormat::Json => OutputFormat::Json,
            CliOutputFormat::Text => OutputFormat::Text,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import one screenplay file
    Import {
        /// File to import
        #[arg(value_name = "INPUT_FILE")]
        input_file: PathBuf,

        /// Skip detection and read the file as this format (fdx, fountain, docx, ...)
        #[arg(short, long)]
        format: Option<SourceFormat>,

        /// Write the document here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output encoding
        #[arg(long, value_enum)]
        output_format: Option<CliOutputFormat>,

        /// Write JSON on a single line
        #[arg(long)]
        compact: bool,
    },

    /// Import every supported file in a directory tree
    Batch {
        /// Directory to scan
        #[arg(value_name = "INPUT_DIR")]
        input_dir: PathBuf,

        /// Where to write imported documents (default: INPUT_DIR/storyport-output)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Output encoding
        #[arg(long, value_enum)]
        output_format: Option<CliOutputFormat>,
    },

    /// List supported formats and their file extensions
    Formats,

    /// Generate shell completions for storyport
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// storyport - screenplay import core
///
/// Reads screenplays and stories written in external authoring tools and
/// converts them into one canonical, format-independent document.
#[derive(Parser, Debug)]
#[command(name = "storyport")]
#[command(version)]
#[command(about = "Import screenplays from external authoring tools")]
#[command(long_about = "storyport detects the format of a screenplay file and converts it into a canonical document.

EXAMPLES:
    storyport import pilot.fdx                      # Print the document as JSON
    storyport import draft.txt --format fountain    # Skip detection
    storyport import story.docx -o story.json       # Write to a file
    storyport batch ~/scripts -o ~/imported         # Import a whole folder
    storyport formats                               # List supported formats
    storyport completions bash > storyport.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in storyport.json by default. You can specify a
    different config file with --config. If the config file doesn't exist, a
    default one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long = "config", global = true, default_value = DEFAULT_CONFIG_FILE, env = "STORYPORT_CONFIG")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the effective level is set through set_max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "storyport", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = load_config(&cli.config_path, cli.log_level.clone())?;

    match cli.command {
        Commands::Import {
            input_file,
            format,
            output,
            output_format,
            compact,
        } => {
            if let Some(output_format) = output_format {
                config.output.format = output_format.into();
            }
            if compact {
                config.output.pretty = false;
            }
            let controller = Controller::with_config(config)?;
            controller.run_import(input_file, format, output).await?;
        }
        Commands::Batch {
            input_dir,
            output_dir,
            output_format,
        } => {
            if let Some(output_format) = output_format {
                config.output.format = output_format.into();
            }
            let controller = Controller::with_config(config)?;
            let summary = controller.run_batch(input_dir, output_dir).await?;
            if !summary.failed.is_empty() {
                warn!("{} of {} files failed to import", summary.failed.len(), summary.total());
            }
        }
        Commands::Formats => {
            let controller = Controller::with_config(config)?;
            print!("{}", controller.describe_formats());
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

// Load the config file or create a default one, then apply CLI overrides
fn load_config(config_path: &str, cli_log_level: Option<CliLogLevel>) -> Result<Config> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &cli_log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = if Path::new(config_path).exists() {
        Config::from_file(config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        config
            .save(config_path)
            .with_context(|| format!("Failed to write default config to file: {}", config_path))?;
        config
    };

    if let Some(log_level) = cli_log_level {
        config.log_level = log_level.into();
    }

    config.validate().context("Configuration validation failed")?;

    // Just update the max level without reinitializing the logger
    log::set_max_level(config.log_level.to_level_filter());
    debug!("Using configuration from {}", PathBuf::from(config_path).display());

    Ok(config)
}
