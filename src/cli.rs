//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// LogTally - validate a log file and tally its levels and actions
///
/// Each line must look like `<YYYY-MM-DD> <info|warn|error> action=<name> [key=value ...]`.
/// Malformed lines are skipped and reported, or abort the run with --strict.
///
/// Examples:
///   logtally
///   logtally server.log --dry-run
///   logtally server.log --strict -o summary.csv
///   logtally server.log --format json --top 5
///   logtally --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the input log file
    #[arg(default_value = "app.log", value_name = "INPUT_FILE")]
    pub input_file: PathBuf,

    /// Fail on the first invalid line instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// Print the summary to the console instead of writing a report file
    #[arg(long)]
    pub dry_run: bool,

    /// Output file path for the report
    ///
    /// Defaults to <INPUT_FILE without extension>_report.csv
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable verbose (debug) logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Report format (csv, json)
    ///
    /// Overrides the config file setting when given.
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Number of top actions to include in the report
    #[arg(long, value_name = "N", env = "LOGTALLY_TOP")]
    pub top: Option<usize>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .logtally.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Generate a default .logtally.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// CSV format (default)
    #[default]
    Csv,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// File extension used for default report names.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.top == Some(0) {
            return Err("--top must be at least 1".to_string());
        }

        if self.input_file.as_os_str().is_empty() {
            return Err("Input file path must not be empty".to_string());
        }

        if let Some(ref output) = self.output {
            if output.is_dir() {
                return Err(format!(
                    "Output path is a directory: {}",
                    output.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Returns the report destination: `--output` if given, otherwise
    /// the input path with its extension replaced by `_report.<ext>`.
    pub fn output_path(&self, format: OutputFormat) -> PathBuf {
        match self.output {
            Some(ref output) => output.clone(),
            None => default_output_path(&self.input_file, format),
        }
    }
}

/// `logs/app.log` becomes `logs/app_report.csv`.
pub fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}_report.{}", stem, format.extension()))
}
