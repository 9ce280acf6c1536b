//! LogTally - log file validator and tally reporter
//!
//! Reads a line-oriented log file, validates every line against the
//! `<date> <level> key=value ...` schema, tallies levels and actions,
//! and writes a CSV (or JSON) report or prints a console summary.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Unreadable input, no valid action data, strict-mode abort,
//!       invalid arguments or report write failure

mod analysis;
mod cli;
mod config;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::Config;
use models::RunOutcome;
use report::{Report, ReportMetadata, ReportSummary};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Configuration decides verbosity, so it is loaded before logging starts
    let (config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(log_level(&args, &config));

    info!("LogTally v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_source {
        Some(path) => debug!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    match run(&args, &config) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .logtally.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  .logtally.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .logtally.toml")?;

    println!("✅ Created .logtally.toml with default settings.");
    println!("   Edit it to change strict mode, report format and top action count.");
    Ok(())
}

/// Load configuration from file or use defaults, merged with CLI arguments.
///
/// Returns the path the configuration came from, if any.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    let (mut config, source) = match args.config {
        Some(ref config_path) => (Config::load(config_path)?, Some(config_path.clone())),
        None => match Config::load_default()? {
            Some(config) => (config, Some(PathBuf::from(config::DEFAULT_CONFIG_FILE))),
            None => (Config::default(), None),
        },
    };

    config.merge_with_args(args);
    Ok((config, source))
}

/// Effective log level: --quiet wins, then --verbose or the config setting.
fn log_level(args: &Args, config: &Config) -> tracing::Level {
    if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    }
}

/// Initialize logging. Diagnostics go to stderr; `RUST_LOG` overrides the level.
fn init_logging(level: tracing::Level) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Process the input and emit the summary. Returns the exit code.
fn run(args: &Args, config: &Config) -> Result<i32> {
    let sink = analysis::TracingSink;
    let strict = config.general.strict;

    info!(
        "Analyzing {}{}",
        args.input_file.display(),
        if strict { " (strict mode)" } else { "" }
    );

    let tally = match analysis::process_file(&args.input_file, strict, &sink) {
        RunOutcome::Completed(tally) => tally,
        RunOutcome::Aborted(abort) => {
            eprintln!(
                "\n⛔ Aborted at line {} in strict mode: {}",
                abort.line_number, abort.reason
            );
            return Ok(1);
        }
        RunOutcome::Fatal(e) => {
            eprintln!("\n❌ Error: {}", e);
            return Ok(1);
        }
    };

    let summary = ReportSummary::from_tally(&tally, config.report.top_actions);

    // Handle --dry-run: print to the console, write nothing
    if args.dry_run {
        println!("{}", report::generate_console_summary(&summary));
        println!("✅ Dry run complete. No report file was written.");
        return Ok(0);
    }

    let output_path = args.output_path(config.report.format);
    let output = match config.report.format {
        OutputFormat::Csv => report::generate_csv_report(&summary)?,
        OutputFormat::Json => report::generate_json_report(&Report {
            metadata: ReportMetadata {
                input_file: args.input_file.display().to_string(),
                generated_at: Utc::now(),
                strict,
            },
            summary: summary.clone(),
        })?,
    };

    report::write_report(&output, &output_path)?;

    println!("\n📊 Log Summary:");
    println!(
        "   Valid: {} | Skipped: {} | Total: {}",
        summary.valid_lines, summary.skipped_lines, summary.total_lines
    );
    println!("\n✅ Report saved to: {}", output_path.display());

    Ok(0)
}
