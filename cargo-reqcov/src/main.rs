//! cargo-reqcov - Requirement coverage tool
//!
//! Thin CLI over the reqcov-core library: evaluates the CI gate on a
//! machine-readable coverage report, renders that report into other formats,
//! lists what is uncovered, validates specification files and aggregates
//! events streamed by a test engine.

use std::{
    path::PathBuf,
    process,
};

use anyhow::{
    Context,
    Result,
};
use clap::{
    Parser,
    Subcommand,
};
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;
mod helpers;

use helpers::{
    GlobalArgs,
    OutputManager,
};

/// Gate passed or command succeeded
pub const EXIT_SUCCESS: i32 = 0;
/// A gate threshold was violated
pub const EXIT_GATE_FAILED: i32 = 1;
/// The tool itself failed: unreadable input, bad arguments, I/O
pub const EXIT_TOOL_ERROR: i32 = 2;

/// Requirement coverage reporting and CI gate
#[derive(Parser)]
#[command(name = "cargo-reqcov")]
#[command(
    version,
    about = "Requirement coverage reporting and CI gate",
    long_about = "
Requirement coverage reporting and CI gate

Usage:
  cargo-reqcov <COMMAND>           # Direct usage
  cargo reqcov <COMMAND>           # As Cargo subcommand

Examples:
  # Fail the build below 95% requirement verification
  cargo-reqcov gate --report report.json --min-verification 95

  # Render every report format from a run's JSON report
  cargo-reqcov render --report report.json --format all --out-dir reports

  # List requirements and features no test exercises
  cargo-reqcov uncovered --report report.json

  # Validate a specification file
  cargo-reqcov check-spec --spec requirements.toml

  # Aggregate JSON-lines events from a test engine into reports
  cargo-reqcov collect --spec requirements.toml --events events.jsonl

Exit codes:
  0  success / gate passed
  1  gate failed
  2  tool error (unreadable or invalid input)
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level for diagnostics written to stderr
    #[arg(long, global = true, default_value = "warn", env = "REQCOV_LOG")]
    log_level: String,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Configuration file (defaults to reqcov.toml discovery in the current
    /// directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the CI gate on a machine-readable report
    Gate {
        /// Coverage report produced at the end of a run
        #[arg(long, default_value = "report.json")]
        report: PathBuf,

        /// Minimum requirement verification percentage
        #[arg(long)]
        min_verification: Option<f64>,

        /// Minimum feature verification percentage
        #[arg(long)]
        min_feature_verification: Option<f64>,

        /// Minimum requirement coverage percentage
        #[arg(long)]
        min_coverage: Option<f64>,

        /// Fail when the specification declares no requirements
        #[arg(long)]
        require_requirements: bool,
    },

    /// Render a machine-readable report into other formats
    Render {
        /// Coverage report produced at the end of a run
        #[arg(long, default_value = "report.json")]
        report: PathBuf,

        /// Output format: json, html, markdown, table, uncovered or all
        #[arg(long, default_value = "all")]
        format: String,

        /// Directory to write documents to
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Override the report title
        #[arg(long)]
        title: Option<String>,

        /// Print to stdout instead of writing files
        #[arg(long)]
        stdout: bool,
    },

    /// List uncovered requirements and features
    Uncovered {
        /// Coverage report produced at the end of a run
        #[arg(long, default_value = "report.json")]
        report: PathBuf,
    },

    /// Validate a requirement specification file
    CheckSpec {
        /// Specification file (.json or .toml)
        #[arg(long)]
        spec: PathBuf,
    },

    /// Aggregate JSON-lines outcome events into coverage reports
    Collect {
        /// Specification file (.json or .toml)
        #[arg(long)]
        spec: PathBuf,

        /// Events file, one JSON object per line
        #[arg(long)]
        events: PathBuf,

        /// Tag file mapping test identifiers to claims
        #[arg(long)]
        tags: Option<PathBuf>,

        /// Directory to write documents to
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Report title
        #[arg(long)]
        title: Option<String>,
    },
}

/// Handle both `cargo-reqcov` and `cargo reqcov` calling patterns
fn parse_args() -> Cli {
    let mut args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "reqcov" {
        args.remove(1);
    }
    Cli::parse_from(args)
}

fn init_tracing(log_level: &str) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level.parse::<Level>().unwrap_or(Level::WARN))
        .with_writer(std::io::stderr)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global default tracing subscriber")
}

fn run(cli: Cli) -> Result<i32> {
    init_tracing(&cli.log_level)?;

    let globals = GlobalArgs::from_cli(cli.config.clone(), cli.no_color);
    let config = globals.load_config()?;
    let output = OutputManager::new(globals.use_colors());

    match cli.command {
        Commands::Gate {
            report,
            min_verification,
            min_feature_verification,
            min_coverage,
            require_requirements,
        } => {
            let thresholds = helpers::merge_thresholds(
                &config,
                min_verification,
                min_feature_verification,
                min_coverage,
                require_requirements,
            )?;
            commands::cmd_gate(&report, &thresholds, &output)
        },
        Commands::Render {
            report,
            format,
            out_dir,
            title,
            stdout,
        } => commands::cmd_render(
            &report,
            &format,
            out_dir.as_deref(),
            title,
            stdout,
            &config,
            &output,
        ),
        Commands::Uncovered { report } => commands::cmd_uncovered(&report),
        Commands::CheckSpec { spec } => commands::cmd_check_spec(&spec, &output),
        Commands::Collect {
            spec,
            events,
            tags,
            out_dir,
            title,
        } => commands::cmd_collect(
            &spec,
            &events,
            tags.as_deref(),
            out_dir.as_deref(),
            title,
            &config,
            &output,
        ),
    }
}

fn main() {
    let cli = parse_args();

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", "error:".bright_red().bold(), e);
            process::exit(EXIT_TOOL_ERROR);
        },
    }
}
