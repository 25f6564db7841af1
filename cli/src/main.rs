//! repsq - command-line front end.
//!
//! ```text
//! main() -> init_tracing() -> Cli::parse() -> commands::{square, classify, digest, limits, worker}
//!                                                   |
//!                                                   v
//!                                  JobScheduler (thread | process backend)
//! ```
//!
//! Logs go to a file, never to stdout: the hidden `worker` subcommand speaks
//! its wire protocol over stdout.

mod commands;

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use repsq_config::{BackendKind, RepsqConfig, Settings};
use repsq_types::ModeSelection;

#[derive(Debug, Parser)]
#[command(name = "repsq")]
#[command(version, about = "Square digit strings exactly in bases 2-36 and classify palindromic squares")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Square a digit string through the job scheduler
    Square(SquareArgs),
    /// Classify the square of a repunit without computing it
    Classify {
        #[arg(long, default_value_t = 10)]
        base: u32,
        /// Number of `1` digits
        #[arg(long)]
        length: usize,
        /// Also materialize the square's digits
        #[arg(long)]
        materialize: bool,
        #[arg(long)]
        json: bool,
    },
    /// Compute a determinism digest from its fields
    Digest {
        #[arg(long)]
        base: u32,
        /// Root digits (canonicalized before hashing)
        #[arg(long)]
        root: String,
        /// Square digits (canonicalized before hashing)
        #[arg(long)]
        square: String,
        /// Peak coefficient as a decimal string
        #[arg(long)]
        peak: String,
        #[arg(long, action = clap::ArgAction::Set)]
        palindrome: bool,
    },
    /// Show resolved limits, or persist new ones to the config file
    Limits {
        #[arg(long)]
        safe_digits_exact: Option<usize>,
        #[arg(long)]
        timeout_ms: Option<u64>,
        #[arg(long)]
        warning_ms: Option<u64>,
    },
    /// Serve one request on stdin and reply on stdout
    #[command(hide = true)]
    Worker,
}

#[derive(Debug, Args)]
struct SquareArgs {
    /// Root digits, most significant first (0-9, then A-Z; case-insensitive)
    digits: String,
    #[arg(long, default_value_t = 10)]
    base: u32,
    #[arg(long, default_value = "exact", value_parser = parse_mode)]
    mode: ModeSelection,
    /// Collect the carry trace (omitted above the configured size)
    #[arg(long)]
    trace: bool,
    /// Job timeout budget; defaults to the configured hard timeout
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Execution backend; defaults to the configured backend
    #[arg(long, value_parser = parse_backend)]
    backend: Option<BackendKind>,
    /// Print machine-readable JSON
    #[arg(long)]
    json: bool,
}

fn parse_mode(raw: &str) -> Result<ModeSelection, String> {
    ModeSelection::parse(raw).ok_or_else(|| format!("unknown mode {raw:?} (expected exact, preview, or auto)"))
}

fn parse_backend(raw: &str) -> Result<BackendKind, String> {
    BackendKind::parse(raw).ok_or_else(|| format!("unknown backend {raw:?} (expected thread or process)"))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::debug!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // Without a log file, install the filter only; stdout belongs to command output.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!("Failed to create log dir {}: {e}", parent.display()));
            continue;
        }

        match OpenOptions::new().create(true).append(true).open(&candidate) {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!("Failed to open log file {}: {e}", candidate.display()));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.repsq/logs/repsq.log
    if let Some(dir) = repsq_config::log_dir() {
        candidates.push(dir.join("repsq.log"));
    }

    // Fallback: ./.repsq/logs/repsq.log
    candidates.push(PathBuf::from(".repsq").join("logs").join("repsq.log"));

    candidates
}

fn load_settings() -> Settings {
    match RepsqConfig::load() {
        Ok(config) => config.unwrap_or_default().resolve(),
        Err(err) => {
            eprintln!("warning: {err}; using defaults");
            RepsqConfig::default().resolve()
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Square(args) => commands::square(args, &load_settings()).await,
        Commands::Classify {
            base,
            length,
            materialize,
            json,
        } => commands::classify(base, length, materialize, json),
        Commands::Digest {
            base,
            root,
            square,
            peak,
            palindrome,
        } => commands::digest(base, &root, &square, &peak, palindrome),
        Commands::Limits {
            safe_digits_exact,
            timeout_ms,
            warning_ms,
        } => commands::limits(safe_digits_exact, timeout_ms, warning_ms),
        Commands::Worker => commands::worker().await,
    }
}
