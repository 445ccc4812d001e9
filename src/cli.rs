// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::RawSourceConfig;
use crate::types::{BackendKind, OverflowPolicy};

/// Command-line arguments for `dirchanges`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dirchanges",
    version,
    about = "Print creations, modifications and deletions in a directory as they happen.",
    long_about = None
)]
pub struct CliArgs {
    /// Directory to watch. Overrides `[source].directory` from `--config`.
    #[arg(value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Optional TOML config file with a `[source]` section.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Poll interval in milliseconds (default 250).
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Maximum number of undelivered records to keep (default 200).
    #[arg(long, value_name = "N")]
    pub buffer_size: Option<usize>,

    /// What to drop when the buffer is full: `drop-oldest` or `reject-new`.
    #[arg(long, value_name = "POLICY")]
    pub overflow: Option<OverflowPolicy>,

    /// Watch primitive: `native` or `poll`.
    #[arg(long, value_name = "BACKEND")]
    pub backend: Option<BackendKind>,

    /// How many records to request at a time.
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub batch: u64,

    /// Exit after printing this many records.
    #[arg(long, value_name = "N")]
    pub count: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DIRCHANGES_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and validate the configuration, print it, and exit.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// The source settings given on the command line, to be layered over
    /// the config file.
    pub fn source_overrides(&self) -> RawSourceConfig {
        RawSourceConfig {
            directory: self.directory.clone(),
            poll_interval_ms: self.poll_interval_ms,
            max_buffer_size: self.buffer_size,
            overflow_policy: self.overflow,
            backend: self.backend,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
