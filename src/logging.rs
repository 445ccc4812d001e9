// src/logging.rs

//! Logging setup for `dirchanges` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `DIRCHANGES_LOG` environment variable: either a bare level ("debug")
//!    or full `EnvFilter` directives ("dirchanges::watch=trace,notify=debug")
//! 3. default to `info`
//!
//! A bare level applies to this crate only; dependencies such as notify's
//! watcher threads stay at `warn`.
//!
//! Logs are sent to STDERR so that stdout carries only change records.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

const LOG_ENV: &str = "DIRCHANGES_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = build_filter(cli_level, env.as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> Result<EnvFilter> {
    if let Some(lvl) = cli_level {
        return Ok(crate_filter(level_from_log_level(lvl)));
    }

    match env.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(crate_filter(tracing::Level::INFO)),
        Some(raw) => match parse_level_str(raw) {
            Some(level) => Ok(crate_filter(level)),
            None => EnvFilter::try_new(raw)
                .with_context(|| format!("invalid {LOG_ENV} value: {raw:?}")),
        },
    }
}

fn crate_filter(level: tracing::Level) -> EnvFilter {
    EnvFilter::new(format!(
        "warn,{}={}",
        env!("CARGO_CRATE_NAME"),
        level.as_str().to_lowercase()
    ))
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
