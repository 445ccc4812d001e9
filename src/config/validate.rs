// src/config/validate.rs

use std::path::Path;
use std::time::Duration;

use crate::config::model::{
    RawSourceConfig, SourceConfig, DEFAULT_MAX_BUFFER_SIZE, DEFAULT_POLL_INTERVAL_MS,
};
use crate::errors::{DirChangesError, Result};

impl TryFrom<RawSourceConfig> for SourceConfig {
    type Error = DirChangesError;

    fn try_from(raw: RawSourceConfig) -> std::result::Result<Self, Self::Error> {
        let directory = raw.directory.ok_or_else(|| {
            DirChangesError::Configuration(
                "a directory to watch is required ([source].directory or DIR)".to_string(),
            )
        })?;

        let cfg = SourceConfig::new_unchecked(
            directory,
            Duration::from_millis(raw.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS)),
            raw.max_buffer_size.unwrap_or(DEFAULT_MAX_BUFFER_SIZE),
            raw.overflow_policy.unwrap_or_default(),
            raw.backend.unwrap_or_default(),
        );
        validate_source_config(&cfg)?;
        Ok(cfg)
    }
}

/// Check the invariants a source relies on.
///
/// This does **not** touch the filesystem: whether the directory exists is
/// checked when the source starts, not when it is configured.
pub fn validate_source_config(cfg: &SourceConfig) -> Result<()> {
    validate_directory(cfg.directory())?;
    validate_poll_interval(cfg.poll_interval())?;
    validate_buffer_size(cfg.max_buffer_size())?;
    Ok(())
}

fn validate_directory(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Err(DirChangesError::Configuration(
            "directory must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_poll_interval(interval: Duration) -> Result<()> {
    if interval.is_zero() {
        return Err(DirChangesError::Configuration(
            "poll interval must be > 0 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_buffer_size(size: usize) -> Result<()> {
    if size == 0 {
        return Err(DirChangesError::Configuration(
            "max buffer size must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
