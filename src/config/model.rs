// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::errors::Result;
use crate::types::{BackendKind, OverflowPolicy};

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 200;

/// Top-level configuration file as read from TOML.
///
/// ```toml
/// [source]
/// directory = "incoming"
/// poll_interval_ms = 250
/// max_buffer_size = 200
/// overflow_policy = "drop-oldest"
/// backend = "native"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub source: RawSourceConfig,
}

/// `[source]` section, before validation.
///
/// Every field is optional so command-line flags can be layered on top of a
/// file (or used without one). Missing values fall back to the defaults
/// above when converted into a [`SourceConfig`]; `directory` has no default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSourceConfig {
    #[serde(default)]
    pub directory: Option<PathBuf>,

    #[serde(default)]
    pub poll_interval_ms: Option<u64>,

    #[serde(default)]
    pub max_buffer_size: Option<usize>,

    #[serde(default)]
    pub overflow_policy: Option<OverflowPolicy>,

    #[serde(default)]
    pub backend: Option<BackendKind>,
}

impl RawSourceConfig {
    /// Overlay `other` on top of `self`; values set in `other` win.
    pub fn merge(self, other: RawSourceConfig) -> RawSourceConfig {
        RawSourceConfig {
            directory: other.directory.or(self.directory),
            poll_interval_ms: other.poll_interval_ms.or(self.poll_interval_ms),
            max_buffer_size: other.max_buffer_size.or(self.max_buffer_size),
            overflow_policy: other.overflow_policy.or(self.overflow_policy),
            backend: other.backend.or(self.backend),
        }
    }
}

/// Validated source configuration.
///
/// Constructed only through [`SourceConfig::new`] or `TryFrom<RawSourceConfig>`,
/// so `poll_interval > 0` and `max_buffer_size >= 1` always hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    directory: PathBuf,
    poll_interval: Duration,
    max_buffer_size: usize,
    overflow_policy: OverflowPolicy,
    backend: BackendKind,
}

impl SourceConfig {
    pub fn new(
        directory: impl Into<PathBuf>,
        poll_interval: Duration,
        max_buffer_size: usize,
    ) -> Result<Self> {
        let cfg = Self::new_unchecked(
            directory.into(),
            poll_interval,
            max_buffer_size,
            OverflowPolicy::default(),
            BackendKind::default(),
        );
        super::validate::validate_source_config(&cfg)?;
        Ok(cfg)
    }

    pub(crate) fn new_unchecked(
        directory: PathBuf,
        poll_interval: Duration,
        max_buffer_size: usize,
        overflow_policy: OverflowPolicy,
        backend: BackendKind,
    ) -> Self {
        Self {
            directory,
            poll_interval,
            max_buffer_size,
            overflow_policy,
            backend,
        }
    }

    pub fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn max_buffer_size(&self) -> usize {
        self.max_buffer_size
    }

    pub fn overflow_policy(&self) -> OverflowPolicy {
        self.overflow_policy
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }
}
