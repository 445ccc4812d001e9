#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use dirchanges::config::SourceConfig;
use dirchanges::types::{BackendKind, OverflowPolicy};

/// Builder for `SourceConfig` with test-friendly defaults
/// (`/w`, 10ms poll interval, capacity 100).
pub struct SourceConfigBuilder {
    directory: PathBuf,
    poll_interval: Duration,
    max_buffer_size: usize,
    overflow_policy: OverflowPolicy,
    backend: BackendKind,
}

impl SourceConfigBuilder {
    pub fn new() -> Self {
        Self {
            directory: PathBuf::from("/w"),
            poll_interval: Duration::from_millis(10),
            max_buffer_size: 100,
            overflow_policy: OverflowPolicy::DropOldest,
            backend: BackendKind::Native,
        }
    }

    pub fn directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directory = dir.into();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn poll_interval_ms(self, ms: u64) -> Self {
        self.poll_interval(Duration::from_millis(ms))
    }

    pub fn max_buffer_size(mut self, size: usize) -> Self {
        self.max_buffer_size = size;
        self
    }

    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn build(self) -> SourceConfig {
        SourceConfig::new(self.directory, self.poll_interval, self.max_buffer_size)
            .expect("Failed to build valid config from builder")
            .with_overflow_policy(self.overflow_policy)
            .with_backend(self.backend)
    }
}

impl Default for SourceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
