#![allow(dead_code)]

pub use dirchanges_test_utils::builders;
pub use dirchanges_test_utils::{assert_pending_for, init_tracing, with_timeout};

use std::sync::Arc;
use std::time::Duration;

use dirchanges::config::SourceConfig;
use dirchanges::fs::mock::MockFileSystem;
use dirchanges::{ChangeRecord, ChangeSubscription, DirectoryChangeSource};

/// A mock filesystem with the watched directory `/w` already created.
pub fn mock_fs() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.create_dir("/w").expect("create /w");
    fs
}

/// A source whose watch primitive and filesystem are both `fs`.
pub fn mock_source(fs: &MockFileSystem, cfg: SourceConfig) -> DirectoryChangeSource {
    DirectoryChangeSource::with_backend(cfg, Arc::new(fs.clone()), Arc::new(fs.clone()))
}

/// Receive exactly `n` records, failing the test on errors or a timeout.
pub async fn next_records(sub: &mut ChangeSubscription, n: usize) -> Vec<ChangeRecord> {
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        match with_timeout(sub.next()).await {
            Some(Ok(record)) => out.push(record),
            Some(Err(err)) => panic!("unexpected failure after {} records: {err}", out.len()),
            None => panic!("subscription ended after {} records", out.len()),
        }
    }
    out
}

/// Poll `cond` every few milliseconds until it holds or 5 seconds pass.
pub async fn eventually(mut cond: impl FnMut() -> bool) {
    with_timeout(async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
}
