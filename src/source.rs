// src/source.rs

//! Public entry point: a directory change source and its subscription.
//!
//! A [`DirectoryChangeSource`] is configured up front and started by
//! [`DirectoryChangeSource::subscribe`], which wires
//! `WatchPoller -> BoundedEventBuffer -> DemandDrivenEmitter` and hands the
//! consumer a [`ChangeSubscription`]. Nothing is delivered until the consumer
//! requests it.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use futures::stream::{self, Stream};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SourceConfig;
use crate::engine::{Delivery, DemandDrivenEmitter, EmitterStats};
use crate::errors::{DirChangesError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::ChangeRecord;
use crate::watch::{NotifyBackend, WatchBackend, WatchPoller};

/// A single-use, single-consumer source of change records for one directory.
///
/// The second call to [`subscribe`](Self::subscribe) on the same instance
/// fails with [`DirChangesError::AlreadyConsumed`]. A failed start does not
/// count as a use.
#[derive(Debug)]
pub struct DirectoryChangeSource {
    config: SourceConfig,
    backend: Arc<dyn WatchBackend>,
    fs: Arc<dyn FileSystem>,
    consumed: AtomicBool,
}

impl DirectoryChangeSource {
    /// Build a source from the three core parameters, using the native
    /// notify backend and the default overflow policy.
    ///
    /// Fails fast with `Configuration` if `poll_interval` is zero or
    /// `max_buffer_size` is zero. The directory itself is only checked when
    /// the source starts.
    pub fn create(
        directory: impl Into<PathBuf>,
        poll_interval: Duration,
        max_buffer_size: usize,
    ) -> Result<Self> {
        let config = SourceConfig::new(directory, poll_interval, max_buffer_size)?;
        Ok(Self::new(config))
    }

    /// Build a source backed by notify and the real filesystem.
    pub fn new(config: SourceConfig) -> Self {
        let backend = Arc::new(NotifyBackend::new(config.backend(), config.poll_interval()));
        Self::with_backend(config, backend, Arc::new(RealFileSystem))
    }

    /// Build a source on an alternative watch primitive and filesystem.
    pub fn with_backend(
        config: SourceConfig,
        backend: Arc<dyn WatchBackend>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            config,
            backend,
            fs,
            consumed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Start watching and return the consumer's handle.
    ///
    /// Must be called from within a Tokio runtime; the poller is spawned on
    /// it. Fails with:
    /// - `AlreadyConsumed` if this source was already started
    /// - `DirectoryNotFound` if the directory is missing or not a directory
    /// - `WatchPrimitive` / `DirectoryUnavailable` if registration fails
    pub fn subscribe(&self) -> Result<ChangeSubscription> {
        if self.consumed.swap(true, Ordering::SeqCst) {
            return Err(DirChangesError::AlreadyConsumed);
        }

        let started = self.start();
        if started.is_err() {
            self.consumed.store(false, Ordering::SeqCst);
        }
        started
    }

    fn start(&self) -> Result<ChangeSubscription> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| DirChangesError::Other(anyhow!("no Tokio runtime to poll on: {e}")))?;

        let dir = self.resolve_directory()?;
        let session = self.backend.open(&dir)?;

        let (emitter, delivery_rx, shutdown_rx) = DemandDrivenEmitter::new(
            self.config.max_buffer_size(),
            self.config.overflow_policy(),
        );

        let poller = WatchPoller::new(
            dir.clone(),
            self.config.poll_interval(),
            session,
            Arc::clone(&self.fs),
            emitter.clone(),
            shutdown_rx,
        );
        let poller_task = runtime.spawn(poller.run());

        info!(
            capacity = self.config.max_buffer_size(),
            policy = ?self.config.overflow_policy(),
            "directory change source started on {:?}",
            dir
        );

        Ok(ChangeSubscription {
            dir,
            emitter,
            delivery_rx,
            poller_task: Some(poller_task),
            terminated: false,
        })
    }

    fn resolve_directory(&self) -> Result<PathBuf> {
        let dir = self.config.directory();
        if !self.fs.is_dir(dir) {
            return Err(DirChangesError::DirectoryNotFound(dir.to_path_buf()));
        }
        self.fs
            .canonicalize(dir)
            .map_err(|_| DirChangesError::DirectoryNotFound(dir.to_path_buf()))
    }
}

/// Consumer handle for a started source.
///
/// Follows a reactive pull protocol: [`request`](Self::request) authorizes
/// more records, [`next`](Self::next) awaits the next one, and
/// [`cancel`](Self::cancel) ends the subscription and releases the watch.
/// The consumer sees further records, or exactly one error, or the end of
/// the subscription; never records after an error.
///
/// Dropping the subscription cancels it.
#[derive(Debug)]
pub struct ChangeSubscription {
    dir: PathBuf,
    emitter: DemandDrivenEmitter,
    delivery_rx: mpsc::UnboundedReceiver<Delivery>,
    poller_task: Option<JoinHandle<()>>,
    terminated: bool,
}

impl ChangeSubscription {
    /// The canonical directory being watched.
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// Authorize `n` more records. `request(0)` does nothing.
    pub fn request(&self, n: u64) {
        if !self.terminated {
            self.emitter.request(n);
        }
    }

    /// Wait for the next delivery.
    ///
    /// Returns `None` once the subscription has been cancelled or has failed.
    /// Without outstanding demand this waits until demand is added from
    /// elsewhere, so callers normally `request` first.
    pub async fn next(&mut self) -> Option<Result<ChangeRecord>> {
        if self.terminated {
            return None;
        }
        let delivery = self.delivery_rx.recv().await;
        self.on_delivery(delivery)
    }

    /// Non-blocking variant of [`next`](Self::next).
    ///
    /// Returns `None` both when nothing is available yet and when the
    /// subscription is over; use [`is_terminated`](Self::is_terminated) to
    /// tell the two apart.
    pub fn try_next(&mut self) -> Option<Result<ChangeRecord>> {
        if self.terminated {
            return None;
        }
        match self.delivery_rx.try_recv() {
            Ok(delivery) => self.on_delivery(Some(delivery)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => self.on_delivery(None),
        }
    }

    /// `request(1)` followed by `next()`.
    pub async fn request_next(&mut self) -> Option<Result<ChangeRecord>> {
        self.request(1);
        self.next().await
    }

    /// Stop delivery and tell the poller to release its watch.
    ///
    /// Records that were already delivered but not yet read are discarded.
    pub fn cancel(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        self.emitter.cancel();
        self.delivery_rx.close();
        while self.delivery_rx.try_recv().is_ok() {}
        debug!("subscription cancelled on {:?}", self.dir);
    }

    /// Wait until the poller has exited and the watch session is released.
    ///
    /// Only meaningful after [`cancel`](Self::cancel) or a terminal failure;
    /// otherwise the poller keeps running.
    pub async fn wait_released(&mut self) {
        if let Some(task) = self.poller_task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "poller task ended abnormally");
            }
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn stats(&self) -> EmitterStats {
        self.emitter.stats()
    }

    /// Adapt into a `Stream` that requests one record each time it is polled.
    pub fn into_stream(self) -> impl Stream<Item = Result<ChangeRecord>> {
        stream::unfold(self, |mut sub| async move {
            let item = sub.request_next().await?;
            Some((item, sub))
        })
    }

    fn on_delivery(&mut self, delivery: Option<Delivery>) -> Option<Result<ChangeRecord>> {
        match delivery {
            Some(Delivery::Next(record)) => Some(Ok(record)),
            Some(Delivery::Failed(err)) => {
                self.terminated = true;
                Some(Err(err))
            }
            None => {
                self.terminated = true;
                None
            }
        }
    }
}

impl Drop for ChangeSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
