// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info};

use crate::errors::{DirChangesError, Result};
use crate::types::BackendKind;
use crate::watch::backend::{absorb_raw, WatchBackend, WatchSession};

/// Watch backend built on `notify`.
///
/// `BackendKind::Native` uses the platform's recommended watcher;
/// `BackendKind::Poll` uses notify's stat-based `PollWatcher`, scanning at the
/// source's poll interval and comparing file contents so that same-size,
/// same-mtime writes are still reported.
#[derive(Debug, Clone)]
pub struct NotifyBackend {
    kind: BackendKind,
    poll_interval: Duration,
}

impl NotifyBackend {
    pub fn new(kind: BackendKind, poll_interval: Duration) -> Self {
        Self {
            kind,
            poll_interval,
        }
    }
}

impl WatchBackend for NotifyBackend {
    fn open(&self, dir: &Path) -> Result<Box<dyn WatchSession>> {
        // Channel from the notify callback thread into the poller.
        let (event_tx, event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();

        // Closure called synchronously by notify whenever an event arrives.
        // A send error only means the session was dropped in the meantime.
        let handler = move |res: notify::Result<Event>| {
            let _ = event_tx.send(res);
        };

        let mut watcher: Box<dyn Watcher + Send> = match self.kind {
            BackendKind::Native => Box::new(
                RecommendedWatcher::new(handler, Config::default())
                    .map_err(|e| DirChangesError::from_notify(dir, e))?,
            ),
            BackendKind::Poll => Box::new(
                PollWatcher::new(
                    handler,
                    Config::default()
                        .with_poll_interval(self.poll_interval)
                        .with_compare_contents(true),
                )
                .map_err(|e| DirChangesError::from_notify(dir, e))?,
            ),
        };

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| DirChangesError::from_notify(dir, e))?;

        info!(backend = ?self.kind, "watch registered on {:?}", dir);

        Ok(Box::new(NotifySession {
            dir: dir.to_path_buf(),
            watcher,
            event_rx,
        }))
    }
}

/// Session handle for a notify watcher.
///
/// Keeps the watcher alive for as long as the session exists; dropping the
/// session unregisters the directory and stops the notify thread.
pub struct NotifySession {
    dir: PathBuf,
    watcher: Box<dyn Watcher + Send>,
    event_rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
}

impl std::fmt::Debug for NotifySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifySession")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

impl WatchSession for NotifySession {
    fn drain(&mut self) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        loop {
            match self.event_rx.try_recv() {
                Ok(raw) => absorb_raw(&self.dir, raw, &mut events)?,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    return Err(DirChangesError::WatchPrimitive(
                        "notify event channel closed".to_string(),
                    ));
                }
            }
        }
        Ok(events)
    }
}

impl Drop for NotifySession {
    fn drop(&mut self) {
        // Fails when the directory is already gone; the watcher itself is
        // dropped right after either way.
        if let Err(err) = self.watcher.unwatch(&self.dir) {
            debug!(error = %err, "unwatch failed for {:?}", self.dir);
        }
        debug!("watch released on {:?}", self.dir);
    }
}
