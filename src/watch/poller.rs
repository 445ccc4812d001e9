// src/watch/poller.rs

//! Timer-driven poll loop for a single watch session.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

use crate::engine::DemandDrivenEmitter;
use crate::errors::{DirChangesError, Result};
use crate::fs::FileSystem;
use crate::watch::backend::WatchSession;
use crate::watch::translate::translate_batch;

/// Polls a [`WatchSession`] at a fixed interval and pushes translated
/// records into the emitter.
///
/// The poller owns the session: whichever way the loop ends (cancellation,
/// terminal failure, emitter gone) the session is dropped on the way out,
/// which releases the OS registration.
#[derive(Debug)]
pub struct WatchPoller {
    dir: PathBuf,
    poll_interval: Duration,
    session: Box<dyn WatchSession>,
    fs: Arc<dyn FileSystem>,
    emitter: DemandDrivenEmitter,
    shutdown_rx: watch::Receiver<bool>,
}

impl WatchPoller {
    pub fn new(
        dir: PathBuf,
        poll_interval: Duration,
        session: Box<dyn WatchSession>,
        fs: Arc<dyn FileSystem>,
        emitter: DemandDrivenEmitter,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            dir,
            poll_interval,
            session,
            fs,
            emitter,
            shutdown_rx,
        }
    }

    /// Main poll loop.
    ///
    /// - Waits for the next tick or a shutdown signal, whichever comes first.
    /// - Drains the session, checks the directory, translates, pushes.
    /// - Terminal errors are handed to the emitter, which fails the consumer.
    pub async fn run(mut self) {
        info!(interval = ?self.poll_interval, "poller started on {:?}", self.dir);

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        debug!("poller observed shutdown signal");
                        break;
                    }
                    continue;
                }
            }

            match self.poll_once() {
                Ok(true) => {}
                Ok(false) => {
                    debug!("emitter no longer active; stopping poller");
                    break;
                }
                Err(err) => {
                    error!(error = %err, "terminal watch failure on {:?}", self.dir);
                    self.emitter.fail(err);
                    break;
                }
            }
        }

        info!("poller stopped on {:?}; releasing watch", self.dir);
        // `self.session` drops here.
    }

    /// Run a single poll tick.
    ///
    /// Returns `Ok(false)` once the emitter has been cancelled and polling
    /// should stop. A tick without new events is a no-op, and so is one
    /// whose drain failed on a single entry.
    pub fn poll_once(&mut self) -> Result<bool> {
        let raw = match self.session.drain() {
            Ok(raw) => raw,
            Err(err) if err.is_transient() => {
                warn!(error = %err, "entry-level watch error; retrying next tick");
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        if !self.fs.is_dir(&self.dir) {
            return Err(DirChangesError::DirectoryUnavailable(self.dir.clone()));
        }

        let records = translate_batch(self.fs.as_ref(), &self.dir, &raw)?;
        if records.is_empty() {
            trace!(raw = raw.len(), "poll tick produced no records");
            return Ok(self.emitter.is_active());
        }

        debug!(raw = raw.len(), records = records.len(), "poll tick produced records");
        Ok(self.emitter.push(records))
    }
}
