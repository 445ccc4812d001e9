// src/watch/backend.rs

//! Pluggable watch primitive abstraction.
//!
//! The poller talks to a `WatchBackend` instead of a concrete notify watcher.
//! This keeps the production primitive in [`super::watcher`] while tests can
//! swap in an in-memory filesystem (`fs::mock::MockFileSystem`) or a scripted
//! backend that fails on demand.

use std::fmt::Debug;
use std::path::Path;

use notify::Event;
use tracing::warn;

use crate::errors::{DirChangesError, Result};

/// Something that can register a directory for change notifications.
pub trait WatchBackend: Send + Sync + Debug {
    /// Register a non-recursive watch on `dir`.
    ///
    /// The returned session owns the registration; dropping it releases the
    /// underlying OS watch.
    fn open(&self, dir: &Path) -> Result<Box<dyn WatchSession>>;
}

/// A live watch registration on a single directory.
pub trait WatchSession: Send + Debug {
    /// Return every raw event that arrived since the previous call, in the
    /// order the primitive reported them. Never blocks; an empty vector means
    /// nothing happened.
    ///
    /// An error means the registration is unusable and the session should be
    /// torn down, unless [`DirChangesError::is_transient`] says it only
    /// concerns a single entry.
    fn drain(&mut self) -> Result<Vec<Event>>;
}

/// Append one raw primitive result to `events`.
///
/// Entry-level errors are logged and skipped so the events around them are
/// kept; an error about `dir` itself is returned.
pub(crate) fn absorb_raw(
    dir: &Path,
    raw: notify::Result<Event>,
    events: &mut Vec<Event>,
) -> Result<()> {
    match raw {
        Ok(event) => events.push(event),
        Err(err) => {
            let err = DirChangesError::from_notify(dir, err);
            if !err.is_transient() {
                return Err(err);
            }
            warn!(error = %err, "skipping entry-level watch error");
        }
    }
    Ok(())
}
