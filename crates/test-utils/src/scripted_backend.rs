use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use dirchanges::errors::{DirChangesError, Result};
use dirchanges::watch::{WatchBackend, WatchSession};
use notify::Event;

/// One scripted answer to `WatchSession::drain`.
pub enum ScriptedDrain {
    Events(Vec<Event>),
    Fail(DirChangesError),
}

/// A fake watch backend that:
/// - hands out sessions replaying a fixed script of drains (then empty
///   drains forever)
/// - counts how many sessions were opened and how many are still alive
/// - can be told to fail `open` outright.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    script: Arc<Mutex<VecDeque<ScriptedDrain>>>,
    open_error: Arc<Mutex<Option<String>>>,
    opened: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
    drains: Arc<AtomicUsize>,
}

impl std::fmt::Debug for ScriptedDrain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScriptedDrain::Events(events) => write!(f, "Events({})", events.len()),
            ScriptedDrain::Fail(err) => write!(f, "Fail({err})"),
        }
    }
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_events(self, events: Vec<Event>) -> Self {
        self.script.lock().unwrap().push_back(ScriptedDrain::Events(events));
        self
    }

    pub fn then_fail(self, err: DirChangesError) -> Self {
        self.script.lock().unwrap().push_back(ScriptedDrain::Fail(err));
        self
    }

    pub fn fail_open(self, message: &str) -> Self {
        *self.open_error.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn live_sessions(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn drain_calls(&self) -> usize {
        self.drains.load(Ordering::SeqCst)
    }
}

impl WatchBackend for ScriptedBackend {
    fn open(&self, _dir: &Path) -> Result<Box<dyn WatchSession>> {
        if let Some(msg) = self.open_error.lock().unwrap().clone() {
            return Err(DirChangesError::WatchPrimitive(msg));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            backend: self.clone(),
        }))
    }
}

#[derive(Debug)]
struct ScriptedSession {
    backend: ScriptedBackend,
}

impl WatchSession for ScriptedSession {
    fn drain(&mut self) -> Result<Vec<Event>> {
        self.backend.drains.fetch_add(1, Ordering::SeqCst);
        match self.backend.script.lock().unwrap().pop_front() {
            Some(ScriptedDrain::Events(events)) => Ok(events),
            Some(ScriptedDrain::Fail(err)) => Err(err),
            None => Ok(Vec::new()),
        }
    }
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        self.backend.live.fetch_sub(1, Ordering::SeqCst);
    }
}
