// src/fs/mock.rs

//! In-memory filesystem with a built-in watch primitive.
//!
//! Every mutation made through [`MockFileSystem`] is recorded as a raw
//! `notify::Event` on the sessions watching the affected directory, in the
//! order the mutations happened. Events only become visible to a source when
//! its poller drains the session, just like a polled OS primitive.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use anyhow::{anyhow, bail, Result};
use notify::event::{CreateKind, DataChange, ModifyKind, RemoveKind};
use notify::{Event, EventKind};

use super::FileSystem;
use crate::errors::{DirChangesError, Result as WatchResult};
use crate::watch::backend::absorb_raw;
use crate::watch::{WatchBackend, WatchSession};

type EventQueue = Arc<Mutex<VecDeque<notify::Result<Event>>>>;

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir,
}

#[derive(Debug)]
struct MockWatch {
    id: u64,
    dir: PathBuf,
    queue: EventQueue,
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    watches: Vec<MockWatch>,
    next_watch_id: u64,
}

impl MockState {
    /// Queue `event` on every session watching `dir`.
    fn notify_dir(&self, dir: &Path, event: &Event) {
        for watch in self.watches.iter().filter(|w| w.dir == dir) {
            lock(&watch.queue).push_back(Ok(event.clone()));
        }
    }

    fn notify_parent(&self, path: &Path, event: Event) {
        if let Some(parent) = path.parent() {
            self.notify_dir(parent, &event.add_path(path.to_path_buf()));
        }
    }

    fn require_parent_dir(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow!("path has no parent: {:?}", path))?;
        match self.entries.get(parent) {
            Some(MockEntry::Dir) => Ok(()),
            Some(MockEntry::File(_)) => bail!("parent is a file: {:?}", parent),
            None => bail!("parent directory not found: {:?}", parent),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFileSystem {
    /// Create an empty filesystem containing only the root directory `/`.
    pub fn new() -> Self {
        let mut state = MockState::default();
        state.entries.insert(PathBuf::from("/"), MockEntry::Dir);
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn create_dir(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref().to_path_buf();
        let mut state = lock(&self.state);
        state.require_parent_dir(&path)?;
        if state.entries.contains_key(&path) {
            bail!("already exists: {:?}", path);
        }
        state.entries.insert(path.clone(), MockEntry::Dir);
        state.notify_parent(&path, Event::new(EventKind::Create(CreateKind::Folder)));
        Ok(path)
    }

    pub fn create_file(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref().to_path_buf();
        let mut state = lock(&self.state);
        state.require_parent_dir(&path)?;
        if state.entries.contains_key(&path) {
            bail!("already exists: {:?}", path);
        }
        state.entries.insert(path.clone(), MockEntry::File(Vec::new()));
        state.notify_parent(&path, Event::new(EventKind::Create(CreateKind::File)));
        Ok(path)
    }

    /// Replace the contents of a file, creating it first if needed.
    pub fn write(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> Result<()> {
        let path = path.as_ref().to_path_buf();
        let mut state = lock(&self.state);
        state.require_parent_dir(&path)?;
        match state.entries.get(&path) {
            Some(MockEntry::Dir) => bail!("is a directory: {:?}", path),
            Some(MockEntry::File(_)) => {}
            None => {
                state.notify_parent(&path, Event::new(EventKind::Create(CreateKind::File)));
            }
        }
        state.entries.insert(path.clone(), MockEntry::File(contents.into()));
        state.notify_parent(
            &path,
            Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content))),
        );
        Ok(())
    }

    pub fn read(&self, path: impl AsRef<Path>) -> Result<Vec<u8>> {
        let path = path.as_ref();
        match lock(&self.state).entries.get(path) {
            Some(MockEntry::File(content)) => Ok(content.clone()),
            Some(MockEntry::Dir) => Err(anyhow!("is a directory: {:?}", path)),
            None => Err(anyhow!("file not found: {:?}", path)),
        }
    }

    /// Delete a file or an empty directory.
    ///
    /// Deleting a directory also tells sessions watching that directory
    /// that it is gone.
    pub fn delete(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref().to_path_buf();
        let mut state = lock(&self.state);
        let kind = match state.entries.get(&path) {
            Some(MockEntry::File(_)) => RemoveKind::File,
            Some(MockEntry::Dir) => {
                if state.entries.keys().any(|p| p.parent() == Some(path.as_path())) {
                    bail!("directory not empty: {:?}", path);
                }
                RemoveKind::Folder
            }
            None => bail!("not found: {:?}", path),
        };
        state.entries.remove(&path);
        state.notify_parent(&path, Event::new(EventKind::Remove(kind)));
        if kind == RemoveKind::Folder {
            let own = Event::new(EventKind::Remove(kind)).add_path(path.clone());
            state.notify_dir(&path, &own);
        }
        Ok(())
    }

    /// Queue an arbitrary raw event (or primitive error) for sessions
    /// watching `dir`, bypassing the entry table.
    pub fn inject(&self, dir: impl AsRef<Path>, raw: notify::Result<Event>) {
        let state = lock(&self.state);
        let dir = dir.as_ref();
        for watch in state.watches.iter().filter(|w| w.dir == dir) {
            lock(&watch.queue).push_back(clone_raw(&raw));
        }
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        lock(&self.state).entries.contains_key(path.as_ref())
    }

    /// Number of sessions currently registered.
    pub fn active_watches(&self) -> usize {
        lock(&self.state).watches.len()
    }
}

fn clone_raw(raw: &notify::Result<Event>) -> notify::Result<Event> {
    let err = match raw {
        Ok(event) => return Ok(event.clone()),
        Err(err) => err,
    };
    let kind = match &err.kind {
        notify::ErrorKind::Generic(msg) => notify::ErrorKind::Generic(msg.clone()),
        notify::ErrorKind::Io(io) => {
            notify::ErrorKind::Io(std::io::Error::new(io.kind(), io.to_string()))
        }
        notify::ErrorKind::PathNotFound => notify::ErrorKind::PathNotFound,
        notify::ErrorKind::WatchNotFound => notify::ErrorKind::WatchNotFound,
        notify::ErrorKind::InvalidConfig(cfg) => notify::ErrorKind::InvalidConfig(*cfg),
        notify::ErrorKind::MaxFilesWatch => notify::ErrorKind::MaxFilesWatch,
    };
    let mut cloned = notify::Error::new(kind);
    cloned.paths = err.paths.clone();
    Err(cloned)
}

impl FileSystem for MockFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        matches!(lock(&self.state).entries.get(path), Some(MockEntry::Dir))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        // Mock paths are already absolute and free of symlinks.
        if self.exists(path) {
            Ok(path.to_path_buf())
        } else {
            Err(anyhow!("not found: {:?}", path))
        }
    }
}

impl WatchBackend for MockFileSystem {
    fn open(&self, dir: &Path) -> WatchResult<Box<dyn WatchSession>> {
        let mut state = lock(&self.state);
        if !matches!(state.entries.get(dir), Some(MockEntry::Dir)) {
            return Err(DirChangesError::DirectoryNotFound(dir.to_path_buf()));
        }

        let id = state.next_watch_id;
        state.next_watch_id += 1;
        let queue: EventQueue = Arc::new(Mutex::new(VecDeque::new()));
        state.watches.push(MockWatch {
            id,
            dir: dir.to_path_buf(),
            queue: Arc::clone(&queue),
        });

        Ok(Box::new(MockWatchSession {
            id,
            dir: dir.to_path_buf(),
            queue,
            state: Arc::downgrade(&self.state),
        }))
    }
}

/// Session handed out by [`MockFileSystem`]; unregisters itself on drop.
#[derive(Debug)]
pub struct MockWatchSession {
    id: u64,
    dir: PathBuf,
    queue: EventQueue,
    state: Weak<Mutex<MockState>>,
}

impl WatchSession for MockWatchSession {
    fn drain(&mut self) -> WatchResult<Vec<Event>> {
        let mut queue = lock(&self.queue);
        let mut events = Vec::with_capacity(queue.len());
        while let Some(raw) = queue.pop_front() {
            absorb_raw(&self.dir, raw, &mut events)?;
        }
        Ok(events)
    }
}

impl Drop for MockWatchSession {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            lock(&state).watches.retain(|w| w.id != self.id);
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
