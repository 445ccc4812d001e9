// src/watch/translate.rs

//! Translation from raw notify events into [`ChangeRecord`]s.
//!
//! Only direct entries of the watched directory are reported. Raw events that
//! cannot be classified as a creation, modification or deletion are dropped
//! here rather than surfaced as errors.

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};
use tracing::{trace, warn};

use crate::errors::{DirChangesError, Result};
use crate::fs::FileSystem;
use crate::types::{ChangeKind, ChangeRecord};

/// Translate a batch of raw events, preserving their order.
///
/// Fails with `DirectoryUnavailable` if the batch reports the removal of the
/// watched directory itself.
pub fn translate_batch(
    fs: &dyn FileSystem,
    dir: &Path,
    events: &[Event],
) -> Result<Vec<ChangeRecord>> {
    let mut records = Vec::with_capacity(events.len());
    for event in events {
        translate_event(fs, dir, event, &mut records)?;
    }
    Ok(records)
}

/// Translate a single raw event, appending zero or more records to `out`.
pub fn translate_event(
    fs: &dyn FileSystem,
    dir: &Path,
    event: &Event,
    out: &mut Vec<ChangeRecord>,
) -> Result<()> {
    if event.need_rescan() {
        warn!(?event, "watch primitive requested a rescan; events may have been lost");
        return Ok(());
    }

    if matches!(event.kind, EventKind::Remove(_)) && event.paths.iter().any(|p| p == dir) {
        return Err(DirChangesError::DirectoryUnavailable(dir.to_path_buf()));
    }

    match event.kind {
        EventKind::Create(_) => push_all(fs, dir, &event.paths, ChangeKind::Creation, out),
        EventKind::Remove(_) => push_all(fs, dir, &event.paths, ChangeKind::Deletion, out),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => push_all(fs, dir, &event.paths, ChangeKind::Deletion, out),
            RenameMode::To => push_all(fs, dir, &event.paths, ChangeKind::Creation, out),
            RenameMode::Both => {
                // [old, new]; either side may live outside the directory.
                if let Some(old) = event.paths.first() {
                    push_one(fs, dir, old, ChangeKind::Deletion, out);
                }
                if let Some(new) = event.paths.get(1) {
                    push_one(fs, dir, new, ChangeKind::Creation, out);
                }
            }
            RenameMode::Any | RenameMode::Other => {
                trace!(?event, "dropping unclassifiable rename event");
            }
        },
        EventKind::Modify(_) => push_all(fs, dir, &event.paths, ChangeKind::Modification, out),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => {
            trace!(?event, "dropping unclassifiable event");
        }
    }

    Ok(())
}

fn push_all(
    fs: &dyn FileSystem,
    dir: &Path,
    paths: &[PathBuf],
    kind: ChangeKind,
    out: &mut Vec<ChangeRecord>,
) {
    for path in paths {
        push_one(fs, dir, path, kind, out);
    }
}

fn push_one(
    fs: &dyn FileSystem,
    dir: &Path,
    path: &Path,
    kind: ChangeKind,
    out: &mut Vec<ChangeRecord>,
) {
    match entry_in_dir(fs, dir, path) {
        Some(entry) => out.push(ChangeRecord::new(entry, kind)),
        None => trace!(?path, "dropping event outside the watched directory"),
    }
}

/// Resolve `path` to `dir/<name>` if it is a direct entry of `dir`.
///
/// - First a plain parent comparison.
/// - If that fails (symlinked prefixes such as `/private/var` on macOS), the
///   parent is canonicalized and compared again. The entry itself may no
///   longer exist, so only its parent is resolved.
pub fn entry_in_dir(fs: &dyn FileSystem, dir: &Path, path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?;
    let parent = path.parent()?;

    if parent == dir {
        return Some(dir.join(name));
    }

    match fs.canonicalize(parent) {
        Ok(canon) if canon == dir => Some(dir.join(name)),
        _ => None,
    }
}
