// src/types.rs

//! Value types shared across the crate.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

/// Classification of a single directory-entry change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Creation,
    Modification,
    Deletion,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Creation => "creation",
            ChangeKind::Modification => "modification",
            ChangeKind::Deletion => "deletion",
        };
        f.write_str(s)
    }
}

/// A detected change: which entry, and what happened to it.
///
/// Two records are equal iff both path and kind are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChangeRecord {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl ChangeRecord {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.kind, self.path.display())
    }
}

/// What the event buffer does when a record arrives while it is full.
///
/// - `DropOldest`: evict the head to make room (sliding window, default).
///   Capacity then bounds how stale a delivered record can be.
/// - `RejectNew`: keep the buffered records and discard the newcomer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    DropOldest,
    RejectNew,
}

impl Default for OverflowPolicy {
    fn default() -> Self {
        OverflowPolicy::DropOldest
    }
}

impl FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drop-oldest" | "drop_oldest" => Ok(OverflowPolicy::DropOldest),
            "reject-new" | "reject_new" => Ok(OverflowPolicy::RejectNew),
            other => Err(format!(
                "invalid overflow_policy: {other} (expected \"drop-oldest\" or \"reject-new\")"
            )),
        }
    }
}

/// Which notify watcher implementation backs a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The platform's recommended watcher (inotify, FSEvents, ...).
    Native,
    /// Stat-based polling at the configured poll interval.
    Poll,
}

impl Default for BackendKind {
    fn default() -> Self {
        BackendKind::Native
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "native" => Ok(BackendKind::Native),
            "poll" => Ok(BackendKind::Poll),
            other => Err(format!(
                "invalid backend: {other} (expected \"native\" or \"poll\")"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_compare_by_path_and_kind() {
        let a = ChangeRecord::new("/d/a", ChangeKind::Creation);
        assert_eq!(a, ChangeRecord::new("/d/a", ChangeKind::Creation));
        assert_ne!(a, ChangeRecord::new("/d/a", ChangeKind::Deletion));
        assert_ne!(a, ChangeRecord::new("/d/b", ChangeKind::Creation));
    }

    #[test]
    fn overflow_policy_parses_both_spellings() {
        assert_eq!("drop-oldest".parse(), Ok(OverflowPolicy::DropOldest));
        assert_eq!(" Reject_New ".parse(), Ok(OverflowPolicy::RejectNew));
        assert!("block".parse::<OverflowPolicy>().is_err());
    }

    #[test]
    fn record_display_is_tab_separated() {
        let r = ChangeRecord::new("/d/a.txt", ChangeKind::Modification);
        assert_eq!(r.to_string(), "modification\t/d/a.txt");
    }
}
