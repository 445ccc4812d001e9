// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirChangesError {
    /// Invalid poll interval, buffer capacity or directory setting.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Directory not found: {0:?}")]
    DirectoryNotFound(PathBuf),

    /// The watched directory went away or became inaccessible while watched.
    #[error("Directory unavailable: {0:?}")]
    DirectoryUnavailable(PathBuf),

    #[error("Watch primitive error: {0}")]
    WatchPrimitive(String),

    /// A single entry of the directory could not be inspected, typically
    /// because it vanished between listing and stat. Not terminal.
    #[error("Entry error on {path:?}: {message}")]
    Entry { path: PathBuf, message: String },

    /// A source only supports a single subscription.
    #[error("Source already consumed")]
    AlreadyConsumed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DirChangesError {
    /// Map a notify error raised while watching `dir`.
    ///
    /// An error that names only entries of `dir` becomes `Entry`. Otherwise,
    /// anything that says the watched path is gone becomes
    /// `DirectoryUnavailable` and the rest is a primitive failure.
    pub fn from_notify(dir: impl Into<PathBuf>, err: notify::Error) -> Self {
        let dir = dir.into();
        if !err.paths.contains(&dir) {
            if let Some(entry) = err.paths.first() {
                return DirChangesError::Entry {
                    path: entry.clone(),
                    message: err.to_string(),
                };
            }
        }

        match err.kind {
            notify::ErrorKind::PathNotFound | notify::ErrorKind::WatchNotFound => {
                DirChangesError::DirectoryUnavailable(dir)
            }
            notify::ErrorKind::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound => {
                DirChangesError::DirectoryUnavailable(dir)
            }
            _ => DirChangesError::WatchPrimitive(err.to_string()),
        }
    }

    /// True for errors the poller logs and skips instead of failing the
    /// subscription.
    pub fn is_transient(&self) -> bool {
        matches!(self, DirChangesError::Entry { .. })
    }

    /// True for failures that mean the watched resource is gone.
    pub fn is_directory_gone(&self) -> bool {
        matches!(
            self,
            DirChangesError::DirectoryNotFound(_) | DirChangesError::DirectoryUnavailable(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DirChangesError>;
