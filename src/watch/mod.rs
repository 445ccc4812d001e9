// src/watch/mod.rs

//! Directory watching.
//!
//! This module is responsible for:
//! - The watch primitive abstraction (`WatchBackend` / `WatchSession`).
//! - A `notify`-based implementation of that primitive.
//! - Translating raw notify events into typed change records.
//! - The timer-driven poll loop that feeds the emitter.
//!
//! It does **not** know about consumer demand; that lives in
//! [`crate::engine`].

pub mod backend;
pub mod poller;
pub mod translate;
pub mod watcher;

pub use backend::{WatchBackend, WatchSession};
pub use poller::WatchPoller;
pub use translate::{entry_in_dir, translate_batch};
pub use watcher::{NotifyBackend, NotifySession};
