// src/config/mod.rs

//! Configuration for a directory change source.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate the three source parameters (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{
    RawConfigFile, RawSourceConfig, SourceConfig, DEFAULT_MAX_BUFFER_SIZE,
    DEFAULT_POLL_INTERVAL_MS,
};
