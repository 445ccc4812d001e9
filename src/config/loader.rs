// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{RawConfigFile, SourceConfig};
use crate::errors::Result;

/// Load a configuration file and return the raw, unvalidated model.
///
/// Only TOML deserialization happens here. Use [`load_and_validate`] to get
/// a [`SourceConfig`] that is ready to start a source.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate its `[source]` section.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<SourceConfig> {
    let raw = load_from_path(&path)?;
    SourceConfig::try_from(raw.source)
}
