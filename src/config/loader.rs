// src/config/loader.rs

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::model::ConfigFile;
use crate::config::validate::validate_config;

/// Load a configuration file from a given path and return the raw `ConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (reference checks, cycles, globs). Use [`load_and_validate`]
/// for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading config file at {:?}", path))?;

    load_from_str(&contents).with_context(|| format!("parsing TOML config from {:?}", path))
}

/// Parse a configuration from an in-memory TOML string.
pub fn load_from_str(contents: &str) -> Result<ConfigFile> {
    let config: ConfigFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load a configuration file from path and run semantic validation.
///
/// This is the entry point the rest of the application should use:
///
/// - Reads TOML, applying defaults via `serde` + `Default` impls.
/// - Checks that task/step references exist, the alias graph is acyclic,
///   glob patterns compile, and per-kind required fields are present.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let config = load_from_path(&path)?;
    validate_config(&config)?;
    Ok(config)
}
