// src/config/mod.rs

//! Configuration loading and validation for siteforge.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk or from a string (`loader.rs`).
//! - Validate references, alias-graph acyclicity and globs (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_from_str};
pub use model::{
    ConfigFile, ProjectSection, Protocol, ServerSection, StepConfig, StepKindName, StepOverride,
    TaskConfig, WatchRule,
};
pub use validate::validate_config;
