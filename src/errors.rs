// src/errors.rs

//! Crate-wide error taxonomy.
//!
//! Task resolution and step execution report structured errors so callers can
//! distinguish "you asked for something that does not exist" from "a step's
//! underlying operation failed". `anyhow` is still used at the binary
//! boundary and inside loaders for context-rich wrapping.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("unknown task or step '{0}'")]
    UnknownTask(String),

    #[error("cyclic task composition: {}", path.join(" -> "))]
    CyclicTask { path: Vec<String> },

    #[error("step '{step}' failed: {reason}")]
    StepFailure { step: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    /// Wrap an arbitrary failure as a `StepFailure` attributed to `step`.
    pub fn step_failure(step: impl Into<String>, reason: impl ToString) -> Self {
        PipelineError::StepFailure {
            step: step.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
