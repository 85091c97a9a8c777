// src/pipeline/step.rs

use std::fmt;

use crate::config::model::{StepConfig, StepKindName, StepOverride};
use crate::errors::{PipelineError, Result};

/// Target variant a pipeline runs against.
///
/// Steps may carry `[step.<name>.develop]` / `[step.<name>.build]` override
/// tables; the target picks which one applies (e.g. source-mapped styles in
/// develop vs minified output in build).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Develop,
    Build,
}

impl Target {
    pub fn as_str(self) -> &'static str {
        match self {
            Target::Develop => "develop",
            Target::Build => "build",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a resolved step actually does.
#[derive(Debug, Clone)]
pub enum StepAction {
    /// Copy matched source files below `output_root/<dest>`.
    Copy { dest: String },
    /// Delete matched files below the output root.
    Clean,
    /// Run an external tool via the shell.
    Command { cmd: String },
}

/// A step configuration with the target's overrides already applied.
#[derive(Debug, Clone)]
pub struct ResolvedStep {
    pub name: String,
    /// Effective source glob patterns (with `!` negation).
    pub src: Vec<String>,
    pub action: StepAction,
}

impl ResolvedStep {
    /// Merge the base step config with the override table for `target`.
    ///
    /// Override fields win when present; otherwise the base value applies.
    pub fn from_config(name: &str, cfg: &StepConfig, target: Target) -> Result<Self> {
        let ov: Option<&StepOverride> = match target {
            Target::Develop => cfg.develop.as_ref(),
            Target::Build => cfg.build.as_ref(),
        };

        let src = ov
            .and_then(|o| o.src.clone())
            .unwrap_or_else(|| cfg.src.clone());
        let dest = ov
            .and_then(|o| o.dest.clone())
            .or_else(|| cfg.dest.clone())
            .unwrap_or_default();
        let cmd = ov.and_then(|o| o.cmd.clone()).or_else(|| cfg.cmd.clone());

        let action = match cfg.kind {
            StepKindName::Copy => StepAction::Copy { dest },
            StepKindName::Clean => StepAction::Clean,
            StepKindName::Command => {
                let cmd = cmd.ok_or_else(|| {
                    PipelineError::Config(format!(
                        "command step '{name}' has no cmd for target '{target}'"
                    ))
                })?;
                StepAction::Command { cmd }
            }
        };

        Ok(Self {
            name: name.to_string(),
            src,
            action,
        })
    }
}
