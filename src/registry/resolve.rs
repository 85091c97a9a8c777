// src/registry/resolve.rs

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::model::{ConfigFile, StepConfig, TaskConfig};
use crate::errors::{PipelineError, Result};

/// Immutable mapping from names to step configurations and task compositions.
///
/// A task's `steps` entries may name primitive steps or other tasks; the
/// registry expands the latter recursively, depth-first and left-to-right,
/// preserving declaration order. Resolution is pure: it never touches the
/// filesystem and has no side effects.
#[derive(Debug, Clone)]
pub struct TaskRegistry {
    steps: BTreeMap<String, StepConfig>,
    tasks: BTreeMap<String, TaskConfig>,
}

impl TaskRegistry {
    /// Build a registry from a loaded [`ConfigFile`].
    ///
    /// The config is expected to have passed `validate_config`, but `resolve`
    /// still detects unknown names and cycles on its own so the registry is
    /// safe to use with hand-built configs (as the tests do).
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            steps: cfg.step.clone(),
            tasks: cfg.task.clone(),
        }
    }

    /// Configuration of a primitive step, if it exists.
    pub fn step_config(&self, name: &str) -> Option<&StepConfig> {
        self.steps.get(name)
    }

    /// Flatten `name` into its ordered sequence of primitive step names.
    ///
    /// - A primitive step name resolves to itself.
    /// - A task name expands depth-first, left-to-right.
    ///
    /// Errors:
    /// - [`PipelineError::UnknownTask`] if `name` (or anything it references)
    ///   is neither a step nor a task.
    /// - [`PipelineError::CyclicTask`] if expansion revisits a task already on
    ///   the current expansion path; the error carries that path.
    pub fn resolve(&self, name: &str) -> Result<Vec<String>> {
        let mut out = Vec::new();
        let mut path: Vec<String> = Vec::new();
        self.expand(name, &mut path, &mut out)?;
        debug!(task = %name, steps = ?out, "resolved task to primitive steps");
        Ok(out)
    }

    fn expand(&self, name: &str, path: &mut Vec<String>, out: &mut Vec<String>) -> Result<()> {
        if self.steps.contains_key(name) {
            out.push(name.to_string());
            return Ok(());
        }

        let Some(task) = self.tasks.get(name) else {
            return Err(PipelineError::UnknownTask(name.to_string()));
        };

        if path.iter().any(|seen| seen == name) {
            let mut cycle = path.clone();
            cycle.push(name.to_string());
            return Err(PipelineError::CyclicTask { path: cycle });
        }

        path.push(name.to_string());
        for step_ref in task.steps.iter() {
            self.expand(step_ref, path, out)?;
        }
        path.pop();

        Ok(())
    }
}
