// src/pipeline/runner.rs

use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::model::ProjectSection;
use crate::errors::{PipelineError, Result};
use crate::pipeline::clean::run_clean;
use crate::pipeline::command::run_command;
use crate::pipeline::copy::run_copy;
use crate::pipeline::stamp::{StampStore, compute_hash_for_paths};
use crate::pipeline::step::{ResolvedStep, StepAction, Target};
use crate::pipeline::walk::walk_files;
use crate::registry::TaskRegistry;
use crate::watch::patterns::PatternSet;

/// Filesystem layout of the project, derived from the config file location.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    /// Directory containing the config file; commands run from here.
    pub root: PathBuf,
    /// Source tree; steps only read from it.
    pub source_root: PathBuf,
    /// Regenerable output tree; steps only write (and clean) below it.
    pub output_root: PathBuf,
}

impl ProjectPaths {
    pub fn from_config(root: impl Into<PathBuf>, project: &ProjectSection) -> Self {
        let root = root.into();
        let source_root = root.join(&project.source_root);
        let output_root = root.join(&project.output_root);
        Self {
            root,
            source_root,
            output_root,
        }
    }
}

/// Terminal outcome of one pipeline invocation, as seen by the alert hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    Success,
    Failed,
}

/// Summary of a completed (successful) task run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub task: String,
    /// Steps that did work.
    pub steps_run: usize,
    /// Steps skipped because their inputs were unchanged.
    pub steps_skipped: usize,
}

/// Seam between the watch dispatcher and step execution, so tests can
/// substitute a recording fake for the real runner.
pub trait PipelineDriver {
    fn run_task(
        &mut self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<PipelineReport>> + Send;
}

/// Executes resolved tasks strictly in order, fail-fast.
///
/// Each step receives only its own configuration; steps share no mutable
/// state. The first failing step aborts the run and no later step executes.
pub struct PipelineRunner {
    registry: TaskRegistry,
    paths: ProjectPaths,
    target: Target,
    stamps: StampStore,
}

impl PipelineRunner {
    pub fn new(registry: TaskRegistry, paths: ProjectPaths, target: Target) -> Self {
        let stamps = StampStore::for_output_root(&paths.output_root);
        Self {
            registry,
            paths,
            target,
            stamps,
        }
    }

    /// Resolve `name` and execute its primitive steps in order.
    ///
    /// Resolution errors (`UnknownTask`, `CyclicTask`) and the first
    /// `StepFailure` all surface as `Err`; callers decide whether that ends
    /// the process (build) or just this run (watch loop).
    pub async fn run_task(&mut self, name: &str) -> Result<PipelineReport> {
        let steps = self.registry.resolve(name)?;
        info!(task = %name, target = %self.target, steps = ?steps, "running pipeline");

        let mut report = PipelineReport {
            task: name.to_string(),
            steps_run: 0,
            steps_skipped: 0,
        };

        for step_name in steps.iter() {
            match self.run_step(step_name).await? {
                StepRun::Ran => report.steps_run += 1,
                StepRun::Skipped => report.steps_skipped += 1,
            }
        }

        info!(
            task = %name,
            steps_run = report.steps_run,
            steps_skipped = report.steps_skipped,
            "pipeline finished"
        );
        Ok(report)
    }

    async fn run_step(&mut self, step_name: &str) -> Result<StepRun> {
        let cfg = self
            .registry
            .step_config(step_name)
            .ok_or_else(|| PipelineError::UnknownTask(step_name.to_string()))?;
        let step = ResolvedStep::from_config(step_name, cfg, self.target)?;

        let patterns = PatternSet::compile(&step.src)
            .map_err(|e| PipelineError::step_failure(step_name, format!("{e:#}")))?;

        match &step.action {
            StepAction::Copy { dest } => {
                debug!(step = %step.name, dest = %dest, "copy step");
                run_copy(&self.paths.source_root, &self.paths.output_root, dest, &patterns)
                    .map_err(|e| PipelineError::step_failure(&step.name, format!("{e:#}")))?;
                Ok(StepRun::Ran)
            }
            StepAction::Clean => {
                debug!(step = %step.name, "clean step");
                run_clean(&self.paths.output_root, &patterns)
                    .map_err(|e| PipelineError::step_failure(&step.name, format!("{e:#}")))?;
                Ok(StepRun::Ran)
            }
            StepAction::Command { cmd } => {
                if self.command_inputs_unchanged(&step, &patterns)? {
                    info!(step = %step.name, "inputs unchanged since last success; skipping");
                    return Ok(StepRun::Skipped);
                }

                run_command(
                    &step.name,
                    cmd,
                    &self.paths.root,
                    &self.paths.source_root,
                    &self.paths.output_root,
                    self.target,
                )
                .await?;

                self.record_command_inputs(&step, &patterns)?;
                Ok(StepRun::Ran)
            }
        }
    }

    /// True if this command step declared `src` patterns and their current
    /// aggregate hash matches the stamp from the last successful run.
    fn command_inputs_unchanged(&self, step: &ResolvedStep, patterns: &PatternSet) -> Result<bool> {
        if step.src.is_empty() {
            // No declared inputs: always run.
            return Ok(false);
        }

        let hash = self.hash_inputs(patterns)?;
        let stored = self
            .stamps
            .load(&self.stamp_key(&step.name))
            .map_err(|e| PipelineError::step_failure(&step.name, format!("{e:#}")))?;

        Ok(stored.as_deref() == Some(hash.as_str()))
    }

    fn record_command_inputs(&self, step: &ResolvedStep, patterns: &PatternSet) -> Result<()> {
        if step.src.is_empty() {
            return Ok(());
        }
        let hash = self.hash_inputs(patterns)?;
        self.stamps
            .save(&self.stamp_key(&step.name), &hash)
            .map_err(|e| PipelineError::step_failure(&step.name, format!("{e:#}")))?;
        Ok(())
    }

    fn hash_inputs(&self, patterns: &PatternSet) -> Result<String> {
        let inputs: Vec<_> = walk_files(&self.paths.source_root)
            .map_err(PipelineError::Other)?
            .into_iter()
            .filter(|f| patterns.matches(&f.rel))
            .map(|f| f.abs)
            .collect();
        compute_hash_for_paths(inputs).map_err(PipelineError::Other)
    }

    fn stamp_key(&self, step: &str) -> String {
        format!("{}@{}", step, self.target)
    }
}

impl PipelineDriver for PipelineRunner {
    fn run_task(
        &mut self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<PipelineReport>> + Send {
        PipelineRunner::run_task(self, name)
    }
}

enum StepRun {
    Ran,
    Skipped,
}
