// src/pipeline/mod.rs

//! Step execution.
//!
//! This module turns step configurations into filesystem effects:
//! - [`step`] selects the effective per-target step variant.
//! - [`copy`] / [`clean`] implement the built-in file steps.
//! - [`command`] delegates transform/bundle/minify work to external tools.
//! - [`stamp`] keeps input-content hashes so unchanged command steps are
//!   skipped on incremental rebuilds.
//! - [`runner`] executes a resolved task strictly in order, fail-fast.
//!
//! Steps only ever write below the configured output root; `clean` is the
//! only step kind that deletes, and only there.

pub mod clean;
pub mod command;
pub mod copy;
pub mod runner;
pub mod stamp;
pub mod step;
pub mod walk;

pub use runner::{PipelineDriver, PipelineOutcome, PipelineReport, PipelineRunner, ProjectPaths};
pub use step::{ResolvedStep, StepAction, Target};
