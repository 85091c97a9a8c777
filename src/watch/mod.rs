// src/watch/mod.rs

//! File watching and debounced dispatch.
//!
//! - [`patterns`] compiles `!`-aware glob lists for steps and watch rules.
//! - [`watcher`] wires up a cross-platform filesystem watcher (`notify`) and
//!   forwards source-root-relative paths into an async channel.
//! - [`dispatcher`] is the two-state debounce machine that turns bursts of
//!   file events into exactly one serialized pipeline dispatch per quiet
//!   period.
//!
//! Nothing in here knows how steps execute; dispatch goes through the
//! [`crate::pipeline::PipelineDriver`] seam.

pub mod dispatcher;
pub mod patterns;
pub mod watcher;

pub use dispatcher::{Dispatcher, WatchEvent};
pub use patterns::{PatternSet, RuleProfile, build_rule_profiles};
pub use watcher::{WatcherHandle, spawn_watcher};
