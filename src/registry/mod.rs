// src/registry/mod.rs

//! The task registry: named compositions of steps and other tasks.
//!
//! [`TaskRegistry`] is built once from a loaded config and is immutable
//! afterwards. Its one operation, [`TaskRegistry::resolve`], flattens a task
//! name into the ordered sequence of primitive steps to execute.

pub mod resolve;

pub use resolve::TaskRegistry;
