// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `siteforge`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "siteforge",
    version,
    about = "Run declarative build pipelines for static sites, with watch-triggered incremental rebuilds.",
    long_about = None
)]
pub struct CliArgs {
    /// Name of the task to run (e.g. `build`, `develop`).
    #[arg(value_name = "TASK", default_value = "build")]
    pub task: String,

    /// Path to the config file (TOML).
    ///
    /// Default: `Siteforge.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Siteforge.toml")]
    pub config: String,

    /// Run a watch-mode task once and exit instead of entering the watch loop.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEFORGE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print resolved pipelines, but don't execute any steps.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
