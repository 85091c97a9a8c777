// src/config/model.rs

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::alert::AlertMode;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [project]
/// source_root = "src"
/// output_root = "dist"
///
/// [step.copy-html]
/// kind = "copy"
/// src = ["**/*.html", "!includes/**/*.html"]
///
/// [task.build]
/// steps = ["clean-all", "copy-html"]
///
/// [[watch]]
/// files = ["**/*.html"]
/// tasks = ["copy-html"]
/// live_reload = true
/// ```
///
/// The registry and step configurations built from this value are constructed
/// once at startup and immutable thereafter.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Project-wide settings from `[project]`.
    #[serde(default)]
    pub project: ProjectSection,

    /// Optional development-server collaborator from `[server]`.
    #[serde(default)]
    pub server: Option<ServerSection>,

    /// Primitive step configurations from `[step.<name>]`.
    #[serde(default)]
    pub step: BTreeMap<String, StepConfig>,

    /// Task compositions from `[task.<name>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// Watch rules from `[[watch]]`, in declaration order.
    #[serde(default)]
    pub watch: Vec<WatchRule>,
}

/// `[project]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    /// Root of the source tree, relative to the config file's directory.
    #[serde(default = "default_source_root")]
    pub source_root: String,

    /// Root of the regenerable output tree. Steps only ever write below it.
    #[serde(default = "default_output_root")]
    pub output_root: String,

    /// Port handed to the development-server collaborator.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Protocol handed to the development-server collaborator.
    #[serde(default)]
    pub protocol: Protocol,

    /// Alert behaviour on pipeline success/failure.
    #[serde(default)]
    pub alert: AlertMode,

    /// Command run for `alert = "clip"` (e.g. an audio player invocation).
    #[serde(default)]
    pub clip_cmd: Option<String>,

    /// Quiet period after the last matching file event before dispatch.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_source_root() -> String {
    "src".to_string()
}

fn default_output_root() -> String {
    "dist".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_debounce_ms() -> u64 {
    200
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            output_root: default_output_root(),
            port: default_port(),
            protocol: Protocol::default(),
            alert: AlertMode::default(),
            clip_cmd: None,
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Protocol for the development server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => write!(f, "http"),
            Protocol::Https => write!(f, "https"),
        }
    }
}

/// `[server]` section: the external development-server collaborator.
///
/// siteforge never serves files itself; it spawns `cmd` and keeps it alive for
/// the duration of the watch loop, and runs `reload_cmd` after a successful
/// watch-triggered run when the matched rule asked for a live reload.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Long-lived server command (receives PORT / PROTOCOL / OUTPUT_ROOT env).
    pub cmd: String,

    /// Command used to push a reload signal to connected clients.
    #[serde(default)]
    pub reload_cmd: Option<String>,
}

/// Step kind discriminator for `[step.<name>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKindName {
    /// Copy glob-matched files from the source root into the output root.
    Copy,
    /// Delete glob-matched files below the output root. The only step kind
    /// permitted to delete anything.
    Clean,
    /// Delegate to an external tool (compile, bundle, minify, ...).
    Command,
}

/// `[step.<name>]` section.
///
/// Unknown fields are rejected at parse time: a typo in a step option is a
/// configuration error, not something to silently ignore.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
    pub kind: StepKindName,

    /// Source glob patterns, relative to the source root (`copy`, `command`)
    /// or the output root (`clean`). A leading `!` negates a pattern.
    #[serde(default)]
    pub src: Vec<String>,

    /// Destination subdirectory below the output root (`copy` only).
    #[serde(default)]
    pub dest: Option<String>,

    /// Shell command for `kind = "command"` steps.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Overrides applied when running the `develop` target variant.
    #[serde(default)]
    pub develop: Option<StepOverride>,

    /// Overrides applied when running the `build` target variant.
    #[serde(default)]
    pub build: Option<StepOverride>,
}

/// Per-target overrides for a step (`[step.<name>.develop]` / `.build`).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct StepOverride {
    #[serde(default)]
    pub src: Option<Vec<String>>,

    #[serde(default)]
    pub dest: Option<String>,

    #[serde(default)]
    pub cmd: Option<String>,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// Ordered references to primitive steps or other tasks (aliasing).
    pub steps: Vec<String>,

    /// Marks this task as a watch-mode entry point: after the initial run it
    /// starts the development server and the watch loop, and step failures
    /// no longer terminate the process.
    #[serde(default)]
    pub watch: bool,
}

/// One `[[watch]]` rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchRule {
    /// Glob patterns (relative to the source root) this rule listens on.
    /// A leading `!` negates a pattern.
    pub files: Vec<String>,

    /// Tasks (or primitive steps) to run when a matching path changes,
    /// in this order.
    pub tasks: Vec<String>,

    /// Inform the reload collaborator after a successful run.
    #[serde(default)]
    pub live_reload: bool,
}
