// src/server.rs

//! The development-server collaborator.
//!
//! siteforge never serves files or speaks a live-reload protocol itself.
//! The server is an external process given the output tree, port and
//! protocol; reload signalling goes through the narrow [`ReloadSink`]
//! interface, so anything from a `curl` against a livereload endpoint to a
//! no-op can stand on the other side.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::config::model::{ProjectSection, ServerSection};

/// Reload-notification collaborator: informed after a successful
/// watch-triggered run when a matched rule asked for a live reload.
pub trait ReloadSink {
    fn notify_reload(&self);
}

/// Sink used when no `[server].reload_cmd` is configured.
#[derive(Debug, Clone, Default)]
pub struct NullReload;

impl ReloadSink for NullReload {
    fn notify_reload(&self) {
        debug!("no reload collaborator configured; reload signal dropped");
    }
}

/// Sink that pushes the reload signal by running an external command.
#[derive(Debug, Clone)]
pub struct CommandReload {
    cmd: String,
}

impl CommandReload {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self { cmd: cmd.into() }
    }
}

impl ReloadSink for CommandReload {
    fn notify_reload(&self) {
        let cmd = self.cmd.clone();
        info!(%cmd, "notifying reload collaborator");
        // Fire-and-forget: reload is advisory and must never stall dispatch.
        tokio::spawn(async move {
            match shell(&cmd).status().await {
                Ok(status) if !status.success() => {
                    warn!(%cmd, ?status, "reload command failed");
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(%cmd, error = %err, "could not run reload command");
                }
            }
        });
    }
}

/// Build the reload sink for a config: command-backed when configured,
/// otherwise the null sink.
pub fn reload_sink(server: Option<&ServerSection>) -> Box<dyn ReloadSink + Send + Sync> {
    match server.and_then(|s| s.reload_cmd.clone()) {
        Some(cmd) => Box::new(CommandReload::new(cmd)),
        None => Box::new(NullReload),
    }
}

/// Handle keeping the external dev-server process alive. Dropping it kills
/// the server.
#[derive(Debug)]
pub struct ServerHandle {
    _child: Child,
}

/// Spawn the configured development server.
///
/// The collaborator receives the serving contract via its environment:
/// `SITEFORGE_PORT`, `SITEFORGE_PROTOCOL` and `SITEFORGE_OUTPUT_ROOT`.
pub fn spawn_server(
    server: &ServerSection,
    project: &ProjectSection,
    output_root: &Path,
) -> Result<ServerHandle> {
    let mut command = shell(&server.cmd);
    command
        .env("SITEFORGE_PORT", project.port.to_string())
        .env("SITEFORGE_PROTOCOL", project.protocol.to_string())
        .env("SITEFORGE_OUTPUT_ROOT", output_root)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let child = command
        .spawn()
        .with_context(|| format!("spawning development server: {}", server.cmd))?;

    info!(
        cmd = %server.cmd,
        port = project.port,
        protocol = %project.protocol,
        "development server started"
    );

    Ok(ServerHandle { _child: child })
}

fn shell(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}
