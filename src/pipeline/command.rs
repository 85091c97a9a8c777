// src/pipeline/command.rs

use std::path::Path;
use std::process::Stdio;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::{PipelineError, Result};
use crate::pipeline::step::Target;

/// Run an external tool for a command step and wait for it to exit.
///
/// The command is executed via the platform shell from `project_root`, with
/// the project layout exported in its environment:
///
/// - `SITEFORGE_SOURCE_ROOT`
/// - `SITEFORGE_OUTPUT_ROOT`
/// - `SITEFORGE_TARGET` (`develop` or `build`)
///
/// A non-zero exit status is a [`PipelineError::StepFailure`].
pub async fn run_command(
    step_name: &str,
    cmd: &str,
    project_root: &Path,
    source_root: &Path,
    output_root: &Path,
    target: Target,
) -> Result<()> {
    info!(step = %step_name, cmd = %cmd, "starting external tool");

    let mut command = shell_command(cmd);
    command
        .current_dir(project_root)
        .env("SITEFORGE_SOURCE_ROOT", source_root)
        .env("SITEFORGE_OUTPUT_ROOT", output_root)
        .env("SITEFORGE_TARGET", target.as_str())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning process for step '{step_name}'"))?;

    // Consume both pipes so OS buffers never fill; log lines at debug.
    if let Some(stdout) = child.stdout.take() {
        spawn_line_logger(step_name.to_string(), "stdout", stdout);
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_line_logger(step_name.to_string(), "stderr", stderr);
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of step '{step_name}'"))?;

    let code = status.code().unwrap_or(-1);
    info!(
        step = %step_name,
        exit_code = code,
        success = status.success(),
        "external tool exited"
    );

    if status.success() {
        Ok(())
    } else {
        Err(PipelineError::step_failure(
            step_name,
            format!("command exited with status {code}"),
        ))
    }
}

/// Build a shell command appropriate for the platform.
fn shell_command(cmd: &str) -> Command {
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

fn spawn_line_logger(
    step: String,
    stream: &'static str,
    pipe: impl tokio::io::AsyncRead + Unpin + Send + 'static,
) {
    tokio::spawn(async move {
        let reader = BufReader::new(pipe);
        let mut lines = reader.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(step = %step, "{stream}: {line}");
        }
    });
}
