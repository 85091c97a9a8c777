// src/alert.rs

//! Notification hook: audible feedback on pipeline success/failure.
//!
//! The hook must fire exactly once per pipeline invocation, and it must never
//! block the pipeline or change its outcome. Alert failures (e.g. a missing
//! audio player) are logged and swallowed.

use std::io::Write;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::pipeline::PipelineOutcome;

/// Alert behaviour selector, from `[project].alert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertMode {
    /// No feedback.
    #[default]
    Silent,
    /// ASCII BEL to the terminal.
    Beep,
    /// Run a configured audio-clip command.
    Clip,
}

/// The configured notification hook.
#[derive(Debug, Clone)]
pub struct Alert {
    mode: AlertMode,
    clip_cmd: Option<String>,
}

impl Alert {
    pub fn new(mode: AlertMode, clip_cmd: Option<String>) -> Self {
        Self { mode, clip_cmd }
    }

    /// A hook that never makes a sound.
    pub fn silent() -> Self {
        Self::new(AlertMode::Silent, None)
    }

    /// Report a pipeline outcome. Never fails, never blocks.
    pub fn notify(&self, outcome: PipelineOutcome) {
        match self.mode {
            AlertMode::Silent => {
                debug!(?outcome, "alert: silent mode, nothing to do");
            }
            AlertMode::Beep => {
                let mut stderr = std::io::stderr();
                // BEL; errors writing to stderr are not worth reporting.
                let _ = stderr.write_all(b"\x07");
                let _ = stderr.flush();
            }
            AlertMode::Clip => {
                let Some(cmd) = self.clip_cmd.clone() else {
                    warn!("alert = \"clip\" but no clip_cmd configured; staying silent");
                    return;
                };
                // Fire-and-forget; the pipeline never waits on this.
                tokio::spawn(async move {
                    let mut command = if cfg!(windows) {
                        let mut c = tokio::process::Command::new("cmd");
                        c.arg("/C").arg(&cmd);
                        c
                    } else {
                        let mut c = tokio::process::Command::new("sh");
                        c.arg("-c").arg(&cmd);
                        c
                    };
                    match command.status().await {
                        Ok(status) if !status.success() => {
                            warn!(%cmd, ?status, "alert clip command failed");
                        }
                        Ok(_) => {}
                        Err(err) => {
                            warn!(%cmd, error = %err, "could not run alert clip command");
                        }
                    }
                });
            }
        }
    }
}
