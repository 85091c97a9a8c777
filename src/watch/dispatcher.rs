// src/watch/dispatcher.rs

use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info};

use crate::alert::Alert;
use crate::pipeline::{PipelineDriver, PipelineOutcome};
use crate::server::ReloadSink;
use crate::watch::patterns::RuleProfile;

/// Events consumed by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A file below the source root changed; path is source-root-relative
    /// with forward slashes.
    PathChanged(String),
    /// Graceful shutdown request (e.g. Ctrl-C).
    Shutdown,
}

/// Debounced watch dispatcher.
///
/// Two states:
/// - **Idle**: no rule has matched; block on the event channel.
/// - **Debouncing**: at least one rule matched; wait until the window
///   deadline. Every further *matching* event within the window pushes the
///   deadline back (coalescing), so N rapid events produce exactly one
///   dispatch. Events that match no rule leave the deadline alone, so
///   churn in unwatched files cannot postpone a pending dispatch.
///
/// When the window elapses, matched rules dispatch in registration order,
/// each rule's task list in declared order, concatenated; every task run
/// completes before the next starts. A failed run is reported through the
/// alert hook and logged, and the loop keeps watching; work already
/// dispatched is never preempted by new events.
pub struct Dispatcher<D: PipelineDriver> {
    profiles: Vec<RuleProfile>,
    debounce: Duration,
    driver: D,
    alert: Alert,
    reload: Box<dyn ReloadSink + Send + Sync>,
    events_rx: mpsc::Receiver<WatchEvent>,
}

impl<D: PipelineDriver> Dispatcher<D> {
    pub fn new(
        profiles: Vec<RuleProfile>,
        debounce: Duration,
        driver: D,
        alert: Alert,
        reload: Box<dyn ReloadSink + Send + Sync>,
        events_rx: mpsc::Receiver<WatchEvent>,
    ) -> Self {
        Self {
            profiles,
            debounce,
            driver,
            alert,
            reload,
            events_rx,
        }
    }

    /// Run the watch loop until the channel closes or shutdown is requested.
    pub async fn run(mut self) -> Result<()> {
        info!(
            rules = self.profiles.len(),
            debounce_ms = self.debounce.as_millis() as u64,
            "watch dispatcher started"
        );

        // Indices of matched rules accumulated during the current window,
        // and the window's deadline while debouncing.
        let mut matched: BTreeSet<usize> = BTreeSet::new();
        let mut deadline: Option<Instant> = None;

        loop {
            let event = match deadline {
                // Idle: block until something happens.
                None => self.events_rx.recv().await,
                // Debouncing: wait for the next event or the deadline,
                // whichever comes first.
                Some(at) => {
                    tokio::select! {
                        ev = self.events_rx.recv() => ev,
                        _ = sleep_until(at) => {
                            deadline = None;
                            self.dispatch(&mut matched).await;
                            continue;
                        }
                    }
                }
            };

            let Some(event) = event else {
                if !matched.is_empty() {
                    self.dispatch(&mut matched).await;
                }
                break;
            };

            match event {
                WatchEvent::PathChanged(path) => {
                    // Only matching events push the deadline back.
                    if self.note_path(&path, &mut matched) {
                        deadline = Some(Instant::now() + self.debounce);
                    }
                }
                WatchEvent::Shutdown => {
                    info!("shutdown requested, stopping watch dispatcher");
                    break;
                }
            }
        }

        info!("watch dispatcher exiting");
        Ok(())
    }

    /// Record every rule interested in `rel_path`; true if any matched.
    fn note_path(&self, rel_path: &str, matched: &mut BTreeSet<usize>) -> bool {
        let mut any = false;
        for profile in self.profiles.iter() {
            if profile.matches(rel_path) {
                debug!(
                    rule = profile.index,
                    path = %rel_path,
                    "watch rule matched"
                );
                matched.insert(profile.index);
                any = true;
            }
        }
        any
    }

    /// Run everything the matched rules asked for, then fire the alert hook
    /// exactly once and the reload collaborator if requested and successful.
    async fn dispatch(&mut self, matched: &mut BTreeSet<usize>) {
        let rule_indices: Vec<usize> = std::mem::take(matched).into_iter().collect();

        let mut tasks: Vec<String> = Vec::new();
        let mut want_reload = false;
        for idx in rule_indices.iter() {
            let profile = &self.profiles[*idx];
            tasks.extend(profile.tasks.iter().cloned());
            want_reload |= profile.live_reload;
        }

        info!(rules = ?rule_indices, tasks = ?tasks, "dispatching watch-triggered run");

        let mut outcome = PipelineOutcome::Success;
        for task in tasks.iter() {
            match self.driver.run_task(task).await {
                Ok(report) => {
                    debug!(
                        task = %report.task,
                        steps_run = report.steps_run,
                        steps_skipped = report.steps_skipped,
                        "watch-triggered task finished"
                    );
                }
                Err(err) => {
                    // Failures end this run only; the watch loop survives.
                    error!(task = %task, error = %err, "watch-triggered task failed");
                    outcome = PipelineOutcome::Failed;
                    break;
                }
            }
        }

        self.alert.notify(outcome);

        if want_reload && outcome == PipelineOutcome::Success {
            self.reload.notify_reload();
        }
    }
}
