// src/lib.rs

pub mod alert;
pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod pipeline;
pub mod registry;
pub mod server;
pub mod watch;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::alert::Alert;
use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::errors::PipelineError;
use crate::pipeline::{PipelineOutcome, PipelineRunner, ProjectPaths, Target};
use crate::registry::TaskRegistry;
use crate::server::{reload_sink, spawn_server};
use crate::watch::{Dispatcher, WatchEvent, build_rule_profiles, spawn_watcher};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - the task registry and pipeline runner
/// - the alert hook
/// - for watch-mode tasks: the dev-server collaborator, file watcher,
///   debounce dispatcher, and Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    let registry = TaskRegistry::from_config(&cfg);

    if args.dry_run {
        print_dry_run(&cfg, &registry)?;
        return Ok(());
    }

    let task_cfg = cfg
        .task
        .get(&args.task)
        .ok_or_else(|| PipelineError::UnknownTask(args.task.clone()))?;

    // Watch-mode tasks run the develop variants of each step; one-shot tasks
    // run the build variants. `--once` keeps the develop variants but skips
    // the watch loop.
    let watch_mode = task_cfg.watch && !args.once;
    let target = if task_cfg.watch {
        Target::Develop
    } else {
        Target::Build
    };

    let root = config_root_dir(&config_path);
    let paths = ProjectPaths::from_config(root, &cfg.project);
    let alert = Alert::new(cfg.project.alert, cfg.project.clip_cmd.clone());
    let mut runner = PipelineRunner::new(registry, paths.clone(), target);

    // Initial run. The alert hook fires exactly once regardless of outcome.
    match runner.run_task(&args.task).await {
        Ok(report) => {
            alert.notify(PipelineOutcome::Success);
            info!(
                task = %report.task,
                steps_run = report.steps_run,
                steps_skipped = report.steps_skipped,
                "initial run succeeded"
            );
        }
        Err(err) => {
            alert.notify(PipelineOutcome::Failed);
            if !watch_mode {
                // Build-style invocation: fatal, non-zero exit.
                return Err(err.into());
            }
            // Develop-style invocation: report and keep watching.
            error!(task = %args.task, error = %err, "initial run failed; watching for changes");
        }
    }

    if !watch_mode {
        return Ok(());
    }

    // Dev-server collaborator (optional).
    let _server = match cfg.server.as_ref() {
        Some(section) => Some(spawn_server(section, &cfg.project, &paths.output_root)?),
        None => None,
    };
    let reload = reload_sink(cfg.server.as_ref());

    // Watch channel: filesystem events and Ctrl-C feed the dispatcher.
    let (events_tx, events_rx) = mpsc::channel::<WatchEvent>(64);
    let _watcher = spawn_watcher(paths.source_root.clone(), events_tx.clone())?;

    {
        let tx = events_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(WatchEvent::Shutdown).await;
        });
    }

    let profiles = build_rule_profiles(&cfg.watch)?;
    let debounce = Duration::from_millis(cfg.project.debounce_ms);

    let dispatcher = Dispatcher::new(profiles, debounce, runner, alert, reload, events_rx);
    dispatcher.run().await
}

/// Figure out the project root: directory containing the config file, or `.`.
fn config_root_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Simple dry-run output: print project layout, resolved pipelines and
/// watch rules.
fn print_dry_run(cfg: &ConfigFile, registry: &TaskRegistry) -> Result<()> {
    println!("siteforge dry-run");
    println!("  project.source_root = {}", cfg.project.source_root);
    println!("  project.output_root = {}", cfg.project.output_root);
    println!("  project.debounce_ms = {}", cfg.project.debounce_ms);
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        let steps = registry.resolve(name)?;
        let mode = if task.watch { " (watch)" } else { "" };
        println!("  - {name}{mode}");
        println!("      steps: {:?}", steps);
    }

    if !cfg.watch.is_empty() {
        println!();
        println!("watch rules ({}):", cfg.watch.len());
        for (idx, rule) in cfg.watch.iter().enumerate() {
            println!("  #{} files: {:?}", idx + 1, rule.files);
            println!("      tasks: {:?}", rule.tasks);
            if rule.live_reload {
                println!("      live_reload: true");
            }
        }
    }

    Ok(())
}
