// src/config/validate.rs

use anyhow::{Context, Result, anyhow};
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, StepKindName};
use crate::watch::patterns::PatternSet;

/// Run semantic validation against a loaded configuration.
///
/// Checks:
/// - there is at least one task
/// - no name is both a step and a task
/// - every task-step reference and watch-rule task reference exists
/// - the task alias graph has no cycles
/// - all glob patterns compile
/// - `clean` steps declare `src`; `command` steps declare a `cmd` usable for
///   both targets
/// - `debounce_ms >= 1`
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_names(cfg)?;
    validate_references(cfg)?;
    validate_alias_graph(cfg)?;
    validate_steps(cfg)?;
    validate_watch_rules(cfg)?;
    validate_project(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &ConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(anyhow!(
            "config must contain at least one [task.<name>] section"
        ));
    }
    Ok(())
}

fn validate_names(cfg: &ConfigFile) -> Result<()> {
    for name in cfg.task.keys() {
        if cfg.step.contains_key(name) {
            return Err(anyhow!(
                "name '{}' is declared both as a step and as a task; references would be ambiguous",
                name
            ));
        }
    }
    Ok(())
}

fn validate_references(cfg: &ConfigFile) -> Result<()> {
    let known = |name: &str| cfg.step.contains_key(name) || cfg.task.contains_key(name);

    for (name, task) in cfg.task.iter() {
        if task.steps.is_empty() {
            return Err(anyhow!("task '{}' has an empty `steps` list", name));
        }
        for step_ref in task.steps.iter() {
            if !known(step_ref) {
                return Err(anyhow!(
                    "task '{}' references unknown step or task '{}'",
                    name,
                    step_ref
                ));
            }
        }
    }

    for (idx, rule) in cfg.watch.iter().enumerate() {
        for task_ref in rule.tasks.iter() {
            if !known(task_ref) {
                return Err(anyhow!(
                    "watch rule #{} references unknown step or task '{}'",
                    idx + 1,
                    task_ref
                ));
            }
        }
    }

    Ok(())
}

fn validate_alias_graph(cfg: &ConfigFile) -> Result<()> {
    // Edge direction: task -> referenced task. Primitive step references are
    // leaves and cannot participate in a cycle, so only task-to-task edges
    // are added. A topological sort fails exactly when there is a cycle.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for step_ref in task.steps.iter() {
            if cfg.task.contains_key(step_ref) {
                graph.add_edge(name.as_str(), step_ref.as_str(), ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(anyhow!(
                "cycle detected in task composition involving task '{}'",
                node
            ))
        }
    }
}

fn validate_steps(cfg: &ConfigFile) -> Result<()> {
    for (name, step) in cfg.step.iter() {
        compile_step_patterns(name, &step.src)?;
        if let Some(ov) = &step.develop {
            if let Some(src) = &ov.src {
                compile_step_patterns(name, src)?;
            }
        }
        if let Some(ov) = &step.build {
            if let Some(src) = &ov.src {
                compile_step_patterns(name, src)?;
            }
        }

        match step.kind {
            StepKindName::Clean => {
                if step.src.is_empty() {
                    return Err(anyhow!(
                        "clean step '{}' must declare `src` patterns to delete",
                        name
                    ));
                }
            }
            StepKindName::Command => {
                let dev_cmd = step.develop.as_ref().and_then(|o| o.cmd.as_ref());
                let build_cmd = step.build.as_ref().and_then(|o| o.cmd.as_ref());
                let covered = step.cmd.is_some() || (dev_cmd.is_some() && build_cmd.is_some());
                if !covered {
                    return Err(anyhow!(
                        "command step '{}' has no `cmd` (neither a base value nor overrides for both targets)",
                        name
                    ));
                }
            }
            StepKindName::Copy => {}
        }
    }
    Ok(())
}

fn compile_step_patterns(step: &str, patterns: &[String]) -> Result<()> {
    PatternSet::compile(patterns)
        .with_context(|| format!("compiling glob patterns for step '{}'", step))?;
    Ok(())
}

fn validate_watch_rules(cfg: &ConfigFile) -> Result<()> {
    for (idx, rule) in cfg.watch.iter().enumerate() {
        if rule.files.is_empty() {
            return Err(anyhow!("watch rule #{} has no `files` patterns", idx + 1));
        }
        if rule.tasks.is_empty() {
            return Err(anyhow!("watch rule #{} has no `tasks` to run", idx + 1));
        }
        PatternSet::compile(&rule.files)
            .with_context(|| format!("compiling glob patterns for watch rule #{}", idx + 1))?;
    }
    Ok(())
}

fn validate_project(cfg: &ConfigFile) -> Result<()> {
    if cfg.project.debounce_ms == 0 {
        return Err(anyhow!("[project].debounce_ms must be >= 1 (got 0)"));
    }
    Ok(())
}
