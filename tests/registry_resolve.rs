use std::error::Error;

use siteforge::config::load_from_str;
use siteforge::errors::PipelineError;
use siteforge::registry::TaskRegistry;

type TestResult = Result<(), Box<dyn Error>>;

fn registry(toml: &str) -> Result<TaskRegistry, Box<dyn Error>> {
    let cfg = load_from_str(toml)?;
    Ok(TaskRegistry::from_config(&cfg))
}

#[test]
fn resolve_flattens_aliases_depth_first_left_to_right() -> TestResult {
    let reg = registry(
        r#"
        [step.clean]
        kind = "clean"
        src = ["**/*"]

        [step.copy-assets]
        kind = "copy"
        src = ["**"]

        [step.bundle]
        kind = "command"
        cmd = "true"

        [step.minify]
        kind = "command"
        cmd = "true"

        [task.core]
        steps = ["clean", "copy-assets"]

        [task.scripts]
        steps = ["bundle", "minify"]

        [task.build]
        steps = ["core", "scripts", "copy-assets"]
        "#,
    )?;

    let steps = reg.resolve("build")?;
    assert_eq!(
        steps,
        vec!["clean", "copy-assets", "bundle", "minify", "copy-assets"]
    );

    Ok(())
}

#[test]
fn resolve_of_a_primitive_step_is_itself() -> TestResult {
    let reg = registry(
        r#"
        [step.copy]
        kind = "copy"
        src = ["**"]

        [task.all]
        steps = ["copy"]
        "#,
    )?;

    assert_eq!(reg.resolve("copy")?, vec!["copy"]);
    Ok(())
}

#[test]
fn resolve_unknown_name_fails_with_unknown_task() -> TestResult {
    let reg = registry(
        r#"
        [step.copy]
        kind = "copy"

        [task.all]
        steps = ["copy"]
        "#,
    )?;

    let err = reg.resolve("deploy").unwrap_err();
    assert!(matches!(err, PipelineError::UnknownTask(name) if name == "deploy"));

    Ok(())
}

#[test]
fn resolve_direct_cycle_fails_with_cyclic_task() -> TestResult {
    let reg = registry(
        r#"
        [task.loop]
        steps = ["loop"]
        "#,
    )?;

    let err = reg.resolve("loop").unwrap_err();
    match err {
        PipelineError::CyclicTask { path } => {
            assert_eq!(path, vec!["loop".to_string(), "loop".to_string()]);
        }
        other => panic!("expected CyclicTask, got {other:?}"),
    }

    Ok(())
}

#[test]
fn resolve_transitive_cycle_reports_the_expansion_path() -> TestResult {
    let reg = registry(
        r#"
        [step.copy]
        kind = "copy"

        [task.a]
        steps = ["copy", "b"]

        [task.b]
        steps = ["c"]

        [task.c]
        steps = ["a"]
        "#,
    )?;

    let err = reg.resolve("a").unwrap_err();
    match err {
        PipelineError::CyclicTask { path } => {
            assert_eq!(path, vec!["a", "b", "c", "a"]);
        }
        other => panic!("expected CyclicTask, got {other:?}"),
    }

    Ok(())
}

#[test]
fn diamond_composition_is_not_a_cycle() -> TestResult {
    // `shared` is reached via two branches; that duplicates steps but must
    // not be mistaken for a cycle.
    let reg = registry(
        r#"
        [step.copy]
        kind = "copy"

        [task.shared]
        steps = ["copy"]

        [task.left]
        steps = ["shared"]

        [task.right]
        steps = ["shared"]

        [task.top]
        steps = ["left", "right"]
        "#,
    )?;

    assert_eq!(reg.resolve("top")?, vec!["copy", "copy"]);
    Ok(())
}
