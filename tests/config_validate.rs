use std::error::Error;
use std::path::PathBuf;

use siteforge::config::{load_and_validate, load_from_str, validate_config};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn bundled_example_config_is_valid() -> TestResult {
    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let cfg = load_and_validate(manifest.join("Siteforge.toml"))?;

    assert_eq!(cfg.project.source_root, "src");
    assert_eq!(cfg.project.output_root, "dist");
    assert_eq!(cfg.project.debounce_ms, 200);
    assert!(cfg.task.get("develop").unwrap().watch);
    assert!(!cfg.task.get("build").unwrap().watch);
    assert_eq!(cfg.watch.len(), 5);

    Ok(())
}

#[test]
fn unknown_step_reference_is_rejected() -> TestResult {
    let cfg = load_from_str(
        r#"
        [step.copy]
        kind = "copy"

        [task.build]
        steps = ["copy", "minify"]
        "#,
    )?;

    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("minify"));
    Ok(())
}

#[test]
fn step_and_task_name_collision_is_rejected() -> TestResult {
    let cfg = load_from_str(
        r#"
        [step.assets]
        kind = "copy"

        [task.assets]
        steps = ["assets"]
        "#,
    )?;

    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("ambiguous"));
    Ok(())
}

#[test]
fn cyclic_task_composition_is_rejected_at_validation() -> TestResult {
    let cfg = load_from_str(
        r#"
        [task.a]
        steps = ["b"]

        [task.b]
        steps = ["a"]
        "#,
    )?;

    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("cycle"));
    Ok(())
}

#[test]
fn unknown_step_option_fails_at_parse_time() {
    let res = load_from_str(
        r#"
        [step.copy]
        kind = "copy"
        sources = ["**"]

        [task.build]
        steps = ["copy"]
        "#,
    );

    assert!(res.is_err());
}

#[test]
fn command_step_without_cmd_is_rejected() -> TestResult {
    let cfg = load_from_str(
        r#"
        [step.bundle]
        kind = "command"
        src = ["scripts/**/*.js"]

        [task.build]
        steps = ["bundle"]
        "#,
    )?;

    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("cmd"));
    Ok(())
}

#[test]
fn command_step_with_cmd_for_both_targets_is_accepted() -> TestResult {
    let cfg = load_from_str(
        r#"
        [step.bundle]
        kind = "command"

        [step.bundle.develop]
        cmd = "true"

        [step.bundle.build]
        cmd = "true"

        [task.build]
        steps = ["bundle"]
        "#,
    )?;

    validate_config(&cfg)?;
    Ok(())
}

#[test]
fn clean_step_without_src_is_rejected() -> TestResult {
    let cfg = load_from_str(
        r#"
        [step.clean]
        kind = "clean"

        [task.build]
        steps = ["clean"]
        "#,
    )?;

    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("clean"));
    Ok(())
}

#[test]
fn zero_debounce_is_rejected() -> TestResult {
    let cfg = load_from_str(
        r#"
        [project]
        debounce_ms = 0

        [step.copy]
        kind = "copy"

        [task.build]
        steps = ["copy"]
        "#,
    )?;

    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("debounce_ms"));
    Ok(())
}

#[test]
fn watch_rule_referencing_unknown_task_is_rejected() -> TestResult {
    let cfg = load_from_str(
        r#"
        [step.copy]
        kind = "copy"

        [task.build]
        steps = ["copy"]

        [[watch]]
        files = ["**/*.html"]
        tasks = ["compile-styles"]
        "#,
    )?;

    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("compile-styles"));
    Ok(())
}
