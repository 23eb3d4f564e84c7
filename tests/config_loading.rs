// tests/config_loading.rs

mod common;
use crate::common::builders::{TaskConfigBuilder, TaskFileBuilder};
use crate::common::init_tracing;

use std::io::Write;

use tempfile::NamedTempFile;

use batchflow::config::{TaskFile, load_and_validate, load_from_str};
use batchflow::errors::SchedulerError;
use batchflow::simulate;
use batchflow::types::EstimatedTime;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_valid_file_loads_with_defaults() {
    init_tracing();
    let file = write_config(
        r#"
[config]
max_batch_size = 6

[task.setup]
name = "Setup"
estimated_time = "short"
tool_calls_estimate = 0

[task.build]
depends_on = ["setup"]
description = "compile everything"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.config.max_batch_size, 6);
    assert_eq!(cfg.tasks.len(), 2);

    let build = cfg.tasks.iter().find(|t| t.id == "build").unwrap();
    assert_eq!(build.name, "build");
    assert_eq!(build.estimated_time, EstimatedTime::Medium);
    assert_eq!(build.tool_calls_estimate, 5);
    assert_eq!(build.decision_points, 0);
    assert_eq!(build.description.as_deref(), Some("compile everything"));
    assert!((build.complexity_score() - 4.0).abs() < 1e-9);

    let setup = cfg.tasks.iter().find(|t| t.id == "setup").unwrap();
    assert_eq!(setup.name, "Setup");
    assert!((setup.complexity_score() - 1.0).abs() < 1e-9);
}

#[test]
fn test_missing_config_section_uses_default_batch_size() {
    init_tracing();
    let raw = load_from_str("[task.only]\n").unwrap();
    let cfg = TaskFile::try_from(raw).unwrap();
    assert_eq!(cfg.config.max_batch_size, 10);
}

#[test]
fn test_dag_cycle_returns_structured_error() {
    init_tracing();
    let file = write_config(
        r#"
[task.A]
depends_on = ["B"]

[task.B]
depends_on = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(SchedulerError::CircularDependency { cycle }) => {
            assert_eq!(cycle, vec!["A", "B", "A"]);
        }
        Err(e) => panic!("Expected CircularDependency, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_dependency_returns_structured_error() {
    init_tracing();
    let file = write_config(
        r#"
[task.A]
depends_on = ["NonExistent"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(SchedulerError::UnknownDependency { task, dependency }) => {
            assert_eq!(task, "A");
            assert_eq!(dependency, "NonExistent");
        }
        Err(e) => panic!("Expected UnknownDependency, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_bad_estimated_time_is_a_configuration_error() {
    init_tracing();
    let raw = TaskFileBuilder::new()
        .with_task("A", TaskConfigBuilder::new().estimated_time("huge").build())
        .raw();

    match TaskFile::try_from(raw) {
        Err(SchedulerError::InvalidConfiguration(msg)) => {
            assert!(msg.contains("task 'A'"));
            assert!(msg.contains("huge"));
        }
        other => panic!("Expected InvalidConfiguration, got: {other:?}"),
    }
}

#[test]
fn test_zero_batch_size_is_rejected() {
    init_tracing();
    let raw = TaskFileBuilder::new()
        .max_batch_size(0)
        .with_task("A", TaskConfigBuilder::new().build())
        .raw();

    assert!(matches!(
        TaskFile::try_from(raw),
        Err(SchedulerError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_empty_file_is_rejected() {
    init_tracing();
    let file = write_config("");

    match load_and_validate(file.path()) {
        Err(SchedulerError::InvalidConfiguration(msg)) => {
            assert!(msg.contains("at least one"));
        }
        other => panic!("Expected InvalidConfiguration, got: {other:?}"),
    }
}

#[test]
fn test_malformed_toml_is_reported() {
    init_tracing();
    let file = write_config("[task.A\n");

    assert!(matches!(
        load_and_validate(file.path()),
        Err(SchedulerError::TomlError(_))
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    init_tracing();
    assert!(matches!(
        load_and_validate("/definitely/not/here/Batchflow.toml"),
        Err(SchedulerError::IoError(_))
    ));
}

#[test]
fn test_simulate_walks_loaded_file_to_completion() {
    init_tracing();
    let cfg = TaskFileBuilder::new()
        .max_batch_size(5)
        .with_task("lint", TaskConfigBuilder::new().estimated_time("short").build())
        .with_task("build", TaskConfigBuilder::new().decisions(1).build())
        .with_task(
            "test",
            TaskConfigBuilder::new().after("build").after("lint").build(),
        )
        .build();

    let rounds = simulate(cfg.config, cfg.tasks).unwrap();
    assert_eq!(
        rounds,
        vec![
            vec!["lint".to_string(), "build".into()],
            vec!["test".to_string()]
        ]
    );
}
