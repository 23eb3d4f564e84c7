// tests/scenarios.rs

mod common;
use crate::common::builders::task;
use crate::common::{ids, init_tracing, manager};

use std::error::Error;

use batchflow::dag::{BatchPlanner, DynamicTaskManager};
use batchflow::errors::SchedulerError;
use batchflow::types::TaskState;

type TestResult = Result<(), Box<dyn Error>>;

/// A (score 4) and B (score 2) at tier 0, C after both.
fn a_b_c() -> DynamicTaskManager {
    let mut m = manager(10);
    m.initialize(vec![
        task("A", 4.0, &[]),
        task("B", 2.0, &[]),
        task("C", 3.0, &["A", "B"]),
    ])
    .expect("valid task set");
    m
}

#[test]
fn test_first_batch_is_tier_zero_sorted_by_score() -> TestResult {
    init_tracing();
    let mut m = a_b_c();

    assert_eq!(ids(m.get_next_batch()), vec!["B", "A"]);

    m.mark_running("B")?;
    m.mark_running("A")?;
    assert!(m.get_next_batch().is_empty());

    m.mark_completed("A")?;
    assert!(
        m.get_next_batch().is_empty(),
        "C must wait until B is also completed"
    );

    m.mark_completed("B")?;
    assert_eq!(ids(m.get_next_batch()), vec!["C"]);
    Ok(())
}

#[test]
fn test_inserted_task_is_not_blocked_behind_unrelated_running_work() -> TestResult {
    init_tracing();
    let mut m = a_b_c();

    m.mark_running("B")?;
    m.mark_running("A")?;
    m.mark_completed("A")?;

    // B is still running, so C is blocked; D only needs A.
    assert!(m.insert_task(task("D", 5.0, &["A"]))?);
    assert_eq!(ids(m.get_next_batch()), vec!["D"]);
    assert_eq!(m.state_of("B"), Some(TaskState::Running));

    m.mark_running("D")?;
    m.mark_completed("B")?;
    assert_eq!(ids(m.get_next_batch()), vec!["C"]);
    Ok(())
}

#[test]
fn test_duplicate_insert_returns_false_and_changes_nothing() -> TestResult {
    init_tracing();
    let mut m = a_b_c();
    m.mark_running("B")?;

    let before: Vec<_> = m.tasks().cloned().collect();
    let next_before = ids(m.get_next_batch());

    let inserted = m.insert_task(task("A", 9.0, &["B"]))?;
    assert!(!inserted);

    let after: Vec<_> = m.tasks().cloned().collect();
    assert_eq!(before, after);
    assert_eq!(ids(m.get_next_batch()), next_before);
    Ok(())
}

#[test]
fn test_seven_root_tasks_split_five_and_two() -> TestResult {
    init_tracing();
    let tasks: Vec<_> = [7.0, 1.0, 6.0, 2.0, 5.0, 3.0, 4.0]
        .iter()
        .enumerate()
        .map(|(i, score)| task(&format!("t{i}"), *score, &[]))
        .collect();

    let batches = BatchPlanner::with_max_batch_size(5)?.plan(tasks.clone())?;
    assert_eq!(batches.len(), 2);
    assert_eq!(ids(&batches[0]), vec!["t1", "t3", "t5", "t6", "t4"]);
    assert_eq!(ids(&batches[1]), vec!["t2", "t0"]);

    let mut m = manager(5);
    m.initialize(tasks)?;
    let first = ids(m.get_next_batch());
    assert_eq!(first, vec!["t1", "t3", "t5", "t6", "t4"]);
    for id in &first {
        m.mark_running(id)?;
    }
    assert_eq!(ids(m.get_next_batch()), vec!["t2", "t0"]);
    Ok(())
}

#[test]
fn test_completing_a_pending_task_is_rejected() {
    init_tracing();
    let mut m = a_b_c();

    match m.mark_completed("A") {
        Err(SchedulerError::InvalidStateTransition { id, from, to, .. }) => {
            assert_eq!(id, "A");
            assert_eq!(from, TaskState::Pending);
            assert_eq!(to, TaskState::Completed);
        }
        other => panic!("Expected InvalidStateTransition, got: {other:?}"),
    }
    assert_eq!(m.state_of("A"), Some(TaskState::Pending));
}

#[test]
fn test_next_batch_is_idempotent_without_mutation() -> TestResult {
    init_tracing();
    let mut m = a_b_c();

    let first = ids(m.get_next_batch());
    let second = ids(m.get_next_batch());
    assert_eq!(first, second);

    m.mark_running("B")?;
    let third = ids(m.get_next_batch());
    assert_eq!(third, vec!["A"]);
    assert_eq!(ids(m.get_next_batch()), third);
    Ok(())
}

#[test]
fn test_dynamic_insert_does_not_interrupt_running_batch() -> TestResult {
    init_tracing();
    let mut m = manager(10);
    m.initialize(vec![
        task("A", 1.0, &[]),
        task("B", 3.0, &["A"]),
        task("C", 2.0, &["B"]),
    ])?;

    assert_eq!(ids(m.get_next_batch()), vec!["A"]);
    m.mark_running("A")?;

    assert!(m.insert_task(task("X", 1.5, &["A"]))?);
    assert_eq!(m.state_of("A"), Some(TaskState::Running));
    assert!(m.get_next_batch().is_empty());

    m.mark_completed("A")?;
    assert_eq!(ids(m.get_next_batch()), vec!["X", "B"]);
    Ok(())
}
