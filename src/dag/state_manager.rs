// src/dag/state_manager.rs

//! Readiness derivation and state-transition checks.
//!
//! Readiness is always computed from the current states of a task's
//! dependencies; it is never cached on the record.

use std::collections::BTreeSet;

use tracing::warn;

use crate::dag::graph::DependencyGraph;
use crate::dag::task_info::TaskRecord;
use crate::errors::{Result, SchedulerError};
use crate::types::{TaskId, TaskState, TaskStatus};

/// Read-only view over a graph for readiness and status questions.
pub struct ReadOnlyStateManager<'a> {
    graph: &'a DependencyGraph,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(graph: &'a DependencyGraph) -> Self {
        Self { graph }
    }

    /// Whether every dependency of `task` is `Completed`.
    pub fn is_ready(&self, task: &TaskRecord) -> bool {
        is_ready(task, self.graph)
    }

    /// Derived status of a task.
    pub fn status_of(&self, task: &TaskRecord) -> TaskStatus {
        match task.state {
            TaskState::Pending if self.is_ready(task) => TaskStatus::Ready,
            TaskState::Pending => TaskStatus::Blocked,
            TaskState::Running => TaskStatus::Running,
            TaskState::Completed => TaskStatus::Completed,
            TaskState::Failed => TaskStatus::Failed,
        }
    }

    /// Pending tasks that can never become ready because some transitive
    /// dependency has failed. Returned in id order.
    pub fn stalled_tasks(&self) -> Vec<&'a TaskRecord> {
        let mut poisoned: BTreeSet<&str> = BTreeSet::new();
        let mut stack: Vec<&str> = self
            .graph
            .records()
            .filter(|r| r.state == TaskState::Failed)
            .map(|r| r.id.as_str())
            .collect();

        while let Some(id) = stack.pop() {
            for dependent in self.graph.dependents_of(id) {
                if poisoned.insert(dependent) {
                    stack.push(dependent);
                }
            }
        }

        poisoned
            .into_iter()
            .filter_map(|id| self.graph.get(id))
            .filter(|r| r.state == TaskState::Pending)
            .collect()
    }
}

/// A task is ready iff all of its dependencies are `Completed`.
pub fn is_ready(task: &TaskRecord, graph: &DependencyGraph) -> bool {
    task.depends_on.iter().all(|dep| match graph.get(dep) {
        Some(d) => d.state == TaskState::Completed,
        None => {
            warn!(task = %task.id, dep = %dep, "dependency missing from graph");
            false
        }
    })
}

/// Check `Pending -> Running`: the task must be pending and ready.
pub fn check_start(task: &TaskRecord, graph: &DependencyGraph) -> Result<()> {
    if task.state != TaskState::Pending {
        return Err(transition_error(
            task,
            TaskState::Running,
            "only pending tasks can start",
        ));
    }
    if !is_ready(task, graph) {
        let waiting: Vec<&str> = task
            .depends_on
            .iter()
            .filter(|dep| graph.get(dep).map(|d| d.state) != Some(TaskState::Completed))
            .map(String::as_str)
            .collect();
        return Err(transition_error(
            task,
            TaskState::Running,
            &format!("waiting on dependencies: {}", waiting.join(", ")),
        ));
    }
    Ok(())
}

/// Check `Running -> Completed` or `Running -> Failed`.
pub fn check_finish(task: &TaskRecord, to: TaskState) -> Result<()> {
    if task.state != TaskState::Running {
        return Err(transition_error(task, to, "only running tasks can finish"));
    }
    Ok(())
}

/// Check that a restored record's state is consistent with its
/// dependencies: anything past `Pending` needs every dependency completed.
pub fn check_restored(task: &TaskRecord, graph: &DependencyGraph) -> Result<()> {
    if task.state == TaskState::Pending || is_ready(task, graph) {
        return Ok(());
    }
    let unfinished: Vec<TaskId> = task
        .depends_on
        .iter()
        .filter(|dep| graph.get(dep).map(|d| d.state) != Some(TaskState::Completed))
        .cloned()
        .collect();
    Err(SchedulerError::InvalidStateTransition {
        id: task.id.clone(),
        from: TaskState::Pending,
        to: task.state,
        reason: format!(
            "restored as {} but dependencies are not completed: {}",
            task.state,
            unfinished.join(", ")
        ),
    })
}

fn transition_error(task: &TaskRecord, to: TaskState, reason: &str) -> SchedulerError {
    SchedulerError::InvalidStateTransition {
        id: task.id.clone(),
        from: task.state,
        to,
        reason: reason.to_string(),
    }
}
