// src/dag/manager.rs

use tracing::{debug, info, warn};

use crate::dag::graph::DependencyGraph;
use crate::dag::state_manager::{self, ReadOnlyStateManager};
use crate::dag::task_info::TaskRecord;
use crate::errors::{Result, SchedulerError};
use crate::types::{SchedulerConfig, TaskState, TaskStatus};

/// Counts of tasks per derived status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub total: usize,
    pub blocked: usize,
    pub ready: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Stateful scheduling session: one dependency graph plus per-task state.
///
/// The manager is the only thing that mutates task state. It is responsible
/// for:
/// - loading and validating the initial task set
/// - accepting new tasks mid-session without touching dispatched ones
/// - handing out the next batch of ready, not-yet-dispatched tasks
/// - enforcing the `Pending -> Running -> Completed` state machine
#[derive(Debug, Default)]
pub struct DynamicTaskManager {
    graph: DependencyGraph,
    config: SchedulerConfig,
}

impl DynamicTaskManager {
    /// Empty session with a validated config.
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            graph: DependencyGraph::new(),
            config,
        })
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Replace the managed set with `tasks`, all starting `Pending`.
    ///
    /// On error the previously managed set is left as it was.
    pub fn initialize<I>(&mut self, tasks: I) -> Result<()>
    where
        I: IntoIterator<Item = TaskRecord>,
    {
        let graph = DependencyGraph::build(tasks.into_iter().map(|mut t| {
            t.state = TaskState::Pending;
            t
        }))?;

        info!(tasks = graph.len(), "initialised task session");
        self.graph = graph;
        Ok(())
    }

    /// Replace the managed set with records that keep their stored state,
    /// e.g. a session restored from an external index.
    ///
    /// Fails if any record past `Pending` has a dependency that is not
    /// `Completed`.
    pub fn resume<I>(&mut self, tasks: I) -> Result<()>
    where
        I: IntoIterator<Item = TaskRecord>,
    {
        let graph = DependencyGraph::build(tasks)?;
        for task in graph.records() {
            state_manager::check_restored(task, &graph)?;
        }

        let manager = ReadOnlyStateManager::new(&graph);
        let stalled = manager.stalled_tasks().len();
        info!(tasks = graph.len(), stalled, "resumed task session");

        self.graph = graph;
        Ok(())
    }

    /// Add a task mid-session.
    ///
    /// Returns `Ok(false)` if the id is already managed, `Ok(true)` once the
    /// task is inserted. Unknown dependencies and cycles are errors. In every
    /// failure case the session is unchanged.
    pub fn insert_task(&mut self, mut task: TaskRecord) -> Result<bool> {
        if self.graph.contains(&task.id) {
            debug!(task = %task.id, "insert of already managed task; ignoring");
            return Ok(false);
        }

        task.state = TaskState::Pending;
        let id = task.id.clone();
        self.graph.insert_validated(task)?;

        debug!(
            task = %id,
            tier = ?self.graph.tier_of(&id),
            status = ?self.status_of(&id),
            "inserted task into running session"
        );
        Ok(true)
    }

    /// Next tasks that are pending and ready, ordered by tier, complexity
    /// score and id, at most `max_batch_size` of them.
    ///
    /// Does not change any state: calling it twice without an intervening
    /// mutation yields the same batch. Tasks leave the candidate set only
    /// when [`mark_running`](Self::mark_running) is called for them.
    pub fn get_next_batch(&self) -> Vec<&TaskRecord> {
        let mgr = ReadOnlyStateManager::new(&self.graph);

        let mut ready: Vec<&TaskRecord> = self
            .graph
            .records()
            .filter(|t| t.state == TaskState::Pending && mgr.is_ready(t))
            .collect();
        ready.sort_by(|a, b| self.graph.compare_tasks(a, b));
        ready.truncate(self.config.max_batch_size);

        if ready.is_empty() {
            self.warn_if_stalled(&mgr);
        }
        ready
    }

    /// `Pending -> Running`; the task must currently be ready.
    pub fn mark_running(&mut self, id: &str) -> Result<()> {
        let task = self.require(id)?;
        state_manager::check_start(task, &self.graph)?;
        self.set_state(id, TaskState::Running)
    }

    /// `Running -> Completed`.
    pub fn mark_completed(&mut self, id: &str) -> Result<()> {
        let task = self.require(id)?;
        state_manager::check_finish(task, TaskState::Completed)?;
        self.set_state(id, TaskState::Completed)
    }

    /// `Running -> Failed`. Dependents of a failed task never become ready.
    pub fn mark_failed(&mut self, id: &str) -> Result<()> {
        let task = self.require(id)?;
        state_manager::check_finish(task, TaskState::Failed)?;
        self.set_state(id, TaskState::Failed)?;

        let stalled: Vec<&str> = ReadOnlyStateManager::new(&self.graph)
            .stalled_tasks()
            .into_iter()
            .map(|t| t.id.as_str())
            .collect();
        warn!(task = %id, ?stalled, "task failed; dependents can no longer run");
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&TaskRecord> {
        self.graph.get(id)
    }

    pub fn state_of(&self, id: &str) -> Option<TaskState> {
        self.graph.get(id).map(|t| t.state)
    }

    pub fn status_of(&self, id: &str) -> Option<TaskStatus> {
        let task = self.graph.get(id)?;
        Some(ReadOnlyStateManager::new(&self.graph).status_of(task))
    }

    pub fn tier_of(&self, id: &str) -> Option<usize> {
        self.graph.tier_of(id)
    }

    /// All managed records in id order.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskRecord> {
        self.graph.records()
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Pending tasks blocked forever by a failed transitive dependency.
    pub fn stalled_tasks(&self) -> Vec<&TaskRecord> {
        ReadOnlyStateManager::new(&self.graph).stalled_tasks()
    }

    pub fn summary(&self) -> SessionSummary {
        let mgr = ReadOnlyStateManager::new(&self.graph);
        let mut summary = SessionSummary {
            total: self.graph.len(),
            ..SessionSummary::default()
        };
        for task in self.graph.records() {
            match mgr.status_of(task) {
                TaskStatus::Blocked => summary.blocked += 1,
                TaskStatus::Ready => summary.ready += 1,
                TaskStatus::Running => summary.running += 1,
                TaskStatus::Completed => summary.completed += 1,
                TaskStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }

    /// True when nothing is running and nothing can be dispatched any more.
    pub fn is_finished(&self) -> bool {
        let s = self.summary();
        s.ready == 0 && s.running == 0
    }

    fn require(&self, id: &str) -> Result<&TaskRecord> {
        self.graph
            .get(id)
            .ok_or_else(|| SchedulerError::TaskNotFound(id.to_string()))
    }

    fn set_state(&mut self, id: &str, to: TaskState) -> Result<()> {
        let task = self
            .graph
            .get_mut(id)
            .ok_or_else(|| SchedulerError::TaskNotFound(id.to_string()))?;
        debug!(task = %id, from = %task.state, to = %to, "task state transition");
        task.state = to;
        Ok(())
    }

    /// Pending work remains but nothing is running and nothing is ready.
    fn warn_if_stalled(&self, mgr: &ReadOnlyStateManager<'_>) {
        let mut pending = 0;
        for task in self.graph.records() {
            match task.state {
                TaskState::Running => return,
                TaskState::Pending => pending += 1,
                TaskState::Completed | TaskState::Failed => {}
            }
        }
        if pending > 0 {
            warn!(
                pending,
                stalled = mgr.stalled_tasks().len(),
                "no task is ready or running but pending work remains"
            );
        }
    }
}
