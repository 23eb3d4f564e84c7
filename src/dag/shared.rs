// src/dag/shared.rs

//! Cloneable handle that serialises access to one [`DynamicTaskManager`].

use std::sync::{Arc, Mutex, MutexGuard};

use crate::dag::manager::{DynamicTaskManager, SessionSummary};
use crate::dag::task_info::TaskRecord;
use crate::errors::Result;
use crate::types::{SchedulerConfig, TaskState};

/// Shared session handle.
///
/// Every call takes the lock exactly once, so a reader never observes a
/// half-applied insertion or transition. Batches are returned as owned
/// snapshots because references cannot outlive the guard.
#[derive(Debug, Clone, Default)]
pub struct SharedTaskManager {
    inner: Arc<Mutex<DynamicTaskManager>>,
}

impl SharedTaskManager {
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        Ok(Self::from_manager(DynamicTaskManager::new(config)?))
    }

    pub fn from_manager(manager: DynamicTaskManager) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }

    pub fn initialize(&self, tasks: Vec<TaskRecord>) -> Result<()> {
        self.lock().initialize(tasks)
    }

    pub fn resume(&self, tasks: Vec<TaskRecord>) -> Result<()> {
        self.lock().resume(tasks)
    }

    pub fn insert_task(&self, task: TaskRecord) -> Result<bool> {
        self.lock().insert_task(task)
    }

    pub fn get_next_batch(&self) -> Vec<TaskRecord> {
        self.lock().get_next_batch().into_iter().cloned().collect()
    }

    pub fn mark_running(&self, id: &str) -> Result<()> {
        self.lock().mark_running(id)
    }

    pub fn mark_completed(&self, id: &str) -> Result<()> {
        self.lock().mark_completed(id)
    }

    pub fn mark_failed(&self, id: &str) -> Result<()> {
        self.lock().mark_failed(id)
    }

    pub fn state_of(&self, id: &str) -> Option<TaskState> {
        self.lock().state_of(id)
    }

    pub fn summary(&self) -> SessionSummary {
        self.lock().summary()
    }

    pub fn is_finished(&self) -> bool {
        self.lock().is_finished()
    }

    /// Owned copy of every managed record, in id order.
    pub fn snapshot(&self) -> Vec<TaskRecord> {
        self.lock().tasks().cloned().collect()
    }

    /// Run `f` with exclusive access, for multi-step updates no other handle
    /// may observe halfway (e.g. fetch a batch and mark it running).
    pub fn with<R>(&self, f: impl FnOnce(&mut DynamicTaskManager) -> R) -> R {
        let mut guard = self.lock();
        f(&mut *guard)
    }

    // Each manager operation is atomic on its own, so poisoning is recovered.
    // A closure passed to `with` that panics midway leaves whatever steps it
    // already applied; undoing those is up to the caller.
    fn lock(&self) -> MutexGuard<'_, DynamicTaskManager> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
