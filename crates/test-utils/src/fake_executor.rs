use std::collections::HashSet;

use batchflow::dag::DynamicTaskManager;
use batchflow::errors::Result;

/// A fake executor that:
/// - pulls batches from a manager until nothing is ready
/// - marks every task in a batch running, then finishes each one
/// - fails the tasks listed in `failing`, completes the rest.
pub struct FakeExecutor {
    failing: HashSet<String>,
    executed: Vec<Vec<String>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self {
            failing: HashSet::new(),
            executed: Vec::new(),
        }
    }

    pub fn failing<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failing.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Run one batch. Returns `false` once the manager has nothing ready.
    pub fn step(&mut self, manager: &mut DynamicTaskManager) -> Result<bool> {
        let batch: Vec<String> = manager
            .get_next_batch()
            .into_iter()
            .map(|t| t.id.clone())
            .collect();
        if batch.is_empty() {
            return Ok(false);
        }

        for id in &batch {
            manager.mark_running(id)?;
        }
        for id in &batch {
            if self.failing.contains(id) {
                manager.mark_failed(id)?;
            } else {
                manager.mark_completed(id)?;
            }
        }
        self.executed.push(batch);
        Ok(true)
    }

    /// Step until nothing is ready; `max_rounds` guards against runaway loops.
    pub fn run_to_completion(
        &mut self,
        manager: &mut DynamicTaskManager,
        max_rounds: usize,
    ) -> Result<()> {
        let mut rounds = 0;
        while rounds < max_rounds && self.step(manager)? {
            rounds += 1;
        }
        Ok(())
    }

    /// Ids dispatched per batch, in order.
    pub fn executed(&self) -> &[Vec<String>] {
        &self.executed
    }

    pub fn executed_flat(&self) -> Vec<String> {
        self.executed.iter().flatten().cloned().collect()
    }
}

impl Default for FakeExecutor {
    fn default() -> Self {
        Self::new()
    }
}
