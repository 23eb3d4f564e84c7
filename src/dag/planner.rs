// src/dag/planner.rs

//! One-shot batch planning.
//!
//! Tiers are emitted in increasing order. Each tier is sorted by complexity
//! score (then id) and split into chunks of at most `max_batch_size`. A batch
//! never mixes tiers, so every dependency of a task lands in a strictly
//! earlier batch.

use std::collections::BTreeMap;

use tracing::debug;

use crate::dag::graph::DependencyGraph;
use crate::dag::task_info::TaskRecord;
use crate::errors::Result;
use crate::types::{SchedulerConfig, TaskId};

/// Stateless planner: knows nothing about execution progress.
#[derive(Debug, Clone, Copy)]
pub struct BatchPlanner {
    config: SchedulerConfig,
}

impl Default for BatchPlanner {
    fn default() -> Self {
        Self {
            config: SchedulerConfig::default(),
        }
    }
}

impl BatchPlanner {
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn with_max_batch_size(max_batch_size: usize) -> Result<Self> {
        Self::new(SchedulerConfig::with_max_batch_size(max_batch_size)?)
    }

    pub fn max_batch_size(&self) -> usize {
        self.config.max_batch_size
    }

    /// Validate `tasks` and split them into ordered batches of owned records.
    pub fn plan<I>(&self, tasks: I) -> Result<Vec<Vec<TaskRecord>>>
    where
        I: IntoIterator<Item = TaskRecord>,
    {
        let graph = DependencyGraph::build(tasks)?;

        let layout: Vec<Vec<TaskId>> = self
            .plan_graph(&graph)?
            .into_iter()
            .map(|batch| batch.into_iter().map(|t| t.id.clone()).collect())
            .collect();

        let mut owned: BTreeMap<TaskId, TaskRecord> =
            graph.into_records().map(|t| (t.id.clone(), t)).collect();

        Ok(layout
            .into_iter()
            .map(|batch| {
                batch
                    .into_iter()
                    .filter_map(|id| owned.remove(&id))
                    .collect()
            })
            .collect())
    }

    /// Split an already validated graph into ordered batches of references.
    pub fn plan_graph<'g>(&self, graph: &'g DependencyGraph) -> Result<Vec<Vec<&'g TaskRecord>>> {
        let size = self.config.max_batch_size;
        let mut batches = Vec::new();

        for (tier, tasks) in graph.tiers()?.into_iter().enumerate() {
            for chunk in tasks.chunks(size) {
                debug!(
                    tier,
                    batch = batches.len(),
                    tasks = chunk.len(),
                    "planned batch"
                );
                batches.push(chunk.to_vec());
            }
        }

        Ok(batches)
    }
}
