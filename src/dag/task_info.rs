// src/dag/task_info.rs

//! Task records: static description plus stored scheduling state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::dag::complexity;
use crate::types::{EstimatedTime, TaskId, TaskState};

fn default_tool_calls_estimate() -> u32 {
    5
}

/// One schedulable unit of work.
///
/// Dependencies are stored as ids, never as references to other records; the
/// owning [`DependencyGraph`](crate::dag::DependencyGraph) resolves them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Ids that must be `Completed` before this task can run.
    #[serde(default)]
    pub depends_on: BTreeSet<TaskId>,

    #[serde(default)]
    pub estimated_time: EstimatedTime,

    #[serde(default = "default_tool_calls_estimate")]
    pub tool_calls_estimate: u32,

    #[serde(default)]
    pub decision_points: u32,

    /// Caller-pinned complexity; when set it replaces the computed score.
    #[serde(default, rename = "complexity_score", skip_serializing_if = "Option::is_none")]
    pub complexity_override: Option<f64>,

    #[serde(default)]
    pub state: TaskState,
}

impl TaskRecord {
    /// New pending task with the default estimates (`medium`, 5 tool calls,
    /// no decision points) and no dependencies.
    pub fn new(id: impl Into<TaskId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            depends_on: BTreeSet::new(),
            estimated_time: EstimatedTime::default(),
            tool_calls_estimate: default_tool_calls_estimate(),
            decision_points: 0,
            complexity_override: None,
            state: TaskState::Pending,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskId>,
    {
        self.depends_on.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn with_estimated_time(mut self, estimated_time: EstimatedTime) -> Self {
        self.estimated_time = estimated_time;
        self
    }

    pub fn with_tool_calls(mut self, tool_calls_estimate: u32) -> Self {
        self.tool_calls_estimate = tool_calls_estimate;
        self
    }

    pub fn with_decision_points(mut self, decision_points: u32) -> Self {
        self.decision_points = decision_points;
        self
    }

    pub fn with_complexity(mut self, score: f64) -> Self {
        self.complexity_override = Some(score);
        self
    }

    /// Effective complexity in `[1, 10]`, used for ordering within a tier.
    pub fn complexity_score(&self) -> f64 {
        complexity::score(self)
    }
}
