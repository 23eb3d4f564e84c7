// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::dag::TaskRecord;
use crate::types::SchedulerConfig;

/// Task file as read from TOML, before validation.
///
/// ```toml
/// [config]
/// max_batch_size = 10
///
/// [task.setup]
/// name = "Setup"
/// estimated_time = "short"
///
/// [task.build]
/// depends_on = ["setup"]
/// decision_points = 1
/// ```
///
/// Keys under `[task.<id>]` are the task ids.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTaskFile {
    /// Scheduler tuning from `[config]`.
    #[serde(default)]
    pub config: SchedulerConfig,

    /// All tasks from `[task.<id>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[task.<id>]` section.
///
/// Everything is optional; `estimated_time` stays a string here so that an
/// unknown value is reported as a configuration error rather than a TOML
/// parse error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskConfig {
    /// Display name; defaults to the task id.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Ids of tasks that must complete first.
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// `"short"`, `"medium"` (default) or `"long"`.
    #[serde(default)]
    pub estimated_time: Option<String>,

    #[serde(default)]
    pub tool_calls_estimate: Option<u32>,

    #[serde(default)]
    pub decision_points: Option<u32>,

    /// Pins the complexity score instead of computing it.
    #[serde(default)]
    pub complexity_score: Option<f64>,
}

/// Validated task file: the task set is acyclic, fully resolved and the
/// scheduler config is in range.
#[derive(Debug, Clone)]
pub struct TaskFile {
    pub config: SchedulerConfig,
    /// Records in id order, all `Pending`.
    pub tasks: Vec<TaskRecord>,
}

impl TaskFile {
    /// Internal constructor used by `TryFrom<RawTaskFile>`.
    pub(crate) fn new_unchecked(config: SchedulerConfig, tasks: Vec<TaskRecord>) -> Self {
        Self { config, tasks }
    }
}
