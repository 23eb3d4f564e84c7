#![allow(dead_code)]

use std::collections::BTreeMap;

use batchflow::config::{RawTaskFile, TaskConfig, TaskFile};
use batchflow::dag::TaskRecord;
use batchflow::types::{EstimatedTime, SchedulerConfig};

/// Builder for `TaskRecord` to simplify test setup.
///
/// Starts from `short`, zero tool calls and zero decision points, so the
/// computed score is exactly 1.0 unless something else is set.
pub struct TaskBuilder {
    task: TaskRecord,
}

impl TaskBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            task: TaskRecord::new(id, format!("Task {id}"))
                .with_estimated_time(EstimatedTime::Short)
                .with_tool_calls(0),
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.depends_on.insert(dep.to_string());
        self
    }

    pub fn score(mut self, score: f64) -> Self {
        self.task.complexity_override = Some(score);
        self
    }

    pub fn time(mut self, estimated_time: EstimatedTime) -> Self {
        self.task.estimated_time = estimated_time;
        self
    }

    pub fn tool_calls(mut self, n: u32) -> Self {
        self.task.tool_calls_estimate = n;
        self
    }

    pub fn decisions(mut self, n: u32) -> Self {
        self.task.decision_points = n;
        self
    }

    pub fn build(self) -> TaskRecord {
        self.task
    }
}

/// Shorthand for a task with a pinned score and dependencies.
pub fn task(id: &str, score: f64, deps: &[&str]) -> TaskRecord {
    deps.iter()
        .fold(TaskBuilder::new(id).score(score), |b, dep| b.after(dep))
        .build()
}

/// Builder for `TaskFile`, going through the same validation as the loader.
pub struct TaskFileBuilder {
    raw: RawTaskFile,
}

impl TaskFileBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawTaskFile {
                config: SchedulerConfig::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn max_batch_size(mut self, n: usize) -> Self {
        self.raw.config.max_batch_size = n;
        self
    }

    pub fn with_task(mut self, id: &str, task: TaskConfig) -> Self {
        self.raw.task.insert(id.to_string(), task);
        self
    }

    pub fn raw(self) -> RawTaskFile {
        self.raw
    }

    pub fn build(self) -> TaskFile {
        TaskFile::try_from(self.raw).expect("Failed to build valid task file from builder")
    }
}

impl Default for TaskFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new() -> Self {
        Self {
            task: TaskConfig::default(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.task.name = Some(name.to_string());
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.depends_on.push(dep.to_string());
        self
    }

    pub fn estimated_time(mut self, value: &str) -> Self {
        self.task.estimated_time = Some(value.to_string());
        self
    }

    pub fn tool_calls(mut self, n: u32) -> Self {
        self.task.tool_calls_estimate = Some(n);
        self
    }

    pub fn decisions(mut self, n: u32) -> Self {
        self.task.decision_points = Some(n);
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

impl Default for TaskConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
