use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::SchedulerError;

/// Canonical task identifier type used throughout the crate.
pub type TaskId = String;

/// Coarse duration estimate for a task.
///
/// - `Short`: under five minutes.
/// - `Medium`: five to fifteen minutes (default).
/// - `Long`: over fifteen minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimatedTime {
    Short,
    Medium,
    Long,
}

impl Default for EstimatedTime {
    fn default() -> Self {
        EstimatedTime::Medium
    }
}

impl FromStr for EstimatedTime {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "short" => Ok(EstimatedTime::Short),
            "medium" => Ok(EstimatedTime::Medium),
            "long" => Ok(EstimatedTime::Long),
            other => Err(SchedulerError::InvalidConfiguration(format!(
                "invalid estimated_time: {other} (expected \"short\", \"medium\" or \"long\")"
            ))),
        }
    }
}

impl fmt::Display for EstimatedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EstimatedTime::Short => "short",
            EstimatedTime::Medium => "medium",
            EstimatedTime::Long => "long",
        };
        f.write_str(s)
    }
}

/// Stored lifecycle state of a task.
///
/// Transitions only move forward:
/// `Pending -> Running -> Completed` or `Running -> Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl Default for TaskState {
    fn default() -> Self {
        TaskState::Pending
    }
}

impl TaskState {
    /// `Completed` and `Failed` never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Public, read-only view of a task's state with readiness derived.
///
/// `Blocked` and `Ready` both correspond to a stored `TaskState::Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Blocked,
    Ready,
    Running,
    Completed,
    Failed,
}

/// Smallest accepted `max_batch_size`.
pub const MIN_BATCH_SIZE: usize = 1;
/// Largest accepted `max_batch_size`.
pub const MAX_BATCH_SIZE: usize = 100;
/// Recommended `max_batch_size` range; values outside it are logged.
pub const RECOMMENDED_BATCH_SIZE: std::ops::RangeInclusive<usize> = 5..=20;

fn default_max_batch_size() -> usize {
    10
}

/// Scheduler tuning shared by the planner and the dynamic manager.
///
/// Deserialised from the `[config]` section of a task file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Upper bound on tasks per batch.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
        }
    }
}

impl SchedulerConfig {
    /// Config with the given batch size, validated.
    pub fn with_max_batch_size(max_batch_size: usize) -> Result<Self, SchedulerError> {
        let cfg = Self { max_batch_size };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), SchedulerError> {
        if !(MIN_BATCH_SIZE..=MAX_BATCH_SIZE).contains(&self.max_batch_size) {
            return Err(SchedulerError::InvalidConfiguration(format!(
                "max_batch_size must be between {MIN_BATCH_SIZE} and {MAX_BATCH_SIZE} (got {})",
                self.max_batch_size
            )));
        }
        if !RECOMMENDED_BATCH_SIZE.contains(&self.max_batch_size) {
            tracing::warn!(
                max_batch_size = self.max_batch_size,
                "max_batch_size is outside the recommended range 5..=20"
            );
        }
        Ok(())
    }
}
