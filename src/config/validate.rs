// src/config/validate.rs

use crate::config::model::{RawTaskFile, TaskConfig, TaskFile};
use crate::dag::{DependencyGraph, TaskRecord};
use crate::errors::{Result, SchedulerError};
use crate::types::EstimatedTime;

impl TryFrom<RawTaskFile> for TaskFile {
    type Error = SchedulerError;

    fn try_from(raw: RawTaskFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        let records = raw
            .task
            .iter()
            .map(|(id, task)| task_record(id, task))
            .collect::<Result<Vec<_>>>()?;

        // Resolves references and rejects cycles.
        let graph = DependencyGraph::build(records)?;
        Ok(TaskFile::new_unchecked(raw.config, graph.into_records().collect()))
    }
}

/// Checks that do not need the dependency graph.
pub fn validate_config(cfg: &RawTaskFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    cfg.config.validate()?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawTaskFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(SchedulerError::InvalidConfiguration(
            "task file must contain at least one [task.<id>] section".to_string(),
        ));
    }
    Ok(())
}

fn task_record(id: &str, task: &TaskConfig) -> Result<TaskRecord> {
    let estimated_time = match task.estimated_time.as_deref() {
        Some(s) => s.parse::<EstimatedTime>().map_err(|e| match e {
            SchedulerError::InvalidConfiguration(msg) => {
                SchedulerError::InvalidConfiguration(format!("task '{id}': {msg}"))
            }
            other => other,
        })?,
        None => EstimatedTime::default(),
    };

    let mut record = TaskRecord::new(id, task.name.clone().unwrap_or_else(|| id.to_string()))
        .with_deps(task.depends_on.iter().cloned())
        .with_estimated_time(estimated_time);

    record.description = task.description.clone();
    if let Some(n) = task.tool_calls_estimate {
        record.tool_calls_estimate = n;
    }
    if let Some(n) = task.decision_points {
        record.decision_points = n;
    }
    record.complexity_override = task.complexity_score;
    Ok(record)
}
