// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::types::TaskState;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Duplicate task id: {0}")]
    DuplicateId(String),

    #[error("Task '{task}' depends on unknown task '{dependency}'")]
    UnknownDependency { task: String, dependency: String },

    #[error("Circular dependency detected: {}", .cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    #[error("Configuration error: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid state transition for task '{id}': {from} -> {to} ({reason})")]
    InvalidStateTransition {
        id: String,
        from: TaskState,
        to: TaskState,
        reason: String,
    },

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl SchedulerError {
    /// Ids participating in a detected cycle, if this is a cycle error.
    pub fn cycle(&self) -> Option<&[String]> {
        match self {
            SchedulerError::CircularDependency { cycle } => Some(cycle),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
