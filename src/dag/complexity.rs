// src/dag/complexity.rs

//! Complexity scoring used to order tasks inside a dependency tier.
//!
//! `raw = time + min(tool_calls / 5, 3) + decision_points * 2`, where time is
//! 1 / 3 / 5 for short / medium / long. The score used for ordering is the
//! raw value clamped to `[MIN_SCORE, MAX_SCORE]`, so every task with a raw
//! score above 10 ties at 10 and falls back to the id tie-break.

use crate::dag::task_info::TaskRecord;
use crate::types::EstimatedTime;

pub const MIN_SCORE: f64 = 1.0;
pub const MAX_SCORE: f64 = 10.0;

const TOOL_CALLS_PER_POINT: f64 = 5.0;
const MAX_TOOL_SCORE: f64 = 3.0;
const POINTS_PER_DECISION: f64 = 2.0;

pub fn time_score(estimated_time: EstimatedTime) -> f64 {
    match estimated_time {
        EstimatedTime::Short => 1.0,
        EstimatedTime::Medium => 3.0,
        EstimatedTime::Long => 5.0,
    }
}

pub fn tool_score(tool_calls_estimate: u32) -> f64 {
    (f64::from(tool_calls_estimate) / TOOL_CALLS_PER_POINT).min(MAX_TOOL_SCORE)
}

pub fn decision_score(decision_points: u32) -> f64 {
    f64::from(decision_points) * POINTS_PER_DECISION
}

/// Unclamped formula value, ignoring any override.
pub fn raw_score(task: &TaskRecord) -> f64 {
    time_score(task.estimated_time)
        + tool_score(task.tool_calls_estimate)
        + decision_score(task.decision_points)
}

/// Effective score in `[1, 10]`.
///
/// A caller-pinned override wins over the formula but is clamped the same
/// way. Overrides are checked for finiteness when the task enters a graph.
pub fn score(task: &TaskRecord) -> f64 {
    let value = task.complexity_override.unwrap_or_else(|| raw_score(task));
    value.clamp(MIN_SCORE, MAX_SCORE)
}

/// Total order on scores (scores are always finite once validated).
pub fn compare(a: f64, b: f64) -> std::cmp::Ordering {
    a.total_cmp(&b)
}
