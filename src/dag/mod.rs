// src/dag/mod.rs

//! Task graph and scheduling core. No I/O happens below this module.
//!
//! - [`task_info`] defines the task record.
//! - [`complexity`] scores tasks for ordering inside a tier.
//! - [`graph`] validates dependencies and computes tiers.
//! - [`planner`] produces a one-shot sequence of batches.
//! - [`state_manager`] derives readiness and checks transitions.
//! - [`manager`] is the stateful, incrementally updated session.
//! - [`shared`] wraps a session behind a mutex.

pub mod complexity;
pub mod graph;
pub mod manager;
pub mod planner;
pub mod shared;
pub mod state_manager;
pub mod task_info;

pub use graph::DependencyGraph;
pub use manager::{DynamicTaskManager, SessionSummary};
pub use planner::BatchPlanner;
pub use shared::SharedTaskManager;
pub use task_info::TaskRecord;
