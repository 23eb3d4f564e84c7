// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod logging;
pub mod types;

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::TaskFile;
use crate::dag::{BatchPlanner, DynamicTaskManager, TaskRecord};
use crate::types::{SchedulerConfig, TaskId};

pub use errors::{Result as SchedulerResult, SchedulerError};

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the task file, then either prints the static plan or
/// walks a dynamic session to completion.
pub fn run(args: CliArgs) -> Result<()> {
    let path = PathBuf::from(&args.config);
    let mut file = load_and_validate(&path)?;

    if let Some(size) = args.max_batch_size {
        file.config = SchedulerConfig::with_max_batch_size(size)?;
    }
    info!(
        path = %path.display(),
        tasks = file.tasks.len(),
        max_batch_size = file.config.max_batch_size,
        "loaded task file"
    );

    if args.simulate {
        let rounds = simulate(file.config, file.tasks.clone())?;
        print_rounds(&file, &rounds);
    } else {
        let planner = BatchPlanner::new(file.config)?;
        let batches = planner.plan(file.tasks.clone())?;
        print_plan(&file, &batches);
    }
    Ok(())
}

/// Drive a fresh session the way an external executor would: take the next
/// batch, mark every task running, then mark them all completed. Returns
/// the ids dispatched in each round.
pub fn simulate(config: SchedulerConfig, tasks: Vec<TaskRecord>) -> Result<Vec<Vec<TaskId>>> {
    let mut manager = DynamicTaskManager::new(config)?;
    manager.initialize(tasks)?;

    let mut rounds = Vec::new();
    loop {
        let batch: Vec<TaskId> = manager
            .get_next_batch()
            .into_iter()
            .map(|t| t.id.clone())
            .collect();
        if batch.is_empty() {
            break;
        }

        for id in &batch {
            manager.mark_running(id)?;
        }
        for id in &batch {
            manager.mark_completed(id)?;
        }
        debug!(round = rounds.len(), ?batch, "simulated round");
        rounds.push(batch);
    }

    Ok(rounds)
}

fn print_plan(file: &TaskFile, batches: &[Vec<TaskRecord>]) {
    println!("batchflow plan");
    println!("  config.max_batch_size = {}", file.config.max_batch_size);
    println!("  tasks = {}", file.tasks.len());
    println!();

    for (i, batch) in batches.iter().enumerate() {
        println!("batch {} ({} tasks):", i + 1, batch.len());
        for task in batch {
            println!("  - {} [{}] score={:.2}", task.id, task.name, task.complexity_score());
            if !task.depends_on.is_empty() {
                let deps: Vec<&str> = task.depends_on.iter().map(String::as_str).collect();
                println!("      depends_on: {}", deps.join(", "));
            }
        }
    }
}

fn print_rounds(file: &TaskFile, rounds: &[Vec<TaskId>]) {
    println!("batchflow simulation");
    println!("  config.max_batch_size = {}", file.config.max_batch_size);
    println!();

    for (i, round) in rounds.iter().enumerate() {
        println!("round {}: {}", i + 1, round.join(", "));
    }
}
