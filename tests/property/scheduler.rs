use std::collections::{BTreeSet, HashMap, HashSet};

use proptest::prelude::*;

use batchflow::dag::{BatchPlanner, DynamicTaskManager, TaskRecord};
use batchflow::types::{EstimatedTime, SchedulerConfig, TaskState};
use batchflow_test_utils::builders::TaskBuilder;
use batchflow_test_utils::fake_executor::FakeExecutor;
use batchflow_test_utils::ids;

fn estimated_time_strategy() -> impl Strategy<Value = EstimatedTime> {
    prop_oneof![
        Just(EstimatedTime::Short),
        Just(EstimatedTime::Medium),
        Just(EstimatedTime::Long),
    ]
}

// Strategy to generate a valid task set.
// Acyclic by construction: task N only depends on tasks 0..N-1.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<TaskRecord>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        let shape = (
            proptest::collection::vec(any::<usize>(), 0..4),
            estimated_time_strategy(),
            0..20u32,
            0..4u32,
        );

        proptest::collection::vec(shape, num_tasks).prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, (potential_deps, time, tools, decisions))| {
                    let mut builder = TaskBuilder::new(&format!("task_{i:02}"))
                        .time(time)
                        .tool_calls(tools)
                        .decisions(decisions);

                    if i > 0 {
                        let deps: BTreeSet<usize> =
                            potential_deps.into_iter().map(|d| d % i).collect();
                        for d in deps {
                            builder = builder.after(&format!("task_{d:02}"));
                        }
                    }
                    builder.build()
                })
                .collect()
        })
    })
}

fn new_manager(max_batch_size: usize, tasks: Vec<TaskRecord>) -> DynamicTaskManager {
    let config = SchedulerConfig::with_max_batch_size(max_batch_size).unwrap();
    let mut manager = DynamicTaskManager::new(config).unwrap();
    manager.initialize(tasks).unwrap();
    manager
}

proptest! {
    #[test]
    fn test_plan_covers_every_task_once_in_dependency_order(
        tasks in dag_strategy(25),
        max_batch_size in 1..8usize,
    ) {
        let deps: HashMap<String, BTreeSet<String>> = tasks
            .iter()
            .map(|t| (t.id.clone(), t.depends_on.clone()))
            .collect();

        let batches = BatchPlanner::with_max_batch_size(max_batch_size)
            .unwrap()
            .plan(tasks.clone())
            .unwrap();

        let mut batch_of = HashMap::new();
        for (n, batch) in batches.iter().enumerate() {
            prop_assert!(!batch.is_empty());
            prop_assert!(batch.len() <= max_batch_size);
            for t in batch {
                prop_assert!(batch_of.insert(t.id.clone(), n).is_none(), "{} planned twice", t.id);
            }
        }
        prop_assert_eq!(batch_of.len(), tasks.len());

        for (id, ds) in &deps {
            for d in ds {
                prop_assert!(
                    batch_of[d] < batch_of[id],
                    "{} (batch {}) must come after {} (batch {})",
                    id, batch_of[id], d, batch_of[d]
                );
            }
        }
    }

    #[test]
    fn test_executor_completes_every_task_after_its_dependencies(
        tasks in dag_strategy(25),
        max_batch_size in 1..8usize,
    ) {
        let total = tasks.len();
        let mut manager = new_manager(max_batch_size, tasks);

        let mut exec = FakeExecutor::new();
        exec.run_to_completion(&mut manager, total + 1).unwrap();

        let mut done = HashSet::new();
        for batch in exec.executed() {
            prop_assert!(batch.len() <= max_batch_size);
            for id in batch {
                let record = manager.get(id).unwrap();
                for d in &record.depends_on {
                    prop_assert!(done.contains(d), "{} dispatched before {}", id, d);
                }
            }
            done.extend(batch.iter().cloned());
        }

        prop_assert_eq!(done.len(), total);
        prop_assert!(manager.is_finished());
        prop_assert_eq!(manager.summary().completed, total);
    }

    #[test]
    fn test_next_batch_is_idempotent(
        tasks in dag_strategy(15),
        max_batch_size in 1..8usize,
    ) {
        let manager = new_manager(max_batch_size, tasks);
        let first = ids(manager.get_next_batch());
        let second = ids(manager.get_next_batch());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_failed_dependency_blocks_dispatch(
        tasks in dag_strategy(20),
        failing in proptest::collection::vec(0..20usize, 0..4),
    ) {
        let names: Vec<String> = tasks.iter().map(|t| t.id.clone()).collect();
        let failing: HashSet<String> = failing
            .into_iter()
            .filter(|&i| i < names.len())
            .map(|i| names[i].clone())
            .collect();

        let total = tasks.len();
        let mut manager = new_manager(5, tasks);
        let mut exec = FakeExecutor::new().failing(failing.iter().cloned());
        exec.run_to_completion(&mut manager, total + 1).unwrap();

        let dispatched: HashSet<String> = exec.executed_flat().into_iter().collect();
        for id in &dispatched {
            let record = manager.get(id).unwrap();
            for d in &record.depends_on {
                prop_assert_eq!(manager.state_of(d), Some(TaskState::Completed));
            }
        }

        // Whatever never ran is exactly what the failures stalled.
        let stalled: HashSet<String> = ids(manager.stalled_tasks()).into_iter().collect();
        let never_ran: HashSet<String> = names
            .iter()
            .filter(|id| !dispatched.contains(*id))
            .cloned()
            .collect();
        prop_assert_eq!(stalled, never_ran);
        prop_assert!(manager.is_finished());
    }
}
