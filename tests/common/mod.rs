#![allow(dead_code)]

pub use batchflow_test_utils::builders;
pub use batchflow_test_utils::fake_executor::FakeExecutor;
pub use batchflow_test_utils::{ids, init_tracing};

use batchflow::dag::DynamicTaskManager;
use batchflow::types::SchedulerConfig;

/// Fresh manager with the given batch size.
pub fn manager(max_batch_size: usize) -> DynamicTaskManager {
    let config = SchedulerConfig::with_max_batch_size(max_batch_size).expect("valid batch size");
    DynamicTaskManager::new(config).expect("valid config")
}
