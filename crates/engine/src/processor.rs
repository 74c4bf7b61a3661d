use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::task::{Task, TaskResult};

/// Processing code for one or more task types.
///
/// Types are matched by exact string equality. If two processors declare the
/// same type, [`TaskRouter::build`](crate::TaskRouter::build) fails and the
/// engine must not start. A processor declaring no types is ignored.
#[async_trait]
pub trait TaskProcessor: Send + Sync {
    /// Name used in logs and configuration errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn handled_task_types(&self) -> BTreeSet<String>;

    /// Process a task whose type is one of [`handled_task_types`](Self::handled_task_types).
    ///
    /// An `Err` (or a panic) marks the task as failed; the engine logs it and
    /// carries on.
    async fn process(&self, task: &Task) -> anyhow::Result<Option<TaskResult>>;
}
