//! [`TaskSource`] backed by the `ce_queue` table.

use async_trait::async_trait;
use keystone_db::models::task_queue::QueuedTask;
use keystone_db::repositories::TaskQueueRepo;
use keystone_db::DbPool;
use keystone_engine::worker::BoxError;
use keystone_engine::{DispatchOutcome, Task, TaskSource};

#[derive(Debug, Clone)]
pub struct PgTaskSource {
    pool: DbPool,
}

impl PgTaskSource {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskSource for PgTaskSource {
    async fn next_task(&self) -> Result<Option<Task>, BoxError> {
        let claimed = TaskQueueRepo::claim_next(&self.pool).await?;
        if let Some(row) = &claimed {
            tracing::debug!(task_uuid = %row.uuid, task_type = %row.task_type, "Task claimed");
        }
        Ok(claimed.map(to_task))
    }

    async fn complete(&self, task: &Task, outcome: &DispatchOutcome) -> Result<(), BoxError> {
        match outcome {
            DispatchOutcome::Succeeded { result } => {
                let result = result.as_ref().map(serde_json::to_value).transpose()?;
                TaskQueueRepo::mark_success(&self.pool, task.uuid, result.as_ref()).await?;
            }
            DispatchOutcome::Failed(failure) => {
                TaskQueueRepo::mark_failed(&self.pool, task.uuid, &failure.cause).await?;
            }
            DispatchOutcome::NoHandler => {
                TaskQueueRepo::mark_failed(&self.pool, task.uuid, &no_handler_message(task))
                    .await?;
            }
        }
        Ok(())
    }
}

fn to_task(row: QueuedTask) -> Task {
    Task {
        uuid: row.uuid,
        task_type: row.task_type,
        payload: row.payload,
        submitted_at: row.submitted_at,
    }
}

fn no_handler_message(task: &Task) -> String {
    format!("No processor is defined for task type '{}'", task.task_type)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn claimed_row_becomes_task() {
        let uuid = Uuid::now_v7();
        let submitted_at = Utc::now();
        let row = QueuedTask {
            uuid,
            task_type: "REPORT".into(),
            payload: serde_json::json!({"project": "p1"}),
            status: "in_progress".into(),
            error_message: None,
            result: None,
            submitted_at,
            started_at: Some(submitted_at),
            completed_at: None,
        };

        let task = to_task(row);

        assert_eq!(task.uuid, uuid);
        assert_eq!(task.task_type, "REPORT");
        assert_eq!(task.payload["project"], "p1");
        assert_eq!(task.submitted_at, submitted_at);
    }

    #[test]
    fn unhandled_task_failure_names_the_type() {
        let task = Task::new("MYSTERY", serde_json::Value::Null);
        assert_eq!(
            no_handler_message(&task),
            "No processor is defined for task type 'MYSTERY'"
        );
    }
}
