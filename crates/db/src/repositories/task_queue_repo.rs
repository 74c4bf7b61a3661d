//! Repository for the `ce_queue` table.
//!
//! Workers claim tasks with `SELECT ... FOR UPDATE SKIP LOCKED` so two
//! workers never pick up the same row.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::task_queue::{QueuedTask, TaskStatus};

const COLUMNS: &str = "\
    uuid, task_type, payload, status, error_message, result, \
    submitted_at, started_at, completed_at";

pub struct TaskQueueRepo;

impl TaskQueueRepo {
    /// Enqueue a task and return the stored row.
    pub async fn submit(
        pool: &PgPool,
        task_type: &str,
        payload: &serde_json::Value,
    ) -> Result<QueuedTask, sqlx::Error> {
        let query = format!(
            "INSERT INTO ce_queue (uuid, task_type, payload, status) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QueuedTask>(&query)
            .bind(Uuid::now_v7())
            .bind(task_type)
            .bind(payload)
            .bind(TaskStatus::Pending.as_str())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_uuid(
        pool: &PgPool,
        uuid: Uuid,
    ) -> Result<Option<QueuedTask>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM ce_queue WHERE uuid = $1");
        sqlx::query_as::<_, QueuedTask>(&query)
            .bind(uuid)
            .fetch_optional(pool)
            .await
    }

    /// Atomically claim the oldest pending task and mark it in progress.
    pub async fn claim_next(pool: &PgPool) -> Result<Option<QueuedTask>, sqlx::Error> {
        let query = format!(
            "UPDATE ce_queue \
             SET status = $1, started_at = NOW(), updated_at = NOW() \
             WHERE uuid = ( \
                 SELECT uuid FROM ce_queue \
                 WHERE status = $2 \
                 ORDER BY submitted_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QueuedTask>(&query)
            .bind(TaskStatus::InProgress.as_str())
            .bind(TaskStatus::Pending.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Mark a task as succeeded with an optional result payload.
    pub async fn mark_success(
        pool: &PgPool,
        uuid: Uuid,
        result: Option<&serde_json::Value>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE ce_queue \
             SET status = $2, result = $3, completed_at = NOW(), updated_at = NOW() \
             WHERE uuid = $1",
        )
        .bind(uuid)
        .bind(TaskStatus::Success.as_str())
        .bind(result)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark a task as failed with an error message.
    pub async fn mark_failed(pool: &PgPool, uuid: Uuid, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE ce_queue \
             SET status = $2, error_message = $3, completed_at = NOW(), updated_at = NOW() \
             WHERE uuid = $1",
        )
        .bind(uuid)
        .bind(TaskStatus::Failed.as_str())
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Fail every task left `in_progress` by a worker that stopped before
    /// completing it. Call once at worker startup, before claiming anything.
    ///
    /// Returns the number of tasks failed.
    pub async fn reset_in_progress(pool: &PgPool, reason: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE ce_queue \
             SET status = $1, error_message = $2, completed_at = NOW(), updated_at = NOW() \
             WHERE status = $3",
        )
        .bind(TaskStatus::Failed.as_str())
        .bind(reason)
        .bind(TaskStatus::InProgress.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
