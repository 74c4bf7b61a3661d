//! Repository for the `groups` table.

use sqlx::PgPool;

use crate::models::group::{CreateGroup, Group};
use crate::repositories::GroupRoleRepo;

/// Column list for `groups` queries.
const COLUMNS: &str = "uuid, name, description, created_at, updated_at";

/// Provides CRUD operations for groups.
pub struct GroupRepo;

impl GroupRepo {
    /// Insert a new group and return the created row.
    pub async fn create(pool: &PgPool, input: &CreateGroup) -> Result<Group, sqlx::Error> {
        let query = format!(
            "INSERT INTO groups (uuid, name, description) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Group>(&query)
            .bind(&input.uuid)
            .bind(&input.name)
            .bind(input.description.as_deref())
            .fetch_one(pool)
            .await
    }

    /// Find a group by its uuid.
    pub async fn find_by_uuid(pool: &PgPool, uuid: &str) -> Result<Option<Group>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM groups WHERE uuid = $1");
        sqlx::query_as::<_, Group>(&query)
            .bind(uuid)
            .fetch_optional(pool)
            .await
    }

    /// Replace a group's name and description.
    ///
    /// `description = None` clears the column. Returns `None` if the group
    /// no longer exists.
    pub async fn update(
        pool: &PgPool,
        uuid: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<Option<Group>, sqlx::Error> {
        let query = format!(
            "UPDATE groups SET name = $2, description = $3, updated_at = NOW() \
             WHERE uuid = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Group>(&query)
            .bind(uuid)
            .bind(name)
            .bind(description)
            .fetch_optional(pool)
            .await
    }

    /// Delete a group together with its role rows.
    ///
    /// Returns `true` if the group existed.
    pub async fn delete(pool: &PgPool, uuid: &str) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let roles_removed = GroupRoleRepo::delete_for_group(&mut tx, uuid).await?;
        let result = sqlx::query("DELETE FROM groups WHERE uuid = $1")
            .bind(uuid)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(group_uuid = uuid, roles_removed, "Group rows deleted");
        Ok(result.rows_affected() > 0)
    }
}
