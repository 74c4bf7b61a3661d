//! Repository for the `group_roles` table.

use sqlx::{PgConnection, PgPool};

use crate::models::group_role::GroupRole;

const COLUMNS: &str = "uuid, group_uuid, role, entity_uuid, created_at, updated_at";

pub struct GroupRoleRepo;

impl GroupRoleRepo {
    /// Grant a role to a group, optionally scoped to an entity.
    pub async fn create(
        pool: &PgPool,
        uuid: &str,
        group_uuid: &str,
        role: &str,
        entity_uuid: Option<&str>,
    ) -> Result<GroupRole, sqlx::Error> {
        let query = format!(
            "INSERT INTO group_roles (uuid, group_uuid, role, entity_uuid) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GroupRole>(&query)
            .bind(uuid)
            .bind(group_uuid)
            .bind(role)
            .bind(entity_uuid)
            .fetch_one(pool)
            .await
    }

    pub async fn list_for_group(
        pool: &PgPool,
        group_uuid: &str,
    ) -> Result<Vec<GroupRole>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM group_roles WHERE group_uuid = $1 ORDER BY role");
        sqlx::query_as::<_, GroupRole>(&query)
            .bind(group_uuid)
            .fetch_all(pool)
            .await
    }

    /// Delete every role of a group inside the caller's transaction.
    pub async fn delete_for_group(
        conn: &mut PgConnection,
        group_uuid: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM group_roles WHERE group_uuid = $1")
            .bind(group_uuid)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete role rows pointing at groups that no longer exist.
    pub async fn delete_orphans(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM group_roles gr \
             WHERE gr.group_uuid IS NOT NULL \
               AND NOT EXISTS (SELECT 1 FROM groups g WHERE g.uuid = gr.group_uuid)",
        )
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
