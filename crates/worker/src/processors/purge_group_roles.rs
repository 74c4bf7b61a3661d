use std::collections::BTreeSet;

use async_trait::async_trait;
use keystone_db::repositories::GroupRoleRepo;
use keystone_db::DbPool;
use keystone_engine::{Task, TaskProcessor, TaskResult};

pub const PURGE_ORPHAN_GROUP_ROLES: &str = "PURGE_ORPHAN_GROUP_ROLES";

/// Removes `group_roles` rows whose group no longer exists.
pub struct PurgeOrphanGroupRolesProcessor {
    pool: DbPool,
}

impl PurgeOrphanGroupRolesProcessor {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskProcessor for PurgeOrphanGroupRolesProcessor {
    fn name(&self) -> &str {
        "purge-orphan-group-roles"
    }

    fn handled_task_types(&self) -> BTreeSet<String> {
        BTreeSet::from([PURGE_ORPHAN_GROUP_ROLES.to_string()])
    }

    async fn process(&self, task: &Task) -> anyhow::Result<Option<TaskResult>> {
        let deleted = GroupRoleRepo::delete_orphans(&self.pool).await?;
        tracing::info!(task_uuid = %task.uuid, deleted, "Orphan group roles purged");
        Ok(Some(TaskResult::with_data(serde_json::json!({ "deleted": deleted }))))
    }
}

#[cfg(test)]
mod tests {
    use keystone_engine::{TaskRouter, UnhandledTaskPolicy};
    use sqlx::postgres::PgPoolOptions;

    use super::*;

    #[tokio::test]
    async fn worker_processors_route_without_conflicts() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://keystone@127.0.0.1:1/keystone")
            .unwrap();

        let router = TaskRouter::build(crate::processors::all(&pool), UnhandledTaskPolicy::Ignore)
            .unwrap();

        assert_eq!(router.handled_task_types(), vec![PURGE_ORPHAN_GROUP_ROLES]);
    }
}
