use async_trait::async_trait;
use keystone_core::error::CoreError;
use keystone_core::group::GroupUpdate;
use keystone_db::models::group::Group;
use keystone_db::repositories::GroupRepo;
use keystone_db::DbPool;

use crate::error::AppResult;

/// Group persistence as seen by the REST layer.
#[async_trait]
pub trait GroupService: Send + Sync {
    async fn find_by_uuid(&self, uuid: &str) -> AppResult<Option<Group>>;

    /// Replace the mutable fields of `group`. Returns the stored row.
    async fn update(&self, group: &Group, update: &GroupUpdate) -> AppResult<Group>;

    /// Delete `group` and everything attached to it.
    async fn delete(&self, group: &Group) -> AppResult<()>;
}

/// [`GroupService`] backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgGroupService {
    pool: DbPool,
}

impl PgGroupService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupService for PgGroupService {
    async fn find_by_uuid(&self, uuid: &str) -> AppResult<Option<Group>> {
        Ok(GroupRepo::find_by_uuid(&self.pool, uuid).await?)
    }

    async fn update(&self, group: &Group, update: &GroupUpdate) -> AppResult<Group> {
        GroupRepo::update(
            &self.pool,
            &group.uuid,
            &update.name,
            update.description.as_deref(),
        )
        .await?
        .ok_or_else(|| CoreError::not_found("Group", &group.uuid).into())
    }

    async fn delete(&self, group: &Group) -> AppResult<()> {
        if !GroupRepo::delete(&self.pool, &group.uuid).await? {
            return Err(CoreError::not_found("Group", &group.uuid).into());
        }
        Ok(())
    }
}
