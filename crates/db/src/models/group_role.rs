use keystone_core::types::{GroupUuid, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `group_roles` table. `entity_uuid` is `None` for global roles.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GroupRole {
    pub uuid: String,
    pub group_uuid: Option<GroupUuid>,
    pub role: String,
    pub entity_uuid: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
