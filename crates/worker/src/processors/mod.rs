//! Task processors registered by the worker binary.

pub mod purge_group_roles;

use std::sync::Arc;

use keystone_db::DbPool;
use keystone_engine::TaskProcessor;

pub use purge_group_roles::{PurgeOrphanGroupRolesProcessor, PURGE_ORPHAN_GROUP_ROLES};

/// Every processor this worker knows about.
pub fn all(pool: &DbPool) -> Vec<Arc<dyn TaskProcessor>> {
    vec![Arc::new(PurgeOrphanGroupRolesProcessor::new(pool.clone()))]
}
