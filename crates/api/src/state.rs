use std::sync::Arc;

use crate::config::ServerConfig;
use crate::services::{
    ConfigManagedInstanceChecker, GroupService, ManagedInstanceChecker, PgGroupService,
};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: keystone_db::DbPool,
    pub config: Arc<ServerConfig>,
    pub groups: Arc<dyn GroupService>,
    pub managed_instance: Arc<dyn ManagedInstanceChecker>,
}

impl AppState {
    /// Production wiring: PostgreSQL-backed services and the configured
    /// managed-instance flag.
    pub fn new(pool: keystone_db::DbPool, config: ServerConfig) -> Self {
        Self {
            groups: Arc::new(PgGroupService::new(pool.clone())),
            managed_instance: Arc::new(ConfigManagedInstanceChecker::new(
                config.managed_instance,
            )),
            pool,
            config: Arc::new(config),
        }
    }
}
