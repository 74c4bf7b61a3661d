use std::time::Duration;

use keystone_migration::{MigrationError, MigrationRunner, PgMigrationDatabase, RunReport};
use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod repositories;
pub mod schema;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the server's schema migrations.
///
/// Fails fast on a catalog error (duplicate version) or on the first step
/// that cannot be applied.
pub async fn run_migrations(pool: &DbPool) -> Result<RunReport, MigrationError> {
    let runner = MigrationRunner::new(schema::server_migrations()?);
    let database = PgMigrationDatabase::new(pool.clone());

    let pending = runner.pending(&database).await?;
    if !pending.is_empty() {
        tracing::info!(?pending, "Pending schema migrations");
    }

    runner.run(&database).await
}
