//! Backend traits the runner drives.

use async_trait::async_trait;

use crate::change::SchemaChange;
use crate::error::SchemaError;
use crate::ledger::MigrationLedger;
use crate::step::MigrationStep;

/// A target database: owns the ledger and hands out transactions.
#[async_trait]
pub trait MigrationDatabase: Send + Sync {
    /// Create the ledger table if it does not exist yet.
    async fn ensure_ledger(&self) -> Result<(), SchemaError>;

    async fn load_ledger(&self) -> Result<MigrationLedger, SchemaError>;

    async fn begin(&self) -> Result<Box<dyn SchemaTransaction>, SchemaError>;
}

/// One transactional scope. Nothing is visible outside it until
/// [`commit`](SchemaTransaction::commit); dropping it without committing
/// discards every change.
#[async_trait]
pub trait SchemaTransaction: Send {
    /// Serialize against other runners targeting the same database.
    async fn lock(&mut self) -> Result<(), SchemaError> {
        Ok(())
    }

    /// Whether the version is in the ledger as seen by this transaction.
    async fn is_recorded(&mut self, version: i64) -> Result<bool, SchemaError>;

    async fn table_exists(&mut self, table: &str) -> Result<bool, SchemaError>;

    async fn column_exists(&mut self, table: &str, column: &str) -> Result<bool, SchemaError>;

    async fn index_exists(&mut self, table: &str, index: &str) -> Result<bool, SchemaError>;

    async fn apply(&mut self, change: &SchemaChange) -> Result<(), SchemaError>;

    async fn record(&mut self, step: &MigrationStep) -> Result<(), SchemaError>;

    async fn commit(&mut self) -> Result<(), SchemaError>;

    async fn rollback(&mut self) -> Result<(), SchemaError>;
}
