//! Versioned schema migrations.
//!
//! A [`MigrationRegistry`] holds the ordered catalog of [`MigrationStep`]s.
//! The [`MigrationRunner`] applies the steps missing from the database's
//! [`MigrationLedger`], one transaction per step, stopping at the first
//! failure. Each structural [`SchemaChange`] is checked against the live
//! schema before it runs, so a change that is already in place is skipped
//! instead of failing.
//!
//! Two backends implement [`MigrationDatabase`]: [`PgMigrationDatabase`] for
//! PostgreSQL and [`MemoryDatabase`], an in-process schema model.

pub mod backend;
pub mod change;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod postgres;
pub mod registry;
pub mod runner;
pub mod step;

pub use backend::{MigrationDatabase, SchemaTransaction};
pub use change::{ColumnDef, ColumnType, SchemaChange};
pub use error::{MigrationError, SchemaError};
pub use ledger::{LedgerEntry, MigrationLedger};
pub use memory::MemoryDatabase;
pub use postgres::PgMigrationDatabase;
pub use registry::MigrationRegistry;
pub use runner::{MigrationRunner, RunReport};
pub use step::MigrationStep;
