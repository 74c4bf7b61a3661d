//! In-process schema model implementing [`MigrationDatabase`].
//!
//! Tables, columns, indexes and the ledger live behind a mutex. A
//! transaction works on a private copy and swaps it in on commit, so a
//! failed step leaves no trace. [`SchemaTransaction::lock`] holds a
//! database-wide step lock until commit or rollback and refreshes the copy.
//!
//! Raw SQL is not interpreted; statements are logged and can be made to fail
//! with [`reject_statements_containing`](MemoryDatabase::reject_statements_containing).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::backend::{MigrationDatabase, SchemaTransaction};
use crate::change::SchemaChange;
use crate::error::SchemaError;
use crate::ledger::{LedgerEntry, MigrationLedger};
use crate::step::MigrationStep;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableModel {
    pub columns: Vec<String>,
    /// Index name -> indexed columns.
    pub indexes: BTreeMap<String, Vec<String>>,
}

/// Structural state of the in-memory database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaModel {
    pub tables: BTreeMap<String, TableModel>,
    pub statements: Vec<String>,
}

#[derive(Debug, Clone, Default)]
struct State {
    schema: SchemaModel,
    ledger: MigrationLedger,
    ledger_ready: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<State>,
    reject_pattern: Mutex<Option<String>>,
    step_lock: Arc<Mutex<()>>,
}

/// An in-memory [`MigrationDatabase`]. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    shared: Arc<Shared>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn has_table(&self, table: &str) -> bool {
        self.shared.state.lock().await.schema.tables.contains_key(table)
    }

    pub async fn has_column(&self, table: &str, column: &str) -> bool {
        let state = self.shared.state.lock().await;
        state
            .schema
            .tables
            .get(table)
            .is_some_and(|t| t.columns.iter().any(|c| c == column))
    }

    pub async fn has_index(&self, table: &str, index: &str) -> bool {
        let state = self.shared.state.lock().await;
        state
            .schema
            .tables
            .get(table)
            .is_some_and(|t| t.indexes.contains_key(index))
    }

    pub async fn applied_versions(&self) -> Vec<i64> {
        self.shared.state.lock().await.ledger.versions()
    }

    pub async fn ledger(&self) -> MigrationLedger {
        self.shared.state.lock().await.ledger.clone()
    }

    pub async fn snapshot(&self) -> SchemaModel {
        self.shared.state.lock().await.schema.clone()
    }

    /// Apply a change directly, bypassing the ledger, the way an operator
    /// editing the schema by hand would.
    pub async fn apply_out_of_band(&self, change: &SchemaChange) -> Result<(), SchemaError> {
        let mut state = self.shared.state.lock().await;
        apply_change(&mut state.schema, change, None)
    }

    /// Make every raw SQL statement containing `pattern` fail.
    pub async fn reject_statements_containing(&self, pattern: &str) {
        *self.shared.reject_pattern.lock().await = Some(pattern.to_string());
    }

    pub async fn accept_all_statements(&self) {
        *self.shared.reject_pattern.lock().await = None;
    }
}

#[async_trait]
impl MigrationDatabase for MemoryDatabase {
    async fn ensure_ledger(&self) -> Result<(), SchemaError> {
        self.shared.state.lock().await.ledger_ready = true;
        Ok(())
    }

    async fn load_ledger(&self) -> Result<MigrationLedger, SchemaError> {
        let state = self.shared.state.lock().await;
        if !state.ledger_ready {
            return Err(SchemaError::MissingTable("schema_migrations".into()));
        }
        Ok(state.ledger.clone())
    }

    async fn begin(&self) -> Result<Box<dyn SchemaTransaction>, SchemaError> {
        let working = self.shared.state.lock().await.clone();
        let reject_pattern = self.shared.reject_pattern.lock().await.clone();
        Ok(Box::new(MemoryTransaction {
            shared: Arc::clone(&self.shared),
            working: Some(working),
            reject_pattern,
            step_guard: None,
        }))
    }
}

struct MemoryTransaction {
    shared: Arc<Shared>,
    working: Option<State>,
    reject_pattern: Option<String>,
    step_guard: Option<OwnedMutexGuard<()>>,
}

impl MemoryTransaction {
    fn state(&mut self) -> Result<&mut State, SchemaError> {
        self.working.as_mut().ok_or(SchemaError::TransactionClosed)
    }
}

#[async_trait]
impl SchemaTransaction for MemoryTransaction {
    async fn lock(&mut self) -> Result<(), SchemaError> {
        self.state()?;
        let guard = Arc::clone(&self.shared.step_lock).lock_owned().await;
        self.step_guard = Some(guard);
        // Pick up whatever the previous holder committed.
        let committed = self.shared.state.lock().await.clone();
        self.working = Some(committed);
        Ok(())
    }

    async fn is_recorded(&mut self, version: i64) -> Result<bool, SchemaError> {
        let committed = self.shared.state.lock().await.ledger.contains(version);
        Ok(committed || self.state()?.ledger.contains(version))
    }

    async fn table_exists(&mut self, table: &str) -> Result<bool, SchemaError> {
        Ok(self.state()?.schema.tables.contains_key(table))
    }

    async fn column_exists(&mut self, table: &str, column: &str) -> Result<bool, SchemaError> {
        Ok(self
            .state()?
            .schema
            .tables
            .get(table)
            .is_some_and(|t| t.columns.iter().any(|c| c == column)))
    }

    async fn index_exists(&mut self, table: &str, index: &str) -> Result<bool, SchemaError> {
        Ok(self
            .state()?
            .schema
            .tables
            .get(table)
            .is_some_and(|t| t.indexes.contains_key(index)))
    }

    async fn apply(&mut self, change: &SchemaChange) -> Result<(), SchemaError> {
        let reject_pattern = self.reject_pattern.clone();
        let state = self.state()?;
        apply_change(&mut state.schema, change, reject_pattern.as_deref())
    }

    async fn record(&mut self, step: &MigrationStep) -> Result<(), SchemaError> {
        let state = self.state()?;
        if state.ledger.contains(step.version()) {
            return Err(SchemaError::Rejected(format!(
                "duplicate key: version {} already recorded",
                step.version()
            )));
        }
        state.ledger.insert(LedgerEntry {
            version: step.version(),
            description: step.description().to_string(),
            applied_at: Utc::now(),
        });
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), SchemaError> {
        let working = self.working.take().ok_or(SchemaError::TransactionClosed)?;
        *self.shared.state.lock().await = working;
        self.step_guard = None;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), SchemaError> {
        self.working.take().ok_or(SchemaError::TransactionClosed)?;
        self.step_guard = None;
        Ok(())
    }
}

fn table_mut<'a>(
    schema: &'a mut SchemaModel,
    table: &str,
) -> Result<&'a mut TableModel, SchemaError> {
    schema
        .tables
        .get_mut(table)
        .ok_or_else(|| SchemaError::MissingTable(table.to_string()))
}

fn apply_change(
    schema: &mut SchemaModel,
    change: &SchemaChange,
    reject_pattern: Option<&str>,
) -> Result<(), SchemaError> {
    match change {
        SchemaChange::CreateTable { table, columns } => {
            if schema.tables.contains_key(table) {
                return Err(SchemaError::TableExists(table.clone()));
            }
            schema.tables.insert(
                table.clone(),
                TableModel {
                    columns: columns.iter().map(|c| c.name.clone()).collect(),
                    indexes: BTreeMap::new(),
                },
            );
        }
        SchemaChange::DropTable { table } => {
            schema
                .tables
                .remove(table)
                .ok_or_else(|| SchemaError::MissingTable(table.clone()))?;
        }
        SchemaChange::AddColumn { table, column } => {
            let t = table_mut(schema, table)?;
            if t.columns.contains(&column.name) {
                return Err(SchemaError::ColumnExists {
                    table: table.clone(),
                    column: column.name.clone(),
                });
            }
            t.columns.push(column.name.clone());
        }
        SchemaChange::DropColumn { table, column } => {
            let t = table_mut(schema, table)?;
            let before = t.columns.len();
            t.columns.retain(|c| c != column);
            if t.columns.len() == before {
                return Err(SchemaError::MissingColumn {
                    table: table.clone(),
                    column: column.clone(),
                });
            }
            // Dropping a column drops the indexes built on it.
            t.indexes.retain(|_, cols| !cols.contains(column));
        }
        SchemaChange::RenameColumn { table, from, to } => {
            let t = table_mut(schema, table)?;
            if t.columns.contains(to) {
                return Err(SchemaError::ColumnExists {
                    table: table.clone(),
                    column: to.clone(),
                });
            }
            let slot = t
                .columns
                .iter_mut()
                .find(|c| c.as_str() == from.as_str())
                .ok_or_else(|| SchemaError::MissingColumn {
                    table: table.clone(),
                    column: from.clone(),
                })?;
            *slot = to.clone();
            for cols in t.indexes.values_mut() {
                for col in cols.iter_mut().filter(|c| c.as_str() == from.as_str()) {
                    *col = to.clone();
                }
            }
        }
        SchemaChange::CreateIndex {
            table,
            index,
            columns,
            ..
        } => {
            if schema.tables.values().any(|t| t.indexes.contains_key(index)) {
                return Err(SchemaError::IndexExists(index.clone()));
            }
            let t = table_mut(schema, table)?;
            if let Some(missing) = columns.iter().find(|c| !t.columns.contains(*c)) {
                return Err(SchemaError::MissingColumn {
                    table: table.clone(),
                    column: missing.clone(),
                });
            }
            t.indexes.insert(index.clone(), columns.clone());
        }
        SchemaChange::DropIndex { table, index } => {
            let t = table_mut(schema, table)?;
            t.indexes
                .remove(index)
                .ok_or_else(|| SchemaError::MissingIndex(index.clone()))?;
        }
        SchemaChange::Sql(statement) => {
            if let Some(pattern) = reject_pattern {
                if statement.contains(pattern) {
                    return Err(SchemaError::Rejected(statement.clone()));
                }
            }
            schema.statements.push(statement.clone());
        }
    }
    Ok(())
}
