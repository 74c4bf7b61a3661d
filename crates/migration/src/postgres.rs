//! PostgreSQL implementation of [`MigrationDatabase`].
//!
//! Structure is introspected through `pg_indexes` and `information_schema`
//! scoped to `current_schema()`. DDL is transactional in PostgreSQL, so a
//! step either lands entirely or not at all. Each step transaction takes
//! `pg_advisory_xact_lock` so two instances starting at once apply a step
//! exactly once. Creating the ledger table takes the same lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgConnection;
use sqlx::{Executor, PgPool, Postgres, Transaction};

use crate::backend::{MigrationDatabase, SchemaTransaction};
use crate::change::{ColumnDef, ColumnType, SchemaChange};
use crate::error::SchemaError;
use crate::ledger::{LedgerEntry, MigrationLedger};
use crate::step::MigrationStep;

/// Name of the ledger table.
pub const LEDGER_TABLE: &str = "schema_migrations";

/// Advisory lock key shared by every runner (ASCII "keystone").
const ADVISORY_LOCK_KEY: i64 = 0x6b65_7973_746f_6e65;

pub struct PgMigrationDatabase {
    pool: PgPool,
}

impl PgMigrationDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MigrationDatabase for PgMigrationDatabase {
    async fn ensure_ledger(&self) -> Result<(), SchemaError> {
        let query = format!(
            "CREATE TABLE IF NOT EXISTS {LEDGER_TABLE} ( \
                 version BIGINT PRIMARY KEY, \
                 description TEXT NOT NULL, \
                 applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW() \
             )"
        );
        // Concurrent `CREATE TABLE IF NOT EXISTS` races on the catalog; take
        // the step lock first.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(ADVISORY_LOCK_KEY)
            .execute(&mut *tx)
            .await?;
        (&mut *tx).execute(sqlx::raw_sql(&query)).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn load_ledger(&self) -> Result<MigrationLedger, SchemaError> {
        let query =
            format!("SELECT version, description, applied_at FROM {LEDGER_TABLE} ORDER BY version");
        let rows = sqlx::query_as::<_, (i64, String, DateTime<Utc>)>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(MigrationLedger::from_entries(rows.into_iter().map(
            |(version, description, applied_at)| LedgerEntry {
                version,
                description,
                applied_at,
            },
        )))
    }

    async fn begin(&self) -> Result<Box<dyn SchemaTransaction>, SchemaError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgSchemaTransaction { tx: Some(tx) }))
    }
}

struct PgSchemaTransaction {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgSchemaTransaction {
    fn conn(&mut self) -> Result<&mut PgConnection, SchemaError> {
        self.tx.as_deref_mut().ok_or(SchemaError::TransactionClosed)
    }
}

#[async_trait]
impl SchemaTransaction for PgSchemaTransaction {
    async fn lock(&mut self) -> Result<(), SchemaError> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(ADVISORY_LOCK_KEY)
            .execute(self.conn()?)
            .await?;
        Ok(())
    }

    async fn is_recorded(&mut self, version: i64) -> Result<bool, SchemaError> {
        let query = format!("SELECT EXISTS (SELECT 1 FROM {LEDGER_TABLE} WHERE version = $1)");
        let recorded = sqlx::query_scalar::<_, bool>(&query)
            .bind(version)
            .fetch_one(self.conn()?)
            .await?;
        Ok(recorded)
    }

    async fn table_exists(&mut self, table: &str) -> Result<bool, SchemaError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS ( \
                 SELECT 1 FROM information_schema.tables \
                 WHERE table_schema = current_schema() AND table_name = $1 \
             )",
        )
        .bind(table)
        .fetch_one(self.conn()?)
        .await?;
        Ok(exists)
    }

    async fn column_exists(&mut self, table: &str, column: &str) -> Result<bool, SchemaError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS ( \
                 SELECT 1 FROM information_schema.columns \
                 WHERE table_schema = current_schema() \
                   AND table_name = $1 AND column_name = $2 \
             )",
        )
        .bind(table)
        .bind(column)
        .fetch_one(self.conn()?)
        .await?;
        Ok(exists)
    }

    async fn index_exists(&mut self, table: &str, index: &str) -> Result<bool, SchemaError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS ( \
                 SELECT 1 FROM pg_indexes \
                 WHERE schemaname = current_schema() \
                   AND tablename = $1 AND indexname = $2 \
             )",
        )
        .bind(table)
        .bind(index)
        .fetch_one(self.conn()?)
        .await?;
        Ok(exists)
    }

    async fn apply(&mut self, change: &SchemaChange) -> Result<(), SchemaError> {
        let statement = render(change);
        tracing::debug!(statement = %statement, "Executing DDL");
        self.conn()?.execute(sqlx::raw_sql(&statement)).await?;
        Ok(())
    }

    async fn record(&mut self, step: &MigrationStep) -> Result<(), SchemaError> {
        let query = format!("INSERT INTO {LEDGER_TABLE} (version, description) VALUES ($1, $2)");
        sqlx::query(&query)
            .bind(step.version())
            .bind(step.description())
            .execute(self.conn()?)
            .await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), SchemaError> {
        let tx = self.tx.take().ok_or(SchemaError::TransactionClosed)?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), SchemaError> {
        let tx = self.tx.take().ok_or(SchemaError::TransactionClosed)?;
        tx.rollback().await?;
        Ok(())
    }
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn render_type(column_type: ColumnType) -> String {
    match column_type {
        ColumnType::Varchar(len) => format!("VARCHAR({len})"),
        ColumnType::Text => "TEXT".into(),
        ColumnType::Integer => "INTEGER".into(),
        ColumnType::BigInt => "BIGINT".into(),
        ColumnType::Boolean => "BOOLEAN".into(),
        ColumnType::Uuid => "UUID".into(),
        ColumnType::Timestamp => "TIMESTAMPTZ".into(),
        ColumnType::Json => "JSONB".into(),
    }
}

fn render_column(column: &ColumnDef) -> String {
    let mut sql = format!("{} {}", quote(&column.name), render_type(column.column_type));
    if !column.nullable {
        sql.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(default);
    }
    if column.primary_key {
        sql.push_str(" PRIMARY KEY");
    }
    sql
}

/// Render a change as a single PostgreSQL statement.
pub fn render(change: &SchemaChange) -> String {
    match change {
        SchemaChange::CreateTable { table, columns } => {
            let columns: Vec<String> = columns.iter().map(render_column).collect();
            format!("CREATE TABLE {} ({})", quote(table), columns.join(", "))
        }
        SchemaChange::DropTable { table } => format!("DROP TABLE {}", quote(table)),
        SchemaChange::AddColumn { table, column } => format!(
            "ALTER TABLE {} ADD COLUMN {}",
            quote(table),
            render_column(column)
        ),
        SchemaChange::DropColumn { table, column } => format!(
            "ALTER TABLE {} DROP COLUMN {}",
            quote(table),
            quote(column)
        ),
        SchemaChange::RenameColumn { table, from, to } => format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            quote(table),
            quote(from),
            quote(to)
        ),
        SchemaChange::CreateIndex {
            table,
            index,
            columns,
            unique,
        } => {
            let columns: Vec<String> = columns.iter().map(|c| quote(c)).collect();
            format!(
                "CREATE {}INDEX {} ON {} ({})",
                if *unique { "UNIQUE " } else { "" },
                quote(index),
                quote(table),
                columns.join(", ")
            )
        }
        // Index names are schema-scoped in PostgreSQL; the table only matters to the guard.
        SchemaChange::DropIndex { index, .. } => format!("DROP INDEX {}", quote(index)),
        SchemaChange::Sql(statement) => statement.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_create_table_with_constraints() {
        let change = SchemaChange::create_table(
            "groups",
            vec![
                ColumnDef::new("uuid", ColumnType::Varchar(40)).primary_key(),
                ColumnDef::new("description", ColumnType::Varchar(200)),
                ColumnDef::timestamp_now("created_at"),
            ],
        );
        assert_eq!(
            render(&change),
            "CREATE TABLE \"groups\" (\"uuid\" VARCHAR(40) NOT NULL PRIMARY KEY, \
             \"description\" VARCHAR(200), \
             \"created_at\" TIMESTAMPTZ NOT NULL DEFAULT NOW())"
        );
    }

    #[test]
    fn renders_drop_index_without_table() {
        let change = SchemaChange::drop_index("group_roles", "group_roles_component_uuid");
        assert_eq!(render(&change), "DROP INDEX \"group_roles_component_uuid\"");
    }

    #[test]
    fn renders_unique_multi_column_index() {
        let change =
            SchemaChange::create_unique_index("ce_queue", "uq_ce_queue_x", &["status", "uuid"]);
        assert_eq!(
            render(&change),
            "CREATE UNIQUE INDEX \"uq_ce_queue_x\" ON \"ce_queue\" (\"status\", \"uuid\")"
        );
    }

    #[test]
    fn renders_rename_column() {
        let change = SchemaChange::rename_column("group_roles", "component_uuid", "entity_uuid");
        assert_eq!(
            render(&change),
            "ALTER TABLE \"group_roles\" RENAME COLUMN \"component_uuid\" TO \"entity_uuid\""
        );
    }

    #[test]
    fn quotes_embedded_double_quotes() {
        assert_eq!(quote("we\"ird"), "\"we\"\"ird\"");
    }
}
