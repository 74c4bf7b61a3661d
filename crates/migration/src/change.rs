//! Structural schema changes and their live-schema guards.

use crate::backend::SchemaTransaction;
use crate::error::SchemaError;

/// Column types understood by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Varchar(u32),
    Text,
    Integer,
    BigInt,
    Boolean,
    Uuid,
    Timestamp,
    Json,
}

/// A column definition used by [`SchemaChange::CreateTable`] and
/// [`SchemaChange::AddColumn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
    /// Raw SQL default expression, e.g. `NOW()`.
    pub default: Option<String>,
}

impl ColumnDef {
    /// A nullable column without default.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            primary_key: false,
            default: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Primary key columns are implicitly `NOT NULL`.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn default_expr(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    /// `created_at` / `updated_at` style column: `TIMESTAMPTZ NOT NULL DEFAULT NOW()`.
    pub fn timestamp_now(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Timestamp)
            .not_null()
            .default_expr("NOW()")
    }
}

/// One structural operation inside a [`MigrationStep`](crate::MigrationStep).
///
/// Every variant except [`SchemaChange::Sql`] can tell whether the live schema
/// already reflects it; the runner skips satisfied changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaChange {
    CreateTable {
        table: String,
        columns: Vec<ColumnDef>,
    },
    DropTable {
        table: String,
    },
    AddColumn {
        table: String,
        column: ColumnDef,
    },
    DropColumn {
        table: String,
        column: String,
    },
    RenameColumn {
        table: String,
        from: String,
        to: String,
    },
    CreateIndex {
        table: String,
        index: String,
        columns: Vec<String>,
        unique: bool,
    },
    DropIndex {
        table: String,
        index: String,
    },
    /// Raw statement. Not guarded, so it must be safe to run more than once.
    Sql(String),
}

impl SchemaChange {
    pub fn create_table(table: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        SchemaChange::CreateTable {
            table: table.into(),
            columns,
        }
    }

    pub fn drop_table(table: impl Into<String>) -> Self {
        SchemaChange::DropTable {
            table: table.into(),
        }
    }

    pub fn add_column(table: impl Into<String>, column: ColumnDef) -> Self {
        SchemaChange::AddColumn {
            table: table.into(),
            column,
        }
    }

    pub fn drop_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        SchemaChange::DropColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn rename_column(
        table: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        SchemaChange::RenameColumn {
            table: table.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn create_index(
        table: impl Into<String>,
        index: impl Into<String>,
        columns: &[&str],
    ) -> Self {
        SchemaChange::CreateIndex {
            table: table.into(),
            index: index.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique: false,
        }
    }

    pub fn create_unique_index(
        table: impl Into<String>,
        index: impl Into<String>,
        columns: &[&str],
    ) -> Self {
        SchemaChange::CreateIndex {
            table: table.into(),
            index: index.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique: true,
        }
    }

    pub fn drop_index(table: impl Into<String>, index: impl Into<String>) -> Self {
        SchemaChange::DropIndex {
            table: table.into(),
            index: index.into(),
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> String {
        match self {
            SchemaChange::CreateTable { table, .. } => format!("create table {table}"),
            SchemaChange::DropTable { table } => format!("drop table {table}"),
            SchemaChange::AddColumn { table, column } => {
                format!("add column {}.{}", table, column.name)
            }
            SchemaChange::DropColumn { table, column } => format!("drop column {table}.{column}"),
            SchemaChange::RenameColumn { table, from, to } => {
                format!("rename column {table}.{from} to {to}")
            }
            SchemaChange::CreateIndex { table, index, .. } => {
                format!("create index {index} on {table}")
            }
            SchemaChange::DropIndex { table, index } => format!("drop index {index} on {table}"),
            SchemaChange::Sql(_) => "raw sql".to_string(),
        }
    }

    /// Whether the live schema already reflects this change.
    ///
    /// A rename is satisfied when only the target column exists. It is an
    /// error when both exist or neither does, since the schema has drifted
    /// into a state no step produces.
    pub async fn is_satisfied(&self, tx: &mut dyn SchemaTransaction) -> Result<bool, SchemaError> {
        match self {
            SchemaChange::CreateTable { table, .. } => tx.table_exists(table).await,
            SchemaChange::DropTable { table } => Ok(!tx.table_exists(table).await?),
            SchemaChange::AddColumn { table, column } => {
                tx.column_exists(table, &column.name).await
            }
            SchemaChange::DropColumn { table, column } => {
                Ok(!tx.column_exists(table, column).await?)
            }
            SchemaChange::RenameColumn { table, from, to } => {
                let has_from = tx.column_exists(table, from).await?;
                let has_to = tx.column_exists(table, to).await?;
                match (has_from, has_to) {
                    (true, false) => Ok(false),
                    (false, true) => Ok(true),
                    (true, true) => Err(SchemaError::RenameConflict {
                        table: table.clone(),
                        from: from.clone(),
                        to: to.clone(),
                    }),
                    (false, false) => Err(SchemaError::MissingColumn {
                        table: table.clone(),
                        column: from.clone(),
                    }),
                }
            }
            SchemaChange::CreateIndex { table, index, .. } => tx.index_exists(table, index).await,
            SchemaChange::DropIndex { table, index } => {
                Ok(!tx.index_exists(table, index).await?)
            }
            SchemaChange::Sql(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_key_implies_not_null() {
        let col = ColumnDef::new("uuid", ColumnType::Varchar(40)).primary_key();
        assert!(col.primary_key);
        assert!(!col.nullable);
    }

    #[test]
    fn labels_name_the_target() {
        let change = SchemaChange::drop_index("group_roles", "group_roles_component_uuid");
        assert_eq!(
            change.label(),
            "drop index group_roles_component_uuid on group_roles"
        );
    }
}
