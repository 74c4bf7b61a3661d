/// Errors raised while building the migration catalog or running it.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Two steps share a version. Fatal at startup.
    #[error("Migration version {version} is registered twice ('{existing}' and '{duplicate}')")]
    DuplicateVersion {
        version: i64,
        existing: String,
        duplicate: String,
    },

    /// A step failed; its transaction was rolled back and later steps were not attempted.
    #[error("Migration {version} ({description}) failed: {source}")]
    Mutation {
        version: i64,
        description: String,
        #[source]
        source: SchemaError,
    },

    /// The ledger table could not be created or read.
    #[error("Migration ledger unavailable: {0}")]
    Ledger(#[source] SchemaError),
}

/// Errors raised by a schema backend.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("Table '{0}' does not exist")]
    MissingTable(String),

    #[error("Table '{0}' already exists")]
    TableExists(String),

    #[error("Column '{column}' does not exist on table '{table}'")]
    MissingColumn { table: String, column: String },

    #[error("Column '{column}' already exists on table '{table}'")]
    ColumnExists { table: String, column: String },

    #[error("Index '{0}' does not exist")]
    MissingIndex(String),

    #[error("Index '{0}' already exists")]
    IndexExists(String),

    #[error("Cannot rename '{from}' to '{to}' on table '{table}': both columns exist")]
    RenameConflict {
        table: String,
        from: String,
        to: String,
    },

    #[error("Statement rejected: {0}")]
    Rejected(String),

    #[error("Transaction already finished")]
    TransactionClosed,
}
