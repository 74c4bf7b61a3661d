use crate::change::SchemaChange;

/// A versioned, immutable schema mutation.
///
/// All changes of a step run in one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStep {
    version: i64,
    description: String,
    changes: Vec<SchemaChange>,
}

impl MigrationStep {
    pub fn new(version: i64, description: impl Into<String>) -> Self {
        Self {
            version,
            description: description.into(),
            changes: Vec::new(),
        }
    }

    pub fn change(mut self, change: SchemaChange) -> Self {
        self.changes.push(change);
        self
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn changes(&self) -> &[SchemaChange] {
        &self.changes
    }
}
