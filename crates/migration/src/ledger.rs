use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// One applied migration, as recorded in `schema_migrations`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub version: i64,
    pub description: String,
    pub applied_at: DateTime<Utc>,
}

/// Snapshot of the persistent migration history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationLedger {
    entries: BTreeMap<i64, LedgerEntry>,
}

impl MigrationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = LedgerEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.version, e)).collect(),
        }
    }

    pub fn contains(&self, version: i64) -> bool {
        self.entries.contains_key(&version)
    }

    pub fn insert(&mut self, entry: LedgerEntry) {
        self.entries.insert(entry.version, entry);
    }

    pub fn get(&self, version: i64) -> Option<&LedgerEntry> {
        self.entries.get(&version)
    }

    pub fn versions(&self) -> Vec<i64> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
