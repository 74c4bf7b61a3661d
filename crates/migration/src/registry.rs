use std::collections::BTreeMap;

use crate::error::MigrationError;
use crate::step::MigrationStep;

/// Ordered catalog of migration steps keyed by version.
#[derive(Debug, Default, Clone)]
pub struct MigrationRegistry {
    steps: BTreeMap<i64, MigrationStep>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a step. Fails if its version is already taken.
    pub fn register(&mut self, step: MigrationStep) -> Result<(), MigrationError> {
        if let Some(existing) = self.steps.get(&step.version()) {
            return Err(MigrationError::DuplicateVersion {
                version: step.version(),
                existing: existing.description().to_string(),
                duplicate: step.description().to_string(),
            });
        }
        self.steps.insert(step.version(), step);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, step: MigrationStep) -> Result<Self, MigrationError> {
        self.register(step)?;
        Ok(self)
    }

    /// Steps in ascending version order.
    pub fn steps(&self) -> impl Iterator<Item = &MigrationStep> {
        self.steps.values()
    }

    pub fn get(&self, version: i64) -> Option<&MigrationStep> {
        self.steps.get(&version)
    }

    pub fn latest_version(&self) -> Option<i64> {
        self.steps.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
