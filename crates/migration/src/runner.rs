//! Applies unapplied steps in version order, one transaction each.

use crate::backend::{MigrationDatabase, SchemaTransaction};
use crate::error::{MigrationError, SchemaError};
use crate::registry::MigrationRegistry;
use crate::step::MigrationStep;

/// What a single step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepOutcome {
    /// At least one change was executed.
    Applied,
    /// Every change was already reflected in the schema; only the ledger was written.
    AlreadySatisfied,
    /// Another runner recorded the version between the ledger read and the lock.
    RecordedConcurrently,
}

/// Summary of a [`MigrationRunner::run`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Versions whose changes were executed.
    pub applied: Vec<i64>,
    /// Versions recorded without executing anything (schema already correct).
    pub satisfied: Vec<i64>,
    /// Versions already present in the ledger.
    pub skipped: Vec<i64>,
}

impl RunReport {
    /// Versions newly written to the ledger by this run.
    pub fn recorded(&self) -> usize {
        self.applied.len() + self.satisfied.len()
    }
}

/// Runs a [`MigrationRegistry`] against a [`MigrationDatabase`].
pub struct MigrationRunner {
    registry: MigrationRegistry,
}

impl MigrationRunner {
    pub fn new(registry: MigrationRegistry) -> Self {
        Self { registry }
    }

    /// Versions registered but not yet in the ledger, ascending. Read-only.
    pub async fn pending(&self, db: &dyn MigrationDatabase) -> Result<Vec<i64>, MigrationError> {
        db.ensure_ledger().await.map_err(MigrationError::Ledger)?;
        let ledger = db.load_ledger().await.map_err(MigrationError::Ledger)?;
        Ok(self
            .registry
            .steps()
            .map(MigrationStep::version)
            .filter(|v| !ledger.contains(*v))
            .collect())
    }

    /// Apply every unapplied step in ascending version order.
    ///
    /// Stops at the first failing step; its transaction is rolled back and
    /// no later step is attempted. Calling `run` again resumes from that step.
    pub async fn run(&self, db: &dyn MigrationDatabase) -> Result<RunReport, MigrationError> {
        db.ensure_ledger().await.map_err(MigrationError::Ledger)?;
        let ledger = db.load_ledger().await.map_err(MigrationError::Ledger)?;

        let mut report = RunReport::default();

        for step in self.registry.steps() {
            if ledger.contains(step.version()) {
                report.skipped.push(step.version());
                continue;
            }

            tracing::info!(
                version = step.version(),
                description = step.description(),
                "Applying migration",
            );

            match self.apply_step(db, step).await? {
                StepOutcome::Applied => report.applied.push(step.version()),
                StepOutcome::AlreadySatisfied => {
                    tracing::info!(
                        version = step.version(),
                        "Schema already up to date, recorded migration without changes",
                    );
                    report.satisfied.push(step.version());
                }
                StepOutcome::RecordedConcurrently => {
                    tracing::info!(
                        version = step.version(),
                        "Migration was recorded by another instance",
                    );
                    report.skipped.push(step.version());
                }
            }
        }

        tracing::info!(
            applied = report.applied.len(),
            satisfied = report.satisfied.len(),
            skipped = report.skipped.len(),
            "Migrations complete",
        );

        Ok(report)
    }

    async fn apply_step(
        &self,
        db: &dyn MigrationDatabase,
        step: &MigrationStep,
    ) -> Result<StepOutcome, MigrationError> {
        let mutation_error = |source: SchemaError| MigrationError::Mutation {
            version: step.version(),
            description: step.description().to_string(),
            source,
        };

        let mut tx = db.begin().await.map_err(mutation_error)?;

        match execute_step(tx.as_mut(), step).await {
            Ok(outcome) => {
                tx.commit().await.map_err(mutation_error)?;
                Ok(outcome)
            }
            Err(err) => {
                tracing::error!(
                    version = step.version(),
                    error = %err,
                    "Migration failed, rolling back",
                );
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(
                        version = step.version(),
                        error = %rollback_err,
                        "Rollback failed",
                    );
                }
                Err(mutation_error(err))
            }
        }
    }
}

async fn execute_step(
    tx: &mut dyn SchemaTransaction,
    step: &MigrationStep,
) -> Result<StepOutcome, SchemaError> {
    tx.lock().await?;

    // The ledger read happened before the lock; re-check under it.
    if tx.is_recorded(step.version()).await? {
        return Ok(StepOutcome::RecordedConcurrently);
    }

    let mut executed = 0usize;
    for change in step.changes() {
        if change.is_satisfied(tx).await? {
            tracing::debug!(
                version = step.version(),
                change = %change.label(),
                "Change already satisfied, skipping",
            );
            continue;
        }
        tracing::debug!(version = step.version(), change = %change.label(), "Executing change");
        tx.apply(change).await?;
        executed += 1;
    }

    tx.record(step).await?;

    if executed == 0 {
        Ok(StepOutcome::AlreadySatisfied)
    } else {
        Ok(StepOutcome::Applied)
    }
}
