//! Polling worker that pulls tasks from a [`TaskSource`] and dispatches them
//! through a [`TaskRouter`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::router::{DispatchOutcome, TaskRouter};
use crate::task::Task;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Default polling interval for the worker loop.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Where tasks come from and where their outcomes go.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Claim the next task, or `None` when nothing is waiting.
    async fn next_task(&self) -> Result<Option<Task>, BoxError>;

    /// Persist the terminal outcome of a claimed task.
    async fn complete(&self, task: &Task, outcome: &DispatchOutcome) -> Result<(), BoxError>;
}

/// Counters accumulated over the lifetime of [`TaskWorker::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub succeeded: u64,
    pub failed: u64,
    pub unhandled: u64,
}

impl WorkerStats {
    fn record(&mut self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Succeeded { .. } => self.succeeded += 1,
            DispatchOutcome::Failed(_) => self.failed += 1,
            DispatchOutcome::NoHandler => self.unhandled += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.succeeded + self.failed + self.unhandled
    }
}

/// A single long-lived loop. On every tick it drains the source until it
/// reports no more work.
pub struct TaskWorker<S> {
    router: Arc<TaskRouter>,
    source: S,
    poll_interval: Duration,
}

impl<S: TaskSource> TaskWorker<S> {
    pub fn new(router: Arc<TaskRouter>, source: S) -> Self {
        Self {
            router,
            source,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run until the cancellation token is triggered.
    pub async fn run(&self, cancel: CancellationToken) -> WorkerStats {
        let mut stats = WorkerStats::default();
        let mut ticker = tokio::time::interval(self.poll_interval);
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            task_types = ?self.router.handled_task_types(),
            "Task worker started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(
                        succeeded = stats.succeeded,
                        failed = stats.failed,
                        unhandled = stats.unhandled,
                        "Task worker shutting down",
                    );
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.drain(&mut stats, &cancel).await {
                        tracing::error!(error = %e, "Worker cycle failed");
                    }
                }
            }
        }

        stats
    }

    /// Process every waiting task. Stops early on cancellation.
    async fn drain(
        &self,
        stats: &mut WorkerStats,
        cancel: &CancellationToken,
    ) -> Result<(), BoxError> {
        while !cancel.is_cancelled() {
            let Some(task) = self.source.next_task().await? else {
                break;
            };

            let outcome = self.router.dispatch(&task).await;
            stats.record(&outcome);
            self.source.complete(&task, &outcome).await?;
        }
        Ok(())
    }
}
