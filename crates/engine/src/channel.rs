//! In-process task source backed by a bounded tokio channel.

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use crate::router::DispatchOutcome;
use crate::task::Task;
use crate::worker::{BoxError, TaskSource};

/// Sending half handed to producers.
#[derive(Debug, Clone)]
pub struct TaskSubmitter {
    tx: mpsc::Sender<Task>,
}

impl TaskSubmitter {
    /// Queue a task. Waits while the channel is full.
    pub async fn submit(&self, task: Task) -> Result<Uuid, BoxError> {
        let uuid = task.uuid;
        self.tx
            .send(task)
            .await
            .map_err(|_| "task source has been dropped")?;
        Ok(uuid)
    }
}

/// [`TaskSource`] for tests and single-process setups.
#[derive(Debug)]
pub struct ChannelTaskSource {
    rx: Mutex<mpsc::Receiver<Task>>,
    outcomes: Option<mpsc::Sender<(Uuid, DispatchOutcome)>>,
}

impl ChannelTaskSource {
    pub fn new(capacity: usize) -> (Self, TaskSubmitter) {
        let (tx, rx) = mpsc::channel(capacity);
        let source = Self {
            rx: Mutex::new(rx),
            outcomes: None,
        };
        (source, TaskSubmitter { tx })
    }

    /// Receive `(task uuid, outcome)` for every completed task.
    pub fn subscribe_outcomes(
        &mut self,
        capacity: usize,
    ) -> mpsc::Receiver<(Uuid, DispatchOutcome)> {
        let (tx, rx) = mpsc::channel(capacity);
        self.outcomes = Some(tx);
        rx
    }
}

#[async_trait]
impl TaskSource for ChannelTaskSource {
    async fn next_task(&self) -> Result<Option<Task>, BoxError> {
        // A closed channel simply means no more work.
        Ok(self.rx.lock().await.try_recv().ok())
    }

    async fn complete(&self, task: &Task, outcome: &DispatchOutcome) -> Result<(), BoxError> {
        if let Some(tx) = &self.outcomes {
            if tx.send((task.uuid, outcome.clone())).await.is_err() {
                tracing::debug!(task_uuid = %task.uuid, "Outcome subscriber dropped");
            }
        }
        Ok(())
    }
}
