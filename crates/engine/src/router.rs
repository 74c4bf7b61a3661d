//! Task type -> processor routing.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;

use crate::error::{EngineError, ProcessingFailed};
use crate::processor::TaskProcessor;
use crate::task::{Task, TaskResult};

/// What to do with a task whose type no processor claims.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnhandledTaskPolicy {
    /// Drop it quietly (debug log only).
    #[default]
    Ignore,
    /// Drop it, log a warning and count it in [`TaskRouter::unhandled_count`].
    Report,
}

impl FromStr for UnhandledTaskPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(UnhandledTaskPolicy::Ignore),
            "report" => Ok(UnhandledTaskPolicy::Report),
            other => Err(format!(
                "unknown unhandled task policy '{other}' (expected 'ignore' or 'report')"
            )),
        }
    }
}

/// Terminal state of one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// No processor handles this task type. Not an error.
    NoHandler,
    /// The processor returned normally, with or without a result.
    Succeeded { result: Option<TaskResult> },
    /// The processor returned an error or panicked.
    Failed(ProcessingFailed),
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Succeeded { .. })
    }
}

/// Immutable map from task type to its single processor.
///
/// Safe to share across worker tasks; dispatch takes no locks.
pub struct TaskRouter {
    processors: HashMap<String, Arc<dyn TaskProcessor>>,
    policy: UnhandledTaskPolicy,
    unhandled: AtomicU64,
}

impl std::fmt::Debug for TaskRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRouter")
            .field("task_types", &self.handled_task_types())
            .field("policy", &self.policy)
            .finish()
    }
}

impl TaskRouter {
    /// Build the routing table.
    ///
    /// Processors with no declared types are left out. A type declared by two
    /// different processors fails with [`EngineError::DuplicateHandler`]; the
    /// same processor listed twice is routed once.
    pub fn build(
        processors: Vec<Arc<dyn TaskProcessor>>,
        policy: UnhandledTaskPolicy,
    ) -> Result<Self, EngineError> {
        let mut routes: HashMap<String, Arc<dyn TaskProcessor>> = HashMap::new();

        for processor in processors {
            let task_types = processor.handled_task_types();
            if task_types.is_empty() {
                tracing::debug!(
                    processor = processor.name(),
                    "Processor declares no task type, ignored",
                );
                continue;
            }

            for task_type in task_types {
                if let Some(existing) = routes.get(&task_type) {
                    if Arc::ptr_eq(existing, &processor) {
                        continue;
                    }
                    return Err(EngineError::DuplicateHandler {
                        task_type,
                        first: existing.name().to_string(),
                        second: processor.name().to_string(),
                    });
                }
                routes.insert(task_type, Arc::clone(&processor));
            }
        }

        Ok(Self {
            processors: routes,
            policy,
            unhandled: AtomicU64::new(0),
        })
    }

    /// Routed task types, sorted.
    pub fn handled_task_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.processors.keys().cloned().collect();
        types.sort();
        types
    }

    /// Tasks dropped for lack of a processor under [`UnhandledTaskPolicy::Report`].
    pub fn unhandled_count(&self) -> u64 {
        self.unhandled.load(Ordering::Relaxed)
    }

    /// Route a task to its processor and capture the outcome.
    pub async fn dispatch(&self, task: &Task) -> DispatchOutcome {
        let Some(processor) = self.processors.get(&task.task_type) else {
            self.record_unhandled(task);
            return DispatchOutcome::NoHandler;
        };

        let started = Instant::now();
        let outcome = AssertUnwindSafe(processor.process(task))
            .catch_unwind()
            .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(result)) => {
                tracing::info!(
                    task_uuid = %task.uuid,
                    task_type = %task.task_type,
                    processor = processor.name(),
                    elapsed_ms,
                    has_result = result.is_some(),
                    "Task processed",
                );
                DispatchOutcome::Succeeded { result }
            }
            Ok(Err(err)) => self.failed(task, processor.as_ref(), format!("{err:#}"), elapsed_ms),
            Err(panic) => self.failed(task, processor.as_ref(), panic_message(&*panic), elapsed_ms),
        }
    }

    fn failed(
        &self,
        task: &Task,
        processor: &dyn TaskProcessor,
        cause: String,
        elapsed_ms: u64,
    ) -> DispatchOutcome {
        tracing::error!(
            task_uuid = %task.uuid,
            task_type = %task.task_type,
            processor = processor.name(),
            elapsed_ms,
            error = %cause,
            "Task processing failed",
        );
        DispatchOutcome::Failed(ProcessingFailed {
            task_uuid: task.uuid,
            task_type: task.task_type.clone(),
            processor: processor.name().to_string(),
            cause,
        })
    }

    fn record_unhandled(&self, task: &Task) {
        match self.policy {
            UnhandledTaskPolicy::Ignore => {
                tracing::debug!(
                    task_uuid = %task.uuid,
                    task_type = %task.task_type,
                    "No processor for task type, ignored",
                );
            }
            UnhandledTaskPolicy::Report => {
                let total = self.unhandled.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(
                    task_uuid = %task.uuid,
                    task_type = %task.task_type,
                    unhandled_total = total,
                    "No processor for task type",
                );
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked".to_string()
    }
}
