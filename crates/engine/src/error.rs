use uuid::Uuid;

/// Startup configuration errors. Any of these must stop the process.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Task type '{task_type}' is handled by both '{first}' and '{second}'")]
    DuplicateHandler {
        task_type: String,
        first: String,
        second: String,
    },
}

/// A processor returned an error or panicked while handling a task.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Processing of task {task_uuid} ({task_type}) failed: {cause}")]
pub struct ProcessingFailed {
    pub task_uuid: Uuid,
    pub task_type: String,
    pub processor: String,
    pub cause: String,
}
