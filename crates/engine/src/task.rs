use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unit of work waiting for dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub uuid: Uuid,
    pub task_type: String,
    pub payload: serde_json::Value,
    pub submitted_at: DateTime<Utc>,
}

impl Task {
    /// A new task with a fresh time-ordered uuid.
    pub fn new(task_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            uuid: Uuid::now_v7(),
            task_type: task_type.into(),
            payload,
            submitted_at: Utc::now(),
        }
    }
}

/// What a processor hands back on success.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Identifier of the artefact the task produced, if any.
    pub analysis_uuid: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl TaskResult {
    pub fn with_data(data: serde_json::Value) -> Self {
        Self {
            analysis_uuid: None,
            data,
        }
    }
}
