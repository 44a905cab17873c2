//! Asynchronous task types

use serde::{Deserialize, Serialize};

/// Handle to a long-running server-side task
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskHandle {
    pub id: String,
}

impl TaskHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Task state as reported by `cis/tasks`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Pending,
    Running,
    Blocked,
    Succeeded,
    Failed,
}

impl TaskState {
    /// Whether the task will not change state again
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Task status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInfo {
    pub state: TaskState,
    /// Server-provided failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskInfo {
    #[must_use]
    pub fn new(state: TaskState) -> Self {
        Self { state, error: None }
    }
}
