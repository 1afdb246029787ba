//! Persisted task and message entities
//!
//! A task is created by the API layer in `Created` status. The workflow
//! engine owns the status for the duration of a run: it moves the task to
//! `InProgress` at start and to exactly one of `Completed` or `Failed` at
//! the end. No other component writes the status while a run is active.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Created,
    InProgress,
    Completed,
    Failed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Created => "created",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A user-submitted unit of work, tracked to completion or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,

    /// Final output produced by the workflow, set on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deliverable: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new task in `Created` status.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: description.into(),
            status: TaskStatus::Created,
            deliverable: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Role attached to a conversation message or notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Researcher,
    Writer,
    Analyst,
    Supervisor,
    Human,
    System,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Researcher => "researcher",
            AgentRole::Writer => "writer",
            AgentRole::Analyst => "analyst",
            AgentRole::Supervisor => "supervisor",
            AgentRole::Human => "human",
            AgentRole::System => "system",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted, role-tagged conversation entry for a task.
///
/// Messages are append-only and ordered by the store-assigned ordinal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub task_id: String,
    pub role: AgentRole,
    pub content: String,

    /// Store-assigned position within the task conversation.
    pub ordinal: u64,

    pub created_at: DateTime<Utc>,
}
