//! Task event format published to subscribers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::task::AgentRole;

/// Kind of event published on a task topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TaskStarted,
    AgentMessage,
    TaskCompleted,
    Error,
}

/// A progress event for a task, published to live observers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskEvent {
    pub task_id: String,
    pub kind: EventKind,

    /// Event payload (JSON). For `AgentMessage` this carries the
    /// narrating role and text content.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,

    /// Message ID for deduplication.
    #[serde(default)]
    pub event_id: Option<Uuid>,
}

impl TaskEvent {
    pub fn new(task_id: impl Into<String>, kind: EventKind, payload: serde_json::Value) -> Self {
        Self {
            task_id: task_id.into(),
            kind,
            payload,
            timestamp: Utc::now(),
            event_id: Some(Uuid::new_v4()),
        }
    }

    /// Event announcing that a task entered the workflow.
    pub fn task_started(task_id: &str, title: &str, description: &str) -> Self {
        Self::new(
            task_id,
            EventKind::TaskStarted,
            serde_json::json!({
                "id": task_id,
                "title": title,
                "description": description,
            }),
        )
    }

    /// Event carrying one agent narration message.
    pub fn agent_message(task_id: &str, role: AgentRole, content: &str) -> Self {
        Self::new(
            task_id,
            EventKind::AgentMessage,
            serde_json::json!({
                "agent_role": role.as_str(),
                "content": content,
            }),
        )
    }

    /// Event announcing successful completion with the deliverable text.
    pub fn task_completed(task_id: &str, deliverable: &str) -> Self {
        Self::new(
            task_id,
            EventKind::TaskCompleted,
            serde_json::json!({ "deliverable": deliverable }),
        )
    }

    /// Event announcing a task-level error.
    pub fn error(task_id: &str, message: &str) -> Self {
        Self::new(
            task_id,
            EventKind::Error,
            serde_json::json!({ "error": message }),
        )
    }
}
