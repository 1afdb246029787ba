//! In-memory store implementations
//!
//! Backed by `tokio::sync::RwLock`, suitable for tests and single-process
//! deployments. Each call takes the lock once, so individual mutations are
//! atomic as the store traits require.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Result, WorkforceError};
use crate::task::{AgentRole, StoredMessage, Task, TaskStatus};

use super::{MessageStore, TaskStore};

/// In-memory task store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<HashMap<String, Task>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn get(&self, task_id: &str) -> Result<Option<Task>> {
        Ok(self.tasks.read().await.get(task_id).cloned())
    }

    async fn create(&self, task: &Task) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            return Err(WorkforceError::Store(format!(
                "task {} already exists",
                task.id
            )));
        }
        tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn set_status(&self, task_id: &str, status: TaskStatus) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| WorkforceError::TaskNotFound(task_id.to_string()))?;
        task.status = status;
        task.updated_at = Utc::now();
        Ok(())
    }

    async fn set_deliverable(&self, task_id: &str, text: &str) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| WorkforceError::TaskNotFound(task_id.to_string()))?;
        task.deliverable = Some(text.to_string());
        task.updated_at = Utc::now();
        Ok(())
    }
}

/// In-memory message store with per-task ordinal assignment.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMessageStore {
    messages: Arc<RwLock<HashMap<String, Vec<StoredMessage>>>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(
        &self,
        task_id: &str,
        role: AgentRole,
        content: &str,
    ) -> Result<StoredMessage> {
        let mut messages = self.messages.write().await;
        let entries = messages.entry(task_id.to_string()).or_default();
        let message = StoredMessage {
            id: Uuid::new_v4().to_string(),
            task_id: task_id.to_string(),
            role,
            content: content.to_string(),
            ordinal: entries.len() as u64,
            created_at: Utc::now(),
        };
        entries.push(message.clone());
        Ok(message)
    }

    async fn for_task(&self, task_id: &str) -> Result<Vec<StoredMessage>> {
        Ok(self
            .messages
            .read()
            .await
            .get(task_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_task_lifecycle() {
        let store = InMemoryTaskStore::new();
        let task = Task::new("title", "description");
        store.create(&task).await.unwrap();

        store
            .set_status(&task.id, TaskStatus::InProgress)
            .await
            .unwrap();
        store.set_deliverable(&task.id, "done").await.unwrap();

        let stored = store.get(&task.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::InProgress);
        assert_eq!(stored.deliverable.as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn test_duplicate_create_rejected() {
        let store = InMemoryTaskStore::new();
        let task = Task::new("title", "description");
        store.create(&task).await.unwrap();
        assert!(store.create(&task).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_task_status_update() {
        let store = InMemoryTaskStore::new();
        let err = store
            .set_status("missing", TaskStatus::Failed)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkforceError::TaskNotFound(_)));
    }

    #[tokio::test]
    async fn test_message_ordinals_are_sequential() {
        let store = InMemoryMessageStore::new();

        let first = store
            .append("t1", AgentRole::Researcher, "starting")
            .await
            .unwrap();
        let second = store
            .append("t1", AgentRole::Writer, "drafting")
            .await
            .unwrap();
        // Other tasks get independent ordinals
        let other = store
            .append("t2", AgentRole::Analyst, "reviewing")
            .await
            .unwrap();

        assert_eq!(first.ordinal, 0);
        assert_eq!(second.ordinal, 1);
        assert_eq!(other.ordinal, 0);

        let messages = store.for_task("t1").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "starting");
        assert_eq!(messages[1].content, "drafting");
    }
}
