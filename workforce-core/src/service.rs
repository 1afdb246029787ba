//! Task lifecycle service
//!
//! The service owns task creation and workflow launch. Runs are
//! fire-and-forget: progress streams over the task's pub/sub topic and
//! the terminal result lands in the task store. A semaphore bounds
//! concurrent runs and an active set rejects double starts.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore};
use tracing::{error, info, warn};

use crate::error::{Result, WorkforceError};
use crate::pubsub::{task_topic, PubSub, Subscription, TaskEvent};
use crate::store::{MessageStore, TaskStore};
use crate::task::{StoredMessage, Task, TaskStatus};
use crate::workflow::WorkflowEngine;

/// Coordinates task creation, launch, and observation.
#[derive(Clone)]
pub struct TaskService {
    engine: Arc<WorkflowEngine>,
    tasks: Arc<dyn TaskStore>,
    messages: Arc<dyn MessageStore>,
    pubsub: Arc<dyn PubSub>,
    permits: Arc<Semaphore>,
    active: Arc<Mutex<HashSet<String>>>,
}

impl TaskService {
    pub fn new(
        engine: Arc<WorkflowEngine>,
        tasks: Arc<dyn TaskStore>,
        messages: Arc<dyn MessageStore>,
        pubsub: Arc<dyn PubSub>,
        max_concurrent_tasks: usize,
    ) -> Self {
        Self {
            engine,
            tasks,
            messages,
            pubsub,
            permits: Arc::new(Semaphore::new(max_concurrent_tasks.max(1))),
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Create a task in `Created` status.
    pub async fn create_task(&self, title: &str, description: &str) -> Result<Task> {
        if title.trim().is_empty() {
            return Err(WorkforceError::Workflow(
                "task title cannot be empty".to_string(),
            ));
        }
        let task = Task::new(title.trim(), description.trim());
        self.tasks.create(&task).await?;
        info!(task_id = %task.id, title = %task.title, "task created");
        Ok(task)
    }

    pub async fn get_task(&self, task_id: &str) -> Result<Task> {
        self.tasks
            .get(task_id)
            .await?
            .ok_or_else(|| WorkforceError::TaskNotFound(task_id.to_string()))
    }

    /// Conversation history for a task, in append order.
    pub async fn task_messages(&self, task_id: &str) -> Result<Vec<StoredMessage>> {
        self.messages.for_task(task_id).await
    }

    /// Subscribe to a task's live event stream.
    pub async fn subscribe(&self, task_id: &str) -> Result<Subscription> {
        self.pubsub.subscribe(&task_topic(task_id)).await
    }

    /// Launch the workflow for a created task in the background.
    ///
    /// Rejects tasks that are not in `Created` status and tasks that are
    /// already running. The run itself waits for a concurrency permit.
    pub async fn start_task(&self, task_id: &str) -> Result<()> {
        let task = self.get_task(task_id).await?;
        if task.status != TaskStatus::Created {
            return Err(WorkforceError::Workflow(format!(
                "task {} is in status {} and cannot be started",
                task_id, task.status
            )));
        }

        {
            let mut active = self.active.lock().await;
            if !active.insert(task.id.clone()) {
                return Err(WorkforceError::Workflow(format!(
                    "task {} is already running",
                    task_id
                )));
            }
        }

        let service = self.clone();
        tokio::spawn(async move {
            service.run(&task).await;
            service.active.lock().await.remove(&task.id);
        });
        Ok(())
    }

    /// Run a task's workflow to completion and return the terminal
    /// description (deliverable text, or the failure reason). Used by
    /// callers that want to block on the result.
    pub async fn run_task(&self, task_id: &str) -> Result<String> {
        let task = self.get_task(task_id).await?;
        if task.status != TaskStatus::Created {
            return Err(WorkforceError::Workflow(format!(
                "task {} is in status {} and cannot be started",
                task_id, task.status
            )));
        }
        let _permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| WorkforceError::Workflow("service is shutting down".to_string()))?;
        self.engine.process(&task).await
    }

    async fn run(&self, task: &Task) {
        let permit = match self.permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                warn!(task_id = %task.id, "service shutting down, task not started");
                return;
            }
        };

        if let Err(err) = self.engine.process(task).await {
            // Persistence failed mid-run; make a best effort to leave a
            // terminal status behind.
            error!(task_id = %task.id, error = %err, "workflow run failed");
            if let Err(status_err) = self.tasks.set_status(&task.id, TaskStatus::Failed).await {
                error!(task_id = %task.id, error = %status_err, "could not mark task failed");
            }
            let event = TaskEvent::error(&task.id, &err.to_string());
            if let Err(publish_err) = self.pubsub.publish(&task_topic(&task.id), event).await {
                warn!(task_id = %task.id, error = %publish_err, "could not publish failure");
            }
        }
        drop(permit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::StubProvider;
    use crate::pubsub::{EventKind, LocalPubSub};
    use crate::store::{InMemoryMessageStore, InMemoryTaskStore};

    fn service() -> TaskService {
        let tasks = Arc::new(InMemoryTaskStore::new());
        let messages = Arc::new(InMemoryMessageStore::new());
        let pubsub = Arc::new(LocalPubSub::new());
        let engine = WorkflowEngine::builder()
            .llm(Arc::new(StubProvider))
            .task_store(tasks.clone())
            .message_store(messages.clone())
            .pubsub(pubsub.clone())
            .build()
            .unwrap();
        TaskService::new(Arc::new(engine), tasks, messages, pubsub, 2)
    }

    #[tokio::test]
    async fn test_create_task_rejects_empty_title() {
        let service = service();
        assert!(service.create_task("  ", "description").await.is_err());
    }

    #[tokio::test]
    async fn test_start_requires_created_status() {
        let service = service();
        let task = service.create_task("Title", "Description").await.unwrap();

        // Run it to a terminal status, then try to start it again.
        service.run_task(&task.id).await.unwrap();
        let stored = service.get_task(&task.id).await.unwrap();
        assert_ne!(stored.status, TaskStatus::Created);

        let err = service.start_task(&task.id).await.unwrap_err();
        assert!(err.to_string().contains("cannot be started"));
    }

    #[tokio::test]
    async fn test_start_unknown_task_fails() {
        let service = service();
        assert!(matches!(
            service.start_task("missing").await,
            Err(WorkforceError::TaskNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_background_run_reaches_terminal_status() {
        let service = service();
        let task = service.create_task("Title", "Description").await.unwrap();
        let mut sub = service.subscribe(&task.id).await.unwrap();

        service.start_task(&task.id).await.unwrap();

        // Offline run degrades at every stage and ends in an error event.
        loop {
            let event = sub.recv().await.expect("stream stays open during the run");
            match event.kind {
                EventKind::Error | EventKind::TaskCompleted => break,
                _ => {}
            }
        }
        let stored = service.get_task(&task.id).await.unwrap();
        assert_eq!(stored.status, TaskStatus::Failed);

        // History survived the run.
        let messages = service.task_messages(&task.id).await.unwrap();
        assert!(!messages.is_empty());
    }

    #[tokio::test]
    async fn test_double_start_rejected() {
        let service = service();
        let task = service.create_task("Title", "Description").await.unwrap();

        service.start_task(&task.id).await.unwrap();
        // Whichever guard fires first, the second start must fail.
        assert!(service.start_task(&task.id).await.is_err());
    }
}
