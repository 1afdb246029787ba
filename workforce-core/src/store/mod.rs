//! Task and message persistence traits
//!
//! The workflow engine commits each durable mutation individually (status
//! transition, message append) so a crash mid-run leaves a consistent
//! prefix of progress. Every trait method is atomic per call.

mod memory;

pub use memory::{InMemoryMessageStore, InMemoryTaskStore};

use async_trait::async_trait;

use crate::error::Result;
use crate::task::{AgentRole, StoredMessage, Task, TaskStatus};

/// Durable store for tasks.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Fetch a task by id.
    async fn get(&self, task_id: &str) -> Result<Option<Task>>;

    /// Persist a new task.
    async fn create(&self, task: &Task) -> Result<()>;

    /// Transition the task status.
    async fn set_status(&self, task_id: &str, status: TaskStatus) -> Result<()>;

    /// Persist the final deliverable text.
    async fn set_deliverable(&self, task_id: &str, text: &str) -> Result<()>;
}

/// Durable, append-only store for task conversation messages.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append a message and return it with the store-assigned ordinal.
    async fn append(&self, task_id: &str, role: AgentRole, content: &str)
        -> Result<StoredMessage>;

    /// All messages for a task, in append order.
    async fn for_task(&self, task_id: &str) -> Result<Vec<StoredMessage>>;
}
