//! Pub/sub channel for streaming task progress
//!
//! Notifications are best-effort: losing one must never affect persisted
//! state or workflow progress. Within a task topic, events are delivered
//! in emission order because the workflow emits them from a strictly
//! sequential loop.

mod event;
mod local;

pub use event::{EventKind, TaskEvent};
pub use local::{LocalPubSub, Subscription};

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::Result;

/// Topic name for a task's event stream.
pub fn task_topic(task_id: &str) -> String {
    format!("task.{}", task_id)
}

/// Publish/subscribe channel for task events.
#[async_trait]
pub trait PubSub: Send + Sync + Debug {
    /// Publish an event to a topic. Delivery is best-effort; a publish
    /// with no subscribers is not an error.
    async fn publish(&self, topic: &str, event: TaskEvent) -> Result<()>;

    /// Subscribe to a topic's event stream.
    async fn subscribe(&self, topic: &str) -> Result<Subscription>;
}
