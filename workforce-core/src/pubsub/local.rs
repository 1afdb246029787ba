//! Local in-process pub/sub on tokio broadcast channels
//!
//! One broadcast sender per topic. Publishing with no subscribers is a
//! no-op; a lagged subscriber drops old events rather than blocking the
//! publisher, matching the best-effort delivery contract.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use crate::error::{Result, WorkforceError};
use crate::pubsub::{PubSub, TaskEvent};

/// Buffered events retained per topic for slow subscribers.
const TOPIC_BUFFER: usize = 256;

/// In-process pub/sub implementation.
#[derive(Debug, Clone, Default)]
pub struct LocalPubSub {
    topics: Arc<RwLock<HashMap<String, broadcast::Sender<TaskEvent>>>>,
}

impl LocalPubSub {
    pub fn new() -> Self {
        Self::default()
    }

    async fn sender(&self, topic: &str) -> broadcast::Sender<TaskEvent> {
        let mut topics = self.topics.write().await;
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_BUFFER).0)
            .clone()
    }
}

#[async_trait]
impl PubSub for LocalPubSub {
    async fn publish(&self, topic: &str, event: TaskEvent) -> Result<()> {
        if topic.is_empty() {
            return Err(WorkforceError::PubSub(
                "topic name cannot be empty".to_string(),
            ));
        }
        let sender = self.sender(topic).await;
        // A send error only means there are no live subscribers.
        let _ = sender.send(event);
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription> {
        if topic.is_empty() {
            return Err(WorkforceError::PubSub(
                "topic name cannot be empty".to_string(),
            ));
        }
        let sender = self.sender(topic).await;
        Ok(Subscription {
            topic: topic.to_string(),
            receiver: sender.subscribe(),
        })
    }
}

/// An open subscription to a topic's event stream.
pub struct Subscription {
    topic: String,
    receiver: broadcast::Receiver<TaskEvent>,
}

impl Subscription {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Receive the next event. Returns `None` when the topic is closed.
    /// Lagged events are skipped, not treated as errors.
    pub async fn recv(&mut self) -> Option<TaskEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(topic = %self.topic, skipped, "subscriber lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Drain any events that are already buffered, without waiting.
    pub fn drain(&mut self) -> Vec<TaskEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pubsub::{task_topic, EventKind};
    use crate::task::AgentRole;

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let pubsub = LocalPubSub::new();
        pubsub
            .publish("task.t1", TaskEvent::error("t1", "oops"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_events_arrive_in_emission_order() {
        let pubsub = LocalPubSub::new();
        let topic = task_topic("t1");
        let mut sub = pubsub.subscribe(&topic).await.unwrap();

        pubsub
            .publish(&topic, TaskEvent::task_started("t1", "title", "desc"))
            .await
            .unwrap();
        pubsub
            .publish(
                &topic,
                TaskEvent::agent_message("t1", AgentRole::Researcher, "searching"),
            )
            .await
            .unwrap();
        pubsub
            .publish(&topic, TaskEvent::task_completed("t1", "report"))
            .await
            .unwrap();

        assert_eq!(sub.recv().await.unwrap().kind, EventKind::TaskStarted);
        assert_eq!(sub.recv().await.unwrap().kind, EventKind::AgentMessage);
        assert_eq!(sub.recv().await.unwrap().kind, EventKind::TaskCompleted);
    }

    #[tokio::test]
    async fn test_empty_topic_rejected() {
        let pubsub = LocalPubSub::new();
        assert!(pubsub
            .publish("", TaskEvent::error("t1", "oops"))
            .await
            .is_err());
        assert!(pubsub.subscribe("").await.is_err());
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let pubsub = LocalPubSub::new();
        let mut sub = pubsub.subscribe("task.a").await.unwrap();
        pubsub
            .publish("task.b", TaskEvent::error("b", "other task"))
            .await
            .unwrap();
        assert!(sub.drain().is_empty());
    }
}
