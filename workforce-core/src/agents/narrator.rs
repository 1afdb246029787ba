use std::sync::Arc;

use tracing::warn;

use crate::error::Result;
use crate::pubsub::{task_topic, PubSub, TaskEvent};
use crate::store::MessageStore;
use crate::task::AgentRole;

/// Emits agent progress: persists the message first, then publishes a
/// matching event on the task topic.
///
/// Persistence failures propagate: a message that was never stored must
/// not be announced. Publish failures are logged and swallowed; live
/// notification is best-effort.
#[derive(Clone)]
pub struct Narrator {
    messages: Arc<dyn MessageStore>,
    pubsub: Arc<dyn PubSub>,
}

impl Narrator {
    pub fn new(messages: Arc<dyn MessageStore>, pubsub: Arc<dyn PubSub>) -> Self {
        Self { messages, pubsub }
    }

    /// Record and announce one progress message for the task.
    pub async fn say(&self, task_id: &str, role: AgentRole, content: &str) -> Result<()> {
        self.messages.append(task_id, role, content).await?;

        let event = TaskEvent::agent_message(task_id, role, content);
        if let Err(err) = self.pubsub.publish(&task_topic(task_id), event).await {
            warn!(task_id, %role, error = %err, "failed to publish agent message");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pubsub::{EventKind, LocalPubSub};
    use crate::store::InMemoryMessageStore;

    #[tokio::test]
    async fn test_persists_before_publishing() {
        let messages = Arc::new(InMemoryMessageStore::new());
        let pubsub = Arc::new(LocalPubSub::new());
        let mut sub = pubsub.subscribe(&task_topic("t1")).await.unwrap();

        let narrator = Narrator::new(messages.clone(), pubsub.clone());
        narrator
            .say("t1", AgentRole::Researcher, "Starting research")
            .await
            .unwrap();

        let stored = messages.for_task("t1").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].content, "Starting research");

        let event = sub.recv().await.unwrap();
        assert_eq!(event.kind, EventKind::AgentMessage);
        assert_eq!(event.payload["agent_role"], "researcher");
    }

    #[tokio::test]
    async fn test_no_subscribers_is_not_an_error() {
        let narrator = Narrator::new(
            Arc::new(InMemoryMessageStore::new()),
            Arc::new(LocalPubSub::new()),
        );
        narrator
            .say("t2", AgentRole::Writer, "Drafting")
            .await
            .unwrap();
    }
}
