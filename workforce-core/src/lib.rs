//! # Workforce
//!
//! A supervisor-coordinated multi-agent workflow engine. A task moves
//! through three specialized stages (research, writing, and analysis)
//! under a deterministic supervisor, producing a text deliverable with a
//! persisted conversation history and a live progress event stream.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use workforce_core::llm::StubProvider;
//! use workforce_core::pubsub::LocalPubSub;
//! use workforce_core::store::{InMemoryMessageStore, InMemoryTaskStore};
//! use workforce_core::service::TaskService;
//! use workforce_core::workflow::WorkflowEngine;
//!
//! # async fn run() -> workforce_core::error::Result<()> {
//! let tasks = Arc::new(InMemoryTaskStore::new());
//! let messages = Arc::new(InMemoryMessageStore::new());
//! let pubsub = Arc::new(LocalPubSub::new());
//!
//! let engine = WorkflowEngine::builder()
//!     .llm(Arc::new(StubProvider))
//!     .task_store(tasks.clone())
//!     .message_store(messages.clone())
//!     .pubsub(pubsub.clone())
//!     .build()?;
//!
//! let service = TaskService::new(Arc::new(engine), tasks, messages, pubsub, 5);
//! let task = service.create_task("Market overview", "Survey the field").await?;
//! let deliverable = service.run_task(&task.id).await?;
//! println!("{deliverable}");
//! # Ok(())
//! # }
//! ```

pub mod agents;
pub mod config;
pub mod error;
pub mod llm;
pub mod pubsub;
pub mod search;
pub mod service;
pub mod store;
pub mod task;
pub mod workflow;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commonly used types.
pub mod prelude {
    pub use crate::config::WorkforceConfig;
    pub use crate::error::{Result, WorkforceError};
    pub use crate::pubsub::{task_topic, EventKind, LocalPubSub, PubSub, TaskEvent};
    pub use crate::service::TaskService;
    pub use crate::store::{
        InMemoryMessageStore, InMemoryTaskStore, MessageStore, TaskStore,
    };
    pub use crate::task::{AgentRole, StoredMessage, Task, TaskStatus};
    pub use crate::workflow::{WorkflowEngine, WorkflowState};
}
