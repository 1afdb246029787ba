//! Supervisor-coordinated workflow over the three worker stages.

mod engine;
mod finalize;
mod state;
mod supervisor;

pub use engine::{WorkflowEngine, WorkflowEngineBuilder};
pub use finalize::resolve_deliverable;
pub use state::{merge, StateMessage, WorkflowState};
pub use supervisor::{rule_decision, Supervisor, SupervisorAction};
