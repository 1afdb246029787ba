//! Deliverable resolution at the end of a run.

use super::state::WorkflowState;

/// Resolve the text to deliver for a finished workflow.
///
/// The refined deliverable wins when present and non-empty; otherwise
/// the writer's draft stands in; otherwise there is nothing to deliver
/// and the result is empty.
pub fn resolve_deliverable(state: &WorkflowState) -> String {
    if let Some(deliverable) = &state.final_deliverable {
        if !deliverable.is_empty() {
            return deliverable.clone();
        }
    }
    state
        .writer_output
        .as_ref()
        .map(|w| w.content.clone())
        .unwrap_or_default()
}
