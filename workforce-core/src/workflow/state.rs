//! Workflow state and the merge fold
//!
//! State is an immutable value threaded through the run loop. Each step
//! result is folded in with [`merge`], which is pure: same state and
//! outcome always give the same next state, and repeated merges of the
//! same outcome are idempotent apart from the appended summary message.

use serde::{Deserialize, Serialize};

use crate::agents::{AgentContext, AnalystOutput, ResearchOutput, StepOutcome, WriterOutput};
use crate::task::{AgentRole, Task};

/// One entry in the workflow's in-state conversation log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateMessage {
    pub role: AgentRole,
    pub content: String,
}

/// The full working state of one task's workflow run.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WorkflowState {
    pub task_id: String,
    pub task_title: String,
    pub task_description: String,

    pub research_output: Option<ResearchOutput>,
    pub writer_output: Option<WriterOutput>,
    pub analyst_output: Option<AnalystOutput>,

    /// Set only from a non-empty analyst deliverable.
    pub final_deliverable: Option<String>,

    /// Engine-level failure description, when a step invocation itself
    /// failed rather than degrading internally.
    pub error: Option<String>,

    pub messages: Vec<StateMessage>,
}

impl WorkflowState {
    pub fn for_task(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            task_title: task.title.clone(),
            task_description: task.description.clone(),
            ..Self::default()
        }
    }

    /// Projection of this state that the next worker agent may read.
    pub fn agent_context(&self) -> AgentContext {
        AgentContext {
            task_title: self.task_title.clone(),
            task_description: self.task_description.clone(),
            research: self.research_output.clone(),
            writing: self.writer_output.clone(),
        }
    }
}

/// Fold one step outcome into the state.
///
/// Sets the output slot for the step's stage (last write wins), appends a
/// summary message for the stage, and, for analysis outcomes only,
/// promotes a non-empty deliverable into `final_deliverable`. A `Failed`
/// outcome leaves its output slot unset and records a role-prefixed
/// error instead.
pub fn merge(state: &WorkflowState, outcome: StepOutcome) -> WorkflowState {
    let mut next = state.clone();
    let role = outcome.role();
    let summary = match outcome {
        StepOutcome::Research(output) => {
            let summary = format!(
                "Research complete: {} sources from {} queries.",
                output.sources_found,
                output.search_queries.len()
            );
            next.research_output = Some(output);
            summary
        }
        StepOutcome::Writing(output) => {
            let summary = match &output.metadata {
                Some(metadata) => format!(
                    "Draft complete: {} words in {} sections.",
                    metadata.word_count, metadata.sections
                ),
                None => "Drafting finished without a usable draft.".to_string(),
            };
            next.writer_output = Some(output);
            summary
        }
        StepOutcome::Analysis(output) => {
            let summary = if output.deliverable.is_empty() {
                "Analysis finished without a deliverable.".to_string()
            } else {
                format!(
                    "Analysis complete. Overall quality: {}/10.",
                    output.assessment.overall.score
                )
            };
            if !output.deliverable.is_empty() {
                next.final_deliverable = Some(output.deliverable.clone());
            }
            next.analyst_output = Some(output);
            summary
        }
        StepOutcome::Failed { role, error } => {
            next.error = Some(format!("{} step failed: {}", stage_name(role), error));
            format!("{} step failed.", stage_name(role))
        }
    };
    next.messages.push(StateMessage {
        role,
        content: summary,
    });
    next
}

fn stage_name(role: AgentRole) -> &'static str {
    match role {
        AgentRole::Researcher => "Researcher",
        AgentRole::Writer => "Writer",
        AgentRole::Analyst => "Analyst",
        AgentRole::Supervisor => "Supervisor",
        AgentRole::Human => "Human",
        AgentRole::System => "System",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::QualityAssessment;

    fn base_state() -> WorkflowState {
        WorkflowState {
            task_id: "t1".to_string(),
            task_title: "Title".to_string(),
            task_description: "Description".to_string(),
            ..WorkflowState::default()
        }
    }

    #[test]
    fn test_merge_is_pure() {
        let state = base_state();
        let outcome = StepOutcome::Research(ResearchOutput {
            sources_found: 3,
            ..ResearchOutput::default()
        });
        let a = merge(&state, outcome.clone());
        let b = merge(&state, outcome);
        assert_eq!(a, b);
        assert!(state.research_output.is_none());
        assert_eq!(a.research_output.as_ref().map(|r| r.sources_found), Some(3));
        assert_eq!(a.messages.len(), 1);
    }

    #[test]
    fn test_merge_last_write_wins() {
        let state = base_state();
        let first = merge(
            &state,
            StepOutcome::Research(ResearchOutput {
                sources_found: 1,
                ..ResearchOutput::default()
            }),
        );
        let second = merge(
            &first,
            StepOutcome::Research(ResearchOutput {
                sources_found: 7,
                ..ResearchOutput::default()
            }),
        );
        assert_eq!(
            second.research_output.as_ref().map(|r| r.sources_found),
            Some(7)
        );
        assert_eq!(second.messages.len(), 2);
    }

    #[test]
    fn test_analysis_promotes_nonempty_deliverable() {
        let state = base_state();
        let merged = merge(
            &state,
            StepOutcome::Analysis(AnalystOutput {
                deliverable: "final text".to_string(),
                refined_content: "final text".to_string(),
                assessment: QualityAssessment::default(),
                summary: String::new(),
                error: None,
            }),
        );
        assert_eq!(merged.final_deliverable.as_deref(), Some("final text"));
    }

    #[test]
    fn test_empty_analyst_deliverable_not_promoted() {
        let state = base_state();
        let merged = merge(
            &state,
            StepOutcome::Analysis(AnalystOutput::degraded("no draft", None)),
        );
        assert!(merged.final_deliverable.is_none());
        assert!(merged.analyst_output.is_some());
    }

    #[test]
    fn test_failed_outcome_leaves_slot_unset() {
        let state = base_state();
        let merged = merge(
            &state,
            StepOutcome::Failed {
                role: AgentRole::Writer,
                error: "provider exploded".to_string(),
            },
        );
        assert!(merged.writer_output.is_none());
        assert_eq!(
            merged.error.as_deref(),
            Some("Writer step failed: provider exploded")
        );
        assert_eq!(merged.messages.last().unwrap().content, "Writer step failed.");
    }

    #[test]
    fn test_context_sees_prior_stages_only() {
        let state = base_state();
        let merged = merge(
            &state,
            StepOutcome::Research(ResearchOutput {
                synthesis: "findings".to_string(),
                ..ResearchOutput::default()
            }),
        );
        let context = merged.agent_context();
        assert_eq!(context.research_synthesis(), "findings");
        assert!(context.writing.is_none());
    }
}
