//! Supervisor routing decisions
//!
//! Routing is deterministic: a fixed precedence over the state's output
//! slots decides the next action. The LLM is consulted for the same
//! decision, but its answer is advisory: an unparseable or divergent
//! reply is corrected to the rule-derived action, which bounds every run
//! at one visit per stage.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, warn};

use super::state::WorkflowState;
use crate::agents::prompts::SUPERVISOR_SYSTEM_PROMPT;
use crate::llm::{LLMConfig, LLMProvider};

/// Next action chosen by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorAction {
    Researcher,
    Writer,
    Analyst,
    Finalize,
    /// Abort without finalizing. Reserved for a decision mechanism that
    /// cannot produce any valid action; the precedence rule always can,
    /// so this is never chosen in normal operation.
    End,
}

impl SupervisorAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupervisorAction::Researcher => "researcher",
            SupervisorAction::Writer => "writer",
            SupervisorAction::Analyst => "analyst",
            SupervisorAction::Finalize => "finalize",
            SupervisorAction::End => "end",
        }
    }
}

impl fmt::Display for SupervisorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SupervisorAction {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "researcher" => Ok(SupervisorAction::Researcher),
            "writer" => Ok(SupervisorAction::Writer),
            "analyst" => Ok(SupervisorAction::Analyst),
            "finalize" => Ok(SupervisorAction::Finalize),
            "end" => Ok(SupervisorAction::End),
            _ => Err(()),
        }
    }
}

/// The authoritative routing rule: first stage whose output slot is
/// still empty, in pipeline order; finalize once all three are filled.
pub fn rule_decision(state: &WorkflowState) -> SupervisorAction {
    if state.research_output.is_none() {
        SupervisorAction::Researcher
    } else if state.writer_output.is_none() {
        SupervisorAction::Writer
    } else if state.analyst_output.is_none() {
        SupervisorAction::Analyst
    } else {
        SupervisorAction::Finalize
    }
}

/// Consults the LLM for routing and corrects it against the rule.
pub struct Supervisor {
    llm: Arc<dyn LLMProvider>,
    temperature: f32,
}

impl Supervisor {
    pub fn new(llm: Arc<dyn LLMProvider>, temperature: f32) -> Self {
        Self { llm, temperature }
    }

    /// Decide the next action for the state. Always returns the
    /// rule-derived action; the LLM reply is logged when it diverges.
    pub async fn decide(&self, state: &WorkflowState) -> SupervisorAction {
        let rule = rule_decision(state);

        let prompt = format!(
            "Task: {}\n\nWorkflow progress:\n{}\n\nWhich agent should act next?",
            state.task_title,
            render_progress(state)
        );
        match self
            .llm
            .generate(
                SUPERVISOR_SYSTEM_PROMPT,
                &prompt,
                &LLMConfig::new()
                    .with_temperature(self.temperature)
                    .with_max_tokens(10),
            )
            .await
        {
            Ok(reply) => match reply.parse::<SupervisorAction>() {
                Ok(action) if action == rule => debug!(action = %rule, "supervisor confirmed"),
                Ok(action) => {
                    warn!(proposed = %action, corrected = %rule, "supervisor decision corrected")
                }
                Err(()) => {
                    warn!(reply = %reply.trim(), corrected = %rule, "unparseable supervisor reply")
                }
            },
            Err(err) => debug!(error = %err, action = %rule, "supervisor LLM unavailable"),
        }

        rule
    }
}

fn render_progress(state: &WorkflowState) -> String {
    let stage = |name: &str, done: bool, note: String| {
        if done {
            format!("- {}: complete ({})", name, note)
        } else {
            format!("- {}: pending", name)
        }
    };
    [
        stage(
            "research",
            state.research_output.is_some(),
            state
                .research_output
                .as_ref()
                .map(|r| format!("{} sources", r.sources_found))
                .unwrap_or_default(),
        ),
        stage(
            "writing",
            state.writer_output.is_some(),
            state
                .writer_output
                .as_ref()
                .and_then(|w| w.metadata.as_ref())
                .map(|m| format!("{} words", m.word_count))
                .unwrap_or_else(|| "no draft".to_string()),
        ),
        stage(
            "analysis",
            state.analyst_output.is_some(),
            state
                .analyst_output
                .as_ref()
                .map(|a| format!("overall {}/10", a.assessment.overall.score))
                .unwrap_or_default(),
        ),
    ]
    .join("\n")
}
