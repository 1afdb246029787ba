use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::prompts::ANALYST_SYSTEM_PROMPT;
use super::{
    AgentContext, AnalystOutput, DimensionScore, Narrator, QualityAssessment, StepOutcome,
    WorkerAgent,
};
use crate::error::Result;
use crate::llm::{LLMConfig, LLMProvider};
use crate::task::AgentRole;

/// Reviews the writer's draft, scores it, and produces the refined
/// deliverable. When refinement fails the draft passes through unchanged
/// so a reviewable draft is never lost to a failed review.
pub struct AnalystAgent {
    llm: Arc<dyn LLMProvider>,
    narrator: Narrator,
}

impl AnalystAgent {
    pub fn new(llm: Arc<dyn LLMProvider>, narrator: Narrator) -> Self {
        Self { llm, narrator }
    }

    /// Score the draft on the fixed quality dimensions. A failed call or
    /// unparseable reply leaves zero defaults.
    async fn assess(&self, context: &AgentContext, draft: &str) -> QualityAssessment {
        let prompt = format!(
            "Assess this content against the task. Reply with six lines, one per \
             dimension, in the form `Dimension: <score 1-10> - <feedback>`:\n\
             Accuracy, Completeness, Clarity, Engagement, Technical Quality, Overall.\n\n\
             Task: {}\n\nContent:\n{}",
            context.task_title, draft
        );

        match self
            .llm
            .generate(
                ANALYST_SYSTEM_PROMPT,
                &prompt,
                &LLMConfig::new().with_temperature(0.3).with_max_tokens(600),
            )
            .await
        {
            Ok(text) => parse_assessment(&text),
            Err(err) => {
                warn!(error = %err, "quality assessment failed");
                QualityAssessment::default()
            }
        }
    }

    /// Produce the refined version of the draft.
    async fn refine(
        &self,
        context: &AgentContext,
        draft: &str,
        assessment: &QualityAssessment,
    ) -> std::result::Result<String, String> {
        let weaknesses = assessment
            .dimensions()
            .iter()
            .filter(|(_, score)| score.score > 0 && score.score < 8 && !score.feedback.is_empty())
            .map(|(name, score)| format!("- {}: {}", name, score.feedback))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "Refine this content for the task, addressing the weaknesses below \
             while preserving its intent and factual claims. Return only the \
             improved Markdown document.\n\n\
             Task: {}\n\nWeaknesses:\n{}\n\nContent:\n{}",
            context.task_title,
            if weaknesses.is_empty() {
                "(none identified; polish wording and flow)"
            } else {
                &weaknesses
            },
            draft
        );

        self.llm
            .generate(
                ANALYST_SYSTEM_PROMPT,
                &prompt,
                &LLMConfig::new().with_temperature(0.5).with_max_tokens(4000),
            )
            .await
            .map_err(|err| err.to_string())
    }
}

#[async_trait]
impl WorkerAgent for AnalystAgent {
    fn role(&self) -> AgentRole {
        AgentRole::Analyst
    }

    async fn execute(&self, task_id: &str, context: &AgentContext) -> Result<StepOutcome> {
        let draft = context
            .writing
            .as_ref()
            .map(|w| w.content.as_str())
            .unwrap_or_default();

        if draft.is_empty() {
            self.narrator
                .say(task_id, AgentRole::Analyst, "No draft content to review.")
                .await?;
            return Ok(StepOutcome::Analysis(AnalystOutput::degraded(
                "Analysis failed: no draft content to review",
                None,
            )));
        }

        self.narrator
            .say(
                task_id,
                AgentRole::Analyst,
                &format!("Reviewing draft for: {}", context.task_title),
            )
            .await?;

        let assessment = self.assess(context, draft).await;
        self.narrator
            .say(
                task_id,
                AgentRole::Analyst,
                &format!(
                    "Quality assessment complete. Overall score: {}/10.",
                    assessment.overall.score
                ),
            )
            .await?;

        let output = match self.refine(context, draft, &assessment).await {
            Ok(refined) => {
                let summary = improvement_summary(&assessment);
                AnalystOutput {
                    deliverable: refined.clone(),
                    refined_content: refined,
                    assessment,
                    summary,
                    error: None,
                }
            }
            Err(reason) => {
                warn!(task_id, error = %reason, "refinement failed, passing draft through");
                AnalystOutput {
                    assessment,
                    ..AnalystOutput::degraded(format!("Analysis failed: {}", reason), Some(draft))
                }
            }
        };

        self.narrator
            .say(
                task_id,
                AgentRole::Analyst,
                "Review complete. Deliverable is ready.",
            )
            .await?;

        Ok(StepOutcome::Analysis(output))
    }
}

/// Parse `Dimension: score - feedback` lines. A dimension whose line is
/// missing or malformed keeps the zero default.
fn parse_assessment(text: &str) -> QualityAssessment {
    let mut assessment = QualityAssessment::default();
    for line in text.lines() {
        let Some((name, rest)) = line.split_once(':') else {
            continue;
        };
        let rest = rest.trim();
        let (score_part, feedback) = match rest.split_once('-') {
            Some((score, feedback)) => (score.trim(), feedback.trim()),
            None => (rest, ""),
        };
        // "8/10" style replies still parse.
        let score_text = score_part.split('/').next().unwrap_or_default().trim();
        let Ok(score) = score_text.parse::<u8>() else {
            continue;
        };
        let parsed = DimensionScore {
            score: score.min(10),
            feedback: feedback.to_string(),
        };
        match name.trim().to_lowercase().as_str() {
            "accuracy" => assessment.accuracy = parsed,
            "completeness" => assessment.completeness = parsed,
            "clarity" => assessment.clarity = parsed,
            "engagement" => assessment.engagement = parsed,
            "technical quality" => assessment.technical_quality = parsed,
            "overall" => assessment.overall = parsed,
            _ => {}
        }
    }
    assessment
}

/// Build a short human-readable summary of what the review found.
fn improvement_summary(assessment: &QualityAssessment) -> String {
    let strengths: Vec<&str> = assessment
        .dimensions()
        .iter()
        .filter(|(_, score)| score.score >= 8)
        .map(|(name, _)| *name)
        .collect();
    if strengths.is_empty() {
        "Refined the draft across all quality dimensions.".to_string()
    } else {
        format!(
            "Refined the draft; strong dimensions: {}.",
            strengths.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::WriterOutput;
    use crate::llm::StubProvider;
    use crate::pubsub::LocalPubSub;
    use crate::store::InMemoryMessageStore;

    fn offline_analyst() -> AnalystAgent {
        let narrator = Narrator::new(
            Arc::new(InMemoryMessageStore::new()),
            Arc::new(LocalPubSub::new()),
        );
        AnalystAgent::new(Arc::new(StubProvider), narrator)
    }

    #[test]
    fn test_parse_assessment() {
        let text = "Accuracy: 8 - well sourced\n\
                    Completeness: 6/10 - missing examples\n\
                    Clarity: not a score\n\
                    Overall: 7 - solid";
        let assessment = parse_assessment(text);
        assert_eq!(assessment.accuracy.score, 8);
        assert_eq!(assessment.accuracy.feedback, "well sourced");
        assert_eq!(assessment.completeness.score, 6);
        // Malformed line keeps the zero default.
        assert_eq!(assessment.clarity.score, 0);
        assert_eq!(assessment.overall.score, 7);
    }

    #[test]
    fn test_parse_assessment_clamps_score() {
        let assessment = parse_assessment("Overall: 99 - impossible");
        assert_eq!(assessment.overall.score, 10);
    }

    #[tokio::test]
    async fn test_failed_refinement_passes_draft_through() {
        let agent = offline_analyst();
        let context = AgentContext::new("Title", "Description").with_writing(WriterOutput {
            content: "the draft".to_string(),
            content_type: "report".to_string(),
            ..WriterOutput::default()
        });

        let outcome = agent.execute("t1", &context).await.unwrap();
        let StepOutcome::Analysis(output) = outcome else {
            panic!("expected an analysis outcome");
        };
        assert_eq!(output.deliverable, "the draft");
        assert!(output.error.is_some());
    }

    #[tokio::test]
    async fn test_empty_draft_degrades_with_empty_deliverable() {
        let agent = offline_analyst();
        let context =
            AgentContext::new("Title", "Description").with_writing(WriterOutput::default());

        let outcome = agent.execute("t1", &context).await.unwrap();
        let StepOutcome::Analysis(output) = outcome else {
            panic!("expected an analysis outcome");
        };
        assert!(output.deliverable.is_empty());
        assert!(output.error.is_some());
    }
}
