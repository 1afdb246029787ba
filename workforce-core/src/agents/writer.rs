use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::prompts::WRITER_SYSTEM_PROMPT;
use super::{
    AgentContext, ContentMetadata, ContentRequirements, Narrator, StepOutcome, WorkerAgent,
    WriterOutput,
};
use crate::error::Result;
use crate::llm::{LLMConfig, LLMProvider};
use crate::task::AgentRole;

/// Drafts the task deliverable from the research synthesis.
///
/// Requirement analysis is lenient: any line of the model's reply that
/// does not parse falls back to the default for that field. When even the
/// fallback draft fails, the output carries an error tag and empty
/// content so an empty draft is never presented as a finished document.
pub struct WriterAgent {
    llm: Arc<dyn LLMProvider>,
    narrator: Narrator,
}

impl WriterAgent {
    pub fn new(llm: Arc<dyn LLMProvider>, narrator: Narrator) -> Self {
        Self { llm, narrator }
    }

    /// Infer content requirements from the task description. Defaults
    /// apply for any field the model does not state.
    async fn analyze_requirements(&self, context: &AgentContext) -> ContentRequirements {
        let prompt = format!(
            "Determine the content requirements for this task. Reply with four \
             lines, one per field:\n\
             Type: <report|article|blog_post|documentation|summary>\n\
             Tone: <professional|casual|technical|persuasive>\n\
             Length: <short|medium|long>\n\
             Structure: <standard|listicle|tutorial|comparison>\n\n\
             Task: {}\n\nDetails: {}",
            context.task_title, context.task_description
        );

        match self
            .llm
            .generate(
                WRITER_SYSTEM_PROMPT,
                &prompt,
                &LLMConfig::new().with_temperature(0.2).with_max_tokens(200),
            )
            .await
        {
            Ok(text) => parse_requirements(&text),
            Err(err) => {
                warn!(error = %err, "requirement analysis failed, using defaults");
                ContentRequirements::default()
            }
        }
    }

    /// Draft the content. Tries the full prompt first, then a simpler
    /// fallback prompt with a smaller budget.
    async fn draft(
        &self,
        context: &AgentContext,
        requirements: &ContentRequirements,
    ) -> std::result::Result<String, String> {
        let prompt = format!(
            "Write a {} {} in Markdown for this task. Target length: {}. \
             Structure: {}. Ground every claim in the research findings.\n\n\
             Task: {}\n\nDetails: {}\n\nResearch findings:\n{}",
            requirements.tone,
            requirements.content_type,
            requirements.length,
            requirements.structure,
            context.task_title,
            context.task_description,
            context.research_synthesis(),
        );

        let first_attempt = self
            .llm
            .generate(
                WRITER_SYSTEM_PROMPT,
                &prompt,
                &LLMConfig::new().with_temperature(0.7).with_max_tokens(4000),
            )
            .await;

        match first_attempt {
            Ok(content) => Ok(content),
            Err(err) => {
                warn!(error = %err, "content drafting failed, trying a basic draft");
                let fallback_prompt = format!(
                    "Write a clear, well-structured Markdown document for this task.\n\n\
                     Task: {}\n\nDetails: {}\n\nAvailable information:\n{}",
                    context.task_title,
                    context.task_description,
                    context.research_synthesis(),
                );
                self.llm
                    .generate(
                        WRITER_SYSTEM_PROMPT,
                        &fallback_prompt,
                        &LLMConfig::new().with_max_tokens(2000),
                    )
                    .await
                    .map_err(|err| err.to_string())
            }
        }
    }
}

#[async_trait]
impl WorkerAgent for WriterAgent {
    fn role(&self) -> AgentRole {
        AgentRole::Writer
    }

    async fn execute(&self, task_id: &str, context: &AgentContext) -> Result<StepOutcome> {
        self.narrator
            .say(
                task_id,
                AgentRole::Writer,
                &format!("Analyzing content requirements for: {}", context.task_title),
            )
            .await?;

        let requirements = self.analyze_requirements(context).await;

        self.narrator
            .say(
                task_id,
                AgentRole::Writer,
                &format!(
                    "Drafting a {} {} ({} length).",
                    requirements.tone, requirements.content_type, requirements.length
                ),
            )
            .await?;

        let output = match self.draft(context, &requirements).await {
            Ok(content) => {
                let metadata = ContentMetadata::from_content(&content);
                WriterOutput {
                    content,
                    content_type: requirements.content_type.clone(),
                    requirements: Some(requirements),
                    metadata: Some(metadata),
                    error: None,
                }
            }
            Err(reason) => {
                warn!(task_id, error = %reason, "writer step degraded");
                WriterOutput {
                    requirements: Some(requirements),
                    ..WriterOutput::degraded(format!("Writing failed: {}", reason))
                }
            }
        };

        let completion_note = match &output.metadata {
            Some(metadata) => format!(
                "Draft completed: {} words, {} sections, {}.",
                metadata.word_count, metadata.sections, metadata.reading_time
            ),
            None => "Drafting could not be completed.".to_string(),
        };
        self.narrator
            .say(task_id, AgentRole::Writer, &completion_note)
            .await?;

        Ok(StepOutcome::Writing(output))
    }
}

/// Parse `Key: value` requirement lines; unknown keys and malformed
/// lines are ignored.
fn parse_requirements(text: &str) -> ContentRequirements {
    let mut requirements = ContentRequirements::default();
    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().to_lowercase();
        if value.is_empty() {
            continue;
        }
        match key.trim().to_lowercase().as_str() {
            "type" => requirements.content_type = value,
            "tone" => requirements.tone = value,
            "length" => requirements.length = value,
            "structure" => requirements.structure = value,
            _ => {}
        }
    }
    requirements
}
