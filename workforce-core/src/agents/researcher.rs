use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::prompts::RESEARCHER_SYSTEM_PROMPT;
use super::{AgentContext, Narrator, ResearchOutput, StepOutcome, WorkerAgent};
use crate::error::Result;
use crate::llm::{LLMConfig, LLMProvider};
use crate::search::{SearchProvider, SearchResult};
use crate::task::AgentRole;

/// Max queries to generate and how many of them actually run.
const MAX_QUERIES: usize = 5;
const QUERIES_SEARCHED: usize = 3;
const MAX_SOURCES_SYNTHESIZED: usize = 10;

/// Gathers web sources for the task and synthesizes them into research
/// findings. Degrades to general-knowledge synthesis when search yields
/// nothing, and to a placeholder synthesis when the LLM is unavailable.
pub struct ResearcherAgent {
    llm: Arc<dyn LLMProvider>,
    search: Arc<dyn SearchProvider>,
    narrator: Narrator,
    max_results_per_query: usize,
}

impl ResearcherAgent {
    pub fn new(
        llm: Arc<dyn LLMProvider>,
        search: Arc<dyn SearchProvider>,
        narrator: Narrator,
        max_results_per_query: usize,
    ) -> Self {
        Self {
            llm,
            search,
            narrator,
            max_results_per_query,
        }
    }

    /// Ask the model for search queries; fall back to the task title as
    /// the single query when that fails.
    async fn generate_queries(&self, context: &AgentContext) -> Vec<String> {
        let prompt = format!(
            "Generate up to {MAX_QUERIES} focused web search queries for researching \
             this task. One query per line, no numbering.\n\n\
             Task: {}\n\nDetails: {}",
            context.task_title, context.task_description
        );

        match self
            .llm
            .generate(RESEARCHER_SYSTEM_PROMPT, &prompt, &LLMConfig::default())
            .await
        {
            Ok(text) => {
                let queries = parse_queries(&text);
                if queries.is_empty() {
                    vec![context.task_title.clone()]
                } else {
                    queries
                }
            }
            Err(err) => {
                warn!(error = %err, "query generation failed, searching the task title");
                vec![context.task_title.clone()]
            }
        }
    }

    /// Synthesize findings from collected sources, or from general
    /// knowledge when none were found.
    async fn synthesize(
        &self,
        context: &AgentContext,
        results: &[SearchResult],
    ) -> std::result::Result<String, String> {
        let prompt = if results.is_empty() {
            format!(
                "No current web sources are available for this task. Using your \
                 general knowledge, write a concise research synthesis that a writer \
                 can draft from. Note clearly that it is not based on current sources.\n\n\
                 Task: {}\n\nDetails: {}",
                context.task_title, context.task_description
            )
        } else {
            let sources = results
                .iter()
                .take(MAX_SOURCES_SYNTHESIZED)
                .enumerate()
                .map(|(i, r)| format!("[{}] {} ({})\n{}", i + 1, r.title, r.url, r.content))
                .collect::<Vec<_>>()
                .join("\n\n");
            format!(
                "Synthesize the following sources into concise research findings \
                 for the task. Reference sources by their [number].\n\n\
                 Task: {}\n\nDetails: {}\n\nSources:\n{}",
                context.task_title, context.task_description, sources
            )
        };

        self.llm
            .generate(
                RESEARCHER_SYSTEM_PROMPT,
                &prompt,
                &LLMConfig::new().with_max_tokens(1500),
            )
            .await
            .map_err(|err| err.to_string())
    }
}

#[async_trait]
impl WorkerAgent for ResearcherAgent {
    fn role(&self) -> AgentRole {
        AgentRole::Researcher
    }

    async fn execute(&self, task_id: &str, context: &AgentContext) -> Result<StepOutcome> {
        self.narrator
            .say(
                task_id,
                AgentRole::Researcher,
                &format!("Starting research on: {}", context.task_title),
            )
            .await?;

        let queries = self.generate_queries(context).await;
        debug!(task_id, count = queries.len(), "generated search queries");

        let mut results = Vec::new();
        for query in queries.iter().take(QUERIES_SEARCHED) {
            self.narrator
                .say(
                    task_id,
                    AgentRole::Researcher,
                    &format!("Searching for: {}", query),
                )
                .await?;
            results.extend(self.search.search(query, self.max_results_per_query).await);
        }

        let output = match self.synthesize(context, &results).await {
            Ok(synthesis) => ResearchOutput {
                search_queries: queries,
                sources_found: results.len(),
                synthesis,
                raw_results: results,
                error: None,
            },
            Err(reason) => {
                warn!(task_id, error = %reason, "research synthesis failed");
                ResearchOutput {
                    search_queries: queries,
                    sources_found: results.len(),
                    raw_results: results,
                    ..ResearchOutput::degraded(format!("Research failed: {}", reason))
                }
            }
        };

        self.narrator
            .say(
                task_id,
                AgentRole::Researcher,
                &format!(
                    "Research completed with {} sources across {} queries.",
                    output.sources_found,
                    output.search_queries.len()
                ),
            )
            .await?;

        Ok(StepOutcome::Research(output))
    }
}

/// Parse one query per line, stripping list markers.
fn parse_queries(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')')
                .trim_start_matches(['-', '*'])
                .trim()
                .to_string()
        })
        .filter(|q| !q.is_empty())
        .take(MAX_QUERIES)
        .collect()
}
