//! Worker agents and their result records
//!
//! Each worker step is stateless: given the task metadata and prior
//! outputs it produces a structured result. Failures of external
//! dependencies are caught inside the step and folded into an
//! error-tagged record of the same shape; they never cross the step
//! boundary as errors. The returned record is the authoritative result;
//! narration messages are visible progress only.

mod analyst;
mod context;
mod narrator;
pub mod prompts;
mod researcher;
mod writer;

pub use analyst::AnalystAgent;
pub use context::AgentContext;
pub use narrator::Narrator;
pub use researcher::ResearcherAgent;
pub use writer::WriterAgent;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::search::SearchResult;
use crate::task::AgentRole;

/// Result record produced by the researcher step.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ResearchOutput {
    pub search_queries: Vec<String>,
    pub sources_found: usize,
    pub synthesis: String,
    pub raw_results: Vec<SearchResult>,

    /// Set when the step degraded instead of completing normally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResearchOutput {
    /// Degraded record for a researcher step that could not run.
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            search_queries: Vec::new(),
            sources_found: 0,
            synthesis: "Research could not be completed; no findings are available for this task."
                .to_string(),
            raw_results: Vec::new(),
            error: Some(reason.into()),
        }
    }
}

/// Content requirements inferred by the writer before drafting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentRequirements {
    #[serde(rename = "type")]
    pub content_type: String,
    pub tone: String,
    pub length: String,
    pub structure: String,
}

impl Default for ContentRequirements {
    fn default() -> Self {
        Self {
            content_type: "report".to_string(),
            tone: "professional".to_string(),
            length: "medium".to_string(),
            structure: "standard".to_string(),
        }
    }
}

/// Locally computed statistics about drafted content.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ContentMetadata {
    pub word_count: usize,
    pub character_count: usize,
    pub sections: usize,
    pub reading_time: String,
    pub has_introduction: bool,
    pub has_conclusion: bool,
}

impl ContentMetadata {
    /// Compute metadata from content text. Reading time assumes 200
    /// words per minute.
    pub fn from_content(content: &str) -> Self {
        let word_count = content.split_whitespace().count();
        let lower = content.to_lowercase();
        Self {
            word_count,
            character_count: content.len(),
            sections: content.matches('#').count(),
            reading_time: format!("{} min read", std::cmp::max(1, word_count.div_ceil(200))),
            has_introduction: lower.contains("introduction") || content.starts_with('#'),
            has_conclusion: lower.contains("conclusion") || lower.contains("summary"),
        }
    }
}

/// Result record produced by the writer step.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WriterOutput {
    pub content: String,
    pub content_type: String,
    #[serde(default)]
    pub requirements: Option<ContentRequirements>,
    #[serde(default)]
    pub metadata: Option<ContentMetadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WriterOutput {
    /// Degraded record for a writer step that could not draft. Content
    /// is left empty so the deliverable fallback does not surface a
    /// placeholder as a finished document.
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            content_type: "report".to_string(),
            requirements: None,
            metadata: None,
            error: Some(reason.into()),
        }
    }
}

/// Score and feedback for one assessed quality dimension.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DimensionScore {
    pub score: u8,
    pub feedback: String,
}

/// Quality assessment across the analyst's fixed dimensions.
/// Unparseable dimensions keep the zero default.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct QualityAssessment {
    pub accuracy: DimensionScore,
    pub completeness: DimensionScore,
    pub clarity: DimensionScore,
    pub engagement: DimensionScore,
    pub technical_quality: DimensionScore,
    pub overall: DimensionScore,
}

impl QualityAssessment {
    pub fn dimensions(&self) -> [(&'static str, &DimensionScore); 6] {
        [
            ("Accuracy", &self.accuracy),
            ("Completeness", &self.completeness),
            ("Clarity", &self.clarity),
            ("Engagement", &self.engagement),
            ("Technical Quality", &self.technical_quality),
            ("Overall", &self.overall),
        ]
    }
}

/// Result record produced by the analyst step.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AnalystOutput {
    pub refined_content: String,
    pub assessment: QualityAssessment,
    pub summary: String,

    /// The final deliverable text. Empty when the step degraded with no
    /// content to fall back on.
    pub deliverable: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalystOutput {
    /// Degraded record for an analyst step that could not review. The
    /// writer's draft, when available, passes through unrefined.
    pub fn degraded(reason: impl Into<String>, draft: Option<&str>) -> Self {
        let content = draft.unwrap_or_default().to_string();
        Self {
            refined_content: content.clone(),
            assessment: QualityAssessment::default(),
            summary: String::new(),
            deliverable: content,
            error: Some(reason.into()),
        }
    }
}

/// Outcome of one worker step invocation, merged into workflow state.
///
/// `Failed` is constructed by the engine when an error escapes a step's
/// boundary; agents themselves degrade instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Research(ResearchOutput),
    Writing(WriterOutput),
    Analysis(AnalystOutput),
    Failed { role: AgentRole, error: String },
}

impl StepOutcome {
    /// Role of the step that produced this outcome.
    pub fn role(&self) -> AgentRole {
        match self {
            StepOutcome::Research(_) => AgentRole::Researcher,
            StepOutcome::Writing(_) => AgentRole::Writer,
            StepOutcome::Analysis(_) => AgentRole::Analyst,
            StepOutcome::Failed { role, .. } => *role,
        }
    }
}

/// One specialized unit of LLM-driven work.
///
/// `execute` must not mutate caller state; the engine folds the returned
/// outcome into workflow state. An `Err` return is a defensive failure
/// (caught at the engine boundary), not a normal degradation path.
#[async_trait]
pub trait WorkerAgent: Send + Sync {
    /// The role this agent narrates and reports under.
    fn role(&self) -> AgentRole;

    /// Perform one unit of work for the task.
    async fn execute(&self, task_id: &str, context: &AgentContext) -> Result<StepOutcome>;
}
