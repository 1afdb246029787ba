use super::{ResearchOutput, WriterOutput};

/// Read-only projection of task metadata and prior step results that a
/// worker agent may consult. Later stages see earlier results; never the
/// other way around.
#[derive(Debug, Clone, Default)]
pub struct AgentContext {
    pub task_title: String,
    pub task_description: String,
    pub research: Option<ResearchOutput>,
    pub writing: Option<WriterOutput>,
}

impl AgentContext {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            task_title: title.into(),
            task_description: description.into(),
            research: None,
            writing: None,
        }
    }

    pub fn with_research(mut self, research: ResearchOutput) -> Self {
        self.research = Some(research);
        self
    }

    pub fn with_writing(mut self, writing: WriterOutput) -> Self {
        self.writing = Some(writing);
        self
    }

    /// Research synthesis text, or an explicit placeholder when the
    /// research step has not produced one.
    pub fn research_synthesis(&self) -> &str {
        self.research
            .as_ref()
            .map(|r| r.synthesis.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("No research findings available.")
    }
}
