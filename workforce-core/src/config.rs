//! Configuration types for the Workforce engine

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration for the Workforce engine
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorkforceConfig {
    /// LLM provider configuration
    #[serde(default)]
    pub llm: LLMProviderConfig,

    /// Web search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Workflow engine configuration
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMProviderConfig {
    /// Provider type
    pub provider: LLMProviderKind,

    /// Model name (provider default used when empty)
    #[serde(default)]
    pub model: String,

    /// API key (prefer env vars)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL for custom endpoints (Azure, Ollama)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for LLMProviderConfig {
    fn default() -> Self {
        Self {
            provider: LLMProviderKind::Stub,
            model: String::new(),
            api_key: None,
            base_url: None,
        }
    }
}

/// LLM provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LLMProviderKind {
    OpenAI,
    Ollama,
    /// No provider; agents run their degraded paths.
    Stub,
}

/// Web search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Enable web search; when disabled the researcher degrades to
    /// general-knowledge synthesis.
    pub enabled: bool,

    /// Tavily API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Maximum results per query
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            max_results: 5,
        }
    }
}

/// Workflow engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Hard cap on supervisor loop iterations. The routing precedence
    /// bounds a healthy run at 4 decisions; the cap guards against a
    /// malformed router.
    pub max_iterations: usize,

    /// Per-step timeout; a step that exceeds it is merged as a degraded
    /// result rather than stalling the task.
    #[serde(with = "humantime_serde")]
    pub step_timeout: Duration,

    /// Bound on concurrently in-flight task workflows.
    pub max_concurrent_tasks: usize,

    /// Sampling temperature for the supervisor's routing consult.
    pub supervisor_temperature: f32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            step_timeout: Duration::from_secs(120),
            max_concurrent_tasks: 5,
            supervisor_temperature: 0.3,
        }
    }
}

impl WorkforceConfig {
    /// Load configuration from file and environment variables.
    ///
    /// Loads in this order:
    /// 1. Default configuration
    /// 2. `workforce.toml` (or path from WORKFORCE_CONFIG_PATH)
    /// 3. `WORKFORCE_`-prefixed environment variable overrides
    pub fn load() -> crate::error::Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Toml},
            Figment,
        };

        let mut figment = Figment::from(Serialized::defaults(WorkforceConfig::default()))
            .merge(Toml::file("workforce.toml"))
            .merge(Env::prefixed("WORKFORCE_").split("_"));

        if let Ok(path) = std::env::var("WORKFORCE_CONFIG_PATH") {
            figment = figment.merge(Toml::file(path));
        }

        let config: WorkforceConfig = figment.extract().map_err(|e| {
            crate::error::WorkforceError::Configuration(format!(
                "Failed to load configuration: {}",
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        use figment::{
            providers::{Format, Serialized, Toml},
            Figment,
        };

        let config: WorkforceConfig = Figment::from(Serialized::defaults(WorkforceConfig::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| {
                crate::error::WorkforceError::Configuration(format!(
                    "Failed to load configuration file: {}",
                    e
                ))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.workflow.max_iterations == 0 {
            return Err(crate::error::WorkforceError::Configuration(
                "workflow.max_iterations must be at least 1".to_string(),
            ));
        }
        if self.workflow.max_concurrent_tasks == 0 {
            return Err(crate::error::WorkforceError::Configuration(
                "workflow.max_concurrent_tasks must be at least 1".to_string(),
            ));
        }
        if self.workflow.step_timeout.is_zero() {
            return Err(crate::error::WorkforceError::Configuration(
                "workflow.step_timeout must be non-zero".to_string(),
            ));
        }
        if self.search.enabled && self.search.api_key.is_none() {
            return Err(crate::error::WorkforceError::Configuration(
                "search.api_key is required when search is enabled".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        WorkforceConfig::default().validate().unwrap();
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let mut config = WorkforceConfig::default();
        config.workflow.max_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_search_requires_key() {
        let mut config = WorkforceConfig::default();
        config.search.enabled = true;
        assert!(config.validate().is_err());

        config.search.api_key = Some("tvly-key".to_string());
        config.validate().unwrap();
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workforce.toml");
        std::fs::write(
            &path,
            r#"
[llm]
provider = "ollama"
model = "llama3"

[workflow]
max_iterations = 6
step_timeout = "30s"
max_concurrent_tasks = 2
supervisor_temperature = 0.1
"#,
        )
        .unwrap();

        let config = WorkforceConfig::from_file(&path).unwrap();
        assert_eq!(config.llm.provider, LLMProviderKind::Ollama);
        assert_eq!(config.workflow.max_iterations, 6);
        assert_eq!(config.workflow.step_timeout, Duration::from_secs(30));
    }
}
