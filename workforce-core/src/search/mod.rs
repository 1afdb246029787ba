//! Web search providers
//!
//! The search contract degrades rather than fails: a provider returns an
//! empty result list on any error, and the researcher agent falls back to
//! general-knowledge synthesis when no sources come back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single web search result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
    pub score: f64,
}

/// Trait for web search implementations.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search the web. Returns an empty list on failure instead of an
    /// error; callers rely on this for graceful degradation.
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult>;
}

/// Search provider that always returns no results.
///
/// Used when search is disabled and in tests exercising the researcher's
/// fallback path.
#[derive(Debug, Default)]
pub struct NullSearch;

#[async_trait]
impl SearchProvider for NullSearch {
    async fn search(&self, _query: &str, _max_results: usize) -> Vec<SearchResult> {
        Vec::new()
    }
}

/// Web search via the Tavily API.
pub struct TavilySearch {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TavilySearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.tavily.com".to_string(),
        }
    }

    /// Create with a custom base URL, for tests against a local server.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: f64,
}

#[async_trait]
impl SearchProvider for TavilySearch {
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        let request = TavilyRequest {
            api_key: &self.api_key,
            query,
            max_results,
        };

        let url = format!("{}/search", self.base_url);

        let response = match self.client.post(&url).json(&request).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(query, error = %e, "Tavily search request failed");
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            tracing::error!(query, status = %response.status(), "Tavily search returned an error");
            return Vec::new();
        }

        let body: TavilyResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::error!(query, error = %e, "invalid Tavily response");
                return Vec::new();
            }
        };

        let results: Vec<SearchResult> = body
            .results
            .into_iter()
            .map(|r| SearchResult {
                title: r.title,
                url: r.url,
                content: r.content,
                score: r.score,
            })
            .collect();

        tracing::info!(query, count = results.len(), "search completed");
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_search_is_empty() {
        let provider = NullSearch;
        assert!(provider.search("anything", 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_tavily_unreachable_degrades_to_empty() {
        // Nothing listens on this port; the provider must not error.
        let provider = TavilySearch::with_base_url("key", "http://127.0.0.1:1");
        assert!(provider.search("rust async", 5).await.is_empty());
    }

    #[test]
    fn test_response_parsing_tolerates_missing_fields() {
        let body: TavilyResponse =
            serde_json::from_str(r#"{"results": [{"title": "Rust"}]}"#).unwrap();
        assert_eq!(body.results.len(), 1);
        assert_eq!(body.results[0].title, "Rust");
        assert_eq!(body.results[0].score, 0.0);
    }
}
