use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::instrument;

use crate::domain::{ports::WebSearchProvider, DomainError};
use crate::infrastructure::config::WebSearchConfig;

pub const NO_RESULT: &str = "No good search result found";

/// Google results through SerpAPI, reduced to the single most useful text.
pub struct SerpApiClient {
    http: reqwest::Client,
    api_key: String,
    config: WebSearchConfig,
}

impl SerpApiClient {
    pub fn new(api_key: impl Into<String>, config: WebSearchConfig) -> Result<Self, DomainError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DomainError::internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            config,
        })
    }
}

#[async_trait]
impl WebSearchProvider for SerpApiClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<String, DomainError> {
        let response = self
            .http
            .get(&self.config.endpoint)
            .query(&[
                ("engine", self.config.engine.as_str()),
                ("q", query),
                ("google_domain", self.config.google_domain.as_str()),
                ("gl", self.config.country.as_str()),
                ("hl", self.config.language.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| DomainError::external(format!("Search failed: {}", e.without_url())))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| DomainError::external(format!("Search response unreadable: {e}")))?;

        summarize(&body)
    }
}

/// Picks the best answer out of a SerpAPI response, in the order a reader would.
pub fn summarize(body: &Value) -> Result<String, DomainError> {
    if let Some(error) = body.get("error").and_then(Value::as_str) {
        return Err(DomainError::external(format!("SerpAPI: {error}")));
    }

    let answer_box = body
        .get("answer_box_list")
        .or_else(|| body.get("answer_box"))
        .and_then(|b| match b {
            Value::Array(items) => items.first(),
            other => Some(other),
        });

    if let Some(answer_box) = answer_box {
        if let Some(answer) = answer_box.get("answer").and_then(Value::as_str) {
            return Ok(answer.to_string());
        }
        if let Some(snippet) = answer_box.get("snippet").and_then(Value::as_str) {
            return Ok(snippet.to_string());
        }
        if let Some(words) = answer_box
            .get("snippet_highlighted_words")
            .and_then(Value::as_array)
        {
            let words: Vec<&str> = words.iter().filter_map(Value::as_str).collect();
            if !words.is_empty() {
                return Ok(words.join(", "));
            }
        }
    }

    if let Some(spotlight) = body
        .get("sports_results")
        .and_then(|s| s.get("game_spotlight"))
    {
        return Ok(spotlight.to_string());
    }

    if let Some(shopping) = body.get("shopping_results").and_then(Value::as_array) {
        let titles: Vec<&str> = shopping
            .iter()
            .take(3)
            .filter_map(|item| item.get("title").and_then(Value::as_str))
            .collect();
        if !titles.is_empty() {
            return Ok(titles.join("\n"));
        }
    }

    if let Some(description) = body
        .get("knowledge_graph")
        .and_then(|k| k.get("description"))
        .and_then(Value::as_str)
    {
        return Ok(description.to_string());
    }

    if let Some(first) = body
        .get("organic_results")
        .and_then(Value::as_array)
        .and_then(|results| results.first())
    {
        if let Some(snippet) = first.get("snippet").and_then(Value::as_str) {
            return Ok(snippet.to_string());
        }
        if let Some(link) = first.get("link").and_then(Value::as_str) {
            return Ok(link.to_string());
        }
    }

    Ok(NO_RESULT.to_string())
}
