//! Search tool adapters: web search, place search, scripture Q&A.
//!
//! Each adapter issues one HTTP POST and degrades every upstream failure
//! (non-200, timeout, malformed body) to a fixed failure string through
//! `ToolOutcome`. Nothing here raises past the adapter boundary, so one
//! failed tool cannot abort the agent chain.
//!
//! All three adapters return formatted text. The original service
//! returned raw records from the web search only; that divergence was an
//! oversight and is deliberately not reproduced.

use crate::config::SearchConfig;
use berean_common::{SearchResult, ToolOutcome, MISSING_FIELD};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

pub const WEB_SEARCH_FAILURE: &str = "Failed to search the internet.";
pub const PLACE_SEARCH_FAILURE: &str = "Failed to search places.";
pub const SCRIPTURE_QA_FAILURE: &str = "Failed to get result from the scripture Q&A service.";

/// Format up to `limit` results as Title/Link/Snippet blocks.
///
/// Total over its input: missing fields render as "N/A", an empty list or
/// a zero limit yields the empty string.
pub fn format_results(results: &[SearchResult], limit: usize) -> String {
    let field = |value: &Option<String>| -> String {
        value.clone().unwrap_or_else(|| MISSING_FIELD.to_string())
    };
    results
        .iter()
        .take(limit)
        .map(|result| {
            [
                format!("Title: {}", field(&result.title)),
                format!("Link: {}", field(&result.link)),
                format!("Snippet: {}", field(&result.snippet)),
                "-----------------".to_string(),
            ]
            .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pull result records out of one field of an upstream JSON body.
fn extract_results(body: &Value, field: &str) -> Vec<SearchResult> {
    body.get(field)
        .and_then(Value::as_array)
        .map(|records| {
            records
                .iter()
                .map(|record| SearchResult {
                    title: record.get("title").and_then(Value::as_str).map(String::from),
                    link: record.get("link").and_then(Value::as_str).map(String::from),
                    snippet: record
                        .get("snippet")
                        .and_then(Value::as_str)
                        .map(String::from),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Client for the three external search capabilities.
pub struct SearchClient {
    http_client: reqwest::Client,
    api_key: String,
    serper_base_url: String,
    qa_endpoint: String,
    web_top_n: usize,
    place_top_n: usize,
}

impl SearchClient {
    pub fn new(api_key: String, config: &SearchConfig) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key,
            serper_base_url: config.serper_base_url.trim_end_matches('/').to_string(),
            qa_endpoint: config.qa_endpoint.clone(),
            web_top_n: config.web_top_n,
            place_top_n: config.place_top_n,
        }
    }

    /// Search the internet for a topic and return formatted top results.
    pub async fn search_web(&self, query: &str) -> ToolOutcome {
        let url = format!("{}/search", self.serper_base_url);
        match self.serper_post(&url, query).await {
            Ok(body) => {
                ToolOutcome::Success(format_results(&extract_results(&body, "organic"), self.web_top_n))
            }
            Err(e) => {
                warn!("[TOOL]  web_search failed: {}", e);
                ToolOutcome::failed(WEB_SEARCH_FAILURE)
            }
        }
    }

    /// Search for places in the geographical context of a passage.
    pub async fn search_places(&self, query: &str) -> ToolOutcome {
        let url = format!("{}/places", self.serper_base_url);
        match self.serper_post(&url, query).await {
            Ok(body) => ToolOutcome::Success(format_results(
                &extract_results(&body, "places"),
                self.place_top_n,
            )),
            Err(e) => {
                warn!("[TOOL]  place_search failed: {}", e);
                ToolOutcome::failed(PLACE_SEARCH_FAILURE)
            }
        }
    }

    /// Ask the scripture Q&A prediction endpoint a question.
    ///
    /// The upstream `answer` field is a plain string in practice; a record
    /// list is accepted too and formatted top-1.
    pub async fn answer_scripture_question(&self, question: &str) -> ToolOutcome {
        let result = async {
            let response = self
                .http_client
                .post(&self.qa_endpoint)
                .json(&json!({ "question": question }))
                .send()
                .await?;
            if !response.status().is_success() {
                anyhow::bail!("Q&A endpoint returned {}", response.status());
            }
            response.json::<Value>().await.map_err(anyhow::Error::from)
        }
        .await;

        match result {
            Ok(body) => match body.get("answer") {
                Some(Value::String(answer)) => ToolOutcome::Success(answer.trim().to_string()),
                Some(Value::Array(_)) => {
                    ToolOutcome::Success(format_results(&extract_results(&body, "answer"), 1))
                }
                _ => {
                    warn!("[TOOL]  scripture_qa response had no answer field");
                    ToolOutcome::failed(SCRIPTURE_QA_FAILURE)
                }
            },
            Err(e) => {
                warn!("[TOOL]  scripture_qa failed: {}", e);
                ToolOutcome::failed(SCRIPTURE_QA_FAILURE)
            }
        }
    }

    /// One Serper-style POST: `{"q": query}` with the API key header.
    async fn serper_post(&self, url: &str, query: &str) -> anyhow::Result<Value> {
        let response = self
            .http_client
            .post(url)
            .header("X-API-KEY", &self.api_key)
            .json(&json!({ "q": query }))
            .send()
            .await?;
        if !response.status().is_success() {
            anyhow::bail!("search endpoint returned {}", response.status());
        }
        response.json::<Value>().await.map_err(anyhow::Error::from)
    }
}
