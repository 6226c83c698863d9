//! Web search behind a trait.
//!
//! Production uses the Google Custom Search JSON API. Provider failures are
//! not fatal to a run: a failed query logs a warning and yields no results,
//! the pipeline moves on to the next term.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// One search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Search provider seam. Test doubles substitute the whole provider.
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Up to one provider page of results, PDF links already dropped.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}

/// Google Custom Search JSON API client.
pub struct GoogleSearch {
    client: reqwest::Client,
    api_key: String,
    cx: String,
    endpoint: String,
}

impl GoogleSearch {
    pub fn new(api_key: String, cx: String, endpoint: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key,
            cx,
            endpoint,
        }
    }
}

#[derive(Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Debug, Default, Deserialize)]
struct CseItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

/// Drop links that cannot be fetched as pages: unparseable URLs and PDFs
/// (checked on the path, so query strings do not hide the extension).
fn usable_link(link: &str) -> bool {
    match url::Url::parse(link) {
        Ok(u) => !u.path().to_ascii_lowercase().ends_with(".pdf"),
        Err(_) => false,
    }
}

fn to_results(items: Vec<CseItem>) -> Vec<SearchResult> {
    items
        .into_iter()
        .filter(|item| !item.link.is_empty() && usable_link(&item.link))
        .map(|item| SearchResult {
            title: item.title,
            url: item.link,
            snippet: item.snippet,
        })
        .collect()
}

#[async_trait]
impl WebSearch for GoogleSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        debug!(query, "issuing web search");
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.cx.as_str()),
                ("q", query),
                ("start", "1"),
                ("num", "10"),
                ("hl", "ja"),
                ("lr", "lang_ja"),
            ])
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(query, error = %e, "web search request failed");
                return Ok(Vec::new());
            }
        };
        if !response.status().is_success() {
            warn!(query, status = %response.status(), "web search returned an error status");
            return Ok(Vec::new());
        }
        match response.json::<CseResponse>().await {
            Ok(body) => {
                let results = to_results(body.items);
                debug!(query, count = results.len(), "web search results");
                Ok(results)
            }
            Err(e) => {
                warn!(query, error = %e, "web search response was not valid JSON");
                Ok(Vec::new())
            }
        }
    }
}
