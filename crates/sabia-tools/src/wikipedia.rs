//! Wikipedia page lookup via the MediaWiki extracts API.
//!
//! Plain-text extracts only, redirects followed. Titles are cut to the
//! MediaWiki limit before the request.

use std::time::Duration;

use async_trait::async_trait;
use sabia_core::config::LookupConfig;
use sabia_core::error::{Result, SabiaError};
use sabia_core::traits::Lookup;
use serde_json::Value;

pub struct WikipediaLookup {
    api_url: String,
    max_title_len: usize,
    client: reqwest::Client,
}

impl WikipediaLookup {
    pub fn new(config: &LookupConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(timeout)
            .build()
            .map_err(|e| SabiaError::Lookup(format!("HTTP client: {e}")))?;
        Ok(Self {
            api_url: format!("https://{}.wikipedia.org/w/api.php", config.wiki_language),
            max_title_len: config.max_title_len,
            client,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

/// First `max` characters of a trimmed title.
pub fn truncate_title(title: &str, max: usize) -> String {
    title.trim().chars().take(max).collect()
}

/// Extract text from a `formatversion=2` query response. Missing pages yield `None`.
pub fn parse_extract(body: &Value) -> Option<String> {
    let page = body.get("query")?.get("pages")?.as_array()?.first()?;
    if page.get("missing").is_some() || page.get("invalid").is_some() {
        return None;
    }
    let text = page.get("extract")?.as_str()?.trim();
    if text.is_empty() { None } else { Some(text.to_string()) }
}

#[async_trait]
impl Lookup for WikipediaLookup {
    fn name(&self) -> &str {
        "wikipedia"
    }

    async fn get_text(&self, key: &str) -> Result<Option<String>> {
        let title = truncate_title(key, self.max_title_len);
        if title.is_empty() {
            return Ok(None);
        }
        let resp = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("format", "json"),
                ("formatversion", "2"),
                ("titles", title.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SabiaError::Lookup(format!("Wikipedia request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(SabiaError::Lookup(format!("Wikipedia returned {}", resp.status())));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| SabiaError::Lookup(format!("Wikipedia response: {e}")))?;
        let text = parse_extract(&body);
        tracing::debug!(
            "📖 Wikipedia '{}': {}",
            title,
            text.as_ref().map(|t| format!("{} chars", t.len())).unwrap_or_else(|| "not found".into())
        );
        Ok(text)
    }
}
