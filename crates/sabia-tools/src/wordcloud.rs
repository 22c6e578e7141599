//! Word-cloud rendering through the QuickChart word-cloud API.

use std::time::Duration;

use async_trait::async_trait;
use sabia_core::config::WordCloudConfig;
use sabia_core::error::{Result, SabiaError};
use sabia_core::traits::WordCloudRenderer;
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest<'a> {
    format: &'static str,
    width: u32,
    height: u32,
    text: &'a str,
    /// Stop words are already gone; keep every token we send.
    remove_stopwords: bool,
    max_num_words: u32,
}

pub struct QuickChartRenderer {
    endpoint: String,
    width: u32,
    height: u32,
    client: reqwest::Client,
}

impl QuickChartRenderer {
    pub fn new(config: &WordCloudConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SabiaError::Render(format!("HTTP client: {e}")))?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            width: config.width,
            height: config.height,
            client,
        })
    }

    pub fn request<'a>(&self, text: &'a str) -> RenderRequest<'a> {
        RenderRequest {
            format: "png",
            width: self.width,
            height: self.height,
            text,
            remove_stopwords: false,
            max_num_words: 200,
        }
    }
}

#[async_trait]
impl WordCloudRenderer for QuickChartRenderer {
    async fn render(&self, text: &str) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(SabiaError::Render("no words to render".into()));
        }
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&self.request(text))
            .send()
            .await
            .map_err(|e| SabiaError::Render(format!("word cloud request failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SabiaError::Render(format!("word cloud API {status}: {body}")));
        }
        let is_png = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("image/png"))
            .unwrap_or(false);
        if !is_png {
            return Err(SabiaError::Render("word cloud API did not return a PNG".into()));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| SabiaError::Render(format!("word cloud body: {e}")))?;
        tracing::debug!("☁️ Rendered word cloud ({} bytes)", bytes.len());
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let renderer = QuickChartRenderer::new(&WordCloudConfig::default()).unwrap();
        let body = serde_json::to_value(renderer.request("rust tokio axum")).unwrap();
        assert_eq!(body["format"], "png");
        assert_eq!(body["width"], 1024);
        assert_eq!(body["height"], 1024);
        assert_eq!(body["text"], "rust tokio axum");
        assert_eq!(body["removeStopwords"], false);
    }

    #[tokio::test]
    async fn test_blank_text_rejected_locally() {
        let renderer = QuickChartRenderer::new(&WordCloudConfig::default()).unwrap();
        assert!(matches!(renderer.render("  ").await, Err(SabiaError::Render(_))));
    }
}
