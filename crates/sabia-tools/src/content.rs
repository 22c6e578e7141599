//! Readable-text extraction from web pages.

use std::time::Duration;

use async_trait::async_trait;
use sabia_core::error::{Result, SabiaError};
use sabia_core::traits::ContentExtractor;
use scraper::{Html, Selector};

pub struct WebContentExtractor {
    client: reqwest::Client,
}

impl WebContentExtractor {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.to_string())
            .build()
            .map_err(|e| SabiaError::Lookup(format!("HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Paragraph text of the main article if there is one, else all paragraphs,
/// else the whole body. Whitespace is collapsed.
pub fn extract_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    for css in ["article p", "main p", "p"] {
        let Some(sel) = selector(css) else { continue };
        let paragraphs: Vec<String> = doc
            .select(&sel)
            .map(|el| collapse(&el.text().collect::<String>()))
            .filter(|p| !p.is_empty())
            .collect();
        if !paragraphs.is_empty() {
            return paragraphs.join("\n");
        }
    }
    selector("body")
        .and_then(|sel| doc.select(&sel).next().map(|el| collapse(&el.text().collect::<String>())))
        .unwrap_or_default()
}

#[async_trait]
impl ContentExtractor for WebContentExtractor {
    async fn extract_clean_text(&self, url: &str) -> Result<String> {
        let url = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("https://{url}")
        };
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SabiaError::Lookup(format!("fetch {url}: {e}")))?;
        if !resp.status().is_success() {
            return Err(SabiaError::Lookup(format!("fetch {url}: {}", resp.status())));
        }
        let body = resp
            .bytes()
            .await
            .map_err(|e| SabiaError::Lookup(format!("read {url}: {e}")))?;
        let text = extract_text(&String::from_utf8_lossy(&body));
        if text.is_empty() {
            return Err(SabiaError::Lookup(format!("no readable text at {url}")));
        }
        tracing::debug!("🌐 Extracted {} chars from {}", text.len(), url);
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_paragraphs_preferred() {
        let html = r#"<html><body>
            <nav><p>Menu</p></nav>
            <article><h1>Title</h1><p>First   paragraph.</p><p>Second
            paragraph.</p></article>
            <script>var x = 1;</script>
        </body></html>"#;
        assert_eq!(extract_text(html), "First paragraph.\nSecond paragraph.");
    }

    #[test]
    fn test_falls_back_to_body() {
        let html = "<html><body><div>Just some   text</div></body></html>";
        assert_eq!(extract_text(html), "Just some text");
        assert_eq!(extract_text(""), "");
    }
}
