//! `/wordcloud` argument resolution and rendering.
//!
//! The argument may be a URL (page text is extracted), an encyclopedia
//! title, or just enough raw text to make a cloud worth drawing.

use std::sync::Arc;

use sabia_core::config::WordCloudConfig;
use sabia_core::error::{Result, SabiaError};
use sabia_core::traits::{ContentExtractor, Lookup, Normalizer, WordCloudRenderer};

pub struct WordCloudService {
    normalizer: Arc<dyn Normalizer>,
    lookup: Arc<dyn Lookup>,
    extractor: Arc<dyn ContentExtractor>,
    renderer: Arc<dyn WordCloudRenderer>,
    min_words: usize,
    max_length: usize,
}

impl WordCloudService {
    pub fn new(
        config: &WordCloudConfig,
        normalizer: Arc<dyn Normalizer>,
        lookup: Arc<dyn Lookup>,
        extractor: Arc<dyn ContentExtractor>,
        renderer: Arc<dyn WordCloudRenderer>,
    ) -> Self {
        Self {
            normalizer,
            lookup,
            extractor,
            renderer,
            min_words: config.min_words,
            max_length: config.max_length,
        }
    }

    fn too_short(&self) -> SabiaError {
        SabiaError::Validation(format!(
            "Wikipedia title did not match or input text is too short for a wordcloud (min {} words).",
            self.min_words
        ))
    }

    /// Pick the text the cloud is drawn from.
    pub async fn resolve_text(&self, argument: &str) -> Result<String> {
        let Some(first) = argument.split_whitespace().next() else {
            return Err(SabiaError::Validation("Text is empty.".into()));
        };
        if argument.chars().count() > self.max_length {
            return Err(SabiaError::Validation(format!(
                "Text is too long (max {} characters).",
                self.max_length
            )));
        }

        if self.normalizer.is_url(first) {
            tracing::debug!("Word cloud from URL {}", first);
            return self.extractor.extract_clean_text(first).await;
        }

        match self.lookup.get_text(argument.trim()).await {
            Ok(Some(text)) if !text.trim().is_empty() => {
                tracing::debug!("Word cloud from {} page '{}'", self.lookup.name(), argument.trim());
                return Ok(text);
            }
            Ok(_) => {}
            Err(e) => tracing::debug!("{} lookup failed, using raw text: {}", self.lookup.name(), e),
        }

        if argument.split_whitespace().count() < self.min_words {
            return Err(self.too_short());
        }
        Ok(argument.to_string())
    }

    /// PNG bytes for `argument`.
    pub async fn generate(&self, argument: &str) -> Result<Vec<u8>> {
        let text = self.resolve_text(argument).await?;
        let words = self.normalizer.tokenize_detected(&text);
        if words.is_empty() {
            return Err(self.too_short());
        }
        tracing::debug!("Rendering word cloud from {} words", words.len());
        self.renderer.render(&words.join(" ")).await
    }
}
