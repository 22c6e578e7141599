//! Speech producer trait. One backend in the synthesis fallback chain.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::AudioClip;

#[async_trait]
pub trait SpeechProducer: Send + Sync {
    /// Producer name (e.g., "huggingface", "gtts").
    fn name(&self) -> &str;

    /// Synthesize `text` in `language`. Empty audio must be reported as an error.
    async fn synthesize(&self, text: &str, language: &str) -> Result<AudioClip>;
}
