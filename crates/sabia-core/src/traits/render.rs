//! Word-cloud renderer trait.

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait WordCloudRenderer: Send + Sync {
    /// Render whitespace-separated words into PNG bytes.
    async fn render(&self, text: &str) -> Result<Vec<u8>>;
}
