//! External text sources: encyclopedia lookup and web-content extraction.

use async_trait::async_trait;

use crate::error::Result;

/// Keyed text lookup (e.g., encyclopedia article by title).
#[async_trait]
pub trait Lookup: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` when the key does not exist.
    async fn get_text(&self, key: &str) -> Result<Option<String>>;
}

/// Fetches a web page and returns its readable text.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract_clean_text(&self, url: &str) -> Result<String>;
}
