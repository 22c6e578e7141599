//! # Sabia Tools
//!
//! HTTP-backed collaborators the engine consumes through the core traits:
//! - [`WikipediaLookup`]: encyclopedia page text for retrieval fallback, seeding and word clouds
//! - [`WebContentExtractor`]: readable text of a web page
//! - [`QuickChartRenderer`]: word-cloud PNG rendering

pub mod content;
pub mod wikipedia;
pub mod wordcloud;

pub use content::WebContentExtractor;
pub use wikipedia::WikipediaLookup;
pub use wordcloud::QuickChartRenderer;
