//! # Sabia NLP
//!
//! Default [`Normalizer`](sabia_core::traits::Normalizer) implementation.
//! Pure Rust, no model downloads: per-language stop-word tables, rule-based
//! lemmatization, and a lexicon sentiment scorer.
//!
//! ## Pipeline
//! ```text
//! "What's artificial intelligence?"
//!   ↓ detect_language  (stop-word profile → "en")
//!   ↓ ModelCache::get("en")  (LRU, preloaded at startup)
//!   ↓ words → lowercase → drop stop words → lemmatize
//! ["artificial", "intelligence"]
//! ```

pub mod language;
pub mod lemma;
pub mod model;
pub mod pipeline;
pub mod sentiment;
pub mod stopwords;
pub mod text;

pub use language::{LanguageDetector, base_code};
pub use model::{LanguageModel, ModelCache};
pub use pipeline::TextNormalizer;
pub use sentiment::SentimentAnalyzer;
