//! # Sabia Knowledge
//!
//! In-memory question/answer retrieval. No vector DB, no embeddings.
//!
//! ## Design
//! - **TF-IDF with bigrams** over `primary_text + tags + answer`
//! - **Cosine ranking**, ties broken by corpus position
//! - **Fallback policy**: local index → encyclopedia page merged into a
//!   request-scoped index → canned "no answer" in the user's language
//!
//! ## How it works
//! ```text
//! User: "what's artificial intelligence"
//!   ↓ Normalizer::tokenize → ["artificial", "intelligence"]
//! KnowledgeIndex::search_tokens
//!   ↓ score ≥ threshold?
//! Answer { source: Local, .. }
//! ```

pub mod corpus;
pub mod index;
pub mod retrieval;

pub use corpus::{CorpusEntry, load_entries, seed_corpus, sentence_entries};
pub use index::{KnowledgeIndex, ScoredMatch, TermWeightMatrix};
pub use retrieval::{Answer, AnswerSource, RetrievalEngine};
