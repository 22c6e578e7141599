//! # Sabia Core
//!
//! Shared vocabulary for every Sabia crate: the chat message model, the
//! error taxonomy, process configuration, and the traits through which the
//! engine talks to its collaborators (chat transport, NLP oracle, external
//! lookups, speech producers, word-cloud renderer).

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::SabiaConfig;
pub use error::{ErrorKind, Result, SabiaError};
pub use types::{AudioClip, ChatMessage, MessageStatus, SentimentLabel, SentimentResult};
