//! NLP oracle trait: language detection, tokenization and sentiment.

use crate::types::SentimentResult;

/// Text normalization oracle.
///
/// Implementations must be safe to call from many workers at once; a
/// non-thread-safe model may be serialized internally behind a mutex.
pub trait Normalizer: Send + Sync {
    /// Detect the language of `text`. Never fails; returns the default
    /// language when detection has no signal.
    fn detect_language(&self, text: &str) -> String;

    /// Lemmatized, lowercased, stop-word-filtered tokens.
    fn tokenize(&self, text: &str, language: &str) -> Vec<String>;

    fn sentiment(&self, text: &str, language: &str) -> SentimentResult;

    /// Split running text into sentences.
    fn split_sentences(&self, text: &str) -> Vec<String>;

    /// Whether a single token looks like a URL.
    fn is_url(&self, token: &str) -> bool;

    /// Tokenize in whatever language `text` is detected to be.
    fn tokenize_detected(&self, text: &str) -> Vec<String> {
        let language = self.detect_language(text);
        self.tokenize(text, &language)
    }
}
