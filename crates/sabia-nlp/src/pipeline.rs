//! The default normalizer wired from configuration.

use std::sync::Arc;

use sabia_core::config::NlpConfig;
use sabia_core::error::{Result, SabiaError};
use sabia_core::traits::Normalizer;
use sabia_core::types::SentimentResult;

use crate::language::{LanguageDetector, base_code};
use crate::model::ModelCache;
use crate::sentiment::SentimentAnalyzer;
use crate::{stopwords, text};

pub struct TextNormalizer {
    detector: LanguageDetector,
    models: Arc<ModelCache>,
    sentiment: SentimentAnalyzer,
}

impl TextNormalizer {
    /// Fails if a configured language has no tables or the cache capacity is zero.
    pub fn new(config: &NlpConfig) -> Result<Self> {
        for language in &config.languages {
            let code = base_code(language);
            if stopwords::for_language(&code).is_none() {
                return Err(SabiaError::Nlp(format!(
                    "language '{language}' is not supported (available: {})",
                    stopwords::SUPPORTED.join(", ")
                )));
            }
        }
        let models = ModelCache::new(&config.languages, config.model_cache_capacity)?;
        Ok(Self {
            detector: LanguageDetector::new(&config.languages, &config.default_language),
            models: Arc::new(models),
            sentiment: SentimentAnalyzer::default(),
        })
    }

    pub fn models(&self) -> &Arc<ModelCache> {
        &self.models
    }
}

impl Normalizer for TextNormalizer {
    fn detect_language(&self, text: &str) -> String {
        self.detector.detect(text)
    }

    fn tokenize(&self, text: &str, language: &str) -> Vec<String> {
        let model = self.models.get(language);
        text::words(text).filter_map(|w| model.normalize(w)).collect()
    }

    fn sentiment(&self, text: &str, language: &str) -> SentimentResult {
        let model = self.models.get(language);
        self.sentiment.analyze(&model.lexicon, text, &base_code(language))
    }

    fn split_sentences(&self, text: &str) -> Vec<String> {
        text::sentences(text)
    }

    fn is_url(&self, token: &str) -> bool {
        text::is_url(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sabia_core::types::SentimentLabel;

    fn normalizer() -> TextNormalizer {
        TextNormalizer::new(&NlpConfig::default()).unwrap()
    }

    #[test]
    fn test_tokenize_drops_stopwords_and_lemmatizes() {
        let n = normalizer();
        assert_eq!(n.tokenize("What is AI?", "en"), vec!["ai"]);
        assert_eq!(
            n.tokenize("Neural networks are learning machines", "en"),
            vec!["neural", "network", "learn", "machine"]
        );
    }

    #[test]
    fn test_tokenize_detected_portuguese() {
        let n = normalizer();
        let tokens = n.tokenize_detected("O que são redes neurais?");
        assert!(tokens.contains(&"rede".to_string()));
        assert!(!tokens.contains(&"que".to_string()));
    }

    #[test]
    fn test_unknown_language_uses_multilingual_model() {
        let n = normalizer();
        assert_eq!(n.tokenize("Hallo Welt", "de"), vec!["hallo", "welt"]);
    }

    #[test]
    fn test_sentiment_carries_language() {
        let n = normalizer();
        let r = n.sentiment("this is awful", "en-US");
        assert_eq!(r.label, SentimentLabel::Negative);
        assert_eq!(r.language, "en");
    }

    #[test]
    fn test_unsupported_language_rejected() {
        let config = NlpConfig {
            languages: vec!["en".into(), "ja".into()],
            ..NlpConfig::default()
        };
        let err = TextNormalizer::new(&config).err().unwrap();
        assert!(err.to_string().contains("ja"));
    }

    proptest! {
        #[test]
        fn tokens_are_lowercase_and_never_stopwords(text in "[a-zA-Zà-ú ,.?!']{0,80}") {
            let n = normalizer();
            for token in n.tokenize(&text, "en") {
                prop_assert_eq!(token.to_lowercase(), token.clone());
                prop_assert!(!stopwords::ENGLISH.contains(&token.as_str()));
                prop_assert!(token.chars().all(char::is_alphabetic));
            }
        }

        #[test]
        fn sentiment_score_is_a_probability(text in "[a-z ]{0,60}") {
            let r = normalizer().sentiment(&text, "en");
            prop_assert!((0.0..=1.0).contains(&r.score));
        }
    }
}
