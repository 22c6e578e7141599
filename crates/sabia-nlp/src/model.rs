//! Per-language models and the bounded model cache.
//!
//! The cache is built explicitly at startup with a fixed capacity and the
//! configured languages preloaded, so startup cost is paid once and a
//! missing language table fails construction instead of the first request.

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use sabia_core::error::{Result, SabiaError};

use crate::language::base_code;
use crate::lemma::Lemmatizer;
use crate::sentiment::Lexicon;
use crate::stopwords;

/// Name of the language-agnostic fallback model.
pub const MULTILINGUAL: &str = "xx";

/// Everything needed to normalize and score text in one language.
#[derive(Debug)]
pub struct LanguageModel {
    pub code: String,
    stopwords: HashSet<&'static str>,
    lemmatizer: Lemmatizer,
    pub lexicon: Lexicon,
}

impl LanguageModel {
    /// Load the model for a base language code; `xx` is the multilingual fallback.
    pub fn load(code: &str) -> Result<Self> {
        if code == MULTILINGUAL {
            return Ok(Self::multilingual());
        }
        let table = stopwords::for_language(code)
            .ok_or_else(|| SabiaError::Nlp(format!("no language model for '{code}'")))?;
        Ok(Self {
            code: code.to_string(),
            stopwords: table.iter().copied().collect(),
            lemmatizer: Lemmatizer::for_language(code),
            lexicon: Lexicon::for_language(code),
        })
    }

    /// No stop words, no lemmatization. Serves every unconfigured language.
    pub fn multilingual() -> Self {
        Self {
            code: MULTILINGUAL.into(),
            stopwords: HashSet::new(),
            lemmatizer: Lemmatizer::Identity,
            lexicon: Lexicon::for_language(MULTILINGUAL),
        }
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    /// Lowercase, drop stop words and single letters, lemmatize.
    pub fn normalize(&self, word: &str) -> Option<String> {
        let lower = word.to_lowercase();
        if lower.chars().count() < 2 || self.is_stopword(&lower) {
            return None;
        }
        let lemma = self.lemmatizer.lemma(&lower);
        if self.is_stopword(&lemma) {
            return None;
        }
        Some(lemma)
    }
}

/// LRU cache of language models keyed by model name.
pub struct ModelCache {
    inner: Mutex<LruCache<String, Arc<LanguageModel>>>,
    supported: HashSet<String>,
}

impl ModelCache {
    /// Build the cache and preload `languages` (most important first).
    pub fn new(languages: &[String], capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| SabiaError::Nlp("model cache capacity must be at least 1".into()))?;
        let mut cache = LruCache::new(capacity);
        let mut supported = HashSet::new();

        for language in languages {
            let code = base_code(language);
            let model = LanguageModel::load(&code)?;
            tracing::info!("🧠 Loaded language model '{}'", code);
            supported.insert(code.clone());
            cache.put(code, Arc::new(model));
        }
        if languages.len() > capacity.get() {
            tracing::warn!(
                "Model cache capacity {} is below the {} configured languages; models will be reloaded on demand",
                capacity,
                languages.len()
            );
        }

        Ok(Self {
            inner: Mutex::new(cache),
            supported,
        })
    }

    /// Model name serving `language`: the language itself if configured, else multilingual.
    pub fn resolve(&self, language: &str) -> String {
        let code = base_code(language);
        if self.supported.contains(&code) {
            code
        } else {
            MULTILINGUAL.into()
        }
    }

    pub fn get(&self, language: &str) -> Arc<LanguageModel> {
        let name = self.resolve(language);
        let mut cache = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(model) = cache.get(&name) {
            return model.clone();
        }
        // Evicted models are reloaded; they loaded once at startup so this succeeds.
        let model = Arc::new(LanguageModel::load(&name).unwrap_or_else(|_| LanguageModel::multilingual()));
        tracing::debug!("Loading language model '{}' into cache", name);
        cache.put(name, model.clone());
        model
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
