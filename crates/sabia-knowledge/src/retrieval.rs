//! Answer selection: local index, then an encyclopedia page merged into a
//! request-scoped index, then the canned "no answer" reply.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use sabia_core::config::{LanguageTemplates, SabiaConfig};
use sabia_core::traits::Lookup;

use crate::corpus::sentence_entries;
use crate::index::{KnowledgeIndex, ScoredMatch};

const FALLBACK_NO_ANSWER: &str = "Sorry, I have no answer for that.";

/// Where an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    Local,
    External,
    NoAnswer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub source: AnswerSource,
    pub score: f32,
    /// Detected language of the question.
    pub language: String,
}

pub struct RetrievalEngine {
    index: Arc<KnowledgeIndex>,
    lookup: Option<Arc<dyn Lookup>>,
    threshold: f32,
    top_k: usize,
    lookup_timeout: Duration,
    templates: BTreeMap<String, LanguageTemplates>,
    default_language: String,
}

impl RetrievalEngine {
    pub fn new(index: Arc<KnowledgeIndex>, config: &SabiaConfig) -> Self {
        Self {
            index,
            lookup: None,
            threshold: config.retrieval.similarity_threshold,
            top_k: config.retrieval.top_k,
            lookup_timeout: Duration::from_secs(config.retrieval.lookup_timeout_secs),
            templates: config.templates.clone(),
            default_language: config.nlp.default_language.clone(),
        }
    }

    /// Enable the external lookup stage.
    pub fn with_lookup(mut self, lookup: Arc<dyn Lookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn index(&self) -> &Arc<KnowledgeIndex> {
        &self.index
    }

    pub async fn answer(&self, user_text: &str) -> Answer {
        let normalizer = self.index.normalizer();
        if user_text.trim().is_empty() {
            return self.no_answer(&self.default_language, 0.0);
        }
        let language = normalizer.detect_language(user_text);
        let tokens = normalizer.tokenize(user_text, &language);

        let local = self.index.search_tokens(&tokens, self.top_k);
        let best_local = local.first().map(|m| m.score).unwrap_or(0.0);
        if let Some(hit) = self.accept(&local) {
            tracing::debug!("Local answer (score {:.3})", hit.score);
            return Answer {
                text: hit.entry.answer.clone(),
                source: AnswerSource::Local,
                score: hit.score,
                language,
            };
        }

        if let Some(answer) = self.answer_from_lookup(user_text, &tokens, &language).await {
            return answer;
        }

        tracing::debug!("No answer cleared threshold {:.3} (best {:.3})", self.threshold, best_local);
        self.no_answer(&language, best_local)
    }

    fn accept<'a>(&self, hits: &'a [ScoredMatch]) -> Option<&'a ScoredMatch> {
        hits.first().filter(|m| m.score >= self.threshold)
    }

    async fn answer_from_lookup(&self, user_text: &str, tokens: &[String], language: &str) -> Option<Answer> {
        let lookup = self.lookup.as_ref()?;
        let key = user_text.trim();
        let text = match tokio::time::timeout(self.lookup_timeout, lookup.get_text(key)).await {
            Ok(Ok(Some(text))) if !text.trim().is_empty() => text,
            Ok(Ok(_)) => {
                tracing::debug!("{} has nothing for '{}'", lookup.name(), key);
                return None;
            }
            Ok(Err(e)) => {
                tracing::debug!("{} lookup failed: {}", lookup.name(), e);
                return None;
            }
            Err(_) => {
                tracing::warn!("{} lookup timed out after {:?}", lookup.name(), self.lookup_timeout);
                return None;
            }
        };

        let sentences = self.index.normalizer().split_sentences(&text);
        let base_len = self.index.len();
        let extended = match self.index.merged(sentence_entries(sentences, base_len)) {
            Ok(index) => index,
            Err(e) => {
                tracing::debug!("Could not build supplementary index: {}", e);
                return None;
            }
        };
        let hits = extended.search_tokens(tokens, self.top_k);
        let hit = self.accept(&hits)?;
        let source = if hit.index >= base_len {
            AnswerSource::External
        } else {
            AnswerSource::Local
        };
        tracing::debug!("Answer after {} lookup: {:?} (score {:.3})", lookup.name(), source, hit.score);
        Some(Answer {
            text: hit.entry.answer.clone(),
            source,
            score: hit.score,
            language: language.to_string(),
        })
    }

    fn no_answer(&self, language: &str, score: f32) -> Answer {
        let text = self
            .templates
            .get(language)
            .or_else(|| self.templates.get(&self.default_language))
            .map(|t| t.no_answer.clone())
            .unwrap_or_else(|| FALLBACK_NO_ANSWER.to_string());
        Answer {
            text,
            source: AnswerSource::NoAnswer,
            score,
            language: language.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusEntry;
    use async_trait::async_trait;
    use sabia_core::error::{Result, SabiaError};
    use sabia_nlp::TextNormalizer;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeLookup {
        text: Option<String>,
        fail: bool,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl FakeLookup {
        fn returning(text: Option<&str>) -> Self {
            Self {
                text: text.map(String::from),
                fail: false,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Lookup for FakeLookup {
        fn name(&self) -> &str {
            "fake"
        }
        async fn get_text(&self, _key: &str) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(SabiaError::Lookup("unreachable".into()));
            }
            Ok(self.text.clone())
        }
    }

    fn config() -> SabiaConfig {
        SabiaConfig::default()
    }

    fn engine() -> RetrievalEngine {
        let normalizer = Arc::new(TextNormalizer::new(&Default::default()).unwrap());
        let entries = vec![
            CorpusEntry::new(0, "What is AI?", "AI stands for artificial intelligence.", ["ai".to_string()]),
            CorpusEntry::new(1, "What is a neural network?", "A model made of layers of neurons.", []),
        ];
        let index = KnowledgeIndex::build(entries, normalizer).unwrap();
        RetrievalEngine::new(Arc::new(index), &config())
    }

    #[tokio::test]
    async fn test_local_answer() {
        let answer = engine().answer("what's artificial intelligence").await;
        assert_eq!(answer.source, AnswerSource::Local);
        assert_eq!(answer.text, "AI stands for artificial intelligence.");
        assert_eq!(answer.language, "en");
    }

    #[tokio::test]
    async fn test_empty_question_gets_no_answer() {
        let lookup = Arc::new(FakeLookup::returning(Some("Anything.")));
        let engine = engine().with_lookup(lookup.clone());
        let answer = engine.answer("").await;
        assert_eq!(answer.source, AnswerSource::NoAnswer);
        assert_eq!(answer.text, config().templates["en"].no_answer);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive() {
        let best = engine().index().search("what's artificial intelligence", 1)[0].score;
        let answer = engine().with_threshold(best).answer("what's artificial intelligence").await;
        assert_eq!(answer.source, AnswerSource::Local);

        let answer = engine()
            .with_threshold(best + 0.001)
            .answer("what's artificial intelligence")
            .await;
        assert_eq!(answer.source, AnswerSource::NoAnswer);
    }

    #[tokio::test]
    async fn test_external_lookup_answers_and_leaves_index_alone() {
        let lookup = Arc::new(FakeLookup::returning(Some(
            "The platypus is a mammal. It lays eggs and lives in Australia.",
        )));
        let engine = engine().with_lookup(lookup.clone());
        let answer = engine.answer("which animal lays eggs").await;
        assert_eq!(answer.source, AnswerSource::External);
        assert_eq!(answer.text, "It lays eggs and lives in Australia.");
        assert_eq!(engine.index().len(), 2);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_or_failed_lookup_is_not_found() {
        for lookup in [
            FakeLookup::returning(Some("   ")),
            FakeLookup::returning(None),
            FakeLookup {
                fail: true,
                ..FakeLookup::returning(None)
            },
        ] {
            let engine = engine().with_lookup(Arc::new(lookup));
            let answer = engine.answer("platypus eggs").await;
            assert_eq!(answer.source, AnswerSource::NoAnswer);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_lookup_times_out() {
        let lookup = FakeLookup {
            delay: Duration::from_secs(3600),
            ..FakeLookup::returning(Some("The platypus lays eggs."))
        };
        let engine = engine().with_lookup(Arc::new(lookup));
        let answer = engine.answer("platypus eggs").await;
        assert_eq!(answer.source, AnswerSource::NoAnswer);
    }

    #[tokio::test]
    async fn test_no_answer_in_detected_language() {
        let answer = engine().answer("Você sabe cozinhar feijoada?").await;
        assert_eq!(answer.source, AnswerSource::NoAnswer);
        assert_eq!(answer.language, "pt");
        assert_eq!(answer.text, config().templates["pt"].no_answer);
    }
}
