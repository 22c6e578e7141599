//! Question → framed answer.

use std::sync::Arc;

use sabia_core::types::SentimentResult;
use sabia_knowledge::{AnswerSource, RetrievalEngine};

use crate::adapter::ResponseAdapter;

/// A finished text reply.
#[derive(Debug, Clone)]
pub struct Reply {
    /// Adapted text sent to the user.
    pub text: String,
    pub source: AnswerSource,
    pub sentiment: SentimentResult,
}

impl Reply {
    pub fn language(&self) -> &str {
        &self.sentiment.language
    }
}

pub struct Responder {
    retrieval: Arc<RetrievalEngine>,
    adapter: ResponseAdapter,
}

impl Responder {
    pub fn new(retrieval: Arc<RetrievalEngine>, adapter: ResponseAdapter) -> Self {
        Self { retrieval, adapter }
    }

    /// Retrieve, score sentiment in the detected language, and frame.
    /// The canned no-answer reply is framed too.
    pub async fn reply(&self, text: &str) -> Reply {
        let answer = self.retrieval.answer(text).await;
        let normalizer = self.retrieval.index().normalizer();
        let sentiment = if text.trim().is_empty() {
            SentimentResult::neutral(&answer.language)
        } else {
            normalizer.sentiment(text, &answer.language)
        };
        tracing::debug!(
            "Reply via {:?} (score {:.3}), sentiment {} in {}",
            answer.source,
            answer.score,
            sentiment.label,
            sentiment.language
        );
        Reply {
            text: self.adapter.adapt(&answer.text, &sentiment),
            source: answer.source,
            sentiment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sabia_core::SabiaConfig;
    use sabia_core::types::SentimentLabel;
    use sabia_knowledge::{CorpusEntry, KnowledgeIndex};
    use sabia_nlp::TextNormalizer;

    fn responder() -> Responder {
        let config = SabiaConfig::default();
        let normalizer = Arc::new(TextNormalizer::new(&config.nlp).unwrap());
        let entries = vec![CorpusEntry::new(
            0,
            "What is AI?",
            "AI stands for artificial intelligence.",
            ["ai".to_string()],
        )];
        let index = Arc::new(KnowledgeIndex::build(entries, normalizer).unwrap());
        let retrieval = Arc::new(RetrievalEngine::new(index, &config));
        Responder::new(retrieval, ResponseAdapter::from_config(&config))
    }

    #[tokio::test]
    async fn test_reply_frames_local_answer() {
        let reply = responder().reply("what is artificial intelligence").await;
        assert_eq!(reply.source, AnswerSource::Local);
        assert!(reply.text.ends_with("AI stands for artificial intelligence."));
        assert_eq!(reply.language(), "en");
    }

    #[tokio::test]
    async fn test_negative_question_gets_empathy() {
        let reply = responder().reply("I hate that AI is so confusing and bad").await;
        assert_eq!(reply.sentiment.label, SentimentLabel::Negative);
        assert!(reply.text.starts_with("I hear you."));
    }

    #[tokio::test]
    async fn test_empty_reply_is_no_answer() {
        let reply = responder().reply("   ").await;
        assert_eq!(reply.source, AnswerSource::NoAnswer);
        assert_eq!(reply.sentiment.label, SentimentLabel::Neutral);
        assert!(reply.text.contains("I do not know that yet"));
    }
}
