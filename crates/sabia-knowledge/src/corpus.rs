//! Corpus entries and their sources: the JSON knowledge file and
//! encyclopedia pages split into sentences.

use std::collections::BTreeSet;
use std::path::Path;

use sabia_core::error::{Result, SabiaError};
use sabia_core::traits::{Lookup, Normalizer};
use serde::{Deserialize, Serialize};

/// One answerable unit. `id` is the entry's position in its index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusEntry {
    pub id: usize,
    pub primary_text: String,
    pub answer: String,
    pub tags: BTreeSet<String>,
}

impl CorpusEntry {
    pub fn new(
        id: usize,
        primary_text: impl Into<String>,
        answer: impl Into<String>,
        tags: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            id,
            primary_text: primary_text.into(),
            answer: answer.into(),
            tags: tags.into_iter().collect(),
        }
    }

    /// A sentence that is both the searchable text and the answer.
    pub fn sentence(id: usize, sentence: impl Into<String>) -> Self {
        let sentence = sentence.into();
        Self::new(id, sentence.clone(), sentence, [])
    }

    /// Text the index weighs: primary text, then tags, then answer.
    pub fn searchable_text(&self) -> String {
        let mut text = self.primary_text.clone();
        for tag in &self.tags {
            text.push(' ');
            text.push_str(tag);
        }
        if self.answer != self.primary_text {
            text.push(' ');
            text.push_str(&self.answer);
        }
        text
    }
}

#[derive(Deserialize)]
struct RawEntry {
    question: String,
    answer: String,
    #[serde(default)]
    tags: Vec<String>,
}

/// Load a JSON array of `{question, answer, tags?}` objects.
pub fn load_entries(path: &Path) -> Result<Vec<CorpusEntry>> {
    if !path.exists() {
        tracing::error!("Knowledge base file not found at {}", path.display());
        return Err(SabiaError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("knowledge base file not found at {}", path.display()),
        )));
    }
    tracing::info!("📚 Loading knowledge base from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    let raw: Vec<RawEntry> = serde_json::from_str(&content)?;
    let entries: Vec<CorpusEntry> = raw
        .into_iter()
        .enumerate()
        .map(|(id, e)| CorpusEntry::new(id, e.question, e.answer, e.tags))
        .collect();
    tracing::info!("📚 Loaded {} knowledge entries", entries.len());
    Ok(entries)
}

/// Sentence entries numbered from `start_id`.
pub fn sentence_entries<I>(sentences: I, start_id: usize) -> Vec<CorpusEntry>
where
    I: IntoIterator<Item = String>,
{
    sentences
        .into_iter()
        .enumerate()
        .map(|(i, s)| CorpusEntry::sentence(start_id + i, s))
        .collect()
}

/// Fetch each topic page and split it into sentence entries. Misses are skipped.
pub async fn seed_corpus(
    lookup: &dyn Lookup,
    normalizer: &dyn Normalizer,
    topics: &[String],
    start_id: usize,
) -> Vec<CorpusEntry> {
    let mut entries = Vec::new();
    for topic in topics {
        match lookup.get_text(topic).await {
            Ok(Some(text)) if !text.trim().is_empty() => {
                let sentences = normalizer.split_sentences(&text);
                tracing::info!("🌱 Seeded {} sentences from '{}'", sentences.len(), topic);
                let next = start_id + entries.len();
                entries.extend(sentence_entries(sentences, next));
            }
            Ok(_) => tracing::warn!("Seed topic '{}' not found via {}", topic, lookup.name()),
            Err(e) => tracing::warn!("Seed topic '{}' lookup failed: {}", topic, e),
        }
    }
    entries
}
