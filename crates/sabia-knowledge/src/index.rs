//! TF-IDF term weighting with bigrams, cosine ranking.
//!
//! Weights follow the usual smoothed scheme: raw term counts times
//! `ln((1 + n) / (1 + df)) + 1`, each row L2-normalized so that cosine
//! similarity reduces to a sparse dot product. The vocabulary is fixed at
//! build time; query terms outside it contribute nothing.

use std::collections::HashMap;
use std::sync::Arc;

use sabia_core::error::{Result, SabiaError};
use sabia_core::traits::Normalizer;

use crate::corpus::CorpusEntry;

/// Unigrams followed by adjacent bigrams ("neural network").
pub fn terms(tokens: &[String]) -> Vec<String> {
    let mut out: Vec<String> = tokens.to_vec();
    out.extend(tokens.windows(2).map(|w| format!("{} {}", w[0], w[1])));
    out
}

type SparseRow = Vec<(usize, f32)>;

/// Sparse entry × term weight matrix.
#[derive(Debug, Clone)]
pub struct TermWeightMatrix {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    rows: Vec<SparseRow>,
}

impl TermWeightMatrix {
    /// Fit vocabulary and idf on `documents` (token lists) and weight every row.
    pub fn fit(documents: &[Vec<String>]) -> Self {
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut df: Vec<usize> = Vec::new();
        let mut counted: Vec<HashMap<usize, f32>> = Vec::with_capacity(documents.len());

        for tokens in documents {
            let mut counts: HashMap<usize, f32> = HashMap::new();
            for term in terms(tokens) {
                let next = vocabulary.len();
                let col = *vocabulary.entry(term).or_insert(next);
                if col == df.len() {
                    df.push(0);
                }
                *counts.entry(col).or_insert(0.0) += 1.0;
            }
            for col in counts.keys() {
                df[*col] += 1;
            }
            counted.push(counts);
        }

        let n = documents.len() as f32;
        let idf: Vec<f32> = df
            .iter()
            .map(|&d| ((1.0 + n) / (1.0 + d as f32)).ln() + 1.0)
            .collect();

        let rows = counted
            .into_iter()
            .map(|counts| normalize(counts.into_iter().map(|(c, tf)| (c, tf * idf[c])).collect()))
            .collect();

        Self { vocabulary, idf, rows }
    }

    /// Weight a query with the fitted vocabulary; unknown terms are dropped.
    pub fn transform(&self, tokens: &[String]) -> SparseRow {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for term in terms(tokens) {
            if let Some(&col) = self.vocabulary.get(&term) {
                *counts.entry(col).or_insert(0.0) += 1.0;
            }
        }
        normalize(counts.into_iter().map(|(c, tf)| (c, tf * self.idf[c])).collect())
    }

    /// Cosine similarity of a transformed query against every row.
    pub fn similarities(&self, query: &SparseRow) -> Vec<f32> {
        let q: HashMap<usize, f32> = query.iter().copied().collect();
        self.rows
            .iter()
            .map(|row| {
                let dot: f32 = row.iter().filter_map(|(c, w)| q.get(c).map(|qw| qw * w)).sum();
                dot.clamp(0.0, 1.0)
            })
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }
}

fn normalize(mut row: SparseRow) -> SparseRow {
    // Column order keeps the float summation identical for identical rows.
    row.sort_by_key(|(c, _)| *c);
    let norm = row.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for (_, w) in row.iter_mut() {
            *w /= norm;
        }
    }
    row
}

/// A ranked search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMatch {
    pub index: usize,
    pub entry: CorpusEntry,
    pub score: f32,
}

/// Read-only after construction; share behind an `Arc` without locking.
pub struct KnowledgeIndex {
    entries: Vec<CorpusEntry>,
    tokens: Vec<Vec<String>>,
    matrix: TermWeightMatrix,
    normalizer: Arc<dyn Normalizer>,
}

impl KnowledgeIndex {
    pub fn build(entries: Vec<CorpusEntry>, normalizer: Arc<dyn Normalizer>) -> Result<Self> {
        if entries.is_empty() {
            return Err(SabiaError::EmptyCorpus);
        }
        let tokens = entries
            .iter()
            .map(|e| normalizer.tokenize_detected(&e.searchable_text()))
            .collect();
        let index = Self::assemble(entries, tokens, normalizer);
        tracing::info!(
            "📇 Knowledge index built: {} entries, {} terms",
            index.len(),
            index.matrix.vocabulary_len()
        );
        Ok(index)
    }

    fn assemble(mut entries: Vec<CorpusEntry>, tokens: Vec<Vec<String>>, normalizer: Arc<dyn Normalizer>) -> Self {
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.id = i;
        }
        let matrix = TermWeightMatrix::fit(&tokens);
        Self {
            entries,
            tokens,
            matrix,
            normalizer,
        }
    }

    /// A new index over this corpus plus `extra`. `self` is left untouched.
    pub fn merged(&self, extra: Vec<CorpusEntry>) -> Result<Self> {
        let mut entries = self.entries.clone();
        let mut tokens = self.tokens.clone();
        for entry in extra {
            tokens.push(self.normalizer.tokenize_detected(&entry.searchable_text()));
            entries.push(entry);
        }
        if entries.is_empty() {
            return Err(SabiaError::EmptyCorpus);
        }
        Ok(Self::assemble(entries, tokens, self.normalizer.clone()))
    }

    pub fn search(&self, query_text: &str, top_k: usize) -> Vec<ScoredMatch> {
        if query_text.trim().is_empty() {
            tracing::debug!("Empty search query, returning no results");
            return Vec::new();
        }
        let tokens = self.normalizer.tokenize_detected(query_text);
        self.search_tokens(&tokens, top_k)
    }

    /// Rank entries for an already-normalized query.
    pub fn search_tokens(&self, tokens: &[String], top_k: usize) -> Vec<ScoredMatch> {
        if tokens.is_empty() || top_k == 0 {
            return Vec::new();
        }
        let query = self.matrix.transform(tokens);
        let mut hits: Vec<(usize, f32)> = self
            .matrix
            .similarities(&query)
            .into_iter()
            .enumerate()
            .filter(|(_, s)| *s > 0.0)
            .collect();
        hits.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        hits.truncate(top_k);
        tracing::debug!("Knowledge search matched {} entries", hits.len());
        hits.into_iter()
            .map(|(index, score)| ScoredMatch {
                index,
                entry: self.entries[index].clone(),
                score,
            })
            .collect()
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn normalizer(&self) -> &Arc<dyn Normalizer> {
        &self.normalizer
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
