//! TF-IDF retrieval with cosine similarity.
//!
//! The vector space is rebuilt on every query over `{query} ∪ documents`:
//! - tokens: lowercase, runs of two or more word characters
//! - idf(t) = ln((1 + n) / (1 + df(t))) + 1
//! - weights: raw count × idf, L2-normalised
//! - score: dot product of the normalised query and document vectors
//!
//! Ranking is by descending score with ties kept in insertion order, then
//! truncated to `top_k`, then filtered to scores above `min_score`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use asklyn_core::config::RetrievalConfig;
use regex::Regex;
use serde::Serialize;

use crate::store::KnowledgeStore;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?u)\b\w\w+\b").expect("token pattern is valid"));

/// Split text into lowercase terms of at least two word characters.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// A document that survived ranking and filtering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// Position of the document in the store.
    pub index: usize,
    pub content: String,
    pub score: f64,
}

/// Sparse vector as `(term_id, weight)` pairs sorted by term id.
type SparseVector = Vec<(usize, f64)>;

/// Build L2-normalised TF-IDF vectors for every text in `corpus`.
fn tfidf_vectors(corpus: &[&str]) -> Vec<SparseVector> {
    let tokenized: Vec<Vec<String>> = corpus.iter().map(|text| tokenize(text)).collect();

    // Term ids follow lexical order so every run sums in the same order.
    let mut vocabulary: BTreeMap<&str, usize> = BTreeMap::new();
    for tokens in &tokenized {
        for token in tokens {
            vocabulary.entry(token.as_str()).or_insert(0);
        }
    }
    for (id, slot) in vocabulary.values_mut().enumerate() {
        *slot = id;
    }

    let counts: Vec<BTreeMap<usize, usize>> = tokenized
        .iter()
        .map(|tokens| {
            let mut tf = BTreeMap::new();
            for token in tokens {
                *tf.entry(vocabulary[token.as_str()]).or_insert(0) += 1;
            }
            tf
        })
        .collect();

    let mut df = vec![0usize; vocabulary.len()];
    for tf in &counts {
        for &term in tf.keys() {
            df[term] += 1;
        }
    }

    let n = corpus.len() as f64;
    let idf: Vec<f64> = df
        .iter()
        .map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
        .collect();

    counts
        .into_iter()
        .map(|tf| {
            let mut vector: SparseVector = tf
                .into_iter()
                .map(|(term, count)| (term, count as f64 * idf[term]))
                .collect();
            let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                for (_, w) in &mut vector {
                    *w /= norm;
                }
            }
            vector
        })
        .collect()
}

/// Dot product of two sparse vectors sorted by term id.
fn dot(a: &SparseVector, b: &SparseVector) -> f64 {
    let (mut i, mut j, mut sum) = (0, 0, 0.0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

/// Lexical retriever over a [`KnowledgeStore`].
#[derive(Debug, Clone)]
pub struct Retriever {
    top_k: usize,
    min_score: f64,
}

impl Default for Retriever {
    fn default() -> Self {
        Self::from_config(&RetrievalConfig::default())
    }
}

impl Retriever {
    pub fn new(top_k: usize, min_score: f64) -> Self {
        Self { top_k, min_score }
    }

    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self::new(config.top_k, config.min_score)
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn min_score(&self) -> f64 {
        self.min_score
    }

    /// Cosine similarity between `query` and every document, in store order.
    pub fn scores(&self, store: &KnowledgeStore, query: &str) -> Vec<f64> {
        if store.is_empty() {
            return Vec::new();
        }
        let corpus: Vec<&str> = std::iter::once(query).chain(store.iter()).collect();
        let vectors = tfidf_vectors(&corpus);
        let (query_vec, doc_vecs) = vectors.split_at(1);
        doc_vecs.iter().map(|doc| dot(&query_vec[0], doc)).collect()
    }

    /// Ranked documents with their scores, at most `limit` of them.
    pub fn search(&self, store: &KnowledgeStore, query: &str, limit: usize) -> Vec<SearchResult> {
        if limit == 0 || store.is_empty() {
            return Vec::new();
        }

        let scores = self.scores(store, query);
        let mut ranked: Vec<usize> = (0..scores.len()).collect();
        // Stable sort: equal scores keep insertion order.
        ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        let documents: Vec<&str> = store.iter().collect();
        let results: Vec<SearchResult> = ranked
            .into_iter()
            .take(limit)
            .filter(|&i| scores[i] > self.min_score)
            .map(|i| SearchResult {
                index: i,
                content: documents[i].to_string(),
                score: scores[i],
            })
            .collect();

        tracing::debug!(
            "Retrieved {}/{} document(s) for query ({} chars)",
            results.len(),
            store.len(),
            query.len()
        );
        results
    }

    /// Top documents for `query` using the configured `top_k`.
    pub fn retrieve(&self, store: &KnowledgeStore, query: &str) -> Vec<String> {
        self.retrieve_top(store, query, self.top_k)
    }

    /// Top documents for `query`, at most `top_k` of them.
    pub fn retrieve_top(&self, store: &KnowledgeStore, query: &str, top_k: usize) -> Vec<String> {
        self.search(store, query, top_k)
            .into_iter()
            .map(|r| r.content)
            .collect()
    }
}
