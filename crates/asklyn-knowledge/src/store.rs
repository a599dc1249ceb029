//! Append-only in-memory document store.

use asklyn_core::config::KnowledgeConfig;

/// Ordered collection of raw text documents.
///
/// Documents can only be appended; insertion order is preserved and nothing
/// is deduplicated. Contents are lost when the process exits.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeStore {
    documents: Vec<String>,
}

impl KnowledgeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `documents` in the given order.
    pub fn with_documents<I, S>(documents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            documents: documents.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a store with the built-in seed documents.
    pub fn seeded() -> Self {
        Self::from_config(&KnowledgeConfig::default())
    }

    /// Create a store from the configured seed documents.
    pub fn from_config(config: &KnowledgeConfig) -> Self {
        Self::with_documents(config.seed_documents.iter().cloned())
    }

    /// Append a whole document and return the new total count.
    pub fn append(&mut self, document: impl Into<String>) -> usize {
        let document = document.into();
        if document.trim().is_empty() {
            tracing::warn!("Appending empty document to knowledge base");
        }
        self.documents.push(document);
        self.documents.len()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Iterate documents in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(String::as_str)
    }
}
