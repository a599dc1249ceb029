//! # AskLyn Knowledge Base
//!
//! Minimal retrieval-augmented "generation" over an in-memory list of texts.
//! No embeddings, no vector DB, no persistence: the store lives as long as
//! the process.
//!
//! ## How it works
//! ```text
//! User: "What is RAG?"
//!   ↓
//! Retriever::retrieve(&store, "What is RAG?")
//!   ↓ TF-IDF over {query} ∪ documents, cosine similarity
//! Top 2 documents scoring above 0.1
//!   ↓
//! ResponseComposer::compose(query, context)
//!   ↓
//! Templated answer quoting the retrieved text
//! ```

pub mod compose;
pub mod search;
pub mod store;

pub use compose::ResponseComposer;
pub use search::{Retriever, SearchResult, tokenize};
pub use store::KnowledgeStore;
