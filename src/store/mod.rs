//! Provider traits the search engine is written against.
//!
//! The engine never talks to a concrete backend: lexical ranking, semantic
//! ranking, and parent-document metadata each sit behind an object-safe
//! async trait, so tests and embedded deployments can swap in the in-memory
//! implementations from [`memory`].

pub mod memory;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{DocumentFormat, RankedUnit};

pub use memory::{HashEmbeddingProvider, MemoryDocumentStore, MemoryLexicalIndex};

/// Keyword-ranking backend. Returns units in descending relevance order.
#[async_trait]
pub trait LexicalIndex: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RankedUnit>>;
}

/// Embedding backend: turns text into vectors and ranks stored units by
/// vector similarity.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier of the underlying model, recorded alongside embeddings.
    fn model_name(&self) -> &str;

    /// Dimensionality of the vectors this provider produces.
    fn dims(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch in one provider call. Must return exactly one vector
    /// per input, in order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Rank stored units by similarity to `embedding`, best first.
    async fn search_by_embedding(&self, embedding: &[f32], limit: usize)
        -> Result<Vec<RankedUnit>>;
}

/// Parent-document metadata needed to apply source and format filters.
#[derive(Debug, Clone)]
pub struct ParentDocument {
    pub id: String,
    pub format: DocumentFormat,
    /// Ingestion source the document came from, when recorded.
    pub source_id: Option<String>,
    pub updated_at: i64,
}

/// Lookup of parent documents for filter enrichment.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Resolve metadata for the given document ids. Ids with no stored
    /// document are simply absent from the result map.
    async fn get_metadata_batch(&self, ids: &[String]) -> Result<HashMap<String, ParentDocument>>;
}
