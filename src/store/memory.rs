//! In-memory provider implementations.
//!
//! Brute-force and deterministic: good enough for tests, embedded use, and
//! small corpora. The lexical index ranks by query-term occurrence counts;
//! the embedding provider hashes words into a fixed-size bag-of-words
//! vector and ranks by cosine similarity.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::{RankedUnit, SearchUnit};

use super::{DocumentStore, EmbeddingProvider, LexicalIndex, ParentDocument};

/// Term-occurrence lexical ranking over an in-memory unit list.
#[derive(Default)]
pub struct MemoryLexicalIndex {
    units: RwLock<Vec<SearchUnit>>,
}

impl MemoryLexicalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, unit: SearchUnit) {
        self.units.write().await.push(unit);
    }
}

#[async_trait]
impl LexicalIndex for MemoryLexicalIndex {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RankedUnit>> {
        let terms: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(|t| t.to_string())
            .collect();

        let units = self.units.read().await;
        let mut scored: Vec<RankedUnit> = units
            .iter()
            .filter_map(|unit| {
                let haystack = unit.content.to_lowercase();
                let score: usize = terms
                    .iter()
                    .map(|t| haystack.matches(t.as_str()).count())
                    .sum();
                (score > 0).then(|| RankedUnit {
                    unit: unit.clone(),
                    raw_score: score as f64,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.raw_score
                .partial_cmp(&a.raw_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        Ok(scored)
    }
}

/// Deterministic bag-of-words embedding provider with a cosine-similarity
/// vector store attached.
pub struct HashEmbeddingProvider {
    dims: usize,
    entries: RwLock<Vec<(SearchUnit, Vec<f32>)>>,
}

impl HashEmbeddingProvider {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Embed and store a unit so it becomes visible to
    /// [`EmbeddingProvider::search_by_embedding`].
    pub async fn index(&self, unit: SearchUnit) -> Result<()> {
        let vector = self.embed(&unit.content).await?;
        self.entries.write().await.push((unit, vector));
        Ok(())
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dims];
        for word in text.to_lowercase().split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            let bucket = (hasher.finish() as usize) % self.dims;
            vector[bucket] += 1.0;
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    fn model_name(&self) -> &str {
        "hash-bow"
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    async fn search_by_embedding(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RankedUnit>> {
        if embedding.len() != self.dims {
            bail!(
                "embedding has {} dims, provider expects {}",
                embedding.len(),
                self.dims
            );
        }
        let entries = self.entries.read().await;
        let mut scored: Vec<RankedUnit> = entries
            .iter()
            .map(|(unit, vector)| RankedUnit {
                unit: unit.clone(),
                raw_score: cosine_sim(embedding, vector) as f64,
            })
            .collect();
        scored.sort_by(|a, b| {
            b.raw_score
                .partial_cmp(&a.raw_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        Ok(scored)
    }
}

/// Cosine similarity of two equal-length vectors; zero vectors score 0.
pub fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// In-memory parent-document metadata lookup.
#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: RwLock<HashMap<String, ParentDocument>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, doc: ParentDocument) {
        self.docs.write().await.insert(doc.id.clone(), doc);
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_metadata_batch(&self, ids: &[String]) -> Result<HashMap<String, ParentDocument>> {
        let docs = self.docs.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| docs.get(id).map(|d| (id.clone(), d.clone())))
            .collect())
    }
}
