//! Hybrid search: weighted Reciprocal Rank Fusion over a lexical and a
//! semantic ranking, with metadata filtering and tag-based boosts.
//!
//! Both providers are queried concurrently with an over-fetched candidate
//! budget. Fusion consumes only the rank of each list, never raw backend
//! scores, so wildly different score scales (term counts vs cosine) fuse
//! cleanly. A semantic failure degrades the call to lexical-only; a lexical
//! failure fails it.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::RetrievalConfig;
use crate::error::SearchError;
use crate::models::{RankedUnit, SearchFilter, SearchUnit, TAG_HAS_IMAGE};
use crate::store::{DocumentStore, EmbeddingProvider, LexicalIndex, ParentDocument};

/// Sentinel source id matching conversation-derived units, which have no
/// parent document to resolve a source from.
pub const CONVERSATION_SOURCE: &str = "conversations";

/// Score boost for units produced by a structured chunking strategy.
const STRATEGY_BOOST: f64 = 0.05;

/// Score boost for units carrying embedded image references.
const IMAGE_BOOST: f64 = 0.02;

/// Per-call override of the configured fusion weights.
#[derive(Debug, Clone, Copy)]
pub struct FusionWeights {
    pub lexical: f64,
    pub semantic: f64,
}

/// One fused result with its per-ranking contributions broken out.
#[derive(Debug, Clone)]
pub struct SearchResultItem {
    pub unit: SearchUnit,
    /// Weighted RRF contribution of the lexical ranking (0 if absent).
    pub lexical_score: f64,
    /// Weighted RRF contribution of the semantic ranking (0 if absent).
    pub semantic_score: f64,
    /// Sum of contributions plus tag boosts; the sort key.
    pub combined_score: f64,
}

/// Outcome of one search call.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
    /// True when the semantic ranking contributed nothing and results are
    /// lexical-only.
    pub degraded: bool,
    /// Human-readable cause of degradation, when degraded.
    pub fallback_reason: Option<String>,
}

/// Rank-fusion search over pluggable providers.
pub struct SearchEngine {
    lexical: Arc<dyn LexicalIndex>,
    semantic: Arc<dyn EmbeddingProvider>,
    documents: Arc<dyn DocumentStore>,
    config: RetrievalConfig,
}

impl SearchEngine {
    pub fn new(
        lexical: Arc<dyn LexicalIndex>,
        semantic: Arc<dyn EmbeddingProvider>,
        documents: Arc<dyn DocumentStore>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            lexical,
            semantic,
            documents,
            config,
        }
    }

    /// Run a hybrid search.
    ///
    /// The query is rejected if empty after trimming. `weights` overrides
    /// the configured fusion weights for this call only.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        weights: Option<FusionWeights>,
        filter: &SearchFilter,
    ) -> Result<SearchResponse, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        if limit == 0 {
            return Ok(SearchResponse {
                results: Vec::new(),
                degraded: false,
                fallback_reason: None,
            });
        }

        let weights = weights.unwrap_or(FusionWeights {
            lexical: self.config.lexical_weight,
            semantic: self.config.semantic_weight,
        });
        let fetch = limit * self.config.candidate_multiplier;

        let (lexical_result, embed_result) =
            tokio::join!(self.lexical.search(query, fetch), self.semantic.embed(query));

        let lexical_hits = lexical_result.map_err(SearchError::Lexical)?;

        let (semantic_hits, fallback_reason) = match embed_result {
            Ok(embedding) => match self.semantic.search_by_embedding(&embedding, fetch).await {
                Ok(hits) if hits.is_empty() => {
                    (Vec::new(), Some("semantic search returned no results".to_string()))
                }
                Ok(hits) => (hits, None),
                Err(err) => (Vec::new(), Some(format!("semantic search failed: {err:#}"))),
            },
            Err(err) => (Vec::new(), Some(format!("query embedding failed: {err:#}"))),
        };
        let degraded = fallback_reason.is_some();
        if let Some(reason) = &fallback_reason {
            warn!(%reason, "degrading to lexical-only results");
        }

        let mut results = self.fuse(&lexical_hits, &semantic_hits, weights);
        debug!(
            lexical = lexical_hits.len(),
            semantic = semantic_hits.len(),
            fused = results.len(),
            "fused candidate lists"
        );

        self.apply_filter(&mut results, filter).await?;

        for item in &mut results {
            item.combined_score += boost(&item.unit);
        }

        results.sort_by(|a, b| {
            b.combined_score
                .partial_cmp(&a.combined_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);

        Ok(SearchResponse {
            results,
            degraded,
            fallback_reason,
        })
    }

    /// Weighted RRF: each list contributes `weight / (k + rank + 1)` for
    /// every unit it ranks; contributions sum across lists. Candidate order
    /// follows first appearance (lexical list first), which keeps the final
    /// sort stable and deterministic.
    fn fuse(
        &self,
        lexical: &[RankedUnit],
        semantic: &[RankedUnit],
        weights: FusionWeights,
    ) -> Vec<SearchResultItem> {
        let k = self.config.rrf_k;
        let mut order: Vec<SearchResultItem> = Vec::new();
        let mut by_id: HashMap<String, usize> = HashMap::new();

        let mut absorb = |hits: &[RankedUnit], weight: f64, semantic_list: bool| {
            for (rank, hit) in hits.iter().enumerate() {
                let contribution = weight / (k + rank as f64 + 1.0);
                let idx = *by_id.entry(hit.unit.id.clone()).or_insert_with(|| {
                    order.push(SearchResultItem {
                        unit: hit.unit.clone(),
                        lexical_score: 0.0,
                        semantic_score: 0.0,
                        combined_score: 0.0,
                    });
                    order.len() - 1
                });
                let item = &mut order[idx];
                if semantic_list {
                    item.semantic_score += contribution;
                } else {
                    item.lexical_score += contribution;
                }
                item.combined_score += contribution;
            }
        };

        absorb(lexical, weights.lexical, false);
        absorb(semantic, weights.semantic, true);
        order
    }

    /// Drop candidates the filter excludes. Source and format filters need
    /// the parent document; conversation-derived units have none and match
    /// only the conversation source sentinel.
    async fn apply_filter(
        &self,
        results: &mut Vec<SearchResultItem>,
        filter: &SearchFilter,
    ) -> Result<(), SearchError> {
        if let Some(from) = filter.date_from {
            results.retain(|item| item.unit.created_at >= from.timestamp());
        }
        if let Some(to) = filter.date_to {
            results.retain(|item| item.unit.created_at <= to.timestamp());
        }

        if !filter.needs_parent() {
            return Ok(());
        }

        let ids: Vec<String> = results
            .iter()
            .filter_map(|item| item.unit.document_id.clone())
            .collect();
        let parents = self
            .documents
            .get_metadata_batch(&ids)
            .await
            .map_err(SearchError::Store)?;

        results.retain(|item| parent_matches(&item.unit, filter, &parents));
        Ok(())
    }
}

fn parent_matches(
    unit: &SearchUnit,
    filter: &SearchFilter,
    parents: &HashMap<String, ParentDocument>,
) -> bool {
    let parent = unit.document_id.as_ref().and_then(|id| parents.get(id));

    if let Some(source) = &filter.source {
        let matched = match parent {
            Some(p) => p.source_id.as_deref() == Some(source.as_str()),
            // Conversation units have no parent document; they belong to
            // the conversation pseudo-source.
            None => unit.conversation_id.is_some() && source == CONVERSATION_SOURCE,
        };
        if !matched {
            return false;
        }
    }

    if let Some(format) = filter.format {
        match parent {
            Some(p) if p.format == format => {}
            _ => return false,
        }
    }

    true
}

/// Post-fusion tag boosts: structured chunking and embedded images both
/// mark content that tends to be more useful to surface.
fn boost(unit: &SearchUnit) -> f64 {
    let mut bonus = 0.0;
    if unit
        .tags
        .iter()
        .any(|t| t.starts_with(crate::models::CHUNK_STRATEGY_TAG_PREFIX))
    {
        bonus += STRATEGY_BOOST;
    }
    if unit.tags.iter().any(|t| t == TAG_HAS_IMAGE) {
        bonus += IMAGE_BOOST;
    }
    bonus
}
