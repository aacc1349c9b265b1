use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;

/// Top-level configuration, constructed once at startup and passed by
/// reference into the components that need it. Nothing in the core reads
/// the process environment.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// Size guardrails for both chunking strategies.
#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Floor below which a chunk is merged into a neighbor.
    #[serde(default = "default_min_tokens")]
    pub min_tokens_per_chunk: usize,
    /// Ceiling triggering a paragraph-boundary sub-split.
    #[serde(default = "default_max_tokens")]
    pub max_tokens_per_chunk: usize,
    /// Hard cap on chunks per document, enforced by merging.
    #[serde(default = "default_max_chunks")]
    pub max_chunks_per_document: usize,
    /// Sliding window size in tokens.
    #[serde(default = "default_window_tokens")]
    pub sliding_window_tokens: usize,
    /// Overlap carried between consecutive windows; must be smaller than
    /// the window itself.
    #[serde(default = "default_overlap_tokens")]
    pub sliding_window_overlap_tokens: usize,
    /// Documents below this estimated size are kept whole instead of
    /// windowed.
    #[serde(default = "default_min_tokens_to_chunk")]
    pub sliding_window_min_tokens_to_chunk: usize,
}

fn default_min_tokens() -> usize {
    10
}
fn default_max_tokens() -> usize {
    512
}
fn default_max_chunks() -> usize {
    100
}
fn default_window_tokens() -> usize {
    512
}
fn default_overlap_tokens() -> usize {
    64
}
fn default_min_tokens_to_chunk() -> usize {
    640
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            min_tokens_per_chunk: default_min_tokens(),
            max_tokens_per_chunk: default_max_tokens(),
            max_chunks_per_document: default_max_chunks(),
            sliding_window_tokens: default_window_tokens(),
            sliding_window_overlap_tokens: default_overlap_tokens(),
            sliding_window_min_tokens_to_chunk: default_min_tokens_to_chunk(),
        }
    }
}

impl ChunkingConfig {
    /// Check every chunking invariant. Called by chunker constructors so a
    /// violating configuration is rejected before any chunking attempt.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.max_tokens_per_chunk == 0 {
            return Err(ConfigError::ZeroMaxTokens);
        }
        if self.min_tokens_per_chunk > self.max_tokens_per_chunk {
            return Err(ConfigError::MinExceedsMax {
                min: self.min_tokens_per_chunk,
                max: self.max_tokens_per_chunk,
            });
        }
        if self.max_chunks_per_document == 0 {
            return Err(ConfigError::ZeroChunkCap);
        }
        if self.sliding_window_tokens == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.sliding_window_overlap_tokens >= self.sliding_window_tokens {
            return Err(ConfigError::OverlapNotBelowWindow {
                overlap: self.sliding_window_overlap_tokens,
                window: self.sliding_window_tokens,
            });
        }
        Ok(())
    }
}

/// Fusion tuning for the search engine.
#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Reciprocal Rank Fusion smoothing constant.
    #[serde(default = "default_rrf_k")]
    pub rrf_k: f64,
    /// Weight of the lexical ranking.
    #[serde(default = "default_lexical_weight")]
    pub lexical_weight: f64,
    /// Weight of the semantic ranking.
    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f64,
    /// Over-fetch factor: each provider is asked for `multiplier × limit`
    /// candidates before fusion.
    #[serde(default = "default_candidate_multiplier")]
    pub candidate_multiplier: usize,
}

fn default_rrf_k() -> f64 {
    60.0
}
fn default_lexical_weight() -> f64 {
    0.6
}
fn default_semantic_weight() -> f64 {
    0.4
}
fn default_candidate_multiplier() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            rrf_k: default_rrf_k(),
            lexical_weight: default_lexical_weight(),
            semantic_weight: default_semantic_weight(),
            candidate_multiplier: default_candidate_multiplier(),
        }
    }
}

/// Bulk embedding-indexing settings.
#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// Number of chunks embedded per provider call.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pause between batches, respecting provider throughput limits.
    #[serde(default = "default_batch_interval_ms")]
    pub batch_interval_ms: u64,
}

fn default_batch_size() -> usize {
    64
}
fn default_batch_interval_ms() -> u64 {
    200
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_interval_ms: default_batch_interval_ms(),
        }
    }
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    config
        .chunking
        .validate()
        .with_context(|| "Invalid [chunking] configuration")?;

    if config.retrieval.rrf_k <= 0.0 {
        anyhow::bail!("retrieval.rrf_k must be > 0");
    }
    if config.retrieval.lexical_weight < 0.0 || config.retrieval.semantic_weight < 0.0 {
        anyhow::bail!("retrieval weights must be >= 0");
    }
    if config.retrieval.lexical_weight + config.retrieval.semantic_weight <= 0.0 {
        anyhow::bail!("retrieval weights must not both be zero");
    }
    if config.retrieval.candidate_multiplier < 1 {
        anyhow::bail!("retrieval.candidate_multiplier must be >= 1");
    }
    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }

    Ok(config)
}
