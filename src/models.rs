//! Core data models for the chunking and retrieval pipeline.
//!
//! These types represent the documents flowing into the chunkers, the chunks
//! they produce, and the retrievable units seen by the search engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag applied to every chunk of a document that was actually split.
///
/// Single-chunk documents carry only their strategy tag.
pub const TAG_CHUNKED: &str = "chunked";

/// Tag applied to chunks containing at least one embedded image reference.
pub const TAG_HAS_IMAGE: &str = "has-image";

/// Prefix of the per-strategy tag (`chunk-strategy-markdown-semantic`, ...).
pub const CHUNK_STRATEGY_TAG_PREFIX: &str = "chunk-strategy-";

/// Input format of a document, as declared by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Markdown,
    Html,
    Pdf,
    Txt,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Markdown => "markdown",
            DocumentFormat::Html => "html",
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Txt => "txt",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-format document metadata.
///
/// A tagged union instead of a free-form map: only fields a format actually
/// declares exist, and they are schema-checked at deserialization time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DocumentMeta {
    /// No format-specific metadata.
    #[default]
    Plain,
    /// Metadata declared by PDF-extracted documents.
    Pdf {
        /// Total page count of the source PDF, when known.
        #[serde(default)]
        numpages: Option<u32>,
    },
}

impl DocumentMeta {
    /// Declared page count, if this is PDF metadata carrying one.
    pub fn numpages(&self) -> Option<u32> {
        match self {
            DocumentMeta::Pdf { numpages } => *numpages,
            DocumentMeta::Plain => None,
        }
    }
}

/// Immutable input to chunking, owned by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: Option<String>,
    pub content: String,
    pub format: DocumentFormat,
    #[serde(default)]
    pub meta: DocumentMeta,
}

/// Chunking provenance recorded on every chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Name of the strategy that produced the chunk.
    pub strategy: String,
    /// Zero-based position among the document's chunks.
    pub chunk_index: usize,
    /// Total number of chunks for the document; identical on every chunk.
    pub chunk_count: usize,
    /// Heading the chunk is anchored at (semantic strategy only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    /// Estimated first page covered by the chunk (sliding window only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_start: Option<u32>,
    /// Estimated last page covered by the chunk (sliding window only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_end: Option<u32>,
    /// Token offset of the chunk's first token (sliding window only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_start: Option<usize>,
    /// Token offset one past the chunk's last token (sliding window only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_end: Option<usize>,
}

impl ChunkMetadata {
    pub fn new(strategy: &str) -> Self {
        Self {
            strategy: strategy.to_string(),
            chunk_index: 0,
            chunk_count: 0,
            heading: None,
            page_start: None,
            page_end: None,
            token_start: None,
            token_end: None,
        }
    }
}

/// A bounded sub-span of a document, independently retrievable.
///
/// Produced once per document ingestion and logically immutable afterwards.
/// The `hash` is a SHA-256 of the content, used for embedding staleness
/// detection downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub index: usize,
    pub content: String,
    pub tags: Vec<String>,
    pub hash: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Whether any tag marks this chunk as coming from structured chunking.
    pub fn has_strategy_tag(&self) -> bool {
        self.tags
            .iter()
            .any(|t| t.starts_with(CHUNK_STRATEGY_TAG_PREFIX))
    }
}

/// A persisted retrievable unit as seen by the search providers.
///
/// Units derived from documents carry `document_id`; units derived from
/// conversations carry `conversation_id` instead and have no resolvable
/// parent document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchUnit {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Unix timestamp used for date-range filtering.
    pub created_at: i64,
}

/// A unit returned by a provider, in rank order with its raw backend score.
#[derive(Debug, Clone)]
pub struct RankedUnit {
    pub unit: SearchUnit,
    /// Raw score from the backend (term match count, cosine similarity, ...).
    /// Fusion only consumes the rank, never this value.
    pub raw_score: f64,
}

/// Caller-supplied metadata filter for one search invocation.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Inclusive lower bound on unit timestamps.
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on unit timestamps.
    pub date_to: Option<DateTime<Utc>>,
    /// Restrict to units whose parent document has this source id.
    pub source: Option<String>,
    /// Restrict to units whose parent document has this format.
    pub format: Option<DocumentFormat>,
}

impl SearchFilter {
    /// Whether applying this filter requires resolving parent documents.
    pub fn needs_parent(&self) -> bool {
        self.source.is_some() || self.format.is_some()
    }
}
