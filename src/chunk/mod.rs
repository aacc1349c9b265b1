//! Document chunking.
//!
//! Two strategies share one facade: heading-structured text (Markdown, or
//! HTML after preprocessing) goes through the [`SemanticChunker`]; large
//! unstructured text (PDF-extracted) goes through the
//! [`SlidingWindowChunker`]. Configuration is validated once at
//! construction, after which chunking is total and deterministic.

pub mod semantic;
pub mod window;

pub use semantic::{SemanticChunker, STRATEGY_MARKDOWN_SEMANTIC};
pub use window::{SlidingWindowChunker, STRATEGY_PDF_SLIDING_WINDOW};

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::ChunkingConfig;
use crate::error::ConfigError;
use crate::media;
use crate::models::{
    Chunk, ChunkMetadata, Document, DocumentFormat, CHUNK_STRATEGY_TAG_PREFIX, TAG_CHUNKED,
    TAG_HAS_IMAGE,
};
use crate::preprocess;

/// Format-dispatching chunker facade.
pub struct Chunker {
    semantic: SemanticChunker,
    window: SlidingWindowChunker,
}

impl Chunker {
    /// Build a chunker, rejecting invariant-violating configuration before
    /// any chunking attempt.
    pub fn new(config: &ChunkingConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            semantic: SemanticChunker::new(config)?,
            window: SlidingWindowChunker::new(config)?,
        })
    }

    /// Chunk a document with the strategy its format calls for.
    ///
    /// Total and deterministic: malformed input degrades to coarser
    /// chunking rather than failing, and an empty document yields zero
    /// chunks.
    pub fn chunk(&self, doc: &Document) -> Vec<Chunk> {
        match doc.format {
            DocumentFormat::Pdf => self.window.chunk(doc),
            DocumentFormat::Html => {
                let text = preprocess::html_to_text(&doc.content);
                self.semantic.chunk(doc, &text)
            }
            DocumentFormat::Markdown | DocumentFormat::Txt => {
                self.semantic.chunk(doc, &doc.content)
            }
        }
    }
}

/// Strategy output before ids, hashes, and tags are attached.
pub(crate) struct DraftChunk {
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// Turn strategy drafts into finished chunks: contiguous zero-based
/// indices, uniform `chunk_count`, tag assignment, UUID ids, and SHA-256
/// content hashes.
pub(crate) fn finalize(doc: &Document, strategy: &str, drafts: Vec<DraftChunk>) -> Vec<Chunk> {
    let count = drafts.len();
    drafts
        .into_iter()
        .enumerate()
        .map(|(i, mut draft)| {
            draft.metadata.chunk_index = i;
            draft.metadata.chunk_count = count;

            let mut tags = Vec::new();
            if count > 1 {
                tags.push(TAG_CHUNKED.to_string());
            }
            tags.push(format!("{CHUNK_STRATEGY_TAG_PREFIX}{strategy}"));
            if media::has_media(&draft.content) {
                tags.push(TAG_HAS_IMAGE.to_string());
            }

            let mut hasher = Sha256::new();
            hasher.update(draft.content.as_bytes());

            Chunk {
                id: Uuid::new_v4().to_string(),
                document_id: doc.id.clone(),
                index: i,
                hash: format!("{:x}", hasher.finalize()),
                content: draft.content,
                tags,
                metadata: draft.metadata,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentMeta;

    fn doc(format: DocumentFormat, content: &str) -> Document {
        Document {
            id: "doc-1".into(),
            title: None,
            content: content.into(),
            format,
            meta: DocumentMeta::Plain,
        }
    }

    #[test]
    fn html_is_preprocessed_before_semantic_chunking() {
        let chunker = Chunker::new(&ChunkingConfig::default()).unwrap();
        let chunks = chunker.chunk(&doc(
            DocumentFormat::Html,
            "<h1>Guide</h1><p>Some body text here.</p><script>x()</script>",
        ));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.strategy, STRATEGY_MARKDOWN_SEMANTIC);
        assert!(chunks[0].content.contains("# Guide"));
        assert!(!chunks[0].content.contains("x()"));
    }

    #[test]
    fn pdf_goes_through_the_sliding_window() {
        let chunker = Chunker::new(&ChunkingConfig::default()).unwrap();
        let chunks = chunker.chunk(&doc(DocumentFormat::Pdf, "short pdf text"));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.strategy, STRATEGY_PDF_SLIDING_WINDOW);
    }

    #[test]
    fn single_chunk_is_not_tagged_chunked() {
        let chunker = Chunker::new(&ChunkingConfig::default()).unwrap();
        let chunks = chunker.chunk(&doc(DocumentFormat::Markdown, "Just one tiny note."));
        assert_eq!(chunks.len(), 1);
        assert!(!chunks[0].tags.iter().any(|t| t == TAG_CHUNKED));
        assert!(chunks[0].has_strategy_tag());
    }

    #[test]
    fn image_bearing_chunks_are_tagged() {
        let chunker = Chunker::new(&ChunkingConfig::default()).unwrap();
        let chunks = chunker.chunk(&doc(
            DocumentFormat::Markdown,
            "A note with ![a figure](fig.png) embedded.",
        ));
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].tags.iter().any(|t| t == TAG_HAS_IMAGE));
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = ChunkingConfig {
            sliding_window_overlap_tokens: 512,
            sliding_window_tokens: 512,
            ..ChunkingConfig::default()
        };
        assert!(Chunker::new(&config).is_err());
    }

    #[test]
    fn chunk_ids_are_unique_and_hashes_deterministic() {
        let chunker = Chunker::new(&ChunkingConfig {
            max_tokens_per_chunk: 5,
            min_tokens_per_chunk: 1,
            ..ChunkingConfig::default()
        })
        .unwrap();
        let d = doc(
            DocumentFormat::Markdown,
            "# A\n\none two three four five\n\n# B\n\nsix seven eight nine ten",
        );
        let first = chunker.chunk(&d);
        let second = chunker.chunk(&d);
        assert!(first.len() > 1);
        let mut ids: Vec<&str> = first.iter().map(|c| c.id.as_str()).collect();
        ids.dedup();
        assert_eq!(ids.len(), first.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.content, b.content);
            assert_eq!(a.hash, b.hash);
            assert_eq!(a.tags, b.tags);
        }
    }
}
