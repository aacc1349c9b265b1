//! Sliding-window chunker for large unstructured text.
//!
//! PDF-extracted text rarely has reliable heading structure, so it is cut
//! into overlapping fixed-size token windows instead. Each window records
//! its token offsets and, when the document declares a page count, a page
//! range linearly interpolated from those offsets.

use tracing::debug;

use crate::config::ChunkingConfig;
use crate::error::ConfigError;
use crate::models::{Chunk, ChunkMetadata, Document};
use crate::token::{tokenize_with_offsets, Token};

use super::{finalize, DraftChunk};

/// Strategy name recorded in chunk metadata and the strategy tag.
pub const STRATEGY_PDF_SLIDING_WINDOW: &str = "pdf-sliding-window";

/// Cuts unstructured text into overlapping token windows.
pub struct SlidingWindowChunker {
    window: usize,
    overlap: usize,
    min_tokens_to_chunk: usize,
    max_chunks: usize,
}

impl SlidingWindowChunker {
    /// Rejects `overlap >= window` at construction; such configurations
    /// are never silently corrected.
    pub fn new(config: &ChunkingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            window: config.sliding_window_tokens,
            overlap: config.sliding_window_overlap_tokens,
            min_tokens_to_chunk: config.sliding_window_min_tokens_to_chunk,
            max_chunks: config.max_chunks_per_document,
        })
    }

    /// Window the document into chunks. Documents below the windowing
    /// threshold are kept whole; an empty document yields zero chunks.
    pub fn chunk(&self, doc: &Document) -> Vec<Chunk> {
        let tokens = tokenize_with_offsets(&doc.content);
        let total = tokens.len();
        if total == 0 {
            return Vec::new();
        }
        let numpages = doc.meta.numpages().filter(|p| *p > 0);

        let mut spans: Vec<(usize, usize)> = Vec::new();
        if total < self.min_tokens_to_chunk {
            debug!(total, threshold = self.min_tokens_to_chunk, "below windowing threshold, keeping whole");
            spans.push((0, total));
        } else {
            let step = self.window - self.overlap;
            let mut start = 0;
            loop {
                let end = (start + self.window).min(total);
                spans.push((start, end));
                if end == total {
                    break;
                }
                start += step;
            }
        }

        // The per-document cap applies here too; fold trailing windows
        // into the last kept one until it holds.
        if spans.len() > self.max_chunks {
            let tail_end = spans.last().map(|s| s.1);
            spans.truncate(self.max_chunks);
            if let (Some(end), Some(prev)) = (tail_end, spans.last_mut()) {
                prev.1 = end;
            }
        }

        let drafts = spans
            .into_iter()
            .map(|(start, end)| self.draft(&doc.content, &tokens, start, end, total, numpages))
            .collect();

        finalize(doc, STRATEGY_PDF_SLIDING_WINDOW, drafts)
    }

    fn draft(
        &self,
        content: &str,
        tokens: &[Token<'_>],
        start: usize,
        end: usize,
        total: usize,
        numpages: Option<u32>,
    ) -> DraftChunk {
        let text = &content[tokens[start].start..tokens[end - 1].end];

        let mut metadata = ChunkMetadata::new(STRATEGY_PDF_SLIDING_WINDOW);
        metadata.token_start = Some(start);
        metadata.token_end = Some(end);
        if let Some(pages) = numpages {
            let (page_start, page_end) = interpolate_pages(start, end, total, pages);
            metadata.page_start = Some(page_start);
            metadata.page_end = Some(page_end);
        }

        DraftChunk {
            content: text.to_string(),
            metadata,
        }
    }
}

/// Map a token span onto a page range, proportionally to the total token
/// count. Pages are one-based and clamped to `[1, pages]`.
fn interpolate_pages(start: usize, end: usize, total: usize, pages: u32) -> (u32, u32) {
    let pages_f = pages as f64;
    let total_f = total as f64;
    let page_start = ((start as f64 / total_f) * pages_f).floor() as u32 + 1;
    let page_end = ((end as f64 / total_f) * pages_f).ceil() as u32;
    let page_start = page_start.clamp(1, pages);
    let page_end = page_end.clamp(page_start, pages);
    (page_start, page_end)
}
