//! Heading-anchored section chunker for Markdown-shaped text.
//!
//! Sections are anchored at `#` headings (with a synthetic preamble section
//! before the first heading). Oversized sections are sub-split at paragraph
//! boundaries, undersized chunks are merged into a neighbor, and a hard cap
//! on chunks per document is enforced by merging the smallest adjacent
//! pairs. Merging small chunks runs first, cap enforcement second; both
//! passes are deterministic.

use tracing::debug;

use crate::config::ChunkingConfig;
use crate::error::ConfigError;
use crate::models::{Chunk, ChunkMetadata, Document};
use crate::token::{estimate_tokens, tokenize_with_offsets};

use super::{finalize, DraftChunk};

/// Strategy name recorded in chunk metadata and the strategy tag.
pub const STRATEGY_MARKDOWN_SEMANTIC: &str = "markdown-semantic";

/// Splits heading-structured text into bounded chunks.
pub struct SemanticChunker {
    min_tokens: usize,
    max_tokens: usize,
    max_chunks: usize,
}

/// Working unit while splitting and merging.
struct Section {
    heading: Option<String>,
    content: String,
    tokens: usize,
}

impl Section {
    fn new(heading: Option<String>, content: String) -> Self {
        let tokens = estimate_tokens(&content);
        Self {
            heading,
            content,
            tokens,
        }
    }
}

impl SemanticChunker {
    pub fn new(config: &ChunkingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            min_tokens: config.min_tokens_per_chunk,
            max_tokens: config.max_tokens_per_chunk,
            max_chunks: config.max_chunks_per_document,
        })
    }

    /// Chunk `content` (already preprocessed for HTML documents) on behalf
    /// of `doc`. An empty document yields zero chunks; text without any
    /// heading structure yields a single preamble chunk when it fits.
    pub fn chunk(&self, doc: &Document, content: &str) -> Vec<Chunk> {
        if content.trim().is_empty() {
            return Vec::new();
        }

        let mut pieces: Vec<Section> = Vec::new();
        for section in parse_sections(content) {
            self.split_oversized(section, &mut pieces);
        }

        self.merge_small(&mut pieces);
        self.enforce_cap(&mut pieces);

        let drafts = pieces
            .into_iter()
            .map(|s| {
                let mut metadata = ChunkMetadata::new(STRATEGY_MARKDOWN_SEMANTIC);
                metadata.heading = s.heading;
                DraftChunk {
                    content: s.content.trim().to_string(),
                    metadata,
                }
            })
            .collect();

        finalize(doc, STRATEGY_MARKDOWN_SEMANTIC, drafts)
    }

    /// Step 2/3: sections within bounds pass through; larger ones are split
    /// at paragraph boundaries, every piece still referencing the parent
    /// heading. A single paragraph beyond the ceiling is hard-split on
    /// token boundaries.
    fn split_oversized(&self, section: Section, out: &mut Vec<Section>) {
        if section.tokens <= self.max_tokens {
            out.push(section);
            return;
        }

        let mut buf = String::new();
        let mut buf_tokens = 0usize;
        for para in section.content.split("\n\n") {
            let trimmed = para.trim();
            if trimmed.is_empty() {
                continue;
            }
            let para_tokens = estimate_tokens(trimmed);

            if buf_tokens + para_tokens > self.max_tokens && !buf.is_empty() {
                out.push(Section::new(section.heading.clone(), std::mem::take(&mut buf)));
                buf_tokens = 0;
            }

            if para_tokens > self.max_tokens {
                if !buf.is_empty() {
                    out.push(Section::new(section.heading.clone(), std::mem::take(&mut buf)));
                    buf_tokens = 0;
                }
                for piece in hard_split(trimmed, self.max_tokens) {
                    out.push(Section::new(section.heading.clone(), piece.to_string()));
                }
            } else {
                if !buf.is_empty() {
                    buf.push_str("\n\n");
                }
                buf.push_str(trimmed);
                buf_tokens += para_tokens;
            }
        }
        if !buf.is_empty() {
            out.push(Section::new(section.heading.clone(), buf));
        }
    }

    /// Step 4: fold chunks below the floor into the following chunk, or the
    /// preceding one when there is no follower. A sole chunk is left alone.
    fn merge_small(&self, pieces: &mut Vec<Section>) {
        let mut i = 0;
        while pieces.len() > 1 && i < pieces.len() {
            if pieces[i].tokens >= self.min_tokens {
                i += 1;
                continue;
            }
            debug!(
                tokens = pieces[i].tokens,
                floor = self.min_tokens,
                "merging undersized chunk into neighbor"
            );
            if i + 1 < pieces.len() {
                let small = pieces.remove(i);
                prepend(&mut pieces[i], small);
            } else {
                let small = pieces.remove(i);
                append(&mut pieces[i - 1], small);
            }
        }
    }

    /// Step 5: the chunk cap is a hard bound. Merge the adjacent pair with
    /// the smallest combined token count (earliest pair on ties) until the
    /// cap holds; chunks are never dropped.
    fn enforce_cap(&self, pieces: &mut Vec<Section>) {
        while pieces.len() > self.max_chunks {
            let mut best = 0;
            let mut best_sum = usize::MAX;
            for j in 0..pieces.len() - 1 {
                let sum = pieces[j].tokens + pieces[j + 1].tokens;
                if sum < best_sum {
                    best_sum = sum;
                    best = j;
                }
            }
            debug!(pair = best, "merging to satisfy chunk cap");
            let right = pieces.remove(best + 1);
            append(&mut pieces[best], right);
        }
    }
}

/// Merge `small` in front of `target`; the earlier heading wins.
fn prepend(target: &mut Section, small: Section) {
    target.content = join(&small.content, &target.content);
    target.heading = small.heading.or_else(|| target.heading.take());
    target.tokens = estimate_tokens(&target.content);
}

/// Merge `right` behind `target`; the earlier heading wins.
fn append(target: &mut Section, right: Section) {
    target.content = join(&target.content, &right.content);
    if target.heading.is_none() {
        target.heading = right.heading;
    }
    target.tokens = estimate_tokens(&target.content);
}

fn join(a: &str, b: &str) -> String {
    format!("{}\n\n{}", a.trim_end(), b.trim_start())
}

/// Split a single oversized paragraph into consecutive runs of at most
/// `max_tokens` tokens, slicing the original text so interior spacing is
/// preserved.
fn hard_split(text: &str, max_tokens: usize) -> Vec<&str> {
    let tokens = tokenize_with_offsets(text);
    let mut pieces = Vec::new();
    let mut start = 0;
    while start < tokens.len() {
        let end = (start + max_tokens).min(tokens.len());
        pieces.push(&text[tokens[start].start..tokens[end - 1].end]);
        start = end;
    }
    pieces
}

/// Split text into heading-anchored sections, the heading line included in
/// the section content. Lines before the first heading form the preamble.
fn parse_sections(content: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut heading: Option<String> = None;
    let mut body = String::new();
    let mut in_section = false;

    for line in content.lines() {
        if let Some(text) = heading_text(line) {
            if in_section && (!body.trim().is_empty() || heading.is_some()) {
                sections.push(Section::new(heading.take(), std::mem::take(&mut body)));
            } else {
                body.clear();
            }
            heading = Some(text);
            in_section = true;
        }
        body.push_str(line);
        body.push('\n');
        if !line.trim().is_empty() {
            in_section = true;
        }
    }
    if !body.trim().is_empty() || heading.is_some() {
        sections.push(Section::new(heading, body));
    }
    sections
}

/// `### Title` -> `Some("Title")` for one to six leading hashes.
fn heading_text(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &trimmed[hashes..];
    if rest.is_empty() || rest.starts_with(' ') {
        Some(rest.trim().to_string())
    } else {
        None
    }
}
