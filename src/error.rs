//! Error taxonomy for the chunking and retrieval core.
//!
//! Four classes of failure, handled differently:
//!
//! - Input malformation (bad HTML/Markdown) is recovered locally by the
//!   chunkers and never surfaces as an error.
//! - Configuration invariant violations are fatal at construction time,
//!   before any chunking or search attempt ([`ConfigError`]).
//! - Upstream provider failures abort indexing per batch ([`IndexError`]);
//!   during search a semantic failure degrades to lexical-only instead of
//!   failing the call, while a lexical or store failure fails it
//!   ([`SearchError`]).
//! - Caller input errors (empty query) are rejected before any provider
//!   call ([`SearchError::EmptyQuery`]).

use thiserror::Error;

/// Configuration invariant violation, rejected at construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max_tokens_per_chunk must be greater than zero")]
    ZeroMaxTokens,

    #[error("min_tokens_per_chunk ({min}) must not exceed max_tokens_per_chunk ({max})")]
    MinExceedsMax { min: usize, max: usize },

    #[error("max_chunks_per_document must be at least 1")]
    ZeroChunkCap,

    #[error("sliding_window_tokens must be greater than zero")]
    ZeroWindow,

    #[error("sliding_window_overlap_tokens ({overlap}) must be smaller than sliding_window_tokens ({window})")]
    OverlapNotBelowWindow { overlap: usize, window: usize },
}

/// Failure of a single search call.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The query was empty or whitespace-only; rejected before any
    /// provider call.
    #[error("search query must not be empty")]
    EmptyQuery,

    /// The lexical provider failed. Unlike the semantic path there is no
    /// fallback, so the whole call fails with the specific cause.
    #[error("lexical search failed")]
    Lexical(#[source] anyhow::Error),

    /// Parent-document metadata could not be resolved for filtering.
    #[error("document metadata lookup failed")]
    Store(#[source] anyhow::Error),
}

/// Failure of a bulk embedding-indexing call.
///
/// A batch failure aborts the overall call; the range identifies exactly
/// which chunks were in flight so retries are well-defined.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("embedding batch {start}..{end} failed")]
    BatchFailed {
        /// Index of the first chunk in the failing batch.
        start: usize,
        /// One past the index of the last chunk in the failing batch.
        end: usize,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_names_both_bounds() {
        let err = ConfigError::OverlapNotBelowWindow {
            overlap: 300,
            window: 300,
        };
        let msg = err.to_string();
        assert!(msg.contains("300"));
        assert!(msg.contains("sliding_window_tokens"));
    }

    #[test]
    fn index_error_reports_batch_range() {
        let err = IndexError::BatchFailed {
            start: 64,
            end: 128,
            source: anyhow::anyhow!("provider unavailable"),
        };
        assert!(err.to_string().contains("64..128"));
    }
}
