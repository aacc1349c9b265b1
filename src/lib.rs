//! Document chunking and hybrid retrieval core.
//!
//! Documents come in as Markdown, HTML, PDF-extracted text, or plain text;
//! they leave as bounded, tagged, content-hashed chunks. On the retrieval
//! side, a lexical and a semantic ranking are fused with weighted
//! Reciprocal Rank Fusion behind pluggable provider traits, with metadata
//! filtering against parent documents and graceful lexical-only degradation
//! when the semantic side is unavailable.

pub mod chunk;
pub mod config;
pub mod error;
pub mod index;
pub mod media;
pub mod models;
pub mod preprocess;
pub mod ratelimit;
pub mod search;
pub mod store;
pub mod token;

pub use chunk::Chunker;
pub use config::{load_config, Config};
pub use search::{SearchEngine, SearchResponse};
