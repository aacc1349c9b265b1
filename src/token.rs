//! Token estimation shared by both chunking strategies.
//!
//! A token here is a whitespace-delimited word. This is a deliberately cheap
//! approximation: sizing decisions only need to be consistent, not exact,
//! and the sliding-window chunker additionally needs addressable token
//! offsets, which a word stream provides for free.

/// A single token with its byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    /// Byte offset of the token's first byte.
    pub start: usize,
    /// Byte offset one past the token's last byte.
    pub end: usize,
}

/// Approximate the token count of a text span.
pub fn estimate_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split a text into tokens carrying their byte offsets, in document order.
pub fn tokenize_with_offsets(text: &str) -> Vec<Token<'_>> {
    let base = text.as_ptr() as usize;
    text.split_whitespace()
        .map(|word| {
            let start = word.as_ptr() as usize - base;
            Token {
                text: word,
                start,
                end: start + word.len(),
            }
        })
        .collect()
}
