//! Embedded image-reference detection.
//!
//! Scans chunk text for Markdown `![alt](url)` syntax and HTML `<img>` tags.
//! Matches are returned in strict left-to-right source order, mixed types
//! interleaved by position, so downstream consumers see references the way
//! a reader would.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static MARKDOWN_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").unwrap());
static HTML_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<img\b[^>]*>").unwrap());
static SRC_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)\bsrc\s*=\s*["']([^"']*)["']"#).unwrap());
static ALT_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)\balt\s*=\s*["']([^"']*)["']"#).unwrap());

/// Syntax a media reference was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Markdown,
    Html,
}

/// One embedded image reference found in a text span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaRef {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
    pub alt: Option<String>,
}

/// Find all embedded image references in `text`, in source order.
pub fn detect_media(text: &str) -> Vec<MediaRef> {
    let mut found: Vec<(usize, MediaRef)> = Vec::new();

    for caps in MARKDOWN_IMAGE.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let alt = caps.get(1).map(|m| m.as_str().to_string()).filter(|a| !a.is_empty());
        let url = caps.get(2).map(|m| m.as_str().trim().to_string()).unwrap_or_default();
        found.push((
            whole.start(),
            MediaRef {
                kind: MediaKind::Markdown,
                url,
                alt,
            },
        ));
    }

    for m in HTML_IMAGE.find_iter(text) {
        let tag = m.as_str();
        // An <img> without src still counts as visual content; url is empty.
        let url = SRC_ATTR
            .captures(tag)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let alt = ALT_ATTR
            .captures(tag)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|a| !a.is_empty());
        found.push((
            m.start(),
            MediaRef {
                kind: MediaKind::Html,
                url,
                alt,
            },
        ));
    }

    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, r)| r).collect()
}

/// Whether a text span contains any embedded image reference.
pub fn has_media(text: &str) -> bool {
    MARKDOWN_IMAGE.is_match(text) || HTML_IMAGE.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_markdown_image() {
        let refs = detect_media("before ![a chart](https://example.com/c.png) after");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].kind, MediaKind::Markdown);
        assert_eq!(refs[0].url, "https://example.com/c.png");
        assert_eq!(refs[0].alt.as_deref(), Some("a chart"));
    }

    #[test]
    fn detects_html_image_attributes() {
        let refs = detect_media(r#"<p><img src="/img/x.jpg" alt="photo"></p>"#);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].kind, MediaKind::Html);
        assert_eq!(refs[0].url, "/img/x.jpg");
        assert_eq!(refs[0].alt.as_deref(), Some("photo"));
    }

    #[test]
    fn mixed_types_are_interleaved_by_position() {
        let text = r#"<img src="first.png"> middle ![second](second.png) then <img src="third.png">"#;
        let refs = detect_media(text);
        let urls: Vec<&str> = refs.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["first.png", "second.png", "third.png"]);
        assert_eq!(refs[0].kind, MediaKind::Html);
        assert_eq!(refs[1].kind, MediaKind::Markdown);
        assert_eq!(refs[2].kind, MediaKind::Html);
    }

    #[test]
    fn empty_alt_becomes_none() {
        let refs = detect_media("![](bare.png)");
        assert_eq!(refs.len(), 1);
        assert!(refs[0].alt.is_none());
    }

    #[test]
    fn plain_text_has_no_media() {
        assert!(detect_media("nothing to see here").is_empty());
        assert!(!has_media("a [link](not-an-image.png) only"));
    }
}
