//! HTML-to-structured-text normalization.
//!
//! Converts HTML into the heading/list/paragraph shape the semantic section
//! chunker expects from Markdown: `h1`..`h6` become `#`-prefixed lines, list
//! items become `- ` lines, `<img>` tags become Markdown image syntax (so
//! media detection still sees them), and script/style/navigation subtrees
//! are dropped entirely. Everything else is unwrapped to its inner text.
//!
//! Parsing is lenient (html5ever): malformed input degrades to best-effort
//! text extraction and never fails.

use scraper::{ElementRef, Html};

/// Subtrees removed wholesale, content and tags alike.
const SKIP_TAGS: &[&str] = &[
    "script", "style", "nav", "noscript", "template", "head", "header", "footer", "aside",
];

/// Elements that terminate the current paragraph on both sides.
const BLOCK_TAGS: &[&str] = &[
    "html", "body", "main", "article", "section", "div", "p", "blockquote", "pre", "table",
    "thead", "tbody", "tr", "figure",
];

/// Normalize an HTML document into Markdown-comparable plain text.
pub fn html_to_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut out = String::new();
    render_children(doc.root_element(), &mut out);
    collapse_blank_lines(&out)
}

fn skipped(el: ElementRef) -> bool {
    SKIP_TAGS.contains(&el.value().name()) || el.value().attr("role") == Some("navigation")
}

fn render_children(el: ElementRef, out: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            push_text(out, text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            render_element(child_el, out);
        }
    }
}

fn render_element(el: ElementRef, out: &mut String) {
    if skipped(el) {
        return;
    }
    let name = el.value().name();

    if let Some(level) = heading_level(name) {
        let mut heading = String::new();
        inline_text(el, &mut heading);
        break_block(out);
        out.push_str(&"#".repeat(level));
        out.push(' ');
        out.push_str(heading.trim());
        break_block(out);
    } else if name == "li" {
        let mut item = String::new();
        inline_text(el, &mut item);
        ensure_newline(out);
        out.push_str("- ");
        out.push_str(item.trim());
        out.push('\n');
    } else if name == "ul" || name == "ol" {
        ensure_newline(out);
        render_children(el, out);
        break_block(out);
    } else if name == "img" {
        push_img(el, out);
    } else if name == "br" {
        out.push('\n');
    } else if BLOCK_TAGS.contains(&name) {
        break_block(out);
        render_children(el, out);
        break_block(out);
    } else {
        render_children(el, out);
    }
}

/// Collect descendant text (and image references) without block breaks.
fn inline_text(el: ElementRef, out: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            push_text(out, text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if skipped(child_el) {
                continue;
            }
            if child_el.value().name() == "img" {
                push_img(child_el, out);
            } else {
                inline_text(child_el, out);
            }
        }
    }
}

fn heading_level(name: &str) -> Option<usize> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Append a text node with whitespace runs collapsed to single spaces.
fn push_text(out: &mut String, text: &str) {
    let mut words = text.split_whitespace();
    let Some(first) = words.next() else {
        return;
    };
    if !out.is_empty() && !out.ends_with('\n') && !out.ends_with(' ') {
        out.push(' ');
    }
    out.push_str(first);
    for word in words {
        out.push(' ');
        out.push_str(word);
    }
}

/// Rewrite an `<img>` as Markdown image syntax so media detection keeps
/// working on the normalized text.
fn push_img(el: ElementRef, out: &mut String) {
    let src = el.value().attr("src").unwrap_or("");
    let alt = el.value().attr("alt").unwrap_or("");
    if !out.is_empty() && !out.ends_with('\n') && !out.ends_with(' ') {
        out.push(' ');
    }
    out.push_str("![");
    out.push_str(alt);
    out.push_str("](");
    out.push_str(src);
    out.push(')');
}

fn break_block(out: &mut String) {
    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    if !out.is_empty() {
        out.push_str("\n\n");
    }
}

fn ensure_newline(out: &mut String) {
    let trimmed = out.trim_end_matches([' ', '\t']).len();
    out.truncate(trimmed);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0usize;
    for ch in text.chars() {
        if ch == '\n' {
            newlines += 1;
            if newlines <= 2 {
                out.push(ch);
            }
        } else {
            newlines = 0;
            out.push(ch);
        }
    }
    out.trim().to_string()
}
