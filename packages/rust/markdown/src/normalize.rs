//! Plain-text normalization for indexing and description inference.
//!
//! Order matters: code fences go first so markup stripping never sees code
//! punctuation, and headings are collected before their markers are removed.

use std::sync::LazyLock;

use regex::Regex;

use crate::blocks::{Fence, heading_text, is_directive_line, opening_fence};

static INLINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`+([^`\n]+?)`+").expect("valid regex"));

static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]\n]*)\]\([^)\n]*\)").expect("valid regex"));

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]\n]*)\]\([^)\n]*\)").expect("valid regex"));

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?[A-Za-z][A-Za-z0-9.:_-]*(?:\s[^<>]*)?/?>|<!--.*?-->").expect("valid regex")
});

static HEADING_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^ {0,3}#{1,6}[ \t]+").expect("valid regex"));

/// Convert a markdown body into a single line of plain text.
pub fn to_plain_text(body: &str) -> String {
    let text = strip_code_fences(body);
    let text = INLINE_CODE_RE.replace_all(&text, "$1");
    let text = IMAGE_RE.replace_all(&text, "$1");
    let text = LINK_RE.replace_all(&text, "$1");
    let text = TAG_RE.replace_all(&text, " ");
    let text = HEADING_MARKER_RE.replace_all(&text, "");

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Heading texts in document order, ignoring anything inside code fences.
///
/// Inline markup inside a heading is reduced to its text.
pub fn collect_headings(body: &str) -> Vec<String> {
    let mut headings = Vec::new();
    let mut fence: Option<Fence> = None;

    for line in body.lines() {
        if let Some(open) = fence {
            if open.is_closed_by(line) {
                fence = None;
            }
            continue;
        }
        if let Some(open) = opening_fence(line) {
            fence = Some(open);
            continue;
        }
        if let Some(text) = heading_text(line) {
            let text = INLINE_CODE_RE.replace_all(text, "$1");
            let text = LINK_RE.replace_all(&text, "$1");
            let text = TAG_RE.replace_all(&text, "");
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if !text.is_empty() {
                headings.push(text);
            }
        }
    }

    headings
}

/// Drop fenced code blocks (unterminated fences run to the end) and MDX
/// module directives.
fn strip_code_fences(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut fence: Option<Fence> = None;

    for line in body.lines() {
        if let Some(open) = fence {
            if open.is_closed_by(line) {
                fence = None;
            }
            continue;
        }
        if let Some(open) = opening_fence(line) {
            fence = Some(open);
            continue;
        }
        if is_directive_line(line) {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }

    out
}
