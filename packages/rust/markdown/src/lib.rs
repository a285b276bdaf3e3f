//! Markdown text processing for docpack.
//!
//! Splits frontmatter, normalizes bodies into plain text, tokenizes for the
//! inverted index, renders compact documents, and parses snippet files. All
//! functions here are pure; file I/O lives in `docpack-core`.

mod blocks;
mod cleanup;
mod frontmatter;
mod normalize;
mod snippet;
mod tokenize;

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

pub use cleanup::{MAX_CODE_LINES, truncation_note};
pub use frontmatter::{Frontmatter, parse_frontmatter};
pub use normalize::{collect_headings, to_plain_text};
pub use snippet::{Snippet, parse_snippet};
pub use tokenize::{MAX_TOKEN_LEN, MIN_TOKEN_LEN, is_stopword, tokenize};

/// Longest inferred description, in characters, including the ellipsis.
pub const MAX_DESCRIPTION_LEN: usize = 180;

/// Sentences with fewer alphabetic characters are skipped during inference.
const MIN_SENTENCE_ALPHA: usize = 3;

// ---------------------------------------------------------------------------
// Compact rendering
// ---------------------------------------------------------------------------

/// Render the compact form of a document body.
///
/// The body keeps its markdown structure; import/export directives and
/// embedded tags are removed, long code fences are truncated with a
/// provenance note, and blank lines are collapsed. The result starts with
/// `# {topic}`, the description, and a `Source:` citation.
pub fn compact_document(topic: &str, description: &str, source_path: &str, body: &str) -> String {
    let processed = cleanup::run_pipeline(body, source_path);
    debug!(
        source = source_path,
        in_len = body.len(),
        out_len = processed.len(),
        "compact body processed"
    );
    cleanup::render(topic, description, source_path, &processed)
}

// ---------------------------------------------------------------------------
// Titles and descriptions
// ---------------------------------------------------------------------------

/// Title-case a path's file stem (`getting-started.mdx` → `Getting Started`).
///
/// `index` files take their directory's name; the root index is `Overview`.
pub fn title_from_path(path: &str) -> String {
    let mut segments = path.rsplit('/');
    let file = segments.next().unwrap_or(path);
    let stem = file.rsplit_once('.').map_or(file, |(stem, _)| stem);

    let source = if stem.eq_ignore_ascii_case("index") {
        match segments.next() {
            Some(dir) => dir,
            None => return "Overview".to_string(),
        }
    } else {
        stem
    };

    source
        .replace(['-', '_'], " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    format!("{upper}{}", chars.collect::<String>())
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// First usable sentence of `plain_text`, bounded and ending with a period.
///
/// Sentences with fewer than three alphabetic characters are skipped.
/// Returns `None` when no sentence qualifies.
pub fn infer_description(plain_text: &str) -> Option<String> {
    let sentence = sentences(plain_text)
        .into_iter()
        .find(|s| s.chars().filter(|c| c.is_alphabetic()).count() >= MIN_SENTENCE_ALPHA)?;

    Some(finish_description(sentence))
}

/// Bound `text` to [`MAX_DESCRIPTION_LEN`] and make it end with a period.
pub fn finish_description(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() > MAX_DESCRIPTION_LEN {
        let cut: String = text.chars().take(MAX_DESCRIPTION_LEN - 3).collect();
        return format!("{}...", cut.trim_end());
    }

    let text = text.trim_end_matches(['!', '?', ':', ';', ',']);
    if text.ends_with('.') {
        text.to_string()
    } else {
        format!("{text}.")
    }
}

/// Split on `.`, `!`, `?` followed by whitespace or the end of text.
fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let at_boundary = chars.peek().is_none_or(|(_, next)| next.is_whitespace());
        if at_boundary {
            let end = i + c.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                out.push(sentence);
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

// ---------------------------------------------------------------------------
// Structural lookups (used for bundled reference files)
// ---------------------------------------------------------------------------

/// Text of the first heading in `md`, outside code fences.
pub fn first_heading(md: &str) -> Option<String> {
    collect_headings(md).into_iter().next()
}

/// First prose paragraph of `md` as plain text (headings, fences,
/// blockquote citations, and tables skipped).
pub fn first_paragraph(md: &str) -> Option<String> {
    static SKIP_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^(?: {0,3}#{1,6}[ \t]|\||>|Source:|---)").expect("valid regex")
    });

    let body = parse_frontmatter(md).body;
    let mut fence: Option<blocks::Fence> = None;
    let mut paragraph: Vec<&str> = Vec::new();

    for line in body.lines() {
        if let Some(open) = fence {
            if open.is_closed_by(line) {
                fence = None;
            }
            continue;
        }
        if let Some(open) = blocks::opening_fence(line) {
            if !paragraph.is_empty() {
                break;
            }
            fence = Some(open);
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || SKIP_RE.is_match(line) {
            if !paragraph.is_empty() {
                break;
            }
            continue;
        }
        paragraph.push(trimmed);
    }

    if paragraph.is_empty() {
        return None;
    }
    let text = to_plain_text(&paragraph.join(" "));
    (!text.is_empty()).then_some(text)
}
