//! Compact-rendering cleanup pipeline.
//!
//! Each pass is a function `&str -> String` applied in sequence. Unlike
//! [`crate::to_plain_text`], these passes keep markdown structure and only
//! remove syntax that does not travel well outside the docs site.

use std::sync::LazyLock;

use regex::Regex;

use crate::blocks::{Fence, is_directive_line, opening_fence};

/// Code fences with more body lines than this are truncated.
pub const MAX_CODE_LINES: usize = 40;

/// Run the full compact pipeline on a document body.
///
/// `source_path` is cited in the provenance note left behind truncated
/// code blocks.
pub(crate) fn run_pipeline(body: &str, source_path: &str) -> String {
    let mut result = strip_embedded_syntax(body);
    result = truncate_code_blocks(&result, source_path);
    result = collapse_blank_lines(&result);
    result
}

/// Render the final compact document.
pub(crate) fn render(topic: &str, description: &str, source_path: &str, body: &str) -> String {
    let mut out = format!("# {topic}\n\n{description}\n\nSource: {source_path}\n");
    if !body.is_empty() {
        out.push('\n');
        out.push_str(body);
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// Pass 1: Strip directives and embedded tags
// ---------------------------------------------------------------------------

/// Remove MDX module directives, JSX/HTML tags, and MDX comments outside
/// code fences. Text between tags is kept.
fn strip_embedded_syntax(md: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut prose: Vec<&str> = Vec::new();
    let mut fence: Option<Fence> = None;

    for line in md.lines() {
        if let Some(open) = fence {
            if open.is_closed_by(line) {
                fence = None;
            }
            out.push(line.to_string());
            continue;
        }
        if let Some(open) = opening_fence(line) {
            flush_prose(&mut prose, &mut out);
            fence = Some(open);
            out.push(line.to_string());
            continue;
        }
        if is_directive_line(line) {
            continue;
        }
        prose.push(line);
    }
    flush_prose(&mut prose, &mut out);

    out.join("\n")
}

/// Strip tags from a run of prose lines as one text, so components whose
/// attributes span several lines are removed whole.
fn flush_prose(prose: &mut Vec<&str>, out: &mut Vec<String>) {
    if prose.is_empty() {
        return;
    }
    let stripped = strip_tags_outside_code(&prose.join("\n"));
    prose.clear();

    // A line that held only tags disappears instead of leaving indentation behind.
    out.extend(stripped.split('\n').map(|line| {
        if line.trim().is_empty() {
            String::new()
        } else {
            line.to_string()
        }
    }));
}

/// Apply the tag pattern everywhere except inside inline code spans.
fn strip_tags_outside_code(text: &str) -> String {
    static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)</?[A-Za-z][A-Za-z0-9.:_-]*(?:\s[^<>]*)?/?>|\{/\*.*?\*/\}|<!--.*?-->")
            .expect("valid regex")
    });
    static CODE_SPAN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"``[^\n]+?``|`[^`\n]+`").expect("valid regex"));

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for span in CODE_SPAN_RE.find_iter(text) {
        out.push_str(&TAG_RE.replace_all(&text[last..span.start()], ""));
        out.push_str(span.as_str());
        last = span.end();
    }
    out.push_str(&TAG_RE.replace_all(&text[last..], ""));
    out
}

// ---------------------------------------------------------------------------
// Pass 2: Truncate long code blocks
// ---------------------------------------------------------------------------

/// Keep the first [`MAX_CODE_LINES`] lines of any longer fenced block, close
/// the fence, and cite the source path.
fn truncate_code_blocks(md: &str, source_path: &str) -> String {
    let lines: Vec<&str> = md.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let Some(open) = opening_fence(line) else {
            out.push(line.to_string());
            i += 1;
            continue;
        };

        let body_start = i + 1;
        let close = lines[body_start..]
            .iter()
            .position(|l| open.is_closed_by(l))
            .map(|p| body_start + p);
        let body_end = close.unwrap_or(lines.len());
        let body = &lines[body_start..body_end];

        out.push(line.to_string());
        if body.len() > MAX_CODE_LINES {
            out.extend(body[..MAX_CODE_LINES].iter().map(|l| l.to_string()));
            out.push(open_marker(open));
            out.push(truncation_note(body.len(), source_path));
        } else {
            out.extend(body.iter().map(|l| l.to_string()));
            if let Some(c) = close {
                out.push(lines[c].to_string());
            }
        }

        i = close.map_or(lines.len(), |c| c + 1);
    }

    out.join("\n")
}

fn open_marker(fence: Fence) -> String {
    fence.marker.to_string().repeat(fence.len)
}

/// Provenance line emitted after a truncated block.
pub fn truncation_note(total_lines: usize, source_path: &str) -> String {
    format!(
        "> Code truncated to {MAX_CODE_LINES} of {total_lines} lines. Full example: `{source_path}`"
    )
}

// ---------------------------------------------------------------------------
// Pass 3: Collapse blank lines and trailing whitespace
// ---------------------------------------------------------------------------

/// Outside code fences: trim trailing whitespace and allow at most one blank
/// line in a row. Leading and trailing blank lines are dropped. Fence
/// contents are left untouched.
fn collapse_blank_lines(md: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut fence: Option<Fence> = None;

    for line in md.lines() {
        if let Some(open) = fence {
            if open.is_closed_by(line) {
                fence = None;
                out.push(line.trim_end());
            } else {
                out.push(line);
            }
            continue;
        }
        if let Some(open) = opening_fence(line) {
            fence = Some(open);
            out.push(line.trim_end());
            continue;
        }

        let trimmed = line.trim_end();
        if trimmed.is_empty() && out.last().is_none_or(|prev| prev.is_empty()) {
            continue;
        }
        out.push(trimmed);
    }

    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }

    out.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
