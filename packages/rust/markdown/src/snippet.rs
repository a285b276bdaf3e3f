//! Parser for single-block snippet files.
//!
//! A snippet file holds one fenced block whose opening line names the file
//! it represents, e.g. ```` ```python main.py ```` or
//! ```` ```ts title="client.ts" ````.

use std::sync::LazyLock;

use regex::Regex;

use crate::blocks::opening_fence;

/// A code example recovered from a snippet file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    /// File name from the fence label.
    pub filename: String,
    /// Language tag, if any.
    pub language: Option<String>,
    /// Code between the fences, without a trailing newline.
    pub code: String,
}

/// Parse `text` as a snippet. Returns `None` when the first non-blank line is
/// not a labelled fence or no closing fence exists.
///
/// The closing fence is searched from the end of the text, so fences nested
/// inside the body are kept as code.
pub fn parse_snippet(text: &str) -> Option<Snippet> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.iter().position(|l| !l.trim().is_empty())?;
    let open_line = lines[start];
    let fence = opening_fence(open_line)?;

    let info = open_line.trim_start()[fence.len..].trim();
    let (language, filename) = parse_info(info)?;

    let close = (start + 1..lines.len())
        .rev()
        .find(|&i| fence.is_closed_by(lines[i]))?;

    Some(Snippet {
        filename,
        language,
        code: lines[start + 1..close].join("\n"),
    })
}

/// Split a fence info string into `(language, filename)`.
fn parse_info(info: &str) -> Option<(Option<String>, String)> {
    static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?:title|filename|file|name)=(?:"([^"]+)"|'([^']+)'|(\S+))"#)
            .expect("valid regex")
    });

    let mut parts = info.split_whitespace();
    let first = parts.next()?;

    if let Some(caps) = ATTR_RE.captures(info) {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().to_string())?;
        let language = (!first.contains('=')).then(|| first.to_string());
        return Some((language, name));
    }

    match parts.next() {
        Some(label) => Some((Some(first.to_string()), unquote(label).to_string())),
        // ```main.py: the label doubles as the language via its extension.
        None if looks_like_filename(first) => {
            let language = first.rsplit_once('.').map(|(_, ext)| ext.to_string());
            Some((language, first.to_string()))
        }
        None => None,
    }
}

fn looks_like_filename(token: &str) -> bool {
    token
        .rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
}

fn unquote(s: &str) -> &str {
    s.trim_matches(['"', '\''])
}
