//! Lenient frontmatter splitting.
//!
//! A document may open with a `---` delimited block of flat `key: value`
//! lines. Anything that does not fit that shape is treated as body content;
//! this parser never fails.

use docpack_shared::FrontmatterMeta;
use tracing::warn;

const DELIMITER: &str = "---";

/// A document split into metadata and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frontmatter<'a> {
    /// Parsed metadata; empty when absent or malformed.
    pub meta: FrontmatterMeta,
    /// Everything after the closing delimiter (or the whole text).
    pub body: &'a str,
}

impl Frontmatter<'_> {
    /// Non-empty metadata value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.meta
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Split `text` into frontmatter metadata and body.
pub fn parse_frontmatter(text: &str) -> Frontmatter<'_> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let whole = Frontmatter {
        meta: FrontmatterMeta::new(),
        body: text,
    };

    let mut lines = text.split_inclusive('\n');
    let mut offset = match lines.next() {
        Some(first) if first.trim_end() == DELIMITER => first.len(),
        _ => return whole,
    };

    let mut meta = FrontmatterMeta::new();
    for line in lines {
        let line_len = line.len();
        let content = line.trim_end_matches(['\r', '\n']);

        if content.trim_end() == DELIMITER {
            return Frontmatter {
                meta,
                body: &text[offset + line_len..],
            };
        }
        offset += line_len;

        let trimmed = content.trim();
        // Blank lines, comments, and nested YAML (lists, indented maps) carry
        // no flat key and are skipped.
        if trimmed.is_empty()
            || trimmed.starts_with('#')
            || content.starts_with([' ', '\t'])
            || trimmed.starts_with("- ")
        {
            continue;
        }

        let Some((key, value)) = content.split_once(':') else {
            warn!(line = %content, "malformed frontmatter line, ignoring block");
            return whole;
        };

        let key = key.trim().to_lowercase();
        if key.is_empty() {
            warn!(line = %content, "frontmatter line without key, ignoring block");
            return whole;
        }
        meta.insert(key, strip_quotes(value.trim()).to_string());
    }

    warn!("unterminated frontmatter block, treating document as body");
    whole
}

/// Strip one layer of matching single or double quotes.
fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_metadata() {
        let doc = "---\ntitle: \"Alpha\"\ndescription: 'First doc'\nicon: rocket\n---\n# Alpha\n\nBody.\n";
        let fm = parse_frontmatter(doc);
        assert_eq!(fm.get("title"), Some("Alpha"));
        assert_eq!(fm.get("description"), Some("First doc"));
        assert_eq!(fm.get("icon"), Some("rocket"));
        assert_eq!(fm.body, "# Alpha\n\nBody.\n");
    }

    #[test]
    fn absent_frontmatter_keeps_text() {
        let doc = "# Beta\n\nbeta beta\n";
        let fm = parse_frontmatter(doc);
        assert!(fm.meta.is_empty());
        assert_eq!(fm.body, doc);
    }

    #[test]
    fn unterminated_block_is_body() {
        let doc = "---\ntitle: Broken\n\n# Heading\n";
        let fm = parse_frontmatter(doc);
        assert!(fm.meta.is_empty());
        assert_eq!(fm.body, doc);
    }

    #[test]
    fn malformed_line_is_body() {
        let doc = "---\njust some words\n---\ntext\n";
        let fm = parse_frontmatter(doc);
        assert!(fm.meta.is_empty());
        assert_eq!(fm.body, doc);
    }

    #[test]
    fn nested_yaml_is_skipped() {
        let doc = "---\ntitle: Tags\ntags:\n  - one\n  - two\n---\nbody\n";
        let fm = parse_frontmatter(doc);
        assert_eq!(fm.get("title"), Some("Tags"));
        assert_eq!(fm.get("tags"), None);
        assert_eq!(fm.body, "body\n");
    }

    #[test]
    fn crlf_and_keys_are_normalized() {
        let doc = "---\r\nTitle: Windows\r\n---\r\nbody\r\n";
        let fm = parse_frontmatter(doc);
        assert_eq!(fm.get("title"), Some("Windows"));
        assert_eq!(fm.body, "body\r\n");
    }

    #[test]
    fn value_with_colon_is_kept_whole() {
        let fm = parse_frontmatter("---\nurl: https://example.com/x\n---\n");
        assert_eq!(fm.get("url"), Some("https://example.com/x"));
        assert_eq!(fm.body, "");
    }
}
