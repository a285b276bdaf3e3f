//! Line-level recognizers shared by the normalizer, the compact passes,
//! and the snippet parser.

use std::sync::LazyLock;

use regex::Regex;

/// An opening code fence: marker character and run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Fence {
    pub marker: char,
    pub len: usize,
}

impl Fence {
    /// Whether `line` closes a block opened by this fence.
    ///
    /// A closing fence uses the same marker, is at least as long, and carries
    /// no info string.
    pub fn is_closed_by(&self, line: &str) -> bool {
        let trimmed = line.trim();
        let run = trimmed.chars().take_while(|c| *c == self.marker).count();
        run >= self.len && run == trimmed.chars().count()
    }
}

/// Recognize an opening fence (```` ``` ```` or `~~~`, up to 3 spaces indent).
pub(crate) fn opening_fence(line: &str) -> Option<Fence> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let marker = rest.chars().next()?;
    if marker != '`' && marker != '~' {
        return None;
    }
    let len = rest.chars().take_while(|c| *c == marker).count();
    if len < 3 {
        return None;
    }
    // Backtick info strings may not contain backticks.
    if marker == '`' && rest[len..].contains('`') {
        return None;
    }
    Some(Fence { marker, len })
}

/// MDX module directives (`import … from '…'`, `export const …`).
pub(crate) fn is_directive_line(line: &str) -> bool {
    static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r#"^(?:import\s+(?:['"]|.+\sfrom\s+['"])|export\s+(?:default\b|const\b|let\b|var\b|function\b|async\s+function\b|\{))"#,
        )
        .expect("valid regex")
    });

    DIRECTIVE_RE.is_match(line)
}

/// ATX heading text (`## Title ##` → `Title`), if `line` is a heading.
pub(crate) fn heading_text(line: &str) -> Option<&str> {
    static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^ {0,3}#{1,6}[ \t]+(.+?)(?:[ \t]+#+)?[ \t]*$").expect("valid regex")
    });

    HEADING_RE
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_fence_variants() {
        assert_eq!(
            opening_fence("```python"),
            Some(Fence {
                marker: '`',
                len: 3
            })
        );
        assert_eq!(
            opening_fence("  ~~~~"),
            Some(Fence {
                marker: '~',
                len: 4
            })
        );
        assert_eq!(opening_fence("``not a fence"), None);
        assert_eq!(opening_fence("    ```indented code"), None);
        assert_eq!(opening_fence("```js `bad`"), None);
    }

    #[test]
    fn closing_fence_rules() {
        let fence = opening_fence("````md").expect("fence");
        assert!(!fence.is_closed_by("```"));
        assert!(fence.is_closed_by("````"));
        assert!(fence.is_closed_by("`````  "));
        assert!(!fence.is_closed_by("```` trailing"));
    }

    #[test]
    fn directive_detection() {
        assert!(is_directive_line("import Tabs from '@theme/Tabs';"));
        assert!(is_directive_line("import './styles.css'"));
        assert!(is_directive_line("export const meta = { a: 1 }"));
        assert!(is_directive_line("export default function Layout() {}"));
        assert!(!is_directive_line("Import the module before use."));
        assert!(!is_directive_line("export your data regularly"));
    }

    #[test]
    fn heading_extraction() {
        assert_eq!(heading_text("# Title"), Some("Title"));
        assert_eq!(heading_text("### Closed ###"), Some("Closed"));
        assert_eq!(heading_text("#NoSpace"), None);
        assert_eq!(heading_text("plain"), None);
    }
}
