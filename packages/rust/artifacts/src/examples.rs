//! Merged examples document.

use tracing::debug;

/// One parsed snippet, ready to be merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleSection {
    /// File name from the snippet's fence label.
    pub filename: String,
    pub language: Option<String>,
    /// Snippet file path, relative to the docs root.
    pub source_path: String,
    pub code: String,
}

/// Render all sections into one markdown document.
///
/// Sections are emitted in the order given; callers sort by source path.
/// `snippets_label` names the scanned directory in the preamble.
pub fn render_examples(sections: &[ExampleSection], snippets_label: &str) -> String {
    let mut out = String::from("# Code Examples\n\n");

    if sections.is_empty() {
        out.push_str(&format!(
            "No snippet files were found under `{snippets_label}`.\n"
        ));
        return out;
    }

    let noun = if sections.len() == 1 { "file" } else { "files" };
    out.push_str(&format!(
        "Merged from {} snippet {noun} under `{snippets_label}`.\n",
        sections.len()
    ));

    for section in sections {
        let fence = fence_for(&section.code);
        let language = section.language.as_deref().unwrap_or("");

        out.push_str(&format!("\n## {}\n\n", section.filename));
        out.push_str(&format!("Source: {}\n\n", section.source_path));
        out.push_str(&format!("{fence}{language}\n"));
        if !section.code.is_empty() {
            out.push_str(&section.code);
            out.push('\n');
        }
        out.push_str(&fence);
        out.push('\n');

        debug!(
            filename = %section.filename,
            fence_len = fence.len(),
            "rendered example section"
        );
    }

    out
}

/// A backtick fence longer than any backtick run inside `code` (minimum 3).
pub fn fence_for(code: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in code.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}
