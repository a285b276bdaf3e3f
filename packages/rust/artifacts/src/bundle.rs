//! Bundle-local files: reference index entries, README, lookup script, and
//! the default interface descriptor.

use std::path::Path;

use serde::{Deserialize, Serialize};

use docpack_markdown::{finish_description, first_heading, first_paragraph, title_from_path};
use docpack_shared::{SkillEntry, artifact, sha256_hex};

// ---------------------------------------------------------------------------
// Reference index
// ---------------------------------------------------------------------------

/// One file listed in a bundle's `reference-index.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    /// Path relative to the bundle's reference directory.
    pub path: String,
    pub topic: String,
    pub description: String,
    pub sha256: String,
    pub size_bytes: usize,
}

/// Describe one bundled reference file.
///
/// Known index artifacts get fixed descriptions. Markdown files use their
/// own first heading and first paragraph; anything else is named after its
/// path.
pub fn describe_reference(path: &str, content: &[u8]) -> ReferenceEntry {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let (topic, description) = match known_artifact(file_name) {
        Some(known) => known,
        None if is_markdown(path) => describe_markdown(path, &String::from_utf8_lossy(content)),
        None => (
            title_from_path(path),
            format!("Reference file `{file_name}`."),
        ),
    };

    ReferenceEntry {
        path: path.to_string(),
        topic,
        description,
        sha256: sha256_hex(content),
        size_bytes: content.len(),
    }
}

fn known_artifact(file_name: &str) -> Option<(String, String)> {
    let (topic, description) = match file_name {
        artifact::DOCS_INDEX => ("Document Index", "Forward index of every documentation page."),
        artifact::DOCS_INDEX_JSONL => (
            "Document Index (JSON Lines)",
            "Forward index with one document record per line.",
        ),
        artifact::INVERTED_INDEX => ("Inverted Index", "Maps each token to the IDs of documents containing it."),
        artifact::PATH_TO_ID => ("Path To ID", "Maps document paths to document IDs."),
        artifact::ID_TO_PATH => ("ID To Path", "Maps document IDs to document paths."),
        artifact::COMPACT_INDEX => ("Compact Index", "Summary of every compact reference page."),
        _ => return None,
    };
    Some((topic.to_string(), description.to_string()))
}

fn is_markdown(path: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("mdx"))
}

fn describe_markdown(path: &str, text: &str) -> (String, String) {
    let topic = first_heading(text).unwrap_or_else(|| title_from_path(path));
    let description = first_paragraph(text)
        .map(|p| finish_description(&p))
        .unwrap_or_else(|| format!("Reference page for {topic}."));
    (topic, description)
}

// ---------------------------------------------------------------------------
// README
// ---------------------------------------------------------------------------

/// Counts shown in a bundle README.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleSummary {
    pub document_count: usize,
    pub compact_count: usize,
    pub snippet_count: usize,
    /// Lookup script path relative to the bundle root.
    pub script_file: String,
}

/// Render the fixed-format README placed in a bundle's reference directory.
pub fn render_bundle_readme(skill: &SkillEntry, summary: &BundleSummary) -> String {
    let mut out = format!("# {} References\n\n{}\n", skill.name, skill.description);

    if let Some(url) = &skill.external_reference_url {
        out.push_str(&format!("\nOnline reference: <{url}>\n"));
    }

    out.push_str(
        "\nThese files are generated by docpack and replaced on every build. \
         Edit the documentation sources instead.\n\n## Contents\n\n",
    );

    let rows = [
        (
            artifact::DOCS_INDEX.to_string(),
            format!("forward index of {} documents", summary.document_count),
        ),
        (
            artifact::DOCS_INDEX_JSONL.to_string(),
            "the same records, one per line".to_string(),
        ),
        (
            artifact::INVERTED_INDEX.to_string(),
            "token to document ID lookup".to_string(),
        ),
        (
            artifact::PATH_TO_ID.to_string(),
            "document path to ID lookup".to_string(),
        ),
        (
            artifact::ID_TO_PATH.to_string(),
            "document ID to path lookup".to_string(),
        ),
        (
            format!("{}/", artifact::COMPACT_DIR),
            format!("{} compact reference pages", summary.compact_count),
        ),
        (
            artifact::COMPACT_INDEX.to_string(),
            "topic and description of each compact page".to_string(),
        ),
        (
            artifact::EXAMPLES.to_string(),
            format!("{} merged code examples", summary.snippet_count),
        ),
        (
            artifact::REFERENCE_INDEX.to_string(),
            "every file in this directory with its checksum".to_string(),
        ),
    ];
    for (name, what) in rows {
        out.push_str(&format!("- `{name}`: {what}\n"));
    }

    out.push_str(&format!(
        "\n## Lookup\n\nRun `{} <term>` from the bundle root to list compact pages mentioning a term.\n",
        summary.script_file
    ));

    out
}

// ---------------------------------------------------------------------------
// Lookup script
// ---------------------------------------------------------------------------

const LOOKUP_TEMPLATE: &str = r#"#!/bin/sh
# Search the bundled @NAME@ references for a term.
# Usage: @SCRIPT@ <term>
set -eu

if [ "$#" -ne 1 ]; then
  echo "usage: $0 <term>" >&2
  exit 2
fi

refs="$(cd "$(dirname "$0")/@REFS@" && pwd)"

grep -ril -- "$1" "$refs/compact" | sort | while read -r file; do
  source_line=$(grep -m 1 '^Source: ' "$file" || true)
  printf '%s\t%s\n' "${file#"$refs"/}" "${source_line#Source: }"
done
"#;

/// Render the lookup helper script.
///
/// `script_file` and `reference_dir` are both relative to the bundle root;
/// the script resolves the reference directory relative to itself.
pub fn render_lookup_script(skill_name: &str, script_file: &str, reference_dir: &str) -> String {
    let depth = script_file.split('/').count().saturating_sub(1);
    let refs = format!("{}{}", "../".repeat(depth), reference_dir.trim_matches('/'));

    LOOKUP_TEMPLATE
        .replace("@NAME@", skill_name)
        .replace("@SCRIPT@", script_file)
        .replace("@REFS@", &refs)
}

// ---------------------------------------------------------------------------
// Interface descriptor
// ---------------------------------------------------------------------------

/// Default interface descriptor (YAML) for a skill.
pub fn render_interface_descriptor(skill: &SkillEntry) -> String {
    let mut out = format!(
        "interface:\n  display_name: {}\n  short_description: {}\n",
        yaml_quote(&skill.name),
        yaml_quote(&skill.description)
    );
    if let Some(url) = &skill.external_reference_url {
        out.push_str(&format!("  reference_url: {}\n", yaml_quote(url)));
    }
    out
}

fn yaml_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
