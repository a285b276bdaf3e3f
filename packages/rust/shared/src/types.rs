//! Core domain types for docpack builds.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Current schema version for the build manifest format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Number of hex characters kept from the path digest for a document ID.
pub const DOCUMENT_ID_LEN: usize = 16;

/// Flat `key: value` metadata parsed from a document's frontmatter block.
pub type FrontmatterMeta = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Artifact file names
// ---------------------------------------------------------------------------

/// File and directory names written under the output root and each bundle.
pub mod artifact {
    /// Forward index (JSON array of records).
    pub const DOCS_INDEX: &str = "docs-index.json";
    /// Forward index, one record per line.
    pub const DOCS_INDEX_JSONL: &str = "docs-index.jsonl";
    /// Token → document IDs.
    pub const INVERTED_INDEX: &str = "inverted-index.json";
    /// Relative path → document ID.
    pub const PATH_TO_ID: &str = "path-to-id.json";
    /// Document ID → relative path.
    pub const ID_TO_PATH: &str = "id-to-path.json";
    /// Directory holding one compact markdown file per document.
    pub const COMPACT_DIR: &str = "compact";
    /// Summary of all compact entries.
    pub const COMPACT_INDEX: &str = "compact-index.json";
    /// Merged code examples document.
    pub const EXAMPLES: &str = "examples.md";
    /// Array of discovered skills.
    pub const SKILLS_INDEX: &str = "skills-index.json";
    /// Top-level build manifest.
    pub const MANIFEST: &str = "manifest.json";
    /// Bundle-local listing of every reference file.
    pub const REFERENCE_INDEX: &str = "reference-index.json";
    /// Bundle-local README.
    pub const README: &str = "README.md";
    /// Skill descriptor file that marks a skill directory.
    pub const SKILL_DESCRIPTOR: &str = "SKILL.md";

    /// Artifacts shared verbatim between the output root and every bundle.
    pub const SHARED_FILES: [&str; 7] = [
        DOCS_INDEX,
        DOCS_INDEX_JSONL,
        INVERTED_INDEX,
        PATH_TO_ID,
        ID_TO_PATH,
        COMPACT_INDEX,
        EXAMPLES,
    ];

    /// Every top-level artifact produced by a build, in manifest order.
    pub const BUILD_FILES: [&str; 10] = [
        DOCS_INDEX,
        DOCS_INDEX_JSONL,
        INVERTED_INDEX,
        PATH_TO_ID,
        ID_TO_PATH,
        COMPACT_DIR,
        COMPACT_INDEX,
        EXAMPLES,
        SKILLS_INDEX,
        MANIFEST,
    ];
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// Hex-encoded SHA-256 of arbitrary bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Stable document ID: truncated SHA-256 of the `/`-separated relative path.
///
/// Depends only on the path, so content edits never change an ID.
pub fn stable_id(relative_path: &str) -> String {
    let mut digest = sha256_hex(relative_path.as_bytes());
    digest.truncate(DOCUMENT_ID_LEN);
    digest
}

// ---------------------------------------------------------------------------
// DocumentRecord
// ---------------------------------------------------------------------------

/// One entry of the forward index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Stable ID derived from `path`.
    pub id: String,
    /// `/`-separated path relative to the docs root. Unique.
    pub path: String,
    /// Site URL derived from `path`.
    pub url: String,
    /// Display title.
    pub title: String,
    /// One-sentence description.
    pub description: String,
    /// Heading texts in document order.
    #[serde(default)]
    pub headings: Vec<String>,
    /// SHA-256 of the raw source bytes.
    pub content_sha256: String,
    /// Normalized plain text used for tokenization.
    pub plain_text: String,
    /// Number of indexed tokens (duplicates included).
    pub token_count: usize,
}

// ---------------------------------------------------------------------------
// CompactDocEntry
// ---------------------------------------------------------------------------

/// Summary of one generated compact markdown file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactDocEntry {
    pub topic: String,
    pub description: String,
    /// File name inside the compact directory.
    pub compact_filename: String,
    pub source_path: String,
    pub url: String,
    pub content_sha256: String,
}

// ---------------------------------------------------------------------------
// SkillEntry
// ---------------------------------------------------------------------------

/// A discovered skill bundle (a directory holding a `SKILL.md`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillEntry {
    /// Skill directory name.
    pub id: String,
    pub name: String,
    pub description: String,
    /// Path of the skill directory relative to the skills root.
    pub path: String,
    #[serde(default)]
    pub external_reference_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Change report
// ---------------------------------------------------------------------------

/// Document-level diff between the previous and the current forward index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeReport {
    pub added: Vec<String>,
    pub changed: Vec<String>,
    pub unchanged: usize,
    pub removed: Vec<String>,
}

impl ChangeReport {
    /// Whether anything differs from the previous build.
    pub fn has_changes(&self) -> bool {
        !(self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty())
    }
}

// ---------------------------------------------------------------------------
// BuildManifest
// ---------------------------------------------------------------------------

/// The `manifest.json` written at the output root after every build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildManifest {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    /// Tool version that produced the build.
    pub tool_version: String,
    /// When the build ran.
    pub generated_at: DateTime<Utc>,
    pub document_count: usize,
    pub skill_count: usize,
    pub compact_count: usize,
    pub snippet_count: usize,
    /// Artifact names produced at the output root.
    pub file_list: Vec<String>,
    /// Diff against the previous forward index.
    #[serde(default)]
    pub changes: ChangeReport,
}
