//! Compact markdown generation.
//!
//! One size-bounded, citation-annotated markdown file per page source,
//! written into `<output>/compact/` plus a `compact-index.json` summary.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use docpack_discovery::DocumentSource;
use docpack_markdown::{compact_document, parse_frontmatter, title_from_path, to_plain_text};
use docpack_shared::{CompactDocEntry, DocpackError, Result, artifact, sha256_hex};

use crate::index::{document_url, resolve_description};
use crate::output::{staging_dir_for, swap_into_place, write_atomic, write_json};

/// Deterministic compact file name for a source path.
///
/// Path separators become `__`, characters outside `[A-Za-z0-9._-]` become
/// `-`, and `.md` is appended. A `.md` source extension is folded into that
/// suffix; any other extension stays in the name so `guide.md` and
/// `guide.mdx` map to different files.
pub fn compact_filename(source_path: &str) -> String {
    let stem = source_path.strip_suffix(".md").unwrap_or(source_path);

    let slug = stem
        .split('/')
        .map(|segment| {
            segment
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                        c
                    } else {
                        '-'
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("__");

    format!("{slug}.md")
}

/// Writes compact files for every source whose extension is eligible.
#[derive(Debug, Clone)]
pub struct CompactMarkdownGenerator {
    output_root: PathBuf,
    extensions: Vec<String>,
    page_extensions: Vec<String>,
}

impl CompactMarkdownGenerator {
    /// `extensions` selects eligible sources; `page_extensions` shapes URLs
    /// the same way the document index does.
    pub fn new(
        output_root: impl Into<PathBuf>,
        extensions: &[String],
        page_extensions: &[String],
    ) -> Self {
        Self {
            output_root: output_root.into(),
            extensions: extensions.to_vec(),
            page_extensions: page_extensions.to_vec(),
        }
    }

    /// Directory the compact files end up in.
    pub fn compact_dir(&self) -> PathBuf {
        self.output_root.join(artifact::COMPACT_DIR)
    }

    /// Render every eligible source, replace the compact directory wholesale,
    /// and write `compact-index.json`.
    ///
    /// Two sources mapping to the same file name abort the run before
    /// anything is written.
    #[instrument(skip_all, fields(output = %self.output_root.display()))]
    pub fn generate(&self, sources: &[DocumentSource]) -> Result<Vec<CompactDocEntry>> {
        let eligible: Vec<&DocumentSource> = sources
            .iter()
            .filter(|s| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(&s.extension)))
            .collect();

        let mut claimed: BTreeMap<String, &str> = BTreeMap::new();
        for source in &eligible {
            let name = compact_filename(&source.relative_path);
            if let Some(previous) = claimed.insert(name.clone(), &source.relative_path) {
                return Err(DocpackError::invariant(format!(
                    "compact file name {name} derived from both {previous} and {}",
                    source.relative_path
                )));
            }
        }

        let target = self.compact_dir();
        let staging = staging_dir_for(&target)?;

        let mut entries = Vec::with_capacity(eligible.len());
        for source in eligible {
            let (entry, content) = self.render(source);
            write_atomic(&staging.join(&entry.compact_filename), content.as_bytes())?;
            debug!(
                source = %entry.source_path,
                file = %entry.compact_filename,
                "wrote compact file"
            );
            entries.push(entry);
        }
        entries.sort_by(|a, b| a.source_path.cmp(&b.source_path));

        swap_into_place(&staging, &target)?;
        write_json(&self.output_root.join(artifact::COMPACT_INDEX), &entries)?;

        info!(count = entries.len(), "compact markdown generated");
        Ok(entries)
    }

    fn render(&self, source: &DocumentSource) -> (CompactDocEntry, String) {
        let path = source.relative_path.as_str();
        let text = source.text();
        let fm = parse_frontmatter(&text);

        let topic = fm
            .get("title")
            .map(str::to_string)
            .unwrap_or_else(|| title_from_path(path));
        let plain_text = to_plain_text(fm.body);
        let description = resolve_description(fm.get("description"), &plain_text, &topic, path);

        let content = compact_document(&topic, &description, path, fm.body);
        let entry = CompactDocEntry {
            compact_filename: compact_filename(path),
            url: document_url(path, &self.page_extensions),
            source_path: path.to_string(),
            content_sha256: sha256_hex(&source.raw_bytes),
            topic,
            description,
        };
        (entry, content)
    }
}

/// Compact file names currently present in `dir`, sorted.
pub fn list_compact_files(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| DocpackError::io(dir, e))? {
        let entry = entry.map_err(|e| DocpackError::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".md") && entry.path().is_file() {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
