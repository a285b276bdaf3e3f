//! Snippet merging: many single-block example files → one `examples.md`.

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use docpack_artifacts::{ExampleSection, render_examples};
use docpack_discovery::{SourceScanner, relative_path};
use docpack_markdown::parse_snippet;
use docpack_shared::{Result, artifact};

use crate::output::write_atomic;

/// Outcome of one merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedExamples {
    /// Merged sections in source-path order.
    pub sections: Vec<ExampleSection>,
    /// Files that were scanned but carried no labelled fence.
    pub skipped: Vec<String>,
    /// Where `examples.md` was written.
    pub path: PathBuf,
}

/// Scans a snippets directory and merges every parseable file.
#[derive(Debug, Clone)]
pub struct SnippetMerger {
    docs_root: PathBuf,
    snippets_dir: PathBuf,
    extensions: Vec<String>,
}

impl SnippetMerger {
    /// `snippets_dir` is expected to live under `docs_root`; source paths
    /// in the merged document are cited relative to `docs_root`.
    pub fn new(
        docs_root: impl Into<PathBuf>,
        snippets_dir: impl Into<PathBuf>,
        extensions: &[String],
    ) -> Self {
        Self {
            docs_root: docs_root.into(),
            snippets_dir: snippets_dir.into(),
            extensions: extensions.to_vec(),
        }
    }

    /// Merge snippets and write `examples.md` into `output_root`.
    ///
    /// A missing snippets directory is not an error: the document states
    /// that no snippets were found.
    #[instrument(skip_all, fields(dir = %self.snippets_dir.display()))]
    pub fn merge_into(&self, output_root: &Path) -> Result<MergedExamples> {
        let label = relative_path(&self.docs_root, &self.snippets_dir);
        let mut merged = MergedExamples {
            path: output_root.join(artifact::EXAMPLES),
            ..MergedExamples::default()
        };

        if self.snippets_dir.is_dir() {
            let scanner = SourceScanner::new(&self.snippets_dir, &self.extensions);
            for source in scanner.scan()? {
                let source = source?;
                let cited = format!("{label}/{}", source.relative_path);

                match parse_snippet(&source.text()) {
                    Some(snippet) => merged.sections.push(ExampleSection {
                        filename: snippet.filename,
                        language: snippet.language,
                        source_path: cited,
                        code: snippet.code,
                    }),
                    None => {
                        warn!(path = %cited, "no labelled code fence, skipping snippet");
                        merged.skipped.push(cited);
                    }
                }
            }
        } else {
            warn!("snippets directory not found, writing empty examples document");
        }

        merged.sections.sort_by(|a, b| a.source_path.cmp(&b.source_path));
        let content = render_examples(&merged.sections, &label);
        write_atomic(&merged.path, content.as_bytes())?;

        info!(
            snippets = merged.sections.len(),
            skipped = merged.skipped.len(),
            "examples merged"
        );
        Ok(merged)
    }
}
