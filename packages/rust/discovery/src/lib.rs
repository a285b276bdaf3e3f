//! Source discovery for docpack builds.
//!
//! Two kinds of inputs are discovered here: documentation source files under
//! the docs root ([`SourceScanner`]) and skill bundles under the skills root
//! ([`discover_skills`]). Both produce results in a stable, sorted order so
//! that IDs and listings are identical across runs and platforms.

mod skills;

use std::path::{Path, PathBuf};

use tracing::{debug, instrument, trace};
use walkdir::{DirEntry, WalkDir};

use docpack_shared::{DocpackError, Result};

pub use skills::{DiscoveredSkill, discover_skills, find_skill};

// ---------------------------------------------------------------------------
// DocumentSource
// ---------------------------------------------------------------------------

/// One discovered documentation file, read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSource {
    pub absolute_path: PathBuf,
    /// `/`-separated path relative to the scan root.
    pub relative_path: String,
    /// Lowercase extension without the dot.
    pub extension: String,
    pub raw_bytes: Vec<u8>,
}

impl DocumentSource {
    /// Raw bytes decoded as UTF-8 (invalid sequences replaced).
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.raw_bytes)
    }
}

// ---------------------------------------------------------------------------
// SourceScanner
// ---------------------------------------------------------------------------

/// Enumerates files under a root whose extension is in a recognized set.
#[derive(Debug, Clone)]
pub struct SourceScanner {
    root: PathBuf,
    extensions: Vec<String>,
    excludes: Vec<PathBuf>,
}

impl SourceScanner {
    /// Scanner for `root` accepting the given extensions (without dots).
    pub fn new(root: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            root: root.into(),
            extensions: extensions.iter().map(|e| e.to_ascii_lowercase()).collect(),
            excludes: Vec::new(),
        }
    }

    /// Skip a directory subtree (e.g. an output directory nested in the docs).
    pub fn exclude(mut self, dir: impl Into<PathBuf>) -> Self {
        self.excludes.push(dir.into());
        self
    }

    /// Lazily yield matching files sorted by path.
    ///
    /// Fails up front with [`DocpackError::MissingRoot`] when the root is not
    /// a directory. Files are read as the iterator advances; a read failure
    /// is yielded as an error item.
    #[instrument(skip_all, fields(root = %self.root.display()))]
    pub fn scan(&self) -> Result<impl Iterator<Item = Result<DocumentSource>> + use<>> {
        if !self.root.is_dir() {
            return Err(DocpackError::missing_root("docs", &self.root));
        }

        let root = self.root.clone();
        let extensions = self.extensions.clone();
        let excludes = self.excludes.clone();

        debug!(extensions = ?extensions, "scanning documentation sources");

        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| {
                e.depth() == 0 || !(is_hidden(e) || excludes.iter().any(|x| e.path() == x))
            });

        Ok(walker.filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                    return Some(Err(DocpackError::io(path, e.into())));
                }
            };

            if !entry.file_type().is_file() {
                return None;
            }

            let extension = entry
                .path()
                .extension()
                .map(|e| e.to_string_lossy().to_ascii_lowercase())?;
            if !extensions.contains(&extension) {
                trace!(path = %entry.path().display(), "skipping unrecognized extension");
                return None;
            }

            Some(read_source(&root, entry.path(), extension))
        }))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn read_source(root: &Path, path: &Path, extension: String) -> Result<DocumentSource> {
    let raw_bytes = std::fs::read(path).map_err(|e| DocpackError::io(path, e))?;

    Ok(DocumentSource {
        absolute_path: std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
        relative_path: relative_path(root, path),
        extension,
        raw_bytes,
    })
}

/// `/`-joined path of `path` relative to `root`.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
