//! Forward index, inverted index, and path/ID lookup maps.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use docpack_discovery::DocumentSource;
use docpack_markdown::{
    collect_headings, infer_description, parse_frontmatter, title_from_path, to_plain_text,
    tokenize,
};
use docpack_shared::{
    ChangeReport, DocpackError, DocumentRecord, Result, artifact, sha256_hex, stable_id,
};

use crate::output::{write_atomic, write_json};

/// Token → sorted set of document IDs.
pub type InvertedIndex = BTreeMap<String, BTreeSet<String>>;

// ---------------------------------------------------------------------------
// URL derivation
// ---------------------------------------------------------------------------

/// Site URL for a document path.
///
/// | path                | url          |
/// |---------------------|--------------|
/// | `index.md`          | `/`          |
/// | `guides/index.mdx`  | `/guides/`   |
/// | `guides/setup.md`   | `/guides/setup` |
/// | `data/nav.json`     | `/data/nav.json` |
///
/// `page_extensions` lists extensions rendered as pages; anything else keeps
/// its full path.
pub fn document_url(relative_path: &str, page_extensions: &[String]) -> String {
    let Some((stem, ext)) = relative_path.rsplit_once('.') else {
        return format!("/{relative_path}");
    };
    if ext.contains('/') || !page_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
        return format!("/{relative_path}");
    }

    match stem.rsplit_once('/') {
        None if stem == "index" => "/".to_string(),
        Some((dir, "index")) => format!("/{dir}/"),
        _ => format!("/{stem}"),
    }
}

/// Description fallback chain shared by index records and compact files.
pub(crate) fn resolve_description(
    explicit: Option<&str>,
    plain_text: &str,
    topic: &str,
    path: &str,
) -> String {
    if let Some(d) = explicit {
        return d.to_string();
    }
    infer_description(plain_text).unwrap_or_else(|| {
        warn!(path, "no usable description, using fallback");
        format!("Reference documentation for {topic}.")
    })
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Folds sources one at a time into the index structures.
#[derive(Debug, Default)]
pub struct DocumentIndexBuilder {
    page_extensions: Vec<String>,
    records: Vec<DocumentRecord>,
    inverted: InvertedIndex,
    path_to_id: BTreeMap<String, String>,
    id_to_path: BTreeMap<String, String>,
}

impl DocumentIndexBuilder {
    /// `page_extensions` decides URL shape; see [`document_url`].
    pub fn new(page_extensions: &[String]) -> Self {
        Self {
            page_extensions: page_extensions.to_vec(),
            ..Self::default()
        }
    }

    /// Parse, normalize, and tokenize one source, then record it.
    ///
    /// Fails with [`DocpackError::Invariant`] if the path or its derived ID
    /// was already added.
    pub fn add(&mut self, source: &DocumentSource) -> Result<&DocumentRecord> {
        let path = source.relative_path.clone();
        let id = stable_id(&path);

        if self.path_to_id.contains_key(&path) {
            return Err(DocpackError::invariant(format!("duplicate document path: {path}")));
        }
        if let Some(other) = self.id_to_path.get(&id) {
            return Err(DocpackError::invariant(format!(
                "document ID {id} derived from both {other} and {path}"
            )));
        }

        let text = source.text();
        let fm = parse_frontmatter(&text);
        let headings = collect_headings(fm.body);
        let plain_text = to_plain_text(fm.body);
        let tokens = tokenize(&plain_text);

        let title = fm
            .get("title")
            .map(str::to_string)
            .or_else(|| headings.first().cloned())
            .unwrap_or_else(|| title_from_path(&path));
        let description = resolve_description(fm.get("description"), &plain_text, &title, &path);

        for token in &tokens {
            self.inverted
                .entry(token.clone())
                .or_default()
                .insert(id.clone());
        }
        self.path_to_id.insert(path.clone(), id.clone());
        self.id_to_path.insert(id.clone(), path.clone());

        debug!(%path, %id, tokens = tokens.len(), "indexed document");

        let slot = self.records.len();
        self.records.push(DocumentRecord {
            id,
            url: document_url(&path, &self.page_extensions),
            path,
            title,
            description,
            headings,
            content_sha256: sha256_hex(&source.raw_bytes),
            plain_text,
            token_count: tokens.len(),
        });
        Ok(&self.records[slot])
    }

    /// Finish building. Records are sorted by path.
    pub fn finish(mut self) -> DocumentIndex {
        self.records.sort_by(|a, b| a.path.cmp(&b.path));
        DocumentIndex {
            records: self.records,
            inverted: self.inverted,
            path_to_id: self.path_to_id,
            id_to_path: self.id_to_path,
        }
    }
}

// ---------------------------------------------------------------------------
// DocumentIndex
// ---------------------------------------------------------------------------

/// A complete, mutually consistent set of index structures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentIndex {
    pub records: Vec<DocumentRecord>,
    pub inverted: InvertedIndex,
    pub path_to_id: BTreeMap<String, String>,
    pub id_to_path: BTreeMap<String, String>,
}

impl DocumentIndex {
    /// Index every source, aborting on the first error.
    #[instrument(skip_all)]
    pub fn build<'a>(
        sources: impl IntoIterator<Item = &'a DocumentSource>,
        page_extensions: &[String],
    ) -> Result<Self> {
        let mut builder = DocumentIndexBuilder::new(page_extensions);
        for source in sources {
            builder.add(source)?;
        }
        let index = builder.finish();
        info!(
            documents = index.records.len(),
            tokens = index.inverted.len(),
            "document index built"
        );
        Ok(index)
    }

    /// Record for a path, if indexed.
    pub fn get(&self, path: &str) -> Option<&DocumentRecord> {
        let id = self.path_to_id.get(path)?;
        self.records.iter().find(|r| &r.id == id)
    }

    /// Write the five index artifacts into `dir`.
    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let docs = dir.join(artifact::DOCS_INDEX);
        write_json(&docs, &self.records)?;

        let jsonl = dir.join(artifact::DOCS_INDEX_JSONL);
        let mut lines = String::new();
        for record in &self.records {
            lines.push_str(&serde_json::to_string(record)?);
            lines.push('\n');
        }
        write_atomic(&jsonl, lines.as_bytes())?;

        let inverted = dir.join(artifact::INVERTED_INDEX);
        write_json(&inverted, &self.inverted)?;

        let path_to_id = dir.join(artifact::PATH_TO_ID);
        write_json(&path_to_id, &self.path_to_id)?;

        let id_to_path = dir.join(artifact::ID_TO_PATH);
        write_json(&id_to_path, &self.id_to_path)?;

        info!(documents = self.records.len(), "index artifacts written");
        Ok(vec![docs, jsonl, inverted, path_to_id, id_to_path])
    }

    /// Compare against records from a previous build, keyed by path.
    pub fn diff_against(&self, previous: &[DocumentRecord]) -> ChangeReport {
        let previous_by_path: HashMap<&str, &DocumentRecord> =
            previous.iter().map(|r| (r.path.as_str(), r)).collect();

        let mut report = ChangeReport::default();
        for record in &self.records {
            match previous_by_path.get(record.path.as_str()) {
                Some(old) if old.content_sha256 == record.content_sha256 => report.unchanged += 1,
                Some(_) => report.changed.push(record.path.clone()),
                None => report.added.push(record.path.clone()),
            }
        }

        report.removed = previous
            .iter()
            .filter(|r| !self.path_to_id.contains_key(&r.path))
            .map(|r| r.path.clone())
            .collect();
        report.removed.sort();

        report
    }
}

/// Records from a previous build's forward index in `dir`.
///
/// A missing or unreadable index yields an empty list, so every document
/// counts as added.
pub fn load_previous_records(dir: &Path) -> Vec<DocumentRecord> {
    let path = dir.join(artifact::DOCS_INDEX);
    let Ok(content) = std::fs::read_to_string(&path) else {
        debug!(path = %path.display(), "no previous forward index");
        return Vec::new();
    };

    serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "previous forward index unreadable, ignoring");
        Vec::new()
    })
}
