//! Top-level build manifest.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, instrument};

use docpack_shared::{
    BuildManifest, CURRENT_SCHEMA_VERSION, ChangeReport, DocpackError, Result, artifact,
};

use crate::output::write_json;

/// Counts gathered by the earlier stages.
#[derive(Debug, Clone, Default)]
pub struct ManifestCounts {
    pub document_count: usize,
    pub skill_count: usize,
    pub compact_count: usize,
    pub snippet_count: usize,
}

/// Writes `manifest.json`, replacing any previous one.
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    output_root: PathBuf,
    tool_version: String,
}

impl ManifestWriter {
    pub fn new(output_root: impl Into<PathBuf>, tool_version: impl Into<String>) -> Self {
        Self {
            output_root: output_root.into(),
            tool_version: tool_version.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.output_root.join(artifact::MANIFEST)
    }

    /// Build and write the manifest for this run.
    #[instrument(skip_all, fields(path = %self.path().display()))]
    pub fn write(&self, counts: &ManifestCounts, changes: ChangeReport) -> Result<BuildManifest> {
        let manifest = BuildManifest {
            schema_version: CURRENT_SCHEMA_VERSION,
            tool_version: self.tool_version.clone(),
            generated_at: Utc::now(),
            document_count: counts.document_count,
            skill_count: counts.skill_count,
            compact_count: counts.compact_count,
            snippet_count: counts.snippet_count,
            file_list: artifact::BUILD_FILES.iter().map(|f| f.to_string()).collect(),
            changes,
        };

        write_json(&self.path(), &manifest)?;
        info!(
            documents = manifest.document_count,
            skills = manifest.skill_count,
            "manifest written"
        );
        Ok(manifest)
    }
}

/// Read and validate a manifest written by a previous build.
pub fn read_manifest(output_root: &Path) -> Result<BuildManifest> {
    let path = output_root.join(artifact::MANIFEST);
    let content = std::fs::read_to_string(&path).map_err(|e| DocpackError::io(&path, e))?;
    let manifest: BuildManifest = serde_json::from_str(&content)
        .map_err(|e| DocpackError::validation(format!("invalid {}: {e}", artifact::MANIFEST)))?;

    if manifest.schema_version != CURRENT_SCHEMA_VERSION {
        return Err(DocpackError::validation(format!(
            "unsupported schema_version: {} (expected {})",
            manifest.schema_version, CURRENT_SCHEMA_VERSION
        )));
    }
    Ok(manifest)
}
