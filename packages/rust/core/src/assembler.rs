//! Skill bundle assembler.
//!
//! Copies the shared build artifacts into a skill directory and regenerates
//! the bundle-local files around them.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use docpack_artifacts::{
    BundleSummary, ReferenceEntry, describe_reference, render_bundle_readme,
    render_interface_descriptor, render_lookup_script,
};
use docpack_discovery::DiscoveredSkill;
use docpack_shared::{BundleConfig, DocpackError, Result, artifact};

use crate::manifest::ManifestCounts;
use crate::output::{copy_flat_dir, staging_dir_for, swap_into_place, write_atomic, write_json};

/// Output from assembling one bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledBundle {
    /// Skill directory name.
    pub skill_id: String,
    /// The skill directory the bundle was written into.
    pub bundle_dir: PathBuf,
    /// Number of entries in `reference-index.json`.
    pub reference_count: usize,
    /// Number of compact files copied.
    pub compact_count: usize,
    /// Whether a default interface descriptor was created this run.
    pub interface_written: bool,
}

/// Materializes bundles from a finished output root.
#[derive(Debug, Clone)]
pub struct BundleAssembler {
    output_root: PathBuf,
    layout: BundleConfig,
}

impl BundleAssembler {
    pub fn new(output_root: impl Into<PathBuf>, layout: &BundleConfig) -> Self {
        Self {
            output_root: output_root.into(),
            layout: layout.clone(),
        }
    }

    /// (Re)build the bundle for one skill.
    ///
    /// Creates the following layout inside the skill directory:
    /// ```text
    /// <skill>/
    /// ├── references/
    /// │   ├── docs-index.json, docs-index.jsonl, inverted-index.json
    /// │   ├── path-to-id.json, id-to-path.json, compact-index.json
    /// │   ├── examples.md, README.md, reference-index.json
    /// │   └── compact/*.md      (replaced wholesale)
    /// ├── scripts/lookup.sh
    /// └── agents/interface.yaml (written only if absent)
    /// ```
    #[instrument(skip_all, fields(skill = %skill.entry.id))]
    pub fn assemble(
        &self,
        skill: &DiscoveredSkill,
        counts: &ManifestCounts,
    ) -> Result<AssembledBundle> {
        let bundle_dir = skill.dir.clone();
        let refs = bundle_dir.join(&self.layout.reference_dir);
        std::fs::create_dir_all(&refs).map_err(|e| DocpackError::io(&refs, e))?;

        info!(path = %bundle_dir.display(), "assembling bundle");

        // Shared artifacts, copied byte for byte.
        let mut entries: Vec<ReferenceEntry> = Vec::new();
        for name in artifact::SHARED_FILES {
            let src = self.output_root.join(name);
            let bytes = std::fs::read(&src).map_err(|e| DocpackError::io(&src, e))?;
            write_atomic(&refs.join(name), &bytes)?;
            entries.push(describe_reference(name, &bytes));
        }

        // Compact set, replaced wholesale.
        let compact_target = refs.join(artifact::COMPACT_DIR);
        let staging = staging_dir_for(&compact_target)?;
        let compact_names =
            copy_flat_dir(&self.output_root.join(artifact::COMPACT_DIR), &staging)?;
        for name in &compact_names {
            let path = staging.join(name);
            let bytes = std::fs::read(&path).map_err(|e| DocpackError::io(&path, e))?;
            entries.push(describe_reference(
                &format!("{}/{name}", artifact::COMPACT_DIR),
                &bytes,
            ));
        }
        swap_into_place(&staging, &compact_target)?;
        debug!(count = compact_names.len(), "compact files copied");

        let summary = BundleSummary {
            document_count: counts.document_count,
            compact_count: compact_names.len(),
            snippet_count: counts.snippet_count,
            script_file: self.layout.script_file.clone(),
        };
        let readme = render_bundle_readme(&skill.entry, &summary);
        write_atomic(&refs.join(artifact::README), readme.as_bytes())?;
        entries.push(describe_reference(artifact::README, readme.as_bytes()));

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        write_json(&refs.join(artifact::REFERENCE_INDEX), &entries)?;

        let script_path = bundle_dir.join(&self.layout.script_file);
        let script = render_lookup_script(
            &skill.entry.name,
            &self.layout.script_file,
            &self.layout.reference_dir,
        );
        write_atomic(&script_path, script.as_bytes())?;
        make_executable(&script_path)?;

        let interface_path = bundle_dir.join(&self.layout.interface_file);
        let interface_written = if interface_path.exists() {
            debug!(path = %interface_path.display(), "keeping existing interface descriptor");
            false
        } else {
            let descriptor = render_interface_descriptor(&skill.entry);
            write_atomic(&interface_path, descriptor.as_bytes())?;
            true
        };

        info!(
            references = entries.len(),
            compact = compact_names.len(),
            interface_written,
            "bundle assembly complete"
        );

        Ok(AssembledBundle {
            skill_id: skill.entry.id.clone(),
            bundle_dir,
            reference_count: entries.len(),
            compact_count: compact_names.len(),
            interface_written,
        })
    }
}

/// Verify that a bundle directory is well-formed.
pub fn validate_bundle(bundle_dir: &Path, layout: &BundleConfig) -> Result<()> {
    let refs = bundle_dir.join(&layout.reference_dir);

    let required: Vec<&str> = artifact::SHARED_FILES
        .into_iter()
        .chain([artifact::README, artifact::REFERENCE_INDEX])
        .collect();
    for name in required {
        if !refs.join(name).is_file() {
            return Err(DocpackError::validation(format!(
                "bundle {} missing {}/{name}",
                bundle_dir.display(),
                layout.reference_dir
            )));
        }
    }
    if !refs.join(artifact::COMPACT_DIR).is_dir() {
        return Err(DocpackError::validation(format!(
            "bundle {} missing {}/{}/",
            bundle_dir.display(),
            layout.reference_dir,
            artifact::COMPACT_DIR
        )));
    }
    if !bundle_dir.join(&layout.script_file).is_file() {
        return Err(DocpackError::validation(format!(
            "bundle {} missing {}",
            bundle_dir.display(),
            layout.script_file
        )));
    }

    let index_path = refs.join(artifact::REFERENCE_INDEX);
    let content =
        std::fs::read_to_string(&index_path).map_err(|e| DocpackError::io(&index_path, e))?;
    let entries: Vec<ReferenceEntry> = serde_json::from_str(&content).map_err(|e| {
        DocpackError::validation(format!("invalid {}: {e}", artifact::REFERENCE_INDEX))
    })?;
    for entry in &entries {
        if !refs.join(&entry.path).is_file() {
            return Err(DocpackError::validation(format!(
                "{} lists missing file {}",
                artifact::REFERENCE_INDEX,
                entry.path
            )));
        }
    }

    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)
        .map_err(|e| DocpackError::io(path, e))?
        .permissions();
    perms.set_mode(perms.mode() | 0o755);
    std::fs::set_permissions(path, perms).map_err(|e| DocpackError::io(path, e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
