//! End-to-end `build` pipeline: docs tree → indexes → compact → examples →
//! skills index → manifest → bundles.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, instrument};

use docpack_discovery::{
    DiscoveredSkill, DocumentSource, SourceScanner, discover_skills, find_skill,
};
use docpack_shared::{
    BuildConfig, BuildManifest, ChangeReport, DocpackError, DocumentRecord, Result, artifact,
};

use crate::assembler::{AssembledBundle, BundleAssembler};
use crate::compact::CompactMarkdownGenerator;
use crate::index::{DocumentIndex, load_previous_records};
use crate::manifest::{ManifestCounts, ManifestWriter, read_manifest};
use crate::output::write_json;
use crate::snippets::SnippetMerger;

/// Result of one `build` run.
#[derive(Debug)]
pub struct BuildResult {
    pub output_root: PathBuf,
    pub document_count: usize,
    /// Distinct tokens in the inverted index.
    pub token_count: usize,
    pub compact_count: usize,
    pub snippet_count: usize,
    pub skill_count: usize,
    /// Bundles assembled this run (empty when skipped).
    pub bundles: Vec<AssembledBundle>,
    pub changes: ChangeReport,
    pub manifest: BuildManifest,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each document is read.
    fn document_read(&self, path: &str, current: usize);
    /// Called after each bundle is assembled.
    fn bundle_assembled(&self, skill: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &BuildResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document_read(&self, _path: &str, _current: usize) {}
    fn bundle_assembled(&self, _skill: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &BuildResult) {}
}

/// Run the full `build` pipeline.
///
/// 1. Validate roots and the bundle filter (nothing written yet)
/// 2. Scan and index every document in memory
/// 3. Diff against the previous forward index
/// 4. Write index artifacts
/// 5. Generate compact markdown
/// 6. Merge snippets
/// 7. Write the skills index
/// 8. Write the manifest
/// 9. Assemble bundles (unless skipped)
#[instrument(
    skip_all,
    fields(docs = %config.docs_root.display(), output = %config.output_root.display())
)]
pub fn run_build(config: &BuildConfig, progress: &dyn ProgressReporter) -> Result<BuildResult> {
    let start = Instant::now();
    info!("starting build pipeline");

    // --- Phase 1: Validate inputs ---
    progress.phase("Validating inputs");
    if !config.docs_root.is_dir() {
        return Err(DocpackError::missing_root("docs", &config.docs_root));
    }
    let skills = discover_skills(&config.skills_root, config.base_url.as_ref())?;
    let targets = select_targets(&skills, config)?;
    let sources = scanner_for(config).scan()?;

    build_from_sources(config, &skills, &targets, sources, progress, start)
}

/// Phases 2-9 over validated inputs.
///
/// Every source is read before the first artifact is written, so a failed
/// read leaves the output root untouched.
fn build_from_sources(
    config: &BuildConfig,
    skills: &[DiscoveredSkill],
    targets: &[&DiscoveredSkill],
    sources: impl IntoIterator<Item = Result<DocumentSource>>,
    progress: &dyn ProgressReporter,
    start: Instant,
) -> Result<BuildResult> {
    // --- Phase 2: Scan and index ---
    progress.phase("Indexing documentation");
    let sources = collect_sources(sources, progress)?;
    let index = DocumentIndex::build(&sources, &config.compact_extensions)?;

    // --- Phase 3: Change detection ---
    let changes = index.diff_against(&previous_records(&config.output_root));
    debug!(
        added = changes.added.len(),
        changed = changes.changed.len(),
        removed = changes.removed.len(),
        "change report computed"
    );

    // --- Phase 4: Index artifacts ---
    progress.phase("Writing index artifacts");
    index.write_to(&config.output_root)?;

    // --- Phase 5: Compact markdown ---
    progress.phase("Generating compact markdown");
    let compact = CompactMarkdownGenerator::new(
        &config.output_root,
        &config.compact_extensions,
        &config.compact_extensions,
    )
    .generate(&sources)?;

    // --- Phase 6: Snippets ---
    progress.phase("Merging code examples");
    let examples = SnippetMerger::new(
        &config.docs_root,
        &config.snippets_dir,
        &config.compact_extensions,
    )
    .merge_into(&config.output_root)?;

    // --- Phase 7: Skills index ---
    let entries: Vec<_> = skills.iter().map(|s| s.entry.clone()).collect();
    write_json(&config.output_root.join(artifact::SKILLS_INDEX), &entries)?;

    // --- Phase 8: Manifest ---
    progress.phase("Writing manifest");
    let counts = ManifestCounts {
        document_count: index.records.len(),
        skill_count: skills.len(),
        compact_count: compact.len(),
        snippet_count: examples.sections.len(),
    };
    let manifest = ManifestWriter::new(&config.output_root, &config.tool_version)
        .write(&counts, changes.clone())?;

    // --- Phase 9: Bundles ---
    let mut bundles = Vec::new();
    if config.skip_bundles {
        info!("bundle assembly skipped");
    } else {
        progress.phase("Assembling skill bundles");
        let assembler = BundleAssembler::new(&config.output_root, &config.bundle);
        for (i, skill) in targets.iter().enumerate() {
            bundles.push(assembler.assemble(skill, &counts)?);
            progress.bundle_assembled(&skill.entry.id, i + 1, targets.len());
        }
    }

    let result = BuildResult {
        output_root: config.output_root.clone(),
        document_count: counts.document_count,
        token_count: index.inverted.len(),
        compact_count: counts.compact_count,
        snippet_count: counts.snippet_count,
        skill_count: counts.skill_count,
        bundles,
        changes,
        manifest,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        documents = result.document_count,
        skills = result.skill_count,
        bundles = result.bundles.len(),
        elapsed_ms = result.elapsed.as_millis(),
        "build pipeline complete"
    );

    Ok(result)
}

/// Skills to assemble: all of them, or the one named by `only_skill`.
fn select_targets<'a>(
    skills: &'a [DiscoveredSkill],
    config: &BuildConfig,
) -> Result<Vec<&'a DiscoveredSkill>> {
    match &config.only_skill {
        Some(name) => Ok(vec![find_skill(skills, name)?]),
        None => Ok(skills.iter().collect()),
    }
}

/// Forward index of the previous build. Only trusted when that build left a
/// manifest with the current schema; otherwise every document counts as added.
fn previous_records(output_root: &Path) -> Vec<DocumentRecord> {
    match read_manifest(output_root) {
        Ok(manifest) => {
            debug!(
                generated_at = %manifest.generated_at,
                documents = manifest.document_count,
                "previous build found"
            );
            load_previous_records(output_root)
        }
        Err(e) => {
            debug!(error = %e, "no usable previous manifest");
            Vec::new()
        }
    }
}

fn scanner_for(config: &BuildConfig) -> SourceScanner {
    let scanner = SourceScanner::new(&config.docs_root, &config.extensions);
    if is_nested(&config.output_root, &config.docs_root) {
        debug!("output root is inside the docs root, excluding it from the scan");
        return scanner.exclude(&config.output_root);
    }
    scanner
}

/// Read every source into memory. Any unreadable file aborts the build.
fn collect_sources(
    items: impl IntoIterator<Item = Result<DocumentSource>>,
    progress: &dyn ProgressReporter,
) -> Result<Vec<DocumentSource>> {
    let mut sources = Vec::new();
    for source in items {
        let source = source?;
        progress.document_read(&source.relative_path, sources.len() + 1);
        sources.push(source);
    }
    Ok(sources)
}

fn is_nested(path: &Path, root: &Path) -> bool {
    path != root && path.starts_with(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    use docpack_shared::AppConfig;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("docpack-pipeline-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn config(root: &Path) -> BuildConfig {
        let mut config = BuildConfig::from_app(&AppConfig::default())
            .unwrap()
            .with_docs_root(root.join("docs"), "snippets");
        config.skills_root = root.join("skills");
        config.output_root = root.join("out");
        config
    }

    #[test]
    fn missing_docs_root_writes_nothing() {
        let tmp = temp_dir();
        let err = run_build(&config(&tmp), &SilentProgress).unwrap_err();
        assert!(matches!(err, DocpackError::MissingRoot { kind: "docs", .. }));
        assert!(!tmp.join("out").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_skills_root_writes_nothing() {
        let tmp = temp_dir();
        std::fs::create_dir_all(tmp.join("docs")).unwrap();
        let err = run_build(&config(&tmp), &SilentProgress).unwrap_err();
        assert!(matches!(err, DocpackError::MissingRoot { kind: "skills", .. }));
        assert!(!tmp.join("out").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn unknown_skill_filter_is_fatal() {
        let tmp = temp_dir();
        std::fs::create_dir_all(tmp.join("docs")).unwrap();
        std::fs::create_dir_all(tmp.join("skills")).unwrap();

        let mut config = config(&tmp);
        config.only_skill = Some("ghost".into());
        let err = run_build(&config, &SilentProgress).unwrap_err();
        assert!(matches!(err, DocpackError::SkillNotFound { .. }));
        assert!(err.is_fatal_configuration());
        assert!(!tmp.join("out").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn unreadable_source_aborts_before_any_write() {
        let tmp = temp_dir();
        let config = config(&tmp);
        let sources = vec![
            Ok(DocumentSource {
                absolute_path: tmp.join("docs/a.md"),
                relative_path: "a.md".into(),
                extension: "md".into(),
                raw_bytes: b"alpha".to_vec(),
            }),
            Err(DocpackError::io(
                tmp.join("docs/b.md"),
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            )),
        ];

        let err = build_from_sources(&config, &[], &[], sources, &SilentProgress, Instant::now())
            .unwrap_err();
        assert!(matches!(err, DocpackError::Io { .. }));
        assert!(!config.output_root.exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn nested_output_root_is_not_indexed() {
        let tmp = temp_dir();
        std::fs::create_dir_all(tmp.join("docs")).unwrap();
        std::fs::create_dir_all(tmp.join("skills")).unwrap();
        std::fs::write(tmp.join("docs/a.md"), "alpha").unwrap();

        let mut config = config(&tmp);
        config.output_root = tmp.join("docs/build");
        config.skip_bundles = true;

        run_build(&config, &SilentProgress).unwrap();
        let second = run_build(&config, &SilentProgress).unwrap();
        assert_eq!(second.document_count, 1);
        assert_eq!(second.changes.unchanged, 1);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn stale_schema_manifest_counts_everything_as_added() {
        let tmp = temp_dir();
        std::fs::create_dir_all(tmp.join("docs")).unwrap();
        std::fs::create_dir_all(tmp.join("skills")).unwrap();
        std::fs::write(tmp.join("docs/a.md"), "alpha").unwrap();
        std::fs::write(tmp.join("docs/b.md"), "beta").unwrap();

        let mut config = config(&tmp);
        config.skip_bundles = true;
        run_build(&config, &SilentProgress).unwrap();

        let manifest_path = config.output_root.join(artifact::MANIFEST);
        let mut manifest: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&manifest_path).unwrap()).unwrap();
        manifest["schema_version"] = serde_json::json!(999);
        std::fs::write(&manifest_path, manifest.to_string()).unwrap();

        let second = run_build(&config, &SilentProgress).unwrap();
        assert_eq!(second.changes.added, vec!["a.md", "b.md"]);
        assert_eq!(second.changes.unchanged, 0);

        let third = run_build(&config, &SilentProgress).unwrap();
        assert_eq!(third.changes.unchanged, 2);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn is_nested_paths() {
        assert!(is_nested(Path::new("docs/out"), Path::new("docs")));
        assert!(!is_nested(Path::new("docs"), Path::new("docs")));
        assert!(!is_nested(Path::new("build"), Path::new("docs")));
    }
}
