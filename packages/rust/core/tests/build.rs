use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use docpack_core::pipeline::{SilentProgress, run_build};
use docpack_markdown::tokenize;
use docpack_shared::{AppConfig, BuildConfig, DocumentRecord, stable_id};
use tempfile::TempDir;

fn setup() -> (TempDir, BuildConfig) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    fs::create_dir_all(root.join("docs")).unwrap();
    fs::create_dir_all(root.join("skills")).unwrap();

    let mut config = BuildConfig::from_app(&AppConfig::default())
        .unwrap()
        .with_docs_root(root.join("docs"), "snippets");
    config.skills_root = root.join("skills");
    config.output_root = root.join("out");
    config.tool_version = "test".into();

    (tmp, config)
}

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn add_skill(config: &BuildConfig, name: &str) {
    write(
        &config.skills_root,
        &format!("{name}/SKILL.md"),
        &format!("---\nname: {name}\ndescription: Skill {name}.\n---\n# {name}\n"),
    );
}

fn three_document_tree(config: &BuildConfig) {
    write(
        &config.docs_root,
        "a.md",
        "---\ntitle: Alpha\n---\nThe alpha document.\n",
    );
    write(&config.docs_root, "b.md", "The beta word appears here: beta.\n");
    write(&config.docs_root, "index.md", "# Welcome\n\nStart reading here.\n");
}

fn records(out: &Path) -> Vec<DocumentRecord> {
    serde_json::from_str(&fs::read_to_string(out.join("docs-index.json")).unwrap()).unwrap()
}

fn inverted(out: &Path) -> BTreeMap<String, BTreeSet<String>> {
    serde_json::from_str(&fs::read_to_string(out.join("inverted-index.json")).unwrap()).unwrap()
}

/// Every file under `dir`, keyed by `/`-joined relative path.
fn snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    fn walk(base: &Path, dir: &Path, out: &mut BTreeMap<String, Vec<u8>>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(base, &path, out);
            } else {
                let rel = path.strip_prefix(base).unwrap();
                let key = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                out.insert(key, fs::read(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    walk(dir, dir, &mut out);
    out
}

fn manifest_without_run_fields(out: &Path) -> serde_json::Value {
    let mut value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("manifest.json")).unwrap()).unwrap();
    let object = value.as_object_mut().unwrap();
    object.remove("generated_at");
    object.remove("changes");
    value
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn three_document_scenario() {
    let (_tmp, config) = setup();
    three_document_tree(&config);

    let result = run_build(&config, &SilentProgress).unwrap();
    assert_eq!(result.document_count, 3);

    let out = &config.output_root;
    let records = records(out);
    assert_eq!(records.len(), 3);

    let inverted = inverted(out);
    assert_eq!(inverted["alpha"], BTreeSet::from([stable_id("a.md")]));
    assert_eq!(inverted["beta"], BTreeSet::from([stable_id("b.md")]));

    let index = records.iter().find(|r| r.path == "index.md").unwrap();
    assert_eq!(index.url, "/");
    let a = records.iter().find(|r| r.path == "a.md").unwrap();
    assert_eq!(a.title, "Alpha");
    assert_eq!(a.url, "/a");
}

#[test]
fn rebuild_is_byte_identical() {
    let (_tmp, config) = setup();
    three_document_tree(&config);
    write(
        &config.docs_root,
        "snippets/hello.md",
        "```python hello.py\nprint('hello')\n```\n",
    );
    add_skill(&config, "helper");

    run_build(&config, &SilentProgress).unwrap();
    let mut first = snapshot(&config.output_root);
    let first_bundle = snapshot(&config.skills_root);
    let first_manifest = manifest_without_run_fields(&config.output_root);

    run_build(&config, &SilentProgress).unwrap();
    let mut second = snapshot(&config.output_root);
    let second_bundle = snapshot(&config.skills_root);
    let second_manifest = manifest_without_run_fields(&config.output_root);

    first.remove("manifest.json");
    second.remove("manifest.json");
    assert_eq!(first, second);
    assert_eq!(first_bundle, second_bundle);
    assert_eq!(first_manifest, second_manifest);
}

#[test]
fn ids_follow_paths_not_content() {
    let (_tmp, config) = setup();
    write(&config.docs_root, "guide.md", "First version.\n");

    run_build(&config, &SilentProgress).unwrap();
    let before = records(&config.output_root)[0].id.clone();

    write(&config.docs_root, "guide.md", "---\ntitle: Renamed\n---\nSecond version.\n");
    let result = run_build(&config, &SilentProgress).unwrap();
    assert_eq!(records(&config.output_root)[0].id, before);
    assert_eq!(result.changes.changed, vec!["guide.md"]);

    fs::rename(
        config.docs_root.join("guide.md"),
        config.docs_root.join("manual.md"),
    )
    .unwrap();
    let result = run_build(&config, &SilentProgress).unwrap();
    assert_ne!(records(&config.output_root)[0].id, before);
    assert_eq!(result.changes.added, vec!["manual.md"]);
    assert_eq!(result.changes.removed, vec!["guide.md"]);
}

#[test]
fn inverted_index_matches_tokenized_text() {
    let (_tmp, config) = setup();
    three_document_tree(&config);
    write(
        &config.docs_root,
        "guides/setup.mdx",
        "import Tabs from '@theme/Tabs';\n\n## Install\n\nRun `cargo install docpack` then see [the docs](https://example.com).\n\n```sh\nhidden_command --flag\n```\n",
    );
    write(&config.docs_root, "nav.json", "{\"sidebar\": [\"intro\"]}");

    run_build(&config, &SilentProgress).unwrap();
    let records = records(&config.output_root);
    let inverted = inverted(&config.output_root);

    for record in &records {
        let expected: BTreeSet<String> = tokenize(&record.plain_text).into_iter().collect();
        let actual: BTreeSet<String> = inverted
            .iter()
            .filter(|(_, ids)| ids.contains(&record.id))
            .map(|(token, _)| token.clone())
            .collect();
        assert_eq!(actual, expected, "token set mismatch for {}", record.path);
    }

    assert!(!inverted.contains_key("hidden_command"));
    assert!(!inverted.contains_key("import"));
    assert!(!inverted.contains_key("https"));
    assert!(inverted.contains_key("cargo"));
}

#[test]
fn compact_truncates_long_fences_only() {
    let (_tmp, config) = setup();
    let long: Vec<String> = (1..=57).map(|i| format!("print({i})")).collect();
    let short: Vec<String> = (1..=10).map(|i| format!("echo {i}")).collect();
    let short_block = format!("```sh\n{}\n```", short.join("\n"));
    write(
        &config.docs_root,
        "long.md",
        &format!(
            "# Long\n\nIntro text.\n\n```python\n{}\n```\n\n{short_block}\n",
            long.join("\n")
        ),
    );

    run_build(&config, &SilentProgress).unwrap();
    let compact = fs::read_to_string(config.output_root.join("compact/long.md")).unwrap();
    let lines: Vec<&str> = compact.lines().collect();

    let open = lines.iter().position(|l| *l == "```python").unwrap();
    assert_eq!(&lines[open + 1..open + 41], &long[..40]);
    assert_eq!(lines[open + 41], "```");
    assert_eq!(
        lines[open + 42],
        "> Code truncated to 40 of 57 lines. Full example: `long.md`"
    );
    assert!(!compact.contains("print(41)"));
    assert!(compact.contains(&short_block));
    assert!(compact.starts_with("# Long\n\n"));
    assert!(compact.contains("\nSource: long.md\n"));
}

#[test]
fn deleted_compact_file_is_restored() {
    let (_tmp, config) = setup();
    three_document_tree(&config);

    run_build(&config, &SilentProgress).unwrap();
    let path = config.output_root.join("compact/a.md");
    let original = fs::read(&path).unwrap();

    fs::remove_file(&path).unwrap();
    run_build(&config, &SilentProgress).unwrap();
    assert_eq!(fs::read(&path).unwrap(), original);
}

#[test]
fn removed_source_leaves_no_orphans() {
    let (_tmp, config) = setup();
    three_document_tree(&config);
    add_skill(&config, "helper");

    run_build(&config, &SilentProgress).unwrap();
    let b_id = stable_id("b.md");
    assert!(config.output_root.join("compact/b.md").exists());

    fs::remove_file(config.docs_root.join("b.md")).unwrap();
    let result = run_build(&config, &SilentProgress).unwrap();

    let out = &config.output_root;
    assert!(!out.join("compact/b.md").exists());
    assert!(records(out).iter().all(|r| r.path != "b.md"));
    assert!(inverted(out).values().all(|ids| !ids.contains(&b_id)));
    assert!(!inverted(out).contains_key("beta"));
    assert!(!config.skills_root.join("helper/references/compact/b.md").exists());
    assert_eq!(result.changes.removed, vec!["b.md"]);
}

#[test]
fn bundles_mirror_top_level_artifacts() {
    let (_tmp, config) = setup();
    three_document_tree(&config);
    write(&config.docs_root, "guides/index.mdx", "# Guides\n\nAll guides.\n");
    add_skill(&config, "first");
    add_skill(&config, "second");

    let result = run_build(&config, &SilentProgress).unwrap();
    assert_eq!(result.bundles.len(), 2);
    let n = result.document_count;
    assert_eq!(n, 4);

    for skill in ["first", "second"] {
        let refs = config.skills_root.join(skill).join("references");
        let shared = [
            "docs-index.json",
            "inverted-index.json",
            "path-to-id.json",
            "id-to-path.json",
        ];
        for name in shared {
            assert_eq!(
                fs::read(refs.join(name)).unwrap(),
                fs::read(config.output_root.join(name)).unwrap(),
                "{skill}/{name} differs from the top-level artifact"
            );
        }
        assert_eq!(fs::read_dir(refs.join("compact")).unwrap().count(), n);
        assert!(refs.join("reference-index.json").is_file());
        assert!(refs.join("README.md").is_file());
        assert!(config.skills_root.join(skill).join("scripts/lookup.sh").is_file());
        assert!(config.skills_root.join(skill).join("agents/interface.yaml").is_file());
    }

    let skills: Vec<serde_json::Value> = serde_json::from_str(
        &fs::read_to_string(config.output_root.join("skills-index.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(skills.len(), 2);
    assert_eq!(skills[0]["id"], "first");
}

#[test]
fn skill_filter_and_skip_flag() {
    let (_tmp, config) = setup();
    three_document_tree(&config);
    add_skill(&config, "first");
    add_skill(&config, "second");

    let mut only = config.clone();
    only.only_skill = Some("second".into());
    let result = run_build(&only, &SilentProgress).unwrap();
    assert_eq!(result.bundles.len(), 1);
    assert_eq!(result.bundles[0].skill_id, "second");
    assert!(!config.skills_root.join("first/references").exists());

    let mut skip = config.clone();
    skip.skip_bundles = true;
    let result = run_build(&skip, &SilentProgress).unwrap();
    assert!(result.bundles.is_empty());
    assert_eq!(result.skill_count, 2);
    assert!(!config.skills_root.join("first/references").exists());
}

#[test]
fn manifest_records_counts_and_changes() {
    let (_tmp, config) = setup();
    three_document_tree(&config);
    add_skill(&config, "helper");

    let first = run_build(&config, &SilentProgress).unwrap();
    assert_eq!(first.changes.added.len(), 3);

    let manifest: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(config.output_root.join("manifest.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(manifest["document_count"], 3);
    assert_eq!(manifest["skill_count"], 1);
    assert_eq!(manifest["compact_count"], 3);
    assert_eq!(manifest["snippet_count"], 0);
    assert_eq!(manifest["file_list"].as_array().unwrap().len(), 10);

    let second = run_build(&config, &SilentProgress).unwrap();
    assert!(!second.changes.has_changes());
    assert_eq!(second.changes.unchanged, 3);
}
