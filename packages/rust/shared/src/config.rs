//! Application configuration for docpack.
//!
//! A project config lives at `./docpack.toml`; a user-wide fallback lives at
//! `~/.docpack/docpack.toml`. CLI flags and environment variables override
//! config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DocpackError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docpack.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docpack";

// ---------------------------------------------------------------------------
// Config structs (matching docpack.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Indexing options.
    #[serde(default)]
    pub index: IndexConfig,

    /// Published site settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// Bundle layout.
    #[serde(default)]
    pub bundle: BundleConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Documentation source tree.
    #[serde(default = "default_docs_root")]
    pub docs_root: String,

    /// Directory whose subdirectories are skill bundles.
    #[serde(default = "default_skills_root")]
    pub skills_root: String,

    /// Where global artifacts are written.
    #[serde(default = "default_output_root")]
    pub output_root: String,

    /// Snippet directory, relative to `docs_root`.
    #[serde(default = "default_snippets_dir")]
    pub snippets_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            docs_root: default_docs_root(),
            skills_root: default_skills_root(),
            output_root: default_output_root(),
            snippets_dir: default_snippets_dir(),
        }
    }
}

fn default_docs_root() -> String {
    "docs".into()
}
fn default_skills_root() -> String {
    "skills".into()
}
fn default_output_root() -> String {
    "build/docpack".into()
}
fn default_snippets_dir() -> String {
    "snippets".into()
}

/// `[index]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Extensions (without dot) picked up by the scanner.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Extensions that also get a compact rendering.
    #[serde(default = "default_compact_extensions")]
    pub compact_extensions: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            compact_extensions: default_compact_extensions(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["md".into(), "mdx".into(), "json".into()]
}
fn default_compact_extensions() -> Vec<String> {
    vec!["md".into(), "mdx".into()]
}

/// `[site]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Public base URL of the rendered documentation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl SiteConfig {
    /// Parse `base_url`, if set.
    pub fn parsed_base_url(&self) -> Result<Option<Url>> {
        self.base_url
            .as_deref()
            .map(|raw| {
                Url::parse(raw).map_err(|e| {
                    DocpackError::config(format!("invalid site.base_url '{raw}': {e}"))
                })
            })
            .transpose()
    }
}

/// `[bundle]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleConfig {
    /// Reference subdirectory inside each skill.
    #[serde(default = "default_reference_dir")]
    pub reference_dir: String,

    /// Interface descriptor path inside each skill (written only if absent).
    #[serde(default = "default_interface_file")]
    pub interface_file: String,

    /// Lookup helper script path inside each skill.
    #[serde(default = "default_script_file")]
    pub script_file: String,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            reference_dir: default_reference_dir(),
            interface_file: default_interface_file(),
            script_file: default_script_file(),
        }
    }
}

fn default_reference_dir() -> String {
    "references".into()
}
fn default_interface_file() -> String {
    "agents/interface.yaml".into()
}
fn default_script_file() -> String {
    "scripts/lookup.sh".into()
}

// ---------------------------------------------------------------------------
// Build config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime build configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub docs_root: PathBuf,
    pub skills_root: PathBuf,
    pub output_root: PathBuf,
    /// Absolute or docs-root-relative snippet directory, already joined.
    pub snippets_dir: PathBuf,
    pub extensions: Vec<String>,
    pub compact_extensions: Vec<String>,
    pub base_url: Option<Url>,
    pub bundle: BundleConfig,
    /// Skip bundle assembly entirely.
    pub skip_bundles: bool,
    /// Restrict bundle assembly to one skill.
    pub only_skill: Option<String>,
    /// Tool version string recorded in the manifest.
    pub tool_version: String,
}

impl BuildConfig {
    /// Build the runtime config from a loaded [`AppConfig`].
    pub fn from_app(config: &AppConfig) -> Result<Self> {
        let docs_root = PathBuf::from(&config.paths.docs_root);
        let snippets_dir = docs_root.join(&config.paths.snippets_dir);

        if config.index.extensions.is_empty() {
            return Err(DocpackError::config("index.extensions must not be empty"));
        }

        Ok(Self {
            docs_root,
            skills_root: PathBuf::from(&config.paths.skills_root),
            output_root: PathBuf::from(&config.paths.output_root),
            snippets_dir,
            extensions: normalize_extensions(&config.index.extensions),
            compact_extensions: normalize_extensions(&config.index.compact_extensions),
            base_url: config.site.parsed_base_url()?,
            bundle: config.bundle.clone(),
            skip_bundles: false,
            only_skill: None,
            tool_version: String::new(),
        })
    }

    /// Replace the docs root, keeping the snippet directory relative to it.
    pub fn with_docs_root(mut self, docs_root: PathBuf, snippets_dir: &str) -> Self {
        self.snippets_dir = docs_root.join(snippets_dir);
        self.docs_root = docs_root;
        self
    }
}

/// Lowercase and strip leading dots so `.MD` and `md` compare equal.
fn normalize_extensions(exts: &[String]) -> Vec<String> {
    exts.iter()
        .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
        .collect()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.docpack/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocpackError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.docpack/docpack.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config.
///
/// Looks for `./docpack.toml` first, then the user config file. Returns
/// defaults when neither exists.
pub fn load_config() -> Result<AppConfig> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return load_config_from(&local);
    }

    let path = config_file_path()?;
    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocpackError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DocpackError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the user config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocpackError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocpackError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocpackError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("docs_root"));
        assert!(toml_str.contains("references"));
        assert!(!toml_str.contains("base_url"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.paths.output_root, "build/docpack");
        assert_eq!(parsed.index.extensions, vec!["md", "mdx", "json"]);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[paths]
docs_root = "site/docs"

[site]
base_url = "https://docs.example.com/"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.paths.docs_root, "site/docs");
        assert_eq!(config.paths.skills_root, "skills");
        assert_eq!(config.bundle.interface_file, "agents/interface.yaml");

        let build = BuildConfig::from_app(&config).expect("build config");
        assert_eq!(build.snippets_dir, PathBuf::from("site/docs/snippets"));
        assert_eq!(
            build.base_url.map(|u| u.to_string()).as_deref(),
            Some("https://docs.example.com/")
        );
    }

    #[test]
    fn build_config_normalizes_extensions() {
        let mut config = AppConfig::default();
        config.index.extensions = vec![".MD".into(), "mdx".into()];
        let build = BuildConfig::from_app(&config).expect("build config");
        assert_eq!(build.extensions, vec!["md", "mdx"]);
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let mut config = AppConfig::default();
        config.site.base_url = Some("not a url".into());
        let err = BuildConfig::from_app(&config).unwrap_err();
        assert!(err.to_string().contains("invalid site.base_url"));
    }

    #[test]
    fn empty_extensions_rejected() {
        let mut config = AppConfig::default();
        config.index.extensions.clear();
        assert!(BuildConfig::from_app(&config).is_err());
    }

    #[test]
    fn docs_root_override_moves_snippets() {
        let config = AppConfig::default();
        let build = BuildConfig::from_app(&config)
            .expect("build config")
            .with_docs_root(PathBuf::from("/srv/docs"), &config.paths.snippets_dir);
        assert_eq!(build.snippets_dir, PathBuf::from("/srv/docs/snippets"));
    }
}
