//! Shared types, error model, and configuration for docpack.
//!
//! This crate is the foundation depended on by all other docpack crates.
//! It provides:
//! - [`DocpackError`]: the unified error type
//! - Domain types ([`DocumentRecord`], [`CompactDocEntry`], [`SkillEntry`], [`BuildManifest`])
//! - Configuration ([`AppConfig`], [`BuildConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BuildConfig, BundleConfig, IndexConfig, PathsConfig, SiteConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{DocpackError, Result};
pub use types::{
    BuildManifest, CURRENT_SCHEMA_VERSION, ChangeReport, CompactDocEntry, DOCUMENT_ID_LEN,
    DocumentRecord, FrontmatterMeta, SkillEntry, artifact, sha256_hex, stable_id,
};
