//! Error types for docpack.
//!
//! Library crates use [`DocpackError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all docpack operations.
#[derive(Debug, thiserror::Error)]
pub enum DocpackError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A required input root directory does not exist.
    #[error("{kind} root not found: {}", path.display())]
    MissingRoot { kind: &'static str, path: PathBuf },

    /// A bundle was requested by name but no such skill exists.
    #[error("skill bundle not found: {name}")]
    SkillNotFound { name: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Internal invariant violated (duplicate ID, slug collision, ...).
    #[error("invariant violated: {message}")]
    Invariant { message: String },

    /// JSON serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Data validation error (bad input shape, unsupported value, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocpackError>;

impl DocpackError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a missing-root error for the named input kind (`docs`, `skills`, ...).
    pub fn missing_root(kind: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::MissingRoot {
            kind,
            path: path.into(),
        }
    }

    /// Create an invariant-violation error.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error belongs to the fatal configuration class
    /// (missing roots, unknown bundle, bad config) rather than a defect.
    pub fn is_fatal_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::MissingRoot { .. } | Self::SkillNotFound { .. }
        )
    }
}

impl From<serde_json::Error> for DocpackError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = DocpackError::config("bad extensions list");
        assert_eq!(err.to_string(), "config error: bad extensions list");

        let err = DocpackError::missing_root("docs", "/nope/docs");
        assert_eq!(err.to_string(), "docs root not found: /nope/docs");

        let err = DocpackError::SkillNotFound {
            name: "ghost".into(),
        };
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn fatal_classification() {
        assert!(DocpackError::missing_root("skills", "/x").is_fatal_configuration());
        assert!(!DocpackError::invariant("duplicate id").is_fatal_configuration());
    }
}
