//! Error types for the corpus builder.
//!
//! Fatal conditions are `CorpusError` values. Local, per-item problems
//! (a skipped heading, a malformed record file, an unresolved reference) are
//! not errors: they are reported individually through
//! [`crate::types::Diagnostic`] and the resolver's report so a run can finish.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the corpus library.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// Roman numeral contained no characters or a non-Roman character.
    #[error("Invalid Roman numeral: '{0}'. Expected uppercase I, V, X, L, C, D, M")]
    InvalidRomanNumeral(String),

    /// Chapter designator could not be normalised.
    #[error("Invalid chapter designator: '{0}'. Expected a Roman numeral with an optional letter suffix (e.g., XA)")]
    InvalidChapterId(String),

    /// Same article number found in two chapters (strict mode only).
    #[error("Duplicate article {number}: first in chapter {first_chapter}, again in chapter {second_chapter}")]
    DuplicateArticle {
        number: String,
        first_chapter: String,
        second_chapter: String,
    },

    /// Table of contents has an unexpected shape.
    #[error("Malformed table of contents: {0}")]
    TocFormat(String),

    /// Fallback tolerance out of range.
    #[error("Invalid fallback tolerance: {0}. Expected 0..={max}", max = crate::config::MAX_FALLBACK_TOLERANCE)]
    InvalidTolerance(u32),

    /// Configuration value could not be used.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading a specific file failed.
    #[error("Failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (de)serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

/// Result type alias for corpus operations.
pub type Result<T> = std::result::Result<T, CorpusError>;
