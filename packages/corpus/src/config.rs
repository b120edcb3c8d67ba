//! Configuration constants, environment-driven settings and validation.

use std::path::PathBuf;

use crate::error::{CorpusError, Result};

/// Default output directory for the generated corpus.
pub const DEFAULT_OUTPUT_DIR: &str = "articles";

/// Document name used in the templated `notes` sentence.
pub const DEFAULT_DOCUMENT_NAME: &str = "Maltese Constitution";

/// Top-level key of the table of contents.
pub const DEFAULT_DOCUMENT_TITLE: &str = "Constitution of Malta";

/// Maximum distance between article numbers for a fallback chapter guess.
///
/// Articles within five positions of a known article are assumed to share
/// its chapter.
pub const DEFAULT_FALLBACK_TOLERANCE: u32 = 5;

/// Upper bound accepted for the fallback tolerance.
pub const MAX_FALLBACK_TOLERANCE: u32 = 50;

/// Directory prefix for chapter buckets (e.g. `chapter_10A`).
pub const CHAPTER_DIR_PREFIX: &str = "chapter_";

/// File prefix for article records (e.g. `article_48.json`).
pub const ARTICLE_FILE_PREFIX: &str = "article_";

/// Extension of article record files.
pub const RECORD_EXTENSION: &str = "json";

pub const ENV_FALLBACK_TOLERANCE: &str = "CORPUS_FALLBACK_TOLERANCE";
pub const ENV_DOCUMENT_TITLE: &str = "CORPUS_DOCUMENT_TITLE";
pub const ENV_OVERRIDES: &str = "CORPUS_OVERRIDES";

/// Validate a fallback tolerance.
///
/// # Examples
/// ```
/// use constitution_corpus::config::validate_tolerance;
///
/// assert!(validate_tolerance(5).is_ok());
/// assert!(validate_tolerance(0).is_ok());
/// assert!(validate_tolerance(500).is_err());
/// ```
pub fn validate_tolerance(tolerance: u32) -> Result<()> {
    if tolerance <= MAX_FALLBACK_TOLERANCE {
        Ok(())
    } else {
        Err(CorpusError::InvalidTolerance(tolerance))
    }
}

/// Make an identifier safe for use as a file or directory name component.
///
/// # Examples
/// ```
/// use constitution_corpus::config::sanitize_identifier;
///
/// assert_eq!(sanitize_identifier("10A"), "10A");
/// assert_eq!(sanitize_identifier("48/../x"), "48x");
/// ```
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Settings for the cross-reference resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Maximum article-number distance accepted by the fallback heuristic.
    pub tolerance: u32,
    /// Top-level TOC key. `None` accepts a single-key TOC of any title.
    pub document_title: Option<String>,
    /// Optional YAML table of reference overrides.
    pub overrides: Option<PathBuf>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_FALLBACK_TOLERANCE,
            document_title: Some(DEFAULT_DOCUMENT_TITLE.to_string()),
            overrides: None,
        }
    }
}

impl ResolverConfig {
    /// Read settings from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var(ENV_FALLBACK_TOLERANCE) {
            let tolerance = value.trim().parse::<u32>().map_err(|_| {
                CorpusError::Config(format!("{ENV_FALLBACK_TOLERANCE} is not a number: '{value}'"))
            })?;
            config = config.with_tolerance(tolerance)?;
        }

        if let Ok(title) = std::env::var(ENV_DOCUMENT_TITLE) {
            config.document_title = Some(title);
        }

        if let Ok(path) = std::env::var(ENV_OVERRIDES) {
            config.overrides = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    pub fn with_tolerance(mut self, tolerance: u32) -> Result<Self> {
        validate_tolerance(tolerance)?;
        self.tolerance = tolerance;
        Ok(self)
    }

    pub fn with_document_title(mut self, title: Option<String>) -> Self {
        self.document_title = title;
        self
    }

    pub fn with_overrides(mut self, path: impl Into<PathBuf>) -> Self {
        self.overrides = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_tolerance_bounds() {
        assert!(validate_tolerance(0).is_ok());
        assert!(validate_tolerance(MAX_FALLBACK_TOLERANCE).is_ok());
        assert!(validate_tolerance(MAX_FALLBACK_TOLERANCE + 1).is_err());
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("5"), "5");
        assert_eq!(sanitize_identifier("10A"), "10A");
        assert_eq!(sanitize_identifier("1 2"), "12");
        assert_eq!(sanitize_identifier("../etc"), "etc");
    }

    #[test]
    fn test_default_config() {
        let config = ResolverConfig::default();
        assert_eq!(config.tolerance, 5);
        assert_eq!(config.document_title.as_deref(), Some("Constitution of Malta"));
        assert!(config.overrides.is_none());
    }

    #[test]
    fn test_builder_methods() {
        let config = ResolverConfig::default()
            .with_tolerance(3)
            .unwrap()
            .with_document_title(None)
            .with_overrides("overrides.yaml");
        assert_eq!(config.tolerance, 3);
        assert!(config.document_title.is_none());
        assert_eq!(config.overrides, Some(PathBuf::from("overrides.yaml")));
    }

    #[test]
    fn test_with_tolerance_rejects_out_of_range() {
        assert!(ResolverConfig::default().with_tolerance(51).is_err());
    }
}
