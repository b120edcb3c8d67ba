//! Cross-reference resolution against the table of contents.
//!
//! Each reference is looked up by article number. A miss falls back to the
//! nearest known article number within a tolerance; anything further away is
//! left unresolved and reported. Known-good corrections can be supplied as a
//! declarative override table and are applied last.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{validate_tolerance, ResolverConfig, DEFAULT_FALLBACK_TOLERANCE};
use crate::error::{CorpusError, Result};
use crate::serialize::{Corpus, RecordKey};
use crate::toc::{plain_article_number, ArticleIndex};
use crate::types::{Article, CrossReference};

/// One declarative correction: in article `source`, the reference to
/// `article` belongs to `chapter_number`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRule {
    pub source: String,
    pub article: u32,
    pub chapter_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Override table, loaded from YAML:
///
/// ```yaml
/// overrides:
///   - source: "48"
///     article: 109
///     chapter_number: "10"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideTable {
    #[serde(default)]
    pub overrides: Vec<OverrideRule>,
}

impl OverrideTable {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|source| CorpusError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    fn find(&self, source: &str, article: u32) -> Option<&OverrideRule> {
        self.overrides
            .iter()
            .find(|rule| rule.source == source && rule.article == article)
    }
}

/// How a single reference was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Found in the index.
    Exact,
    /// Chapter taken from the nearest indexed article.
    Fallback { nearest: String, distance: u32 },
    /// Chapter set by the override table.
    Override,
    /// No chapter could be determined; the reference was left as is.
    Unresolved { nearest: Option<(String, u32)> },
}

/// Outcome for one reference in one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceOutcome {
    pub record: RecordKey,
    pub article: u32,
    pub resolution: Resolution,
}

impl fmt::Display for ReferenceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.resolution {
            Resolution::Exact => write!(f, "{}: article {} resolved", self.record, self.article),
            Resolution::Fallback { nearest, distance } => write!(
                f,
                "{}: article {} guessed from article {nearest} ({distance} away)",
                self.record, self.article
            ),
            Resolution::Override => {
                write!(f, "{}: article {} set by override", self.record, self.article)
            }
            Resolution::Unresolved { nearest: Some((nearest, distance)) } => write!(
                f,
                "{}: could not determine chapter for article {} (nearest {nearest} is {distance} away)",
                self.record, self.article
            ),
            Resolution::Unresolved { nearest: None } => write!(
                f,
                "{}: could not determine chapter for article {} (empty index)",
                self.record, self.article
            ),
        }
    }
}

/// Everything a resolution pass did, reference by reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    pub records_scanned: usize,
    /// Records with at least one changed reference, in processing order.
    pub updated: Vec<RecordKey>,
    pub outcomes: Vec<ReferenceOutcome>,
}

impl ResolutionReport {
    pub fn unresolved(&self) -> impl Iterator<Item = &ReferenceOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.resolution, Resolution::Unresolved { .. }))
    }

    pub fn fallbacks(&self) -> impl Iterator<Item = &ReferenceOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.resolution, Resolution::Fallback { .. }))
    }
}

/// Resolves references against an [`ArticleIndex`].
#[derive(Debug, Clone)]
pub struct Resolver {
    index: ArticleIndex,
    tolerance: u32,
    overrides: OverrideTable,
}

impl Resolver {
    #[must_use]
    pub fn new(index: ArticleIndex) -> Self {
        Self {
            index,
            tolerance: DEFAULT_FALLBACK_TOLERANCE,
            overrides: OverrideTable::default(),
        }
    }

    /// Build a resolver with the tolerance and override table of `config`.
    pub fn from_config(index: ArticleIndex, config: &ResolverConfig) -> Result<Self> {
        let overrides = match &config.overrides {
            Some(path) => OverrideTable::load(path)?,
            None => OverrideTable::default(),
        };
        Ok(Self::new(index)
            .with_tolerance(config.tolerance)?
            .with_overrides(overrides))
    }

    pub fn with_tolerance(mut self, tolerance: u32) -> Result<Self> {
        validate_tolerance(tolerance)?;
        self.tolerance = tolerance;
        Ok(self)
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: OverrideTable) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn index(&self) -> &ArticleIndex {
        &self.index
    }

    /// Fill in chapter number, article number and (if missing) title.
    pub fn resolve_reference(&self, reference: &mut CrossReference) -> Resolution {
        let number = reference.article.to_string();

        if let Some(entry) = self.index.get(&number) {
            reference.chapter_number = Some(entry.chapter_number.clone());
            reference.article_number = Some(number);
            if reference.title.as_deref().map_or(true, str::is_empty) {
                reference.title = Some(entry.title.clone());
            }
            return Resolution::Exact;
        }

        let Some(target) = plain_article_number(&number) else {
            return Resolution::Unresolved { nearest: None };
        };

        match self.index.nearest(target) {
            Some((key, entry, distance)) if distance <= self.tolerance => {
                reference.chapter_number = Some(entry.chapter_number.clone());
                reference.article_number = Some(number);
                Resolution::Fallback {
                    nearest: key.to_string(),
                    distance,
                }
            }
            nearest => Resolution::Unresolved {
                nearest: nearest.map(|(key, _, distance)| (key.to_string(), distance)),
            },
        }
    }

    /// Resolve every reference of one article. Returns whether anything
    /// changed, and one outcome per reference.
    pub fn resolve_article(
        &self,
        key: &RecordKey,
        article: &mut Article,
    ) -> (bool, Vec<ReferenceOutcome>) {
        let mut changed = false;
        let mut outcomes = Vec::with_capacity(article.cross_references.len());

        for reference in &mut article.cross_references {
            let before = reference.clone();
            let mut resolution = self.resolve_reference(reference);

            if let Some(rule) = self.overrides.find(&article.number, reference.article) {
                reference.chapter_number = Some(rule.chapter_number.clone());
                reference.article_number = Some(reference.article.to_string());
                if let Some(title) = &rule.title {
                    reference.title = Some(title.clone());
                }
                resolution = Resolution::Override;
            }

            changed |= *reference != before;
            outcomes.push(ReferenceOutcome {
                record: key.clone(),
                article: reference.article,
                resolution,
            });
        }

        (changed, outcomes)
    }

    /// Resolve a whole corpus in record-key order.
    pub fn resolve_corpus(&self, corpus: &mut Corpus) -> ResolutionReport {
        let mut report = ResolutionReport::default();

        for (key, article) in corpus.iter_mut() {
            report.records_scanned += 1;
            let (changed, outcomes) = self.resolve_article(key, article);

            for outcome in &outcomes {
                match outcome.resolution {
                    Resolution::Unresolved { .. } => tracing::warn!("{outcome}"),
                    Resolution::Fallback { .. } | Resolution::Override => {
                        tracing::info!("{outcome}")
                    }
                    Resolution::Exact => tracing::debug!("{outcome}"),
                }
            }

            if changed {
                report.updated.push(key.clone());
            }
            report.outcomes.extend(outcomes);
        }

        report
    }
}
