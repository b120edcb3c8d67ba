//! Core data types for the corpus.
//!
//! `Article` doubles as the on-disk record: its serde shape is the JSON
//! written for each article (camelCase keys, stable field order).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::roman::ChapterId;

/// One entry of an article's flattened content.
///
/// Sub-paragraphs share the number of their numbered parent; the hierarchy
/// is only visible in the leading marker of `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentParagraph {
    pub paragraph: u32,
    pub text: String,
}

impl ContentParagraph {
    #[must_use]
    pub fn new(paragraph: u32, text: impl Into<String>) -> Self {
        Self {
            paragraph,
            text: text.into(),
        }
    }
}

/// A pointer from one article to another.
///
/// Before resolution only `article` is set. Fields this crate does not know
/// about are kept in `extra` and written back untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossReference {
    pub article: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_number: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CrossReference {
    /// Create an unresolved reference to `article`.
    #[must_use]
    pub fn new(article: u32) -> Self {
        Self {
            article,
            chapter_number: None,
            title: None,
            article_number: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.chapter_number.is_some()
    }
}

/// A numbered provision and the record written for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Article number, digits with an optional letter (e.g. "48", "10A").
    pub number: String,

    pub title: String,

    /// Snapshot of the owning chapter's id at creation time.
    pub chapter_number: String,

    /// Snapshot of the owning chapter's title at creation time.
    pub chapter_title: String,

    pub content: Vec<ContentParagraph>,

    #[serde(default)]
    pub amendment_history: Map<String, Value>,

    #[serde(default)]
    pub cross_references: Vec<CrossReference>,

    #[serde(default)]
    pub notes: String,
}

/// Top-level structural division of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub id: ChapterId,
    pub title: String,
    pub articles: Vec<Article>,
}

impl Chapter {
    #[must_use]
    pub fn new(id: ChapterId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            articles: Vec::new(),
        }
    }
}

/// Something skipped or suspect during extraction.
///
/// Offsets are byte positions in the (normalised) source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A chapter heading whose designator could not be normalised.
    SkippedChapter {
        offset: usize,
        designator: String,
        reason: String,
    },
    /// A chapter numeral that scans but is not canonical (e.g. `IIV`).
    NonCanonicalNumeral {
        offset: usize,
        numeral: String,
        value: u32,
    },
    /// A chapter heading with no article headers in its span.
    EmptyChapter { offset: usize, chapter: String },
    /// Text in a chapter span that belongs to no article (strict mode).
    UnparsedText {
        offset: usize,
        chapter: String,
        text: String,
    },
    /// An article number seen in more than one place.
    DuplicateArticle {
        offset: usize,
        number: String,
        first_chapter: String,
        second_chapter: String,
    },
    /// Article text before its first numbered paragraph marker.
    UnnumberedLeadIn {
        offset: usize,
        article: String,
        text: String,
    },
    /// A paragraph marker kept as text: a citation, or inside a quotation.
    DemotedMarker {
        offset: usize,
        article: String,
        marker: String,
        quoted: bool,
    },
    /// A quotation still open at the end of an article body.
    UnclosedQuote { offset: usize, article: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkippedChapter {
                offset,
                designator,
                reason,
            } => write!(f, "skipped chapter '{designator}' at byte {offset}: {reason}"),
            Self::NonCanonicalNumeral {
                offset,
                numeral,
                value,
            } => write!(
                f,
                "non-canonical chapter numeral '{numeral}' at byte {offset}, read as {value}"
            ),
            Self::EmptyChapter { offset, chapter } => {
                write!(f, "chapter {chapter} at byte {offset} has no articles")
            }
            Self::UnparsedText {
                offset,
                chapter,
                text,
            } => write!(
                f,
                "unparsed text in chapter {chapter} at byte {offset}: {}",
                preview(text)
            ),
            Self::DuplicateArticle {
                offset,
                number,
                first_chapter,
                second_chapter,
            } => write!(
                f,
                "article {number} at byte {offset} in chapter {second_chapter} duplicates chapter {first_chapter}"
            ),
            Self::UnnumberedLeadIn {
                offset,
                article,
                text,
            } => write!(
                f,
                "article {article} has text before its first numbered paragraph at byte {offset}: {}",
                preview(text)
            ),
            Self::DemotedMarker {
                offset,
                article,
                marker,
                quoted,
            } => {
                let context = if *quoted { "inside a quotation" } else { "as a citation" };
                write!(
                    f,
                    "article {article}: marker {marker} at byte {offset} kept as text {context}"
                )
            }
            Self::UnclosedQuote { offset, article } => write!(
                f,
                "article {article}: quotation opened at byte {offset} is never closed"
            ),
        }
    }
}

fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 60;
    if text.chars().count() <= MAX_CHARS {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX_CHARS).collect();
        format!("{cut}...")
    }
}

/// The extracted document tree plus extraction diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub chapters: Vec<Chapter>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Document {
    /// All articles in document order.
    pub fn articles(&self) -> impl Iterator<Item = &Article> {
        self.chapters.iter().flat_map(|c| c.articles.iter())
    }

    pub fn article_count(&self) -> usize {
        self.chapters.iter().map(|c| c.articles.len()).sum()
    }

    pub fn find_article(&self, number: &str) -> Option<&Article> {
        self.articles().find(|a| a.number == number)
    }

    pub fn chapter(&self, id: ChapterId) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    /// Correct a chapter title and push it into every article snapshot.
    ///
    /// Returns the number of articles updated, or `None` if no chapter has
    /// that id.
    pub fn retitle_chapter(&mut self, id: ChapterId, title: &str) -> Option<usize> {
        let chapter = self.chapters.iter_mut().find(|c| c.id == id)?;
        chapter.title = title.to_string();
        for article in &mut chapter.articles {
            article.chapter_title = title.to_string();
        }
        Some(chapter.articles.len())
    }
}
