//! Table of contents and the article → chapter index built from it.
//!
//! The TOC is JSON keyed by document title, then by chapter heading
//! (`"Chapter V - Fundamental Rights"`), then either by article number or by
//! part title and then article number:
//!
//! ```json
//! { "Constitution of Malta": {
//!     "Chapter I - The Republic of Malta": { "1": "Malta", "2": "Religion" },
//!     "Chapter VI - The Executive": { "Part 1 - The President": { "48": "..." } }
//! } }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{CorpusError, Result};
use crate::roman::ChapterId;

/// Chapter heading key, e.g. `Chapter XA - Title`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TOC_CHAPTER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Chapter\s+([IVXLCDM]+[A-Z]?)\s+-").expect("valid regex"));

/// Key prefix that marks a chapter subdivided into parts.
const PART_PREFIX: &str = "Part";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocArticle {
    pub number: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocPart {
    pub title: String,
    pub articles: Vec<TocArticle>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TocBody {
    Articles(Vec<TocArticle>),
    Parts(Vec<TocPart>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocChapter {
    pub heading: String,
    pub id: ChapterId,
    pub body: TocBody,
}

impl TocChapter {
    /// Articles of the chapter, parts flattened in order.
    pub fn articles(&self) -> Box<dyn Iterator<Item = &TocArticle> + '_> {
        match &self.body {
            TocBody::Articles(articles) => Box::new(articles.iter()),
            TocBody::Parts(parts) => Box::new(parts.iter().flat_map(|p| p.articles.iter())),
        }
    }
}

/// Authoritative chapter/article/title listing. Read-only once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOfContents {
    pub title: String,
    pub chapters: Vec<TocChapter>,
    /// Top-level keys that did not look like chapter headings.
    pub skipped_headings: Vec<String>,
}

impl TableOfContents {
    /// Parse a TOC from JSON.
    ///
    /// `document_title` selects the top-level key. When it is `None`, or
    /// not present and the TOC has a single top-level key, that single key is
    /// used.
    pub fn from_json(json: &str, document_title: Option<&str>) -> Result<Self> {
        let root: Value = serde_json::from_str(json)?;
        let root = root
            .as_object()
            .ok_or_else(|| CorpusError::TocFormat("top level is not an object".to_string()))?;

        let (title, chapters) = select_document(root, document_title)?;
        let chapters = chapters.as_object().ok_or_else(|| {
            CorpusError::TocFormat(format!("'{title}' does not map chapter headings"))
        })?;

        let mut toc = Self {
            title: title.to_string(),
            chapters: Vec::new(),
            skipped_headings: Vec::new(),
        };

        for (heading, content) in chapters {
            let Some(id) = parse_heading(heading) else {
                tracing::warn!(heading = %heading, "TOC key is not a chapter heading, skipping");
                toc.skipped_headings.push(heading.clone());
                continue;
            };
            let content = content.as_object().ok_or_else(|| {
                CorpusError::TocFormat(format!("chapter '{heading}' is not an object"))
            })?;

            toc.chapters.push(TocChapter {
                heading: heading.clone(),
                id,
                body: parse_body(heading, content)?,
            });
        }

        Ok(toc)
    }

    /// Read and parse a TOC file. Any failure here is fatal for resolution.
    pub fn load(path: &Path, document_title: Option<&str>) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| CorpusError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json, document_title)
    }
}

fn select_document<'a>(
    root: &'a Map<String, Value>,
    document_title: Option<&str>,
) -> Result<(&'a str, &'a Value)> {
    if let Some(title) = document_title {
        if let Some((key, value)) = root.get_key_value(title) {
            return Ok((key.as_str(), value));
        }
    }

    let mut entries = root.iter();
    match (entries.next(), entries.next()) {
        (Some((key, value)), None) => {
            if let Some(wanted) = document_title {
                tracing::warn!(
                    wanted = %wanted,
                    found = %key,
                    "TOC title differs, using the only document"
                );
            }
            Ok((key.as_str(), value))
        }
        _ => Err(CorpusError::TocFormat(match document_title {
            Some(title) => format!("document '{title}' not found"),
            None => "several documents and no title given".to_string(),
        })),
    }
}

fn parse_heading(heading: &str) -> Option<ChapterId> {
    let caps = TOC_CHAPTER_PATTERN.captures(heading)?;
    ChapterId::from_numeral(caps.get(1)?.as_str()).ok()
}

fn parse_body(heading: &str, content: &Map<String, Value>) -> Result<TocBody> {
    let has_parts = content.keys().any(|k| k.starts_with(PART_PREFIX));
    if !has_parts {
        return parse_articles(heading, content).map(TocBody::Articles);
    }

    let mut parts = Vec::new();
    for (title, value) in content {
        match value.as_object() {
            Some(articles) => parts.push(TocPart {
                title: title.clone(),
                articles: parse_articles(heading, articles)?,
            }),
            None => {
                tracing::warn!(
                    chapter = %heading,
                    key = %title,
                    "Non-part entry in a chapter with parts, skipping"
                );
            }
        }
    }
    Ok(TocBody::Parts(parts))
}

fn parse_articles(heading: &str, content: &Map<String, Value>) -> Result<Vec<TocArticle>> {
    content
        .iter()
        .map(|(number, title)| match title {
            Value::String(title) => Ok(TocArticle {
                number: number.clone(),
                title: title.clone(),
            }),
            _ => Err(CorpusError::TocFormat(format!(
                "article '{number}' in '{heading}' has no title string"
            ))),
        })
        .collect()
}

/// Integer part of an article number (`"10A"` → 10).
///
/// # Examples
/// ```
/// use constitution_corpus::toc::plain_article_number;
///
/// assert_eq!(plain_article_number("10A"), Some(10));
/// assert_eq!(plain_article_number("48"), Some(48));
/// assert_eq!(plain_article_number("A"), None);
/// ```
pub fn plain_article_number(number: &str) -> Option<u32> {
    number
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .ok()
}

/// Chapter and title for one article number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub chapter_number: String,
    pub title: String,
}

/// An article number listed under more than one chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocDuplicate {
    pub number: String,
    /// Chapter whose entry was replaced.
    pub replaced_chapter: String,
    /// Chapter whose entry is kept.
    pub kept_chapter: String,
}

/// Flat article number → chapter index (parts are not preserved).
#[derive(Debug, Clone, Default)]
pub struct ArticleIndex {
    entries: HashMap<String, IndexEntry>,
    /// `(plain number, key)` ascending; fixes the fallback scan order.
    ordered: Vec<(u32, String)>,
    duplicates: Vec<TocDuplicate>,
}

impl ArticleIndex {
    /// Build the index. A number listed twice keeps the later entry; every
    /// such case is recorded in [`ArticleIndex::duplicates`].
    pub fn from_toc(toc: &TableOfContents) -> Self {
        let mut index = Self::default();
        for chapter in &toc.chapters {
            let chapter_number = chapter.id.to_string();
            for article in chapter.articles() {
                index.insert(&article.number, &chapter_number, &article.title);
            }
        }
        index.finish();
        index
    }

    /// Build directly from `(number, chapter, title)` entries.
    pub fn from_entries<'a>(
        entries: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>,
    ) -> Self {
        let mut index = Self::default();
        for (number, chapter, title) in entries {
            index.insert(number, chapter, title);
        }
        index.finish();
        index
    }

    fn insert(&mut self, number: &str, chapter_number: &str, title: &str) {
        let entry = IndexEntry {
            chapter_number: chapter_number.to_string(),
            title: title.to_string(),
        };
        if let Some(previous) = self.entries.insert(number.to_string(), entry) {
            tracing::warn!(
                article = %number,
                replaced = %previous.chapter_number,
                kept = %chapter_number,
                "Article listed twice in TOC, later entry wins"
            );
            self.duplicates.push(TocDuplicate {
                number: number.to_string(),
                replaced_chapter: previous.chapter_number,
                kept_chapter: chapter_number.to_string(),
            });
        }
    }

    fn finish(&mut self) {
        self.ordered = self
            .entries
            .keys()
            .filter_map(|key| plain_article_number(key).map(|plain| (plain, key.clone())))
            .collect();
        self.ordered.sort();
    }

    pub fn get(&self, number: &str) -> Option<&IndexEntry> {
        self.entries.get(number)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn duplicates(&self) -> &[TocDuplicate] {
        &self.duplicates
    }

    /// Entry whose plain number is closest to `target`.
    ///
    /// Scans in ascending `(plain number, key)` order; the first entry with
    /// the smallest distance wins. Returns the key, entry and distance.
    pub fn nearest(&self, target: u32) -> Option<(&str, &IndexEntry, u32)> {
        let mut best: Option<(&str, u32)> = None;
        for (plain, key) in &self.ordered {
            let distance = plain.abs_diff(target);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((key.as_str(), distance));
            }
        }
        let (key, distance) = best?;
        self.entries.get(key).map(|entry| (key, entry, distance))
    }
}
