//! Record identifiers and grouping of articles into chapter buckets.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::config::{sanitize_identifier, ARTICLE_FILE_PREFIX, CHAPTER_DIR_PREFIX, RECORD_EXTENSION};
use crate::error::Result;
use crate::types::{Article, Document};

/// Address of one article record: chapter bucket plus record name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    /// Bucket name, e.g. `chapter_10A`.
    pub chapter: String,
    /// Record name without extension, e.g. `article_48`.
    pub article: String,
}

impl RecordKey {
    #[must_use]
    pub fn new(chapter_number: &str, article_number: &str) -> Self {
        Self {
            chapter: chapter_dir_name(chapter_number),
            article: format!("{ARTICLE_FILE_PREFIX}{}", sanitize_identifier(article_number)),
        }
    }

    #[must_use]
    pub fn for_article(article: &Article) -> Self {
        Self::new(&article.chapter_number, &article.number)
    }

    /// Path relative to the corpus root.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(&self.chapter).join(format!("{}.{RECORD_EXTENSION}", self.article))
    }

    fn sort_key(&self) -> (NaturalKey<'_>, NaturalKey<'_>) {
        let chapter = self.chapter.strip_prefix(CHAPTER_DIR_PREFIX);
        let article = self.article.strip_prefix(ARTICLE_FILE_PREFIX);
        (
            NaturalKey::parse(chapter.unwrap_or(&self.chapter)),
            NaturalKey::parse(article.unwrap_or(&self.article)),
        )
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.chapter, self.article)
    }
}

/// Orders `chapter_2` before `chapter_10` and `article_10` before `article_10A`.
impl Ord for RecordKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| (&self.chapter, &self.article).cmp(&(&other.chapter, &other.article)))
    }
}

impl PartialOrd for RecordKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Leading integer plus remainder, for natural ordering of identifiers.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct NaturalKey<'a> {
    number: Option<u64>,
    rest: &'a str,
}

impl<'a> NaturalKey<'a> {
    fn parse(s: &'a str) -> Self {
        let digits_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        Self {
            number: s[..digits_end].parse().ok(),
            rest: &s[digits_end..],
        }
    }
}

/// Directory name for a chapter id, e.g. `chapter_5`.
pub fn chapter_dir_name(chapter_number: &str) -> String {
    format!("{CHAPTER_DIR_PREFIX}{}", sanitize_identifier(chapter_number))
}

/// Articles of one chapter, ready to be written.
#[derive(Debug)]
pub struct ChapterBucket<'a> {
    pub name: String,
    pub records: Vec<(RecordKey, &'a Article)>,
}

/// Group every article under its chapter bucket.
///
/// Each article appears exactly once. Chapter and article order follow the
/// document; two chapters with the same id share one bucket.
pub fn group_by_chapter(document: &Document) -> Vec<ChapterBucket<'_>> {
    let mut buckets: Vec<ChapterBucket<'_>> = Vec::new();

    for article in document.articles() {
        let key = RecordKey::for_article(article);
        match buckets.iter_mut().find(|b| b.name == key.chapter) {
            Some(bucket) => bucket.records.push((key, article)),
            None => buckets.push(ChapterBucket {
                name: key.chapter.clone(),
                records: vec![(key, article)],
            }),
        }
    }

    buckets
}

/// Article records keyed and ordered by [`RecordKey`].
pub type Corpus = BTreeMap<RecordKey, Article>;

/// Snapshot of a document as a corpus. A later article with the same key
/// replaces an earlier one.
pub fn corpus_from_document(document: &Document) -> Corpus {
    document
        .articles()
        .map(|article| (RecordKey::for_article(article), article.clone()))
        .collect()
}

/// Render an article record as pretty JSON with a trailing newline.
pub fn to_json(article: &Article) -> Result<String> {
    let mut json = serde_json::to_string_pretty(article)?;
    json.push('\n');
    Ok(json)
}
