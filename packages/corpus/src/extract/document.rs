//! Chapter and article segmentation.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Map;
use unicode_normalization::UnicodeNormalization;

use super::paragraphs::parse_paragraphs;
use super::{ExtractOptions, ParseMode};
use crate::error::{CorpusError, Result};
use crate::roman::{is_canonical_roman, ChapterId};
use crate::types::{Article, Chapter, Diagnostic, Document};

/// `CHAPTER <numeral>` line followed by a title line, anywhere in the text.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CHAPTER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"CHAPTER\s+([IVXLCDM]+[A-Z]?)\s*\n\s*(.*?)\s*\n").expect("valid regex")
});

/// Chapter heading that must start a line.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CHAPTER_PATTERN_STRICT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*CHAPTER[ \t]+([IVXLCDM]+[A-Z]?)[ \t]*\n\s*(.*?)[ \t]*\n")
        .expect("valid regex")
});

/// `48. Title of the article.` header.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ARTICLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+[A-Z]?)\.\s+(.*?)\.\s+").expect("valid regex"));

/// Article header that must start a line.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ARTICLE_PATTERN_STRICT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(\d+[A-Z]?)\.\s+(.*?)\.\s+").expect("valid regex")
});

struct Heading<'t> {
    start: usize,
    end: usize,
    designator: &'t str,
    title: &'t str,
}

impl<'t> Heading<'t> {
    fn from_captures(caps: &Captures<'t>) -> Option<Self> {
        let whole = caps.get(0)?;
        Some(Self {
            start: whole.start(),
            end: whole.end(),
            designator: caps.get(1)?.as_str(),
            title: caps.get(2)?.as_str().trim(),
        })
    }
}

/// Normalise line endings and Unicode composition before matching.
fn normalize_source(text: &str) -> String {
    text.replace("\r\n", "\n").nfc().collect()
}

/// Templated `notes` sentence for an article.
pub fn article_notes(number: &str, title: &str, document_name: &str) -> String {
    format!("Article {number} of the {document_name} regarding {title}.")
}

fn record(diagnostics: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    tracing::warn!("{diagnostic}");
    diagnostics.push(diagnostic);
}

/// Extract the chapter/article/paragraph tree from raw document text.
///
/// Headings that do not match are not part of the tree; anything the
/// extractor has to skip is reported in [`Document::diagnostics`].
pub fn extract_document(text: &str, options: &ExtractOptions) -> Result<Document> {
    let text = normalize_source(text);
    let (chapter_pattern, article_pattern) = match options.mode {
        ParseMode::Lenient => (&*CHAPTER_PATTERN, &*ARTICLE_PATTERN),
        ParseMode::Strict => (&*CHAPTER_PATTERN_STRICT, &*ARTICLE_PATTERN_STRICT),
    };

    let headings: Vec<Heading<'_>> = chapter_pattern
        .captures_iter(&text)
        .filter_map(|caps| Heading::from_captures(&caps))
        .collect();

    let mut document = Document::default();
    // Article number -> chapter id of its first occurrence.
    let mut seen: HashMap<String, String> = HashMap::new();

    for (index, heading) in headings.iter().enumerate() {
        let span_end = headings.get(index + 1).map_or(text.len(), |next| next.start);

        let id = match ChapterId::from_numeral(heading.designator) {
            Ok(id) => id,
            Err(e) => {
                record(
                    &mut document.diagnostics,
                    Diagnostic::SkippedChapter {
                        offset: heading.start,
                        designator: heading.designator.to_string(),
                        reason: e.to_string(),
                    },
                );
                continue;
            }
        };
        check_numeral(heading, id, &mut document.diagnostics);

        let mut chapter = Chapter::new(id, heading.title);
        let chapter_id = id.to_string();
        tracing::debug!(chapter = %chapter_id, title = %chapter.title, "Found chapter");

        let span = &text[heading.end..span_end];
        let headers: Vec<Heading<'_>> = article_pattern
            .captures_iter(span)
            .filter_map(|caps| Heading::from_captures(&caps))
            .collect();

        if headers.is_empty() {
            record(
                &mut document.diagnostics,
                Diagnostic::EmptyChapter {
                    offset: heading.start,
                    chapter: chapter_id.clone(),
                },
            );
        }

        if options.mode == ParseMode::Strict {
            let preamble_end = headers.first().map_or(span.len(), |h| h.start);
            let preamble = span[..preamble_end].trim();
            if !preamble.is_empty() {
                record(
                    &mut document.diagnostics,
                    Diagnostic::UnparsedText {
                        offset: heading.end,
                        chapter: chapter_id.clone(),
                        text: preamble.to_string(),
                    },
                );
            }
        }

        for (position, header) in headers.iter().enumerate() {
            let body_end = headers.get(position + 1).map_or(span.len(), |next| next.start);
            let raw_body = &span[header.end..body_end];
            let body = raw_body.trim();
            let body_offset =
                heading.end + header.end + (raw_body.len() - raw_body.trim_start().len());
            let number = header.designator;

            if let Some(first_chapter) = seen.get(number) {
                if options.mode == ParseMode::Strict {
                    return Err(CorpusError::DuplicateArticle {
                        number: number.to_string(),
                        first_chapter: first_chapter.clone(),
                        second_chapter: chapter_id.clone(),
                    });
                }
                record(
                    &mut document.diagnostics,
                    Diagnostic::DuplicateArticle {
                        offset: heading.end + header.start,
                        number: number.to_string(),
                        first_chapter: first_chapter.clone(),
                        second_chapter: chapter_id.clone(),
                    },
                );
            } else {
                seen.insert(number.to_string(), chapter_id.clone());
            }

            let parsed = parse_paragraphs(body);
            if let Some(text) = parsed.lead_in {
                record(
                    &mut document.diagnostics,
                    Diagnostic::UnnumberedLeadIn {
                        offset: body_offset,
                        article: number.to_string(),
                        text,
                    },
                );
            }
            for skipped in parsed.skipped {
                record(
                    &mut document.diagnostics,
                    Diagnostic::DemotedMarker {
                        offset: body_offset + skipped.offset,
                        article: number.to_string(),
                        marker: skipped.marker,
                        quoted: skipped.quoted,
                    },
                );
            }
            if let Some(offset) = parsed.unclosed_quote {
                record(
                    &mut document.diagnostics,
                    Diagnostic::UnclosedQuote {
                        offset: body_offset + offset,
                        article: number.to_string(),
                    },
                );
            }

            chapter.articles.push(Article {
                number: number.to_string(),
                title: header.title.to_string(),
                chapter_number: chapter_id.clone(),
                chapter_title: chapter.title.clone(),
                content: parsed.paragraphs,
                amendment_history: Map::new(),
                cross_references: Vec::new(),
                notes: article_notes(number, header.title, &options.document_name),
            });
        }

        document.chapters.push(chapter);
    }

    tracing::info!(
        chapters = document.chapters.len(),
        articles = document.article_count(),
        diagnostics = document.diagnostics.len(),
        "Extraction finished"
    );

    Ok(document)
}

/// Report chapter numerals that only scan to a value, like `IIV`.
fn check_numeral(heading: &Heading<'_>, id: ChapterId, diagnostics: &mut Vec<Diagnostic>) {
    let numeral = if id.suffix.is_some() {
        &heading.designator[..heading.designator.len() - 1]
    } else {
        heading.designator
    };

    if !is_canonical_roman(numeral) {
        record(
            diagnostics,
            Diagnostic::NonCanonicalNumeral {
                offset: heading.start,
                numeral: numeral.to_string(),
                value: id.number,
            },
        );
    }
}
