//! Structural extraction of chapters, articles and paragraphs.
//!
//! Segmentation into chapters and articles is pattern based
//! ([`document`]); article bodies go through a marker tokenizer
//! ([`markers`]) and a small parser ([`paragraphs`]).

mod document;
pub mod markers;
mod paragraphs;

pub use document::{article_notes, extract_document};
pub use paragraphs::{parse_paragraphs, ParsedBody, SkippedMarker};

use crate::config::DEFAULT_DOCUMENT_NAME;

/// How tolerant heading recognition is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Headings may appear anywhere; duplicates are reported and kept.
    #[default]
    Lenient,
    /// Headings must start a line; duplicate article numbers are an error.
    Strict,
}

/// Options for [`extract_document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    pub mode: ParseMode,
    /// Name used in each article's notes sentence.
    pub document_name: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            mode: ParseMode::default(),
            document_name: DEFAULT_DOCUMENT_NAME.to_string(),
        }
    }
}

impl ExtractOptions {
    #[must_use]
    pub fn with_mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_document_name(mut self, name: impl Into<String>) -> Self {
        self.document_name = name.into();
        self
    }
}
