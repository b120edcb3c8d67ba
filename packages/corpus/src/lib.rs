//! Constitution Corpus - Turn a plain-text constitution into a per-article
//! JSON corpus with resolved cross-references.
//!
//! The pipeline has two phases. Extraction segments the text into chapters,
//! articles and paragraphs and writes one record per article. Resolution
//! reads the records back and fills in each cross-reference from a table of
//! contents.
//!
//! # Example
//!
//! ```
//! use constitution_corpus::extract::{extract_document, ExtractOptions};
//! use constitution_corpus::roman::roman_to_int;
//!
//! assert_eq!(roman_to_int("XIV").unwrap(), 14);
//!
//! let text = "CHAPTER I\nTHE REPUBLIC\n\n1. Malta. (1) Malta is a republic.\n";
//! let document = extract_document(text, &ExtractOptions::default()).unwrap();
//! let article = document.find_article("1").unwrap();
//! assert_eq!(article.chapter_number, "1");
//! assert_eq!(article.content[0].text, "(1) Malta is a republic.");
//! ```
//!
//! # Architecture
//!
//! - [`roman`]: Roman numerals and chapter identifiers
//! - [`types`]: Document tree, article records and diagnostics
//! - [`extract`]: Chapter, article and paragraph extraction
//! - [`serialize`]: Record keys, chapter grouping and JSON rendering
//! - [`toc`]: Table of contents parsing and the article index
//! - [`resolver`]: Cross-reference resolution
//! - [`store`]: Reading and writing the on-disk corpus
//! - [`config`]: Configuration constants and validation
//! - [`error`]: Error types and Result alias
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod resolver;
pub mod roman;
pub mod serialize;
pub mod store;
pub mod toc;
pub mod types;

pub use error::{CorpusError, Result};
pub use extract::{extract_document, ExtractOptions, ParseMode};
pub use resolver::{OverrideTable, ResolutionReport, Resolver};
pub use serialize::{Corpus, RecordKey};
pub use store::CorpusStore;
pub use toc::{ArticleIndex, TableOfContents};
pub use types::{Article, Chapter, ContentParagraph, CrossReference, Diagnostic, Document};
