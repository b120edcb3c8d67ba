//! Command-line interface for the corpus builder.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{ResolverConfig, DEFAULT_DOCUMENT_NAME, DEFAULT_OUTPUT_DIR};
use crate::error::{CorpusError, Result};
use crate::extract::{extract_document, ExtractOptions, ParseMode};
use crate::resolver::Resolver;
use crate::store::CorpusStore;
use crate::toc::{ArticleIndex, TableOfContents};

/// Constitution Corpus - Turn constitution text into per-article JSON records.
#[derive(Parser)]
#[command(name = "constitution-corpus")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract articles from a plain-text constitution into JSON records.
    Extract {
        /// Plain-text constitution
        input: PathBuf,

        /// Corpus directory (default: articles/)
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,

        #[command(flatten)]
        extract: ExtractFlags,
    },

    /// Resolve cross-references in an existing corpus against a table of contents.
    Resolve {
        /// Table of contents JSON
        toc: PathBuf,

        /// Corpus directory (default: articles/)
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,

        #[command(flatten)]
        resolve: ResolveFlags,
    },

    /// Extract, then resolve.
    Run {
        /// Plain-text constitution
        input: PathBuf,

        /// Table of contents JSON
        toc: PathBuf,

        /// Corpus directory (default: articles/)
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,

        #[command(flatten)]
        extract: ExtractFlags,

        #[command(flatten)]
        resolve: ResolveFlags,
    },

    /// Delete generated chapter directories.
    Clean {
        /// Corpus directory (default: articles/)
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ExtractFlags {
    /// Require headings at line start and fail on duplicate article numbers
    #[arg(long)]
    pub strict: bool,

    /// Document name used in each article's notes
    #[arg(long, default_value = DEFAULT_DOCUMENT_NAME)]
    pub document_name: String,
}

impl ExtractFlags {
    fn options(&self) -> ExtractOptions {
        let mode = if self.strict {
            ParseMode::Strict
        } else {
            ParseMode::Lenient
        };
        ExtractOptions::default()
            .with_mode(mode)
            .with_document_name(self.document_name.clone())
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ResolveFlags {
    /// Maximum article-number distance for a fallback chapter guess (0-50)
    #[arg(long)]
    pub tolerance: Option<u32>,

    /// Top-level key of the table of contents
    #[arg(long)]
    pub title: Option<String>,

    /// YAML table of reference overrides
    #[arg(long)]
    pub overrides: Option<PathBuf>,
}

impl ResolveFlags {
    /// Environment settings with command-line flags applied on top.
    fn config(&self) -> Result<ResolverConfig> {
        let mut config = ResolverConfig::from_env()?;
        if let Some(tolerance) = self.tolerance {
            config = config.with_tolerance(tolerance)?;
        }
        if let Some(title) = &self.title {
            config = config.with_document_title(Some(title.clone()));
        }
        if let Some(path) = &self.overrides {
            config = config.with_overrides(path);
        }
        Ok(config)
    }
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            input,
            output,
            extract,
        } => extract_command(&input, &output, &extract),
        Commands::Resolve {
            toc,
            output,
            resolve,
        } => resolve_command(&toc, &output, &resolve),
        Commands::Run {
            input,
            toc,
            output,
            extract,
            resolve,
        } => {
            extract_command(&input, &output, &extract)?;
            println!();
            resolve_command(&toc, &output, &resolve)
        }
        Commands::Clean { output, yes } => clean_command(&output, yes),
    }
}

fn extract_command(input: &Path, output: &Path, flags: &ExtractFlags) -> Result<()> {
    let text = fs::read_to_string(input).map_err(|source| CorpusError::ReadFile {
        path: input.to_path_buf(),
        source,
    })?;

    println!(
        "{} {}",
        style("Extracting").bold(),
        style(input.display()).cyan()
    );

    let document = extract_document(&text, &flags.options())?;

    println!("  Chapters: {}", document.chapters.len());
    println!("  Articles: {}", document.article_count());
    if !document.diagnostics.is_empty() {
        println!(
            "  Warnings: {}",
            style(document.diagnostics.len()).yellow().bold()
        );
        for diagnostic in &document.diagnostics {
            println!("    {} {diagnostic}", style("-").yellow());
        }
    }

    let store = CorpusStore::new(output);
    let pb = ProgressBar::new(document.article_count() as u64);
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.green/white} {pos}/{len} {msg}")
            .expect("valid template"),
    );

    let written = store.write_document(&document, |key| {
        pb.set_message(key.to_string());
        pb.inc(1);
    });
    pb.finish_and_clear();
    written?;

    println!(
        "{} {}",
        style("Saved to:").green().bold(),
        store.root().display()
    );

    Ok(())
}

fn resolve_command(toc_path: &Path, output: &Path, flags: &ResolveFlags) -> Result<()> {
    let config = flags.config()?;

    println!(
        "{} {}",
        style("Resolving cross-references with").bold(),
        style(toc_path.display()).cyan()
    );

    let toc = TableOfContents::load(toc_path, config.document_title.as_deref())?;
    let index = ArticleIndex::from_toc(&toc);
    println!("  Document: {}", style(&toc.title).green());
    println!("  Indexed articles: {}", index.len());
    for heading in &toc.skipped_headings {
        println!("    {} not a chapter heading: {heading}", style("-").yellow());
    }
    for duplicate in index.duplicates() {
        println!(
            "    {} article {} listed in chapter {} and chapter {}, using chapter {}",
            style("-").yellow(),
            duplicate.number,
            duplicate.replaced_chapter,
            duplicate.kept_chapter,
            duplicate.kept_chapter
        );
    }

    let resolver = Resolver::from_config(index, &config)?;
    let store = CorpusStore::new(output);
    let mut loaded = store.load()?;

    if !loaded.skipped.is_empty() {
        println!(
            "  Skipped records: {}",
            style(loaded.skipped.len()).yellow().bold()
        );
        for skipped in &loaded.skipped {
            println!(
                "    {} {}: {}",
                style("-").yellow(),
                skipped.path.display(),
                skipped.reason
            );
        }
    }

    let report = resolver.resolve_corpus(&mut loaded.records);
    let saved = store.save_records(&loaded.records, &report.updated)?;

    println!("  Records: {}", report.records_scanned);
    println!("  References: {}", report.outcomes.len());
    println!("  Fallback guesses: {}", report.fallbacks().count());
    let unresolved: Vec<_> = report.unresolved().collect();
    if !unresolved.is_empty() {
        println!("  Unresolved: {}", style(unresolved.len()).yellow().bold());
        for outcome in unresolved {
            println!("    {} {outcome}", style("-").yellow());
        }
    }

    println!();
    println!(
        "{} {saved} record(s) in {}",
        style("Updated").green().bold(),
        store.root().display()
    );

    Ok(())
}

fn clean_command(output: &Path, yes: bool) -> Result<()> {
    let store = CorpusStore::new(output);
    let dirs = store.chapter_dirs()?;

    if dirs.is_empty() {
        println!("No chapter directories found in {}", output.display());
        return Ok(());
    }

    println!("{}", style("The following directories will be deleted:").bold());
    for dir in &dirs {
        println!("  {}", dir.display());
    }

    if !yes && !confirm()? {
        println!("Cleanup cancelled.");
        return Ok(());
    }

    let report = store.remove_dirs(&dirs);
    for dir in &report.removed {
        println!("{} {}", style("Deleted").green(), dir.display());
    }
    for (dir, error) in &report.failed {
        println!("{} {}: {error}", style("Failed").red().bold(), dir.display());
    }

    Ok(())
}

fn confirm() -> Result<bool> {
    let term = Term::stdout();
    term.write_str("Are you sure you want to delete these directories? (y/n): ")?;
    let answer = term.read_line()?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
