//! On-disk corpus: one JSON record per article under per-chapter directories.
//!
//! ```text
//! <root>/chapter_5/article_48.json
//! <root>/chapter_10A/article_109.json
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{ARTICLE_FILE_PREFIX, CHAPTER_DIR_PREFIX, RECORD_EXTENSION};
use crate::error::{CorpusError, Result};
use crate::serialize::{group_by_chapter, to_json, Corpus, RecordKey};
use crate::types::{Article, Document};

/// A record file that could not be read or parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of reading a corpus back from disk.
#[derive(Debug, Default)]
pub struct LoadedCorpus {
    pub records: Corpus,
    pub skipped: Vec<SkippedRecord>,
}

/// Result of removing chapter directories.
#[derive(Debug, Default)]
pub struct RemovalReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Corpus rooted at a directory.
#[derive(Debug, Clone)]
pub struct CorpusStore {
    root: PathBuf,
}

impl CorpusStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn record_path(&self, key: &RecordKey) -> PathBuf {
        self.root.join(key.relative_path())
    }

    /// Write one record, creating its chapter directory if needed.
    pub fn save_record(&self, key: &RecordKey, article: &Article) -> Result<PathBuf> {
        let path = self.record_path(key);
        write_atomic(&path, &to_json(article)?)?;
        Ok(path)
    }

    /// Write every article of `document`, chapter by chapter, calling
    /// `on_record` after each record is on disk.
    pub fn write_document(
        &self,
        document: &Document,
        mut on_record: impl FnMut(&RecordKey),
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(document.article_count());
        for bucket in group_by_chapter(document) {
            for (key, article) in &bucket.records {
                written.push(self.save_record(key, article)?);
                on_record(key);
            }
            tracing::debug!(
                chapter = %bucket.name,
                records = bucket.records.len(),
                "Wrote chapter"
            );
        }
        Ok(written)
    }

    /// Write back only the records named in `keys`.
    pub fn save_records<'a>(
        &self,
        corpus: &Corpus,
        keys: impl IntoIterator<Item = &'a RecordKey>,
    ) -> Result<usize> {
        let mut count = 0;
        for key in keys {
            if let Some(article) = corpus.get(key) {
                self.save_record(key, article)?;
                count += 1;
            }
        }
        Ok(count)
    }

    /// Read every `chapter_*/article_*.json` record below the root.
    ///
    /// Unreadable or malformed records are skipped and reported; they never
    /// abort the load.
    pub fn load(&self) -> Result<LoadedCorpus> {
        let mut loaded = LoadedCorpus::default();

        for dir in self.chapter_dirs()? {
            let Some(chapter) = file_name(&dir) else {
                continue;
            };

            for path in sorted_entries(&dir)? {
                if !path.is_file() || !is_record_file(&path) {
                    continue;
                }
                let Some(article) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let key = RecordKey {
                    chapter: chapter.clone(),
                    article: article.to_string(),
                };

                match read_record(&path) {
                    Ok(record) => {
                        loaded.records.insert(key, record);
                    }
                    Err(reason) => {
                        tracing::warn!(path = %path.display(), reason = %reason, "Skipping record");
                        loaded.skipped.push(SkippedRecord { path, reason });
                    }
                }
            }
        }

        tracing::info!(
            records = loaded.records.len(),
            skipped = loaded.skipped.len(),
            root = %self.root.display(),
            "Loaded corpus"
        );
        Ok(loaded)
    }

    /// Chapter directories directly below the root, sorted by name. A missing
    /// root yields an empty list.
    pub fn chapter_dirs(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        Ok(sorted_entries(&self.root)?
            .into_iter()
            .filter(|path| path.is_dir())
            .filter(|path| file_name(path).is_some_and(|name| name.starts_with(CHAPTER_DIR_PREFIX)))
            .collect())
    }

    /// Remove the given directories, continuing past failures.
    pub fn remove_dirs(&self, dirs: &[PathBuf]) -> RemovalReport {
        let mut report = RemovalReport::default();
        for dir in dirs {
            match fs::remove_dir_all(dir) {
                Ok(()) => report.removed.push(dir.clone()),
                Err(e) => {
                    tracing::warn!(path = %dir.display(), error = %e, "Failed to remove directory");
                    report.failed.push((dir.clone(), e.to_string()));
                }
            }
        }
        report
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(str::to_string)
}

fn is_record_file(path: &Path) -> bool {
    let name_ok = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(ARTICLE_FILE_PREFIX));
    let ext_ok = path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXTENSION);
    name_ok && ext_ok
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| CorpusError::ReadFile {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths = entries
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();
    Ok(paths)
}

fn read_record(path: &Path) -> std::result::Result<Article, String> {
    let json = fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&json).map_err(|e| e.to_string())
}

/// Write to a temp file next to `path`, sync, then rename over it.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir)?;

    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("record");
    let temp_file = dir.join(format!(".{name}.tmp"));

    {
        let mut file = File::create(&temp_file)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }

    // On Windows, rename fails if the destination already exists
    #[cfg(target_os = "windows")]
    if path.exists() {
        fs::remove_file(path)?;
    }

    fs::rename(&temp_file, path)?;
    Ok(())
}
