//! End-to-end tests: extract the fixture, write the corpus, resolve it.

use std::fs;
use std::path::{Path, PathBuf};

use constitution_corpus::resolver::{OverrideTable, Resolution};
use constitution_corpus::{
    extract_document, ArticleIndex, CorpusStore, CrossReference, Document, ExtractOptions,
    ParseMode, RecordKey, Resolver, TableOfContents,
};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_document() -> Document {
    let text = fs::read_to_string(fixture("constitution.txt")).unwrap();
    extract_document(&text, &ExtractOptions::default()).unwrap()
}

fn load_index() -> ArticleIndex {
    let path = fixture("constitution_toc.json");
    let toc = TableOfContents::load(&path, Some("Constitution of Malta")).unwrap();
    ArticleIndex::from_toc(&toc)
}

/// Write the fixture corpus and attach references the way an annotator would.
fn annotated_store(root: &Path) -> CorpusStore {
    let store = CorpusStore::new(root);
    store.write_document(&load_document(), |_| {}).unwrap();

    let mut corpus = store.load().unwrap().records;
    let refs = [("4", "48", vec![109, 118, 120]), ("4", "33", vec![47, 200]), ("1", "1", vec![2])];
    let mut keys = Vec::new();
    for (chapter, article, numbers) in refs {
        let key = RecordKey::new(chapter, article);
        let references = numbers.into_iter().map(CrossReference::new).collect();
        corpus.get_mut(&key).unwrap().cross_references = references;
        keys.push(key);
    }
    store.save_records(&corpus, &keys).unwrap();
    store
}

#[test]
fn test_fixture_structure() {
    let document = load_document();

    let chapters: Vec<String> = document.chapters.iter().map(|c| c.id.to_string()).collect();
    assert_eq!(chapters, vec!["1", "4", "6A", "10"]);
    assert_eq!(document.article_count(), 7);
    assert!(document.diagnostics.is_empty(), "{:?}", document.diagnostics);

    let ombudsman = document.find_article("64A").unwrap();
    assert_eq!(ombudsman.chapter_number, "6A");
    assert_eq!(ombudsman.chapter_title, "THE OMBUDSMAN");
    assert_eq!(
        ombudsman.notes,
        "Article 64A of the Maltese Constitution regarding Parliamentary Ombudsman."
    );
}

#[test]
fn test_fixture_paragraph_hierarchy() {
    let document = load_document();
    let article = document.find_article("33").unwrap();

    let numbers: Vec<u32> = article.content.iter().map(|p| p.paragraph).collect();
    assert_eq!(numbers, vec![1, 2, 2, 2, 2, 2]);

    let texts: Vec<&str> = article.content.iter().map(|p| p.text.as_str()).collect();
    assert!(texts[0].starts_with("(1) No person shall"));
    assert!(texts[1].starts_with("(2) A person shall not"));
    assert_eq!(texts[2], "(a) for the defence of any person from violence; or");
    assert!(texts[3].starts_with("(b) in order to effect a lawful arrest"));
    assert_eq!(texts[4], "(b) (i) is reasonably justifiable; and");
    assert_eq!(texts[5], "(b) (ii) is proportionate.");

    let penalty = document.find_article("48").unwrap();
    assert_eq!(penalty.content.len(), 1);
    assert_eq!(penalty.content[0].paragraph, 1);
}

#[test]
fn test_fixture_strict_mode_matches_lenient() {
    let text = fs::read_to_string(fixture("constitution.txt")).unwrap();
    let options = ExtractOptions::default().with_mode(ParseMode::Strict);
    let strict = extract_document(&text, &options).unwrap();
    assert_eq!(strict, load_document());
}

#[test]
fn test_toc_index() {
    let index = load_index();
    assert_eq!(index.len(), 9);
    assert!(index.duplicates().is_empty());
    assert_eq!(index.get("109").unwrap().chapter_number, "10");
    assert_eq!(index.get("64A").unwrap().chapter_number, "6A");
}

#[test]
fn test_resolve_corpus_end_to_end() {
    let dir = tempdir().unwrap();
    let store = annotated_store(&dir.path().join("articles"));
    let mut loaded = store.load().unwrap();
    assert!(loaded.skipped.is_empty());

    let resolver = Resolver::new(load_index());
    let report = resolver.resolve_corpus(&mut loaded.records);
    store.save_records(&loaded.records, &report.updated).unwrap();

    assert_eq!(report.records_scanned, 7);
    assert_eq!(
        report.updated,
        vec![RecordKey::new("1", "1"), RecordKey::new("4", "33"), RecordKey::new("4", "48")]
    );
    assert_eq!(report.fallbacks().count(), 1);
    let unresolved: Vec<u32> = report.unresolved().map(|o| o.article).collect();
    assert_eq!(unresolved, vec![200]);

    let reloaded = store.load().unwrap().records;
    let penalty = &reloaded[&RecordKey::new("4", "48")];
    let chapters: Vec<(Option<&str>, Option<&str>)> = penalty
        .cross_references
        .iter()
        .map(|r| (r.chapter_number.as_deref(), r.article_number.as_deref()))
        .collect();
    assert_eq!(
        chapters,
        vec![(Some("10"), Some("109")), (Some("11"), Some("118")), (Some("11"), Some("120"))]
    );
    assert_eq!(penalty.cross_references[0].title.as_deref(), Some("Public Service Commission"));

    let life = &reloaded[&RecordKey::new("4", "33")];
    assert_eq!(life.cross_references[0].chapter_number.as_deref(), Some("4"));
    assert!(life.cross_references[0].title.is_none());
    assert!(life.cross_references[1].chapter_number.is_none());
}

#[test]
fn test_resolve_twice_rewrites_nothing() {
    let dir = tempdir().unwrap();
    let store = annotated_store(&dir.path().join("articles"));
    let resolver = Resolver::new(load_index());

    let mut first = store.load().unwrap();
    let report = resolver.resolve_corpus(&mut first.records);
    store.save_records(&first.records, &report.updated).unwrap();

    let record_path = store.record_path(&RecordKey::new("4", "48"));
    let before = fs::read_to_string(&record_path).unwrap();

    let mut second = store.load().unwrap();
    let report = resolver.resolve_corpus(&mut second.records);
    assert!(report.updated.is_empty());
    assert_eq!(store.save_records(&second.records, &report.updated).unwrap(), 0);
    assert_eq!(fs::read_to_string(&record_path).unwrap(), before);
}

#[test]
fn test_override_file_resolves_remaining_reference() {
    let dir = tempdir().unwrap();
    let store = annotated_store(&dir.path().join("articles"));
    let overrides = OverrideTable::load(&fixture("overrides.yaml")).unwrap();
    let resolver = Resolver::new(load_index()).with_overrides(overrides);

    let mut loaded = store.load().unwrap();
    let report = resolver.resolve_corpus(&mut loaded.records);

    assert_eq!(report.unresolved().count(), 0);
    let outcome = report.outcomes.iter().find(|o| o.article == 200).unwrap();
    assert_eq!(outcome.resolution, Resolution::Override);

    let reference = &loaded.records[&RecordKey::new("4", "33")].cross_references[1];
    assert_eq!(reference.chapter_number.as_deref(), Some("11"));
    assert_eq!(reference.title.as_deref(), Some("Miscellaneous"));
}

#[test]
fn test_malformed_record_does_not_block_resolution() {
    let dir = tempdir().unwrap();
    let store = annotated_store(&dir.path().join("articles"));
    fs::write(store.root().join("chapter_4").join("article_49.json"), "not json").unwrap();

    let mut loaded = store.load().unwrap();
    assert_eq!(loaded.skipped.len(), 1);

    let report = Resolver::new(load_index()).resolve_corpus(&mut loaded.records);
    assert_eq!(report.records_scanned, 7);
    assert_eq!(report.updated.len(), 3);
}

#[test]
fn test_unknown_reference_fields_survive_resolution() {
    let dir = tempdir().unwrap();
    let store = annotated_store(&dir.path().join("articles"));
    let path = store.record_path(&RecordKey::new("1", "1"));
    let json = fs::read_to_string(&path)
        .unwrap()
        .replace("\"article\": 2", "\"article\": 2, \"context\": \"see also\"");
    fs::write(&path, json).unwrap();

    let mut loaded = store.load().unwrap();
    let report = Resolver::new(load_index()).resolve_corpus(&mut loaded.records);
    store.save_records(&loaded.records, &report.updated).unwrap();

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let reference = &saved["crossReferences"][0];
    assert_eq!(reference["context"], "see also");
    assert_eq!(reference["chapterNumber"], "1");
    assert_eq!(reference["title"], "Religion");
}
