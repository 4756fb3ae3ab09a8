//! Main test module for Scrapetrack
//!
//! This module includes all test suites:
//! - Integration tests for multi-day scrape scenarios
//! - Chaos tests for corrupted records and failing I/O
//! - Property-based tests for store invariants

pub mod integration;
pub mod chaos;
pub mod property;

#[cfg(test)]
mod edge_cases {
    use ::scrapetrack::*;
    use std::fs;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> TrackingStore {
        TrackingStore::new(dir.path().join("metadata.json"))
    }

    #[test]
    fn test_empty_string_hash_is_fixed() {
        assert_eq!(
            hash_content(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_empty_document_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let detector = ChangeDetector::new(&store);

        detector.update("docs/empty.md", "", None).unwrap();

        assert!(!detector.is_changed("docs/empty.md", "").unwrap());
        assert!(detector.is_changed("docs/empty.md", " ").unwrap());
    }

    #[test]
    fn test_empty_previous_content_still_diffs() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let detector = ChangeDetector::new(&store);

        detector.update("docs/a.md", "", None).unwrap();
        let outcome = detector.update("docs/a.md", "one\ntwo", Some("")).unwrap();

        let entry = outcome.entry.unwrap();
        assert!(entry.has_diff);
        assert_eq!(entry.diff_summary.as_deref(), Some("+2 lines, -0 lines"));
    }

    #[test]
    fn test_unicode_identifiers_and_content() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let guard = DuplicateGuard::new(&store);
        let detector = ChangeDetector::new(&store);

        assert!(guard.add_blog_url("https://例え.jp/記事?id=1").unwrap());
        assert!(!guard.add_blog_url("https://例え.jp/記事?id=1").unwrap());

        detector.update("docs/日本語.md", "こんにちは", None).unwrap();
        assert!(!detector.is_changed("docs/日本語.md", "こんにちは").unwrap());
        assert!(detector.history("日本語").is_ok());
    }

    #[test]
    fn test_empty_identifier_is_an_ordinary_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let guard = DuplicateGuard::new(&store);

        assert!(guard.add_video_id("").unwrap());
        assert!(!guard.add_video_id("").unwrap());
    }

    #[test]
    fn test_record_file_is_pretty_json_with_sets_as_lists() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let guard = DuplicateGuard::new(&store);

        guard.add_video_id("b").unwrap();
        guard.add_video_id("a").unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["video_ids"], serde_json::json!(["a", "b"]));
        assert_eq!(value["stats"]["total_videos"], 2);
        assert_eq!(value["schema_version"], SCHEMA_VERSION);
    }

    #[test]
    fn test_two_stores_on_same_file_see_each_others_writes() {
        let temp_dir = TempDir::new().unwrap();
        let first = store_in(&temp_dir);
        let second = store_in(&temp_dir);

        DuplicateGuard::new(&first).add_video_id("v").unwrap();

        assert!(!DuplicateGuard::new(&second).add_video_id("v").unwrap());
    }

    #[test]
    fn test_custom_docs_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir).with_docs_prefix("pages/");
        let detector = ChangeDetector::new(&store);

        detector.update("pages/home.html", "<h1>", None).unwrap();
        detector.update("docs/ignored.md", "x", None).unwrap();

        let record = store.load().unwrap();
        assert_eq!(record.stats.total_docs, 1);
        assert!(record.doc_versions.contains_key("home"));
        assert!(!record.doc_versions.contains_key("ignored"));
    }
}
