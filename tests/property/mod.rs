//! Property-based testing for Scrapetrack
//!
//! Uses proptest to verify the store invariants across randomly generated
//! identifiers, documents and operation sequences.

use ::scrapetrack::diff::compute_content_diff;
use ::scrapetrack::*;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tempfile::TempDir;

/// An operation a fetcher might perform
#[derive(Debug, Clone)]
pub enum TrackOperation {
    AddVideo(String),
    AddBlog(String),
    Update { doc: String, content: String },
}

fn identifier_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_-]{0,12}"
}

fn doc_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["docs/a.md", "docs/b.md", "docs/c.md", "notes/x.txt"])
        .prop_map(str::to_string)
}

fn content_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z ]{0,8}", 0..6).prop_map(|lines| lines.join("\n"))
}

fn operation_strategy() -> impl Strategy<Value = TrackOperation> {
    prop_oneof![
        identifier_strategy().prop_map(TrackOperation::AddVideo),
        identifier_strategy().prop_map(TrackOperation::AddBlog),
        (doc_strategy(), content_strategy())
            .prop_map(|(doc, content)| TrackOperation::Update { doc, content }),
    ]
}

fn create_store() -> (TrackingStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = TrackingStore::new(temp_dir.path().join("metadata.json"));
    (store, temp_dir)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Hashing is deterministic and distinguishes distinct inputs
    #[test]
    fn hash_deterministic_and_distinct(a in ".{0,64}", b in ".{0,64}") {
        prop_assert_eq!(hash_content(&a), hash_content(&a));
        prop_assert_eq!(hash_content(&a).len(), 64);
        if a != b {
            prop_assert_ne!(hash_content(&a), hash_content(&b));
        }
    }

    /// Diff counts are symmetric under swapping old and new
    #[test]
    fn diff_counts_swap(old in content_strategy(), new in content_strategy()) {
        let forward = compute_content_diff(&old, &new);
        let backward = compute_content_diff(&new, &old);
        prop_assert_eq!(forward.added, backward.removed);
        prop_assert_eq!(forward.removed, backward.added);
        prop_assert_eq!(forward.has_changes(), old.lines().ne(new.lines()));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// The guard accepts each identifier exactly once
    #[test]
    fn guard_accepts_each_identifier_once(
        ids in prop::collection::vec(identifier_strategy(), 1..30)
    ) {
        let (store, _temp) = create_store();
        let guard = DuplicateGuard::new(&store);

        let mut seen = BTreeSet::new();
        for id in &ids {
            let accepted = guard.add_video_id(id).unwrap();
            prop_assert_eq!(accepted, seen.insert(id.clone()));
        }

        let record = store.load().unwrap();
        prop_assert_eq!(record.stats.total_videos, seen.len());
        prop_assert_eq!(record.video_ids, seen);
    }

    /// Derived counters and history bounds hold after any operation sequence
    #[test]
    fn invariants_hold_after_operations(
        operations in prop::collection::vec(operation_strategy(), 1..40)
    ) {
        let (store, _temp) = create_store();
        let guard = DuplicateGuard::new(&store);
        let detector = ChangeDetector::new(&store);

        let mut latest: BTreeMap<String, String> = BTreeMap::new();
        let mut last_updated = None;

        for op in &operations {
            match op {
                TrackOperation::AddVideo(id) => { guard.add_video_id(id).unwrap(); }
                TrackOperation::AddBlog(url) => { guard.add_blog_url(url).unwrap(); }
                TrackOperation::Update { doc, content } => {
                    let previous = latest.get(doc).cloned();
                    let outcome = detector.update(doc, content, previous.as_deref()).unwrap();
                    prop_assert_eq!(
                        outcome.content_changed,
                        previous.as_deref() != Some(content.as_str())
                    );
                    latest.insert(doc.clone(), content.clone());
                }
            }

            let record = store.load().unwrap();
            prop_assert!(record.stats_consistent(DEFAULT_DOCS_PREFIX));
            prop_assert!(record.last_updated >= last_updated);
            last_updated = record.last_updated;
            for history in record.doc_versions.values() {
                prop_assert!(history.history.len() <= MAX_HISTORY_ENTRIES);
                prop_assert_eq!(&history.latest().unwrap().hash, &history.current_hash);
            }
        }

        for (doc, content) in &latest {
            prop_assert!(!detector.is_changed(doc, content).unwrap());
        }
    }
}
