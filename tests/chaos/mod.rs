//! Chaos testing for Scrapetrack
//!
//! Damages the tracking record and the data directory in seeded random ways
//! and checks that the store either recovers (backup + fresh record) or
//! reports an I/O error, and never loses the damaged bytes.

use ::scrapetrack::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::info;

/// Chaos engine for damaging files
pub struct ChaosEngine {
    rng: StdRng,
}

impl ChaosEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Overwrite a few random bytes
    pub fn flip_bytes(&mut self, path: &Path, count: usize) -> std::io::Result<Vec<u8>> {
        let mut content = fs::read(path)?;
        for _ in 0..count {
            if !content.is_empty() {
                let idx = self.rng.random_range(0..content.len());
                content[idx] = self.rng.random();
            }
        }
        fs::write(path, &content)?;
        Ok(content)
    }

    /// Drop random characters, as a partial write would
    pub fn drop_chars(&mut self, path: &Path, count: usize) -> std::io::Result<Vec<u8>> {
        let mut chars: Vec<char> = fs::read_to_string(path)?.chars().collect();
        for _ in 0..count {
            if chars.len() > 1 {
                let idx = self.rng.random_range(0..chars.len());
                chars.remove(idx);
            }
        }
        let content: String = chars.into_iter().collect();
        fs::write(path, &content)?;
        Ok(content.into_bytes())
    }

    /// Cut the file at a random point
    pub fn truncate(&mut self, path: &Path) -> std::io::Result<Vec<u8>> {
        let mut content = fs::read(path)?;
        let keep = self.rng.random_range(0..content.len().max(1));
        content.truncate(keep);
        fs::write(path, &content)?;
        Ok(content)
    }
}

/// A populated store in a temporary directory
pub struct ChaosFixture {
    pub temp_dir: TempDir,
    pub store: TrackingStore,
}

impl ChaosFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let store = TrackingStore::new(temp_dir.path().join("metadata.json"));

        let guard = DuplicateGuard::new(&store);
        let detector = ChangeDetector::new(&store);
        for i in 0..5 {
            guard.add_video_id(&format!("video-{}", i)).unwrap();
            guard.add_blog_url(&format!("https://blog/{}", i)).unwrap();
            detector
                .update(&format!("docs/page-{}.md", i), &format!("page {}", i), None)
                .unwrap();
        }

        Self { temp_dir, store }
    }

    pub fn record_path(&self) -> PathBuf {
        self.store.path().to_path_buf()
    }

    /// Load after damage and check the recovery contract
    ///
    /// Either the damaged bytes still form a valid record, or they were
    /// moved to the backup path untouched and a fresh record replaced them.
    pub fn assert_recovers(&self, damaged: &[u8]) {
        let _ = fs::remove_file(self.store.backup_path());

        let record = self.store.load().expect("load must recover from corruption");

        if self.store.backup_path().exists() {
            assert_eq!(fs::read(self.store.backup_path()).unwrap(), damaged);
            assert!(record.video_ids.is_empty());
            assert!(record.content_hashes.is_empty());
        } else {
            let text = String::from_utf8(damaged.to_vec()).unwrap();
            let parsed: TrackingRecord = serde_json::from_str(&text).unwrap();
            assert_eq!(parsed.video_ids, record.video_ids);
        }

        // The replacement is itself a valid record
        assert!(self.store.inspect().unwrap().is_some());
    }
}

#[test]
fn test_random_byte_corruption() {
    let mut chaos = ChaosEngine::new(42);
    for round in 0..20 {
        let fixture = ChaosFixture::new();
        let damaged = chaos.flip_bytes(&fixture.record_path(), 10).unwrap();
        info!("Round {}: flipped bytes", round);
        fixture.assert_recovers(&damaged);
    }
}

#[test]
fn test_dropped_characters() {
    let mut chaos = ChaosEngine::new(7);
    for _ in 0..20 {
        let fixture = ChaosFixture::new();
        let damaged = chaos.drop_chars(&fixture.record_path(), 5).unwrap();
        fixture.assert_recovers(&damaged);
    }
}

#[test]
fn test_truncated_record() {
    let mut chaos = ChaosEngine::new(1234);
    for _ in 0..20 {
        let fixture = ChaosFixture::new();
        let damaged = chaos.truncate(&fixture.record_path()).unwrap();
        fixture.assert_recovers(&damaged);
    }
}

#[test]
fn test_structural_corruption_variants() {
    let variants: [&[u8]; 7] = [
        b"",
        b"null",
        b"[]",
        b"42",
        b"\"just a string\"",
        br#"{"video_ids": "not-a-list"}"#,
        br#"{"doc_versions": {"a": {"history": [{"hash": 1}]}}}"#,
    ];

    for damaged in variants {
        let fixture = ChaosFixture::new();
        fs::write(fixture.record_path(), damaged).unwrap();
        fixture.assert_recovers(damaged);
        assert!(fixture.store.backup_path().exists());
    }
}

#[test]
fn test_operations_continue_after_recovery() {
    let fixture = ChaosFixture::new();
    fs::write(fixture.record_path(), "{{{{").unwrap();

    let guard = DuplicateGuard::new(&fixture.store);
    assert!(guard.add_video_id("video-0").unwrap());

    let record = fixture.store.load().unwrap();
    assert_eq!(record.stats.total_videos, 1);
    assert_eq!(fs::read(fixture.store.backup_path()).unwrap(), b"{{{{");
}

#[test]
fn test_record_path_is_a_directory() {
    let temp_dir = TempDir::new().unwrap();
    let record_path = temp_dir.path().join("metadata.json");
    fs::create_dir_all(&record_path).unwrap();
    let store = TrackingStore::new(&record_path);

    let err = store.load().unwrap_err();
    assert!(err.is_io(), "expected I/O error, got {:?}", err);
    assert!(record_path.is_dir());
}

#[test]
fn test_parent_is_a_file() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("data");
    fs::write(&blocker, "not a directory").unwrap();
    let store = TrackingStore::new(blocker.join("metadata.json"));

    let err = DuplicateGuard::new(&store).add_video_id("v").unwrap_err();
    assert!(err.is_io());
}

#[test]
fn test_damaged_feed_files_do_not_hide_others() {
    let mut chaos = ChaosEngine::new(99);
    let temp_dir = TempDir::new().unwrap();
    let blog = temp_dir.path().join("blog");
    fs::create_dir_all(&blog).unwrap();

    let good = serde_json::json!([{"title": "Good", "url": "https://blog/good"}]);
    fs::write(blog.join("a-good.json"), good.to_string()).unwrap();
    fs::write(blog.join("b-bad.json"), "[{\"title\": \"Bad\", \"url\": \"https://blog/bad\"}]").unwrap();
    chaos.truncate(&blog.join("b-bad.json")).unwrap();
    fs::write(blog.join("c-binary.json"), [0xff, 0x00, 0xfe]).unwrap();

    let posts = DataDir::new(temp_dir.path()).scan_posts().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "Good");
}
