//! Integration tests for Scrapetrack
//!
//! Multi-day scrape scenarios driven through a harness that plays the part
//! of the fetchers: it writes docs and feed dumps into a data directory and
//! records them through the tracker the way a pipeline would.

use ::scrapetrack::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracing::info;

/// Test harness owning a data directory and a tracker over it
pub struct TrackerTestHarness {
    pub data_dir: TempDir,
    pub tracker: Tracker,
}

impl TrackerTestHarness {
    pub fn new() -> Self {
        let data_dir = TempDir::new().unwrap();
        let tracker = TrackerBuilder::new()
            .data_dir(data_dir.path())
            .build()
            .unwrap();
        Self { data_dir, tracker }
    }

    pub fn root(&self) -> &Path {
        self.data_dir.path()
    }

    /// Write a doc the way the docs fetcher does, recording it afterwards
    pub fn publish_doc(&self, filename: &str, content: &str) -> UpdateOutcome {
        let path = self.root().join("docs").join(filename);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let previous = fs::read_to_string(&path).ok();
        fs::write(&path, content).unwrap();
        self.tracker
            .update(&format!("docs/{}", filename), content, previous.as_deref())
            .unwrap()
    }

    /// Write a doc without recording it
    pub fn write_doc(&self, filename: &str, content: &str) {
        let path = self.root().join("docs").join(filename);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    pub fn remove_doc(&self, filename: &str) {
        fs::remove_file(self.root().join("docs").join(filename)).unwrap();
    }

    /// Dump a feed file under `blog/` or `videos/`
    pub fn write_feed(&self, dir: &str, name: &str, value: serde_json::Value) {
        let path = self.root().join(dir).join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    }

    /// Accept every post and video currently in the data directory
    pub fn accept_feeds(&self) -> (usize, usize) {
        let snapshot = self.tracker.scan().unwrap();
        let posts = snapshot
            .posts
            .iter()
            .filter(|p| self.tracker.add_blog_url(&p.url).unwrap())
            .count();
        let videos = snapshot
            .videos
            .iter()
            .filter(|v| self.tracker.add_video_id(&v.video_id).unwrap())
            .count();
        (posts, videos)
    }
}

fn days_ago(days: i64) -> String {
    (chrono::Utc::now() - chrono::Duration::days(days)).to_rfc3339()
}

#[test]
fn test_week_of_scrapes() {
    let harness = TrackerTestHarness::new();

    // Monday: initial scrape
    harness.publish_doc("intro.md", "# Intro\nhello\n");
    harness.publish_doc("api.md", "# API\nGET /v1\n");
    harness.write_feed(
        "blog",
        "posts.json",
        json!({"posts": [
            {"title": "Launch", "url": "https://blog/launch", "published": days_ago(1)}
        ]}),
    );
    harness.write_feed(
        "videos",
        "channel.json",
        json!([{"title": "Demo", "video_id": "demo1", "published": days_ago(2)}]),
    );

    let report = harness.tracker.detect_changes().unwrap();
    assert_eq!(report.details.blog.count, 1);
    assert_eq!(report.details.videos.count, 1);
    assert!(report.details.docs.new.is_empty());
    assert_eq!(harness.accept_feeds(), (1, 1));

    let report = harness.tracker.detect_changes().unwrap();
    assert!(!report.has_changes);

    // Tuesday: one doc edited outside the pipeline, one new post
    harness.write_doc("api.md", "# API\nGET /v2\n");
    harness.write_feed(
        "blog",
        "posts.json",
        json!({"posts": [
            {"title": "Launch", "url": "https://blog/launch", "published": days_ago(2)},
            {"title": "Update", "url": "https://blog/update", "published": days_ago(0)}
        ]}),
    );

    let report = harness.tracker.detect_changes().unwrap();
    info!("Tuesday report:\n{}", report.summary);
    assert_eq!(report.details.docs.changed.len(), 1);
    assert_eq!(report.details.docs.changed[0].filename, "api.md");
    assert_eq!(report.details.blog.new_posts[0].title, "Update");
    assert_eq!(report.total_changes(), 2);
    assert!(report.summary.contains("Blog Posts: 1 new article"));

    // Wednesday: the pipeline records the edit with a diff
    let outcome = harness.publish_doc("api.md", "# API\nGET /v2\nPOST /v2\n");
    let entry = outcome.entry.unwrap();
    assert!(entry.has_diff);
    assert_eq!(entry.added_lines, Some(1));

    // Thursday: a doc is removed upstream
    harness.remove_doc("intro.md");
    let report = harness.tracker.detect_changes().unwrap();
    assert_eq!(report.details.docs.deleted, vec!["intro.md"]);
}

#[test]
fn test_changed_doc_carries_latest_diff() {
    let harness = TrackerTestHarness::new();

    harness.publish_doc("guide.md", "a\nb\nc\n");
    harness.publish_doc("guide.md", "a\nB\nc\nd\n");
    harness.write_doc("guide.md", "something else entirely");

    let report = harness.tracker.detect_changes().unwrap();
    let change = &report.details.docs.changed[0];
    assert_eq!(change.diff_summary.as_deref(), Some("+2 lines, -1 lines"));
    assert_eq!(change.added_preview, vec!["B", "d"]);
    assert_eq!(change.removed_preview, vec!["b"]);
}

#[test]
fn test_whats_new_window() {
    let harness = TrackerTestHarness::new();
    harness.write_doc("fresh.md", "new page");
    harness.write_feed(
        "blog",
        "posts.json",
        json!([
            {"title": "Recent", "url": "https://blog/recent", "date": days_ago(3)},
            {"title": "Old", "url": "https://blog/old", "date": days_ago(30)},
            {"title": "Undated", "url": "https://blog/undated"}
        ]),
    );
    harness.write_feed(
        "videos",
        "feed.json",
        json!({"videos": [{"title": "Yesterday", "id": "y1", "published": days_ago(1)}]}),
    );

    let week = harness.tracker.whats_new(Some(7)).unwrap();
    assert_eq!(week.period, "Last 7 days");
    assert_eq!(week.new_docs, vec!["fresh.md"]);
    assert_eq!(week.new_blog_posts.len(), 1);
    assert_eq!(week.new_videos.len(), 1);
    assert_eq!(week.total_changes, 3);

    let month = harness.tracker.whats_new(Some(60)).unwrap();
    assert_eq!(month.new_blog_posts.len(), 2);

    let day = harness.tracker.whats_new(Some(1)).unwrap();
    assert_eq!(day.period, "Last 24 hours");
    assert!(day.new_blog_posts.is_empty());
}

#[test]
fn test_saved_report_shape() {
    let harness = TrackerTestHarness::new();
    harness.write_doc("page.md", "text");
    harness.write_feed(
        "videos",
        "feed.json",
        json!([{"title": "Clip", "video_id": "c1", "published": days_ago(0)}]),
    );

    let (report, path) = harness.tracker.save_report(None).unwrap();
    assert!(report.has_changes);

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(saved["total_changes"], 2);
    assert_eq!(saved["docs"]["new"], json!(["page.md"]));
    assert_eq!(saved["videos"]["new_count"], 1);
    assert_eq!(saved["videos"]["new_videos"][0]["video_id"], "c1");
    assert_eq!(saved["whats_new"]["total_changes"], 2);
    assert!(saved["generated_at"].is_string());
}

#[test]
fn test_scrape_summary_file_is_not_a_document() {
    let harness = TrackerTestHarness::new();
    harness.write_doc("scrape-summary.md", "generated");
    harness.write_doc("real.md", "content");

    let report = harness.tracker.detect_changes().unwrap();
    assert_eq!(report.details.docs.new, vec!["real.md"]);
}

#[test]
fn test_reset_then_everything_is_new_again() {
    let harness = TrackerTestHarness::new();
    harness.publish_doc("a.md", "a");
    harness.tracker.add_video_id("v").unwrap();

    harness.tracker.reset().unwrap();

    let backup = fs::read_to_string(&harness.tracker.config().backup_path).unwrap();
    assert!(backup.contains("\"v\""));
    assert!(harness.tracker.add_video_id("v").unwrap());
    let report = harness.tracker.detect_changes().unwrap();
    assert_eq!(report.details.docs.new, vec!["a.md"]);
}
