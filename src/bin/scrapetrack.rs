//! # Scrapetrack CLI
//!
//! Command-line access to the tracking record of a scraped digest site.
//!
//! ## Usage
//! ```bash
//! # Show counters
//! scrapetrack status
//!
//! # Report what changed in data/ and write changes-summary.json
//! scrapetrack detect --save
//!
//! # Record a document version, with a diff against the old file
//! scrapetrack update docs/intro.md --file new/intro.md --previous data/docs/intro.md
//!
//! # Record a video id (prints whether it was new)
//! scrapetrack add-video dQw4w9WgXcQ
//! ```

use clap::{Parser, Subcommand};
use colored::*;
use scrapetrack::utils::display_hash;
use scrapetrack::{Result, TrackError, Tracker, TrackerBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Scrapetrack CLI - change detection and dedup for scraped content
#[derive(Parser)]
#[command(name = "scrapetrack")]
#[command(version)]
#[command(about = "Track what a scraping pipeline has already seen")]
#[command(long_about = None)]
struct Cli {
    /// Data directory holding docs/, blog/ and videos/
    #[arg(short, long, global = true, env = "SCRAPETRACK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Tracking record file (defaults to <data-dir>/metadata.json)
    #[arg(short, long, global = true, env = "SCRAPETRACK_METADATA")]
    metadata: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show tracking counters
    #[command(alias = "st")]
    Status,

    /// Compare the data directory against the record
    Detect {
        /// Lookback window for the what's-new view
        #[arg(long)]
        days: Option<u32>,

        /// Write changes-summary.json into the data directory
        #[arg(long)]
        save: bool,
    },

    /// List changes dated within a window
    WhatsNew {
        /// Lookback window in days
        #[arg(long)]
        days: Option<u32>,
    },

    /// Record a video id
    AddVideo {
        /// Video identifier
        id: String,
    },

    /// Record a blog/post URL
    AddBlog {
        /// Post URL
        url: String,
    },

    /// Check whether a file differs from the recorded version
    Check {
        /// Logical path, e.g. docs/intro.md
        path: String,

        /// File holding the content to check
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Record a file as the current version of a path
    Update {
        /// Logical path, e.g. docs/intro.md
        path: String,

        /// File holding the new content
        #[arg(short, long)]
        file: PathBuf,

        /// File holding the previous content, for diff statistics
        #[arg(short, long)]
        previous: Option<PathBuf>,
    },

    /// Show a document's version history
    History {
        /// Document name, e.g. intro
        doc: String,
    },

    /// Back up the record and start over
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Warnings (e.g. corruption recovery) are always shown
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Disable colors if needed
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e.user_message());
        std::process::exit(1);
    }
}

/// Main command runner
fn run(cli: Cli) -> Result<()> {
    let window = match &cli.command {
        Commands::Detect { days, .. } | Commands::WhatsNew { days } => *days,
        _ => None,
    };
    let tracker = open_tracker(cli.data_dir, cli.metadata, window)?;

    match cli.command {
        Commands::Status => cmd_status(&tracker),
        Commands::Detect { save, .. } => cmd_detect(&tracker, save),
        Commands::WhatsNew { .. } => cmd_whats_new(&tracker),
        Commands::AddVideo { id } => cmd_add_video(&tracker, &id),
        Commands::AddBlog { url } => cmd_add_blog(&tracker, &url),
        Commands::Check { path, file } => cmd_check(&tracker, &path, &file),
        Commands::Update {
            path,
            file,
            previous,
        } => cmd_update(&tracker, &path, &file, previous.as_deref()),
        Commands::History { doc } => cmd_history(&tracker, &doc),
        Commands::Reset { yes } => cmd_reset(&tracker, yes),
    }
}

fn open_tracker(
    data_dir: Option<PathBuf>,
    metadata: Option<PathBuf>,
    window: Option<u32>,
) -> Result<Tracker> {
    let mut builder = TrackerBuilder::new().data_dir(data_dir.unwrap_or_else(|| PathBuf::from("data")));
    if let Some(path) = metadata {
        builder = builder.metadata_path(path);
    }
    if let Some(days) = window {
        builder = builder.window_days(days);
    }
    builder.build()
}

/// Read a content file as UTF-8 text
fn read_text(path: &Path) -> Result<String> {
    Ok(String::from_utf8(fs::read(path)?)?)
}

fn format_time(ts: Option<chrono::DateTime<chrono::Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string())
}

fn cmd_status(tracker: &Tracker) -> Result<()> {
    let status = tracker.status()?;

    println!("{}", "Scrapetrack Status:".blue().bold());
    println!();
    println!("  Record: {}", tracker.config().metadata_path.display());
    println!("  Last updated: {}", format_time(status.last_updated).dimmed());
    println!(
        "  Last scrape: {}",
        format_time(status.last_successful_scrape).dimmed()
    );

    println!("\n{}", "Tracked:".bold());
    println!("  Docs: {}", status.total_docs.to_string().yellow());
    println!("  Blog posts: {}", status.total_blog_posts.to_string().yellow());
    println!("  Videos: {}", status.total_videos.to_string().yellow());
    println!("  Files hashed: {}", status.tracked_files);
    println!("  Doc histories: {}", status.doc_versions_tracked);

    Ok(())
}

fn cmd_detect(tracker: &Tracker, save: bool) -> Result<()> {
    let report = if save {
        let (report, path) = tracker.save_report(None)?;
        println!("{} {}", "Saved".green().bold(), path.display());
        println!();
        report
    } else {
        tracker.detect_changes()?
    };

    if report.has_changes {
        println!("{}", report.summary);
    } else {
        println!("{}", report.summary.yellow());
    }
    Ok(())
}

fn cmd_whats_new(tracker: &Tracker) -> Result<()> {
    let whats_new = tracker.whats_new(None)?;

    println!("{} {}", "What's new:".blue().bold(), whats_new.period.dimmed());
    println!();

    if whats_new.total_changes == 0 {
        println!("{}", "Nothing new.".yellow());
        return Ok(());
    }

    if !whats_new.new_docs.is_empty() {
        println!("{}", "Docs:".bold());
        for name in &whats_new.new_docs {
            println!("  {}", name.cyan());
        }
    }
    if !whats_new.new_blog_posts.is_empty() {
        println!("{}", "Blog posts:".bold());
        for post in &whats_new.new_blog_posts {
            println!("  {} {}", post.date.dimmed(), post.title.cyan());
            println!("    {}", post.url.dimmed());
        }
    }
    if !whats_new.new_videos.is_empty() {
        println!("{}", "Videos:".bold());
        for video in &whats_new.new_videos {
            println!("  {} {} ({})", video.date.dimmed(), video.title.cyan(), video.video_id);
        }
    }

    println!("\nTotal: {}", whats_new.total_changes.to_string().bold());
    Ok(())
}

fn cmd_add_video(tracker: &Tracker, id: &str) -> Result<()> {
    if tracker.add_video_id(id)? {
        println!("{} video {}", "New".green().bold(), id.yellow());
    } else {
        println!("{} video {}", "Seen".dimmed(), id);
    }
    Ok(())
}

fn cmd_add_blog(tracker: &Tracker, url: &str) -> Result<()> {
    if tracker.add_blog_url(url)? {
        println!("{} post {}", "New".green().bold(), url.yellow());
    } else {
        println!("{} post {}", "Seen".dimmed(), url);
    }
    Ok(())
}

fn cmd_check(tracker: &Tracker, path: &str, file: &Path) -> Result<()> {
    let content = read_text(file)?;
    if tracker.is_changed(path, &content)? {
        println!("{} {}", "Changed".yellow().bold(), path);
    } else {
        println!("{} {}", "Unchanged".green(), path);
    }
    Ok(())
}

fn cmd_update(tracker: &Tracker, path: &str, file: &Path, previous: Option<&Path>) -> Result<()> {
    let content = read_text(file)?;
    let previous = previous.map(read_text).transpose()?;

    let outcome = tracker.update(path, &content, previous.as_deref())?;

    let status = if outcome.content_changed {
        "Updated".green().bold()
    } else {
        "Unchanged".dimmed()
    };
    println!("{} {} {}", status, path, display_hash(&outcome.hash).yellow());

    if let Some(summary) = outcome.entry.as_ref().and_then(|e| e.diff_summary.as_ref()) {
        println!("  {}", summary.cyan());
    }
    Ok(())
}

fn cmd_history(tracker: &Tracker, doc: &str) -> Result<()> {
    let history = tracker.history(doc)?;

    println!("{} {}", "History of".blue().bold(), doc.bold());
    println!("  Current: {}", display_hash(&history.current_hash).yellow());
    if let Some(previous) = &history.previous_hash {
        println!("  Previous: {}", display_hash(previous).dimmed());
    }
    println!();

    for entry in history.history.iter().rev() {
        let marker = if entry.changed {
            "*".green().bold()
        } else {
            " ".normal()
        };
        print!(
            "{} {} {}",
            marker,
            display_hash(&entry.hash).yellow(),
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
        );
        if let Some(summary) = &entry.diff_summary {
            print!(" {}", summary.cyan());
        }
        println!();

        for line in &entry.added_preview {
            println!("    {} {}", "+".green(), line);
        }
        for line in &entry.removed_preview {
            println!("    {} {}", "-".red(), line);
        }
    }
    Ok(())
}

fn cmd_reset(tracker: &Tracker, yes: bool) -> Result<()> {
    if !yes {
        return Err(TrackError::invalid_input(
            "reset discards every tracked id and hash; pass --yes to confirm",
        ));
    }

    tracker.reset()?;
    println!(
        "{} record reset, previous copy at {}",
        "Done:".green().bold(),
        tracker.config().backup_path.display()
    );
    Ok(())
}
