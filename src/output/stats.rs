//! Per-board crawl report
//!
//! Counters gathered by the page crawler while it works through a board,
//! printed once the board finishes.

use chrono::{DateTime, Utc};

/// Outcome of one board crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Board name
    pub board: String,

    /// When the board crawl started
    pub started_at: DateTime<Utc>,

    /// When the page queue drained or the crawl was cancelled
    pub finished_at: Option<DateTime<Utc>>,

    /// Listing pages queued at the start; the progress denominator
    pub pages_total: usize,

    /// Listing pages fetched without the busy answer
    pub pages_completed: usize,

    /// Listing pages abandoned after a network or parse failure
    pub pages_failed: usize,

    /// Busy answers received across all pages
    pub busy_responses: u32,

    /// Listing pages given up after exhausting their busy retries
    pub unavailable_pages: Vec<String>,

    /// Thread records appended to the board output
    pub articles_written: u64,

    /// Thread fetches that failed and cut their listing page short
    pub articles_failed: u64,

    /// Comments contained in the written records
    pub comments_written: u64,

    /// Whether the crawl stopped on a cancellation request
    pub cancelled: bool,
}

impl CrawlReport {
    /// Creates an empty report for a board with `pages_total` listing pages
    pub fn new(board: &str, pages_total: usize) -> Self {
        Self {
            board: board.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            pages_total,
            pages_completed: 0,
            pages_failed: 0,
            busy_responses: 0,
            unavailable_pages: Vec::new(),
            articles_written: 0,
            articles_failed: 0,
            comments_written: 0,
            cancelled: false,
        }
    }

    /// Pages that left the queue for good, whatever the outcome
    pub fn pages_done(&self) -> usize {
        self.pages_completed + self.pages_failed + self.unavailable_pages.len()
    }

    /// Completed listing pages as a percentage of the initial queue
    pub fn progress_percent(&self) -> f64 {
        if self.pages_total == 0 {
            return 100.0;
        }
        (self.pages_completed as f64 / self.pages_total as f64) * 100.0
    }

    /// Stamps the finish time
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// True when every listing page was fetched and no thread was lost
    pub fn is_complete(&self) -> bool {
        !self.cancelled
            && self.pages_failed == 0
            && self.articles_failed == 0
            && self.unavailable_pages.is_empty()
            && self.pages_completed == self.pages_total
    }
}

/// Prints a report to stdout
pub fn print_report(report: &CrawlReport) {
    println!("=== Board {} ===\n", report.board);

    println!("Listing pages:");
    println!("  Queued: {}", report.pages_total);
    println!(
        "  Completed: {} ({:.1}%)",
        report.pages_completed,
        report.progress_percent()
    );
    println!("  Failed: {}", report.pages_failed);
    println!("  Busy answers: {}", report.busy_responses);
    println!();

    println!("Threads:");
    println!("  Written: {}", report.articles_written);
    println!("  Failed: {}", report.articles_failed);
    println!("  Comments: {}", report.comments_written);
    println!();

    if !report.unavailable_pages.is_empty() {
        println!("Unavailable pages ({}):", report.unavailable_pages.len());
        for url in &report.unavailable_pages {
            println!("  - {}", url);
        }
        println!();
    }

    if let Some(seconds) = report.duration_seconds() {
        println!("Duration: {}s", seconds);
    }

    if report.cancelled {
        println!("Status: cancelled");
    } else if report.is_complete() {
        println!("Status: complete");
    } else {
        println!("Status: finished with gaps");
    }
}
