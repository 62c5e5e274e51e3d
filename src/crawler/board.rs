//! Board orchestration
//!
//! Opens a board (answering the age gate when asked), works out how many
//! listing pages it has, resets its output and runs the page loop over every
//! page, newest first.

use crate::boards::BoardList;
use crate::config::{Config, CrawlerConfig};
use crate::crawler::extract::{read_page_count, PageView};
use crate::crawler::fetcher::ForumClient;
use crate::crawler::limiter::pause;
use crate::crawler::pages::PageCrawler;
use crate::crawler::queue::PageQueue;
use crate::output::{CrawlReport, JsonlSink, RecordSink};
use crate::{CrawlError, Result};
use tokio_util::sync::CancellationToken;

/// Crawls whole boards into a record sink
pub struct BoardCrawler<S: RecordSink = JsonlSink> {
    client: ForumClient,
    pages: PageCrawler,
    config: CrawlerConfig,
    sink: S,
}

impl<S: RecordSink> BoardCrawler<S> {
    /// Creates a crawler writing to `sink`
    ///
    /// Every request and delay observes `cancel`.
    pub fn new(config: &Config, sink: S, cancel: CancellationToken) -> Result<Self> {
        let client = ForumClient::new(config, cancel)?;
        let pages = PageCrawler::new(client.clone(), config);
        Ok(Self {
            client,
            pages,
            config: config.crawler.clone(),
            sink,
        })
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Number of listing pages `board` currently has
    ///
    /// The index is retried on the busy answer like any listing page.
    pub async fn page_count(&self, board: &str) -> Result<u32> {
        let mut attempts = 0u32;

        loop {
            let page = self.client.open_board(board).await?;

            match read_page_count(&page.body, self.client.busy_marker()) {
                PageView::Ready(count) => {
                    if !page.status.is_success() {
                        return Err(CrawlError::Status {
                            url: page.final_url.to_string(),
                            status: page.status.as_u16(),
                        });
                    }
                    return count.ok_or_else(|| CrawlError::PageCount {
                        board: board.to_string(),
                    });
                }
                PageView::Busy => {
                    attempts += 1;
                    if attempts > self.config.max_busy_retries {
                        return Err(CrawlError::Unavailable {
                            url: self.client.urls().board_index(board)?.to_string(),
                            attempts,
                        });
                    }
                    tracing::warn!("Index of {} busy (attempt {})", board, attempts);
                    pause(
                        self.config.busy_backoff(attempts),
                        self.client.cancellation(),
                    )
                    .await?;
                }
            }
        }
    }

    /// Crawls every listing page of `board`, replacing its previous output
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The page loop ran; the report says how well
    /// * `Err(CrawlError::PageCount)` - The index had no usable navigation
    /// * `Err(CrawlError)` - The board could not be opened or written
    pub async fn crawl_board(&mut self, board: &str) -> Result<CrawlReport> {
        tracing::info!("Crawling board {}", board);

        let total = self.page_count(board).await?;
        tracing::info!("Board {} has {} listing pages", board, total);

        let urls = self.client.urls().descending_listing_pages(board, total)?;
        self.sink.reset(board)?;

        let report = self
            .pages
            .crawl(PageQueue::new(urls), board, &mut self.sink)
            .await?;

        if report.cancelled {
            tracing::warn!("{} crawling cancelled", board);
        } else {
            tracing::info!("{} crawling completed", board);
        }

        Ok(report)
    }

    /// Crawls every board in `list`, removing each one once it completes
    ///
    /// A board that fails or is cut short stays in the list for the next
    /// run. Output failures stop the whole list.
    pub async fn crawl_board_list(&mut self, list: &mut BoardList) -> Result<Vec<CrawlReport>> {
        let boards = list.boards().to_vec();
        let cancel = self.client.cancellation().clone();
        let mut reports = Vec::with_capacity(boards.len());

        tracing::info!(
            "{} boards queued from {}",
            boards.len(),
            list.path().display()
        );

        for (position, board) in boards.iter().enumerate() {
            if position > 0 {
                if let Err(CrawlError::Cancelled) = pause(self.config.board_pause(), &cancel).await {
                    break;
                }
            }

            match self.crawl_board(board).await {
                Ok(report) => {
                    let cancelled = report.cancelled;
                    if !cancelled {
                        list.pop_completed(board)?;
                    }
                    reports.push(report);
                    if cancelled {
                        break;
                    }
                }
                Err(CrawlError::Cancelled) => {
                    tracing::warn!("{} crawling cancelled", board);
                    break;
                }
                Err(error @ CrawlError::Output(_)) => return Err(error),
                Err(error) => {
                    tracing::error!("Failed to crawl board {}: {}", board, error);
                }
            }
        }

        Ok(reports)
    }
}
