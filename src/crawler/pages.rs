//! Listing page loop
//!
//! Pops listing pages one at a time, requeues the ones that drew the busy
//! answer and hands every thread link to the article fetcher. Records are
//! appended in link order by this loop alone.

use crate::config::{Config, CrawlerConfig};
use crate::crawler::article::ArticleFetcher;
use crate::crawler::extract::{read_listing, PageView};
use crate::crawler::fetcher::ForumClient;
use crate::crawler::limiter::{pause, RequestKind};
use crate::crawler::queue::PageQueue;
use crate::output::{CrawlReport, RecordSink};
use crate::{CrawlError, Result};
use futures::stream::{self, StreamExt};
use url::Url;

/// How a listing page fetch ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Every thread on the page was written
    Completed,
    /// The forum answered with its busy page
    Busy,
}

/// Works through a board's page queue
#[derive(Debug, Clone)]
pub struct PageCrawler {
    client: ForumClient,
    articles: ArticleFetcher,
    config: CrawlerConfig,
}

impl PageCrawler {
    pub fn new(client: ForumClient, config: &Config) -> Self {
        let articles = ArticleFetcher::new(client.clone(), &config.crawler, &config.site);
        Self {
            client,
            articles,
            config: config.crawler.clone(),
        }
    }

    fn workers(&self) -> usize {
        self.config.max_concurrent_articles.max(1)
    }

    /// Consumes `queue` until it is empty or the crawl is cancelled
    ///
    /// Page and thread failures are logged and counted in the report; only
    /// output failures abort the board.
    pub async fn crawl<S: RecordSink + ?Sized>(
        &self,
        mut queue: PageQueue,
        board: &str,
        sink: &mut S,
    ) -> Result<CrawlReport> {
        let mut report = CrawlReport::new(board, queue.initial_len());
        let cancel = self.client.cancellation().clone();

        while let Some(page) = queue.pop() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let delay = match self.crawl_page(&page.url, board, sink, &mut report).await {
                Ok(PageOutcome::Completed) => {
                    report.pages_completed += 1;
                    tracing::info!("Download: {} {:.1}%", board, report.progress_percent());
                    if queue.is_empty() {
                        continue;
                    }
                    // Measured from the end of the page, not the start of its last thread
                    self.config.page_interval()
                }
                Ok(PageOutcome::Busy) => {
                    report.busy_responses += 1;
                    let attempts = page.busy_attempts + 1;

                    if attempts > self.config.max_busy_retries {
                        let error = CrawlError::Unavailable {
                            url: page.url.to_string(),
                            attempts,
                        };
                        tracing::error!("Giving up on listing page: {}", error);
                        report.unavailable_pages.push(page.url.to_string());
                        continue;
                    }

                    tracing::warn!(
                        "{} busy (attempt {}), {} pages queued",
                        page.url,
                        attempts,
                        queue.len() + 1
                    );
                    queue.requeue(page);
                    self.config.busy_backoff(attempts)
                }
                Err(CrawlError::Cancelled) => {
                    report.cancelled = true;
                    break;
                }
                Err(error @ CrawlError::Output(_)) => return Err(error),
                Err(error) => {
                    tracing::error!("Failed to crawl {}: {}", page.url, error);
                    report.pages_failed += 1;
                    self.config.error_pause()
                }
            };

            if let Err(CrawlError::Cancelled) = pause(delay, &cancel).await {
                report.cancelled = true;
                break;
            }
        }

        report.finish();
        Ok(report)
    }

    /// Fetches one listing page and writes every thread on it
    ///
    /// The first thread that fails ends the page; threads after it are not
    /// attempted.
    pub async fn crawl_page<S: RecordSink + ?Sized>(
        &self,
        url: &Url,
        board: &str,
        sink: &mut S,
        report: &mut CrawlReport,
    ) -> Result<PageOutcome> {
        let page = self.client.fetch(url, RequestKind::Page).await?;
        let links = match read_listing(&page.body, self.client.urls(), self.client.busy_marker()) {
            PageView::Busy => return Ok(PageOutcome::Busy),
            PageView::Ready(links) => links,
        };

        if !page.status.is_success() {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status: page.status.as_u16(),
            });
        }

        tracing::debug!("{} threads on {}", links.len(), url);

        let mut records = stream::iter(links.iter())
            .map(|link| self.articles.fetch_article(link, board))
            .buffered(self.workers());

        while let Some(result) = records.next().await {
            match result {
                Ok(record) => {
                    sink.append(board, &record)?;
                    report.articles_written += 1;
                    report.comments_written += record.comments.len() as u64;
                }
                Err(CrawlError::Cancelled) => return Err(CrawlError::Cancelled),
                Err(error) => {
                    report.articles_failed += 1;
                    return Err(error);
                }
            }
        }

        Ok(PageOutcome::Completed)
    }
}
