//! Thread records and the article fetcher

use crate::config::{CrawlerConfig, SiteConfig};
use crate::crawler::extract::{
    extract_comments, extract_content, extract_field, is_busy_document, markup, PageView,
    AUTHOR_INDEX, CONTENT_ERROR, DATE_INDEX, TITLE_INDEX,
};
use crate::crawler::fetcher::ForumClient;
use crate::crawler::limiter::{pause, RequestKind};
use crate::url::article_id;
use crate::{CrawlError, Result};
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// One comment ("push") under a thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    /// Reaction tag as rendered: approve, disapprove or a plain note
    pub status: String,
    pub commenter: String,
    pub content: String,
    pub datetime: String,
}

/// One thread, as written to the board output
///
/// `comments` is keyed from 1 and serializes with string keys (`"1"`, `"2"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub id: String,
    pub author: String,
    pub title: String,
    pub date: String,
    pub content: String,
    pub comments: BTreeMap<u32, CommentRecord>,
}

/// Builds a record from a thread page
///
/// Never fails: every field falls back to its sentinel independently.
pub fn parse_article(html: &str, url: &Url, board_dir: &Url, signature_marker: &str) -> ArticleRecord {
    let document = Html::parse_document(html);
    article_from_document(&document, url, board_dir, signature_marker)
}

/// Reads a thread page body: the busy answer, or its record
pub fn read_article(
    html: &str,
    url: &Url,
    board_dir: &Url,
    signature_marker: &str,
    busy_marker: &str,
) -> PageView<ArticleRecord> {
    let document = Html::parse_document(html);
    if is_busy_document(&document, busy_marker) {
        return PageView::Busy;
    }
    PageView::Ready(article_from_document(
        &document,
        url,
        board_dir,
        signature_marker,
    ))
}

fn article_from_document(
    document: &Html,
    url: &Url,
    board_dir: &Url,
    signature_marker: &str,
) -> ArticleRecord {
    let meta = &markup().meta_value;

    let author = extract_field(document, meta, AUTHOR_INDEX, "author").into_text();
    let title = extract_field(document, meta, TITLE_INDEX, "title").into_text();
    let date = extract_field(document, meta, DATE_INDEX, "date").into_text();

    let content = match extract_content(document, signature_marker) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!("No body for {}: {}", url, e);
            CONTENT_ERROR.to_string()
        }
    };

    let comments = (1..)
        .zip(extract_comments(document))
        .collect::<BTreeMap<u32, CommentRecord>>();

    ArticleRecord {
        id: article_id(url, board_dir),
        author,
        title,
        date,
        content,
        comments,
    }
}

/// Fetches threads and turns them into records
///
/// Busy answers are retried in place with the configured backoff; network
/// failures are returned to the caller untouched.
#[derive(Debug, Clone)]
pub struct ArticleFetcher {
    client: ForumClient,
    config: CrawlerConfig,
    signature_marker: String,
}

impl ArticleFetcher {
    pub fn new(client: ForumClient, config: &CrawlerConfig, site: &SiteConfig) -> Self {
        Self {
            client,
            config: config.clone(),
            signature_marker: site.signature_marker.clone(),
        }
    }

    /// Fetches one thread of `board`
    ///
    /// # Returns
    ///
    /// * `Ok(ArticleRecord)` - The record, possibly carrying sentinels
    /// * `Err(CrawlError::Unavailable)` - Still busy after the retry budget
    /// * `Err(CrawlError)` - Network failure or cancellation
    pub async fn fetch_article(&self, url: &Url, board: &str) -> Result<ArticleRecord> {
        let board_dir = self.client.urls().board_dir(board)?;
        let mut attempts = 0u32;

        loop {
            let page = self.client.fetch(url, RequestKind::Article).await?;
            let view = read_article(
                &page.body,
                url,
                &board_dir,
                &self.signature_marker,
                self.client.busy_marker(),
            );

            match view {
                PageView::Ready(record) => {
                    if !page.status.is_success() {
                        // Deleted threads still produce a record made of sentinels
                        tracing::warn!("HTTP {} for thread {}", page.status.as_u16(), url);
                    }
                    tracing::trace!(
                        "Parsed {} ({} comments)",
                        record.id,
                        record.comments.len()
                    );
                    return Ok(record);
                }
                PageView::Busy => {
                    attempts += 1;
                    if attempts > self.config.max_busy_retries {
                        return Err(CrawlError::Unavailable {
                            url: url.to_string(),
                            attempts,
                        });
                    }
                    let backoff = self.config.busy_backoff(attempts);
                    tracing::debug!("Thread {} busy, retrying in {:?}", url, backoff);
                    pause(backoff, self.client.cancellation()).await?;
                }
            }
        }
    }
}
