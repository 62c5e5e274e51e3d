//! HTTP client for the forum
//!
//! This module handles every request the crawler sends:
//! - Building the HTTP client with the crawler's user agent and a cookie store
//! - Waiting on the shared rate limiter before each request
//! - Passing the age-restriction gate once per session
//!
//! Bodies are returned unparsed; the busy answer is recognised by whoever
//! parses them.

use crate::config::Config;
use crate::crawler::limiter::{RateLimiter, RequestKind};
use crate::url::ForumUrls;
use crate::{CrawlError, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Marker present in the URL the forum redirects to when consent is required
const AGE_GATE_MARKER: &str = "over18";

/// A response read to the end
#[derive(Debug)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Page body
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// The cookie store keeps the age-gate consent for the rest of the session.
///
/// # Example
///
/// ```no_run
/// use ptt_crawler::config::Config;
/// use ptt_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(config.crawler.request_timeout())
        .connect_timeout(Duration::from_secs(10))
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Rate-limited, cancellable access to the forum
///
/// Clones share the HTTP connection pool, the cookie store and the limiter
/// timeline.
#[derive(Debug, Clone)]
pub struct ForumClient {
    client: Client,
    urls: ForumUrls,
    limiter: RateLimiter,
    busy_marker: String,
    cancel: CancellationToken,
}

impl ForumClient {
    pub fn new(config: &Config, cancel: CancellationToken) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            urls: ForumUrls::parse(&config.site.base_url)?,
            limiter: RateLimiter::from_config(&config.crawler),
            busy_marker: config.site.busy_marker.clone(),
            cancel,
        })
    }

    pub fn urls(&self) -> &ForumUrls {
        &self.urls
    }

    /// Title text identifying the forum's overload page
    pub fn busy_marker(&self) -> &str {
        &self.busy_marker
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Fetches `url` after waiting for a `kind` slot
    ///
    /// # Returns
    ///
    /// * `Ok(FetchedPage)` - Any answer, whatever its status
    /// * `Err(CrawlError::Http)` - Connection, timeout or body read failure
    /// * `Err(CrawlError::Cancelled)` - The token fired before completion
    pub async fn fetch(&self, url: &Url, kind: RequestKind) -> Result<FetchedPage> {
        self.limiter.wait(kind, &self.cancel).await?;
        tracing::trace!("GET {}", url);

        let request = self.client.get(url.clone()).send();
        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(CrawlError::Cancelled),
            response = request => response.map_err(|source| CrawlError::Http {
                url: url.to_string(),
                source,
            })?,
        };

        let status = response.status();
        let final_url = response.url().clone();

        let body = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(CrawlError::Cancelled),
            body = response.text() => body.map_err(|source| CrawlError::Http {
                url: url.to_string(),
                source,
            })?,
        };

        Ok(FetchedPage {
            final_url,
            status,
            body,
        })
    }

    /// Fetches a board's index, answering the age gate if it shows up
    ///
    /// Consent is posted once and the index requested again; a gate that
    /// persists after consent is reported as a status error.
    pub async fn open_board(&self, board: &str) -> Result<FetchedPage> {
        let index = self.urls.board_index(board)?;

        let page = self.fetch(&index, RequestKind::Page).await?;
        if !page.final_url.as_str().contains(AGE_GATE_MARKER) {
            return Ok(page);
        }

        tracing::info!("Board {} is age-restricted, sending consent", board);
        self.consent(board).await?;

        let page = self.fetch(&index, RequestKind::Page).await?;
        if page.final_url.as_str().contains(AGE_GATE_MARKER) {
            return Err(CrawlError::Status {
                url: page.final_url.to_string(),
                status: StatusCode::FORBIDDEN.as_u16(),
            });
        }
        Ok(page)
    }

    async fn consent(&self, board: &str) -> Result<()> {
        let endpoint = self.urls.consent_endpoint()?;
        let from = self.urls.board_index_path(board);
        let form = [("from", from.as_str()), ("yes", "yes")];

        self.limiter.wait(RequestKind::Page, &self.cancel).await?;
        tracing::trace!("POST {}", endpoint);

        let request = self.client.post(endpoint.clone()).form(&form).send();
        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(CrawlError::Cancelled),
            response = request => response.map_err(|source| CrawlError::Http {
                url: endpoint.to_string(),
                source,
            })?,
        };

        if !response.status().is_success() && !response.status().is_redirection() {
            return Err(CrawlError::Status {
                url: endpoint.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }
}
