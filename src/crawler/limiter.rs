//! Global request spacing
//!
//! Every outbound request, from any worker, reserves the next free slot on a
//! single shared timeline. Listing pages reserve with the long interval and
//! threads with the short one, so the worker count never changes how hard
//! the forum is hit.

use crate::config::CrawlerConfig;
use crate::{CrawlError, Result};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// What an outbound request is for; selects the spacing it must respect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Board index, listing pages and the age-gate exchange
    Page,
    /// Individual thread pages
    Article,
}

/// Shared minimum-interval gate
///
/// Cloning is cheap and every clone shares the same timeline.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    last_slot: Arc<Mutex<Option<Instant>>>,
    page_interval: Duration,
    article_interval: Duration,
}

impl RateLimiter {
    /// Creates a limiter with explicit intervals
    pub fn new(page_interval: Duration, article_interval: Duration) -> Self {
        Self {
            last_slot: Arc::new(Mutex::new(None)),
            page_interval,
            article_interval,
        }
    }

    /// Creates a limiter from the crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.page_interval(), config.article_interval())
    }

    /// Minimum spacing before a request of `kind`
    pub fn interval(&self, kind: RequestKind) -> Duration {
        match kind {
            RequestKind::Page => self.page_interval,
            RequestKind::Article => self.article_interval,
        }
    }

    /// Reserves the next slot for `kind` and returns when it starts
    ///
    /// The first request ever made is let through immediately.
    fn reserve(&self, kind: RequestKind) -> Instant {
        let now = Instant::now();
        let mut last = self
            .last_slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let slot = match *last {
            Some(previous) => std::cmp::max(previous + self.interval(kind), now),
            None => now,
        };
        *last = Some(slot);
        slot
    }

    /// Waits until a request of `kind` may be sent
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The slot has started
    /// * `Err(CrawlError::Cancelled)` - The token fired while waiting
    pub async fn wait(&self, kind: RequestKind, cancel: &CancellationToken) -> Result<()> {
        let slot = self.reserve(kind);
        let delay = slot.saturating_duration_since(Instant::now());
        if !delay.is_zero() {
            tracing::trace!("Waiting {:?} before {:?} request", delay, kind);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CrawlError::Cancelled),
            _ = tokio::time::sleep_until(slot) => Ok(()),
        }
    }
}

/// Sleeps for `duration` unless the token fires first
pub async fn pause(duration: Duration, cancel: &CancellationToken) -> Result<()> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CrawlError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}
