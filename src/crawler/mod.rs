//! Crawler module for the forum
//!
//! This module contains the core crawling logic, including:
//! - Rate-limited HTTP access and the age gate
//! - Field, body and comment extraction
//! - The listing page loop with busy requeue
//! - Whole-board orchestration

mod article;
mod board;
pub mod extract;
mod fetcher;
pub mod limiter;
mod pages;
mod queue;

pub use article::{parse_article, read_article, ArticleFetcher, ArticleRecord, CommentRecord};
pub use board::BoardCrawler;
pub use extract::PageView;
pub use fetcher::{build_http_client, FetchedPage, ForumClient};
pub use limiter::{RateLimiter, RequestKind};
pub use pages::{PageCrawler, PageOutcome};
pub use queue::{PageQueue, QueuedPage};
