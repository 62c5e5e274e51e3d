//! ptt-crawler: a polite board archiver for the PTT forum
//!
//! This crate walks every listing page of a board, fetches each thread and
//! appends one normalized JSON record per thread to a per-board log file,
//! backing off whenever the forum answers with its "busy" page.

pub mod boards;
pub mod config;
pub mod crawler;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Could not determine page count for board {board}")]
    PageCount { board: String },

    #[error("{url} still busy after {attempts} attempts")]
    Unavailable { url: String, attempts: u32 },

    #[error("Crawl cancelled")]
    Cancelled,

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Board list error: {0}")]
    BoardList(#[from] boards::BoardListError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, ::url::ParseError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{ArticleRecord, BoardCrawler, CommentRecord};
pub use output::{CrawlReport, JsonlSink};
