use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for ptt-crawler
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Forum location and the markers used to read its pages
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Scheme and host of the forum, without a trailing path
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Title substring identifying the upstream "busy" page
    #[serde(rename = "busy-marker")]
    pub busy_marker: String,

    /// Line the platform appends after the author's text
    #[serde(rename = "signature-marker")]
    pub signature_marker: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.ptt.cc".to_string(),
            busy_marker: "Service Temporarily".to_string(),
            signature_marker: "※ 發信站: 批踢踢實業坊(ptt.cc),".to_string(),
        }
    }
}

/// Crawl pacing and retry configuration
///
/// All delays are in milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Minimum spacing before a listing page fetch
    #[serde(rename = "page-delay")]
    pub page_delay: u64,

    /// Minimum spacing before a thread fetch
    #[serde(rename = "article-delay")]
    pub article_delay: u64,

    /// Base backoff after a busy answer, multiplied by the attempt count
    #[serde(rename = "busy-delay")]
    pub busy_delay: u64,

    /// Ceiling for the busy backoff
    #[serde(rename = "max-busy-delay")]
    pub max_busy_delay: u64,

    /// Pause after a listing page failed for any other reason
    #[serde(rename = "error-delay")]
    pub error_delay: u64,

    /// Busy answers tolerated per listing page before it is given up
    #[serde(rename = "max-busy-retries")]
    pub max_busy_retries: u32,

    /// Thread fetches allowed in flight at once
    #[serde(rename = "max-concurrent-articles")]
    pub max_concurrent_articles: usize,

    /// Pause between boards when working through the board list
    #[serde(rename = "board-pause")]
    pub board_pause: u64,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            page_delay: 500,
            article_delay: 100,
            busy_delay: 1000,
            max_busy_delay: 10_000,
            error_delay: 1000,
            max_busy_retries: 20,
            max_concurrent_articles: 1,
            board_pause: 3000,
            request_timeout: 30,
        }
    }
}

impl CrawlerConfig {
    pub fn page_interval(&self) -> Duration {
        Duration::from_millis(self.page_delay)
    }

    pub fn article_interval(&self) -> Duration {
        Duration::from_millis(self.article_delay)
    }

    /// Backoff after the `attempt`-th busy answer for the same page
    pub fn busy_backoff(&self, attempt: u32) -> Duration {
        let delay = self
            .busy_delay
            .saturating_mul(u64::from(attempt.max(1)))
            .min(self.max_busy_delay);
        Duration::from_millis(delay)
    }

    pub fn error_pause(&self) -> Duration {
        Duration::from_millis(self.error_delay)
    }

    pub fn board_pause(&self) -> Duration {
        Duration::from_millis(self.board_pause)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "ptt-crawler".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version
    pub fn header_value(&self) -> String {
        format!("{}/{}", self.crawler_name, self.crawler_version)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving one `{board}.jsonl` file per board
    pub directory: PathBuf,

    /// Newline-delimited list of boards consumed by `--file`
    #[serde(rename = "boards-file")]
    pub boards_file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            boards_file: PathBuf::from("data/boards.txt"),
        }
    }
}
