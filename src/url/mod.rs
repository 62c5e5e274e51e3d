//! URL handling module for ptt-crawler
//!
//! This module knows the forum's URL shapes: the board index, numbered
//! listing pages, thread pages and the age-gate consent endpoint.

mod page_number;

use crate::UrlResult;
use url::Url;

pub use page_number::{article_id, page_number};

/// Builds forum URLs relative to a configured base
///
/// # Examples
///
/// ```
/// use ptt_crawler::url::ForumUrls;
///
/// let urls = ForumUrls::parse("https://www.ptt.cc").unwrap();
/// assert_eq!(
///     urls.listing_page("Gossiping", 12).unwrap().as_str(),
///     "https://www.ptt.cc/bbs/Gossiping/index12.html"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct ForumUrls {
    base: Url,
}

impl ForumUrls {
    /// Parses the forum base; any path on it is ignored
    pub fn parse(base: &str) -> UrlResult<Self> {
        let mut base = Url::parse(base)?;
        base.set_path("/");
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// `{base}/bbs/{board}/`
    pub fn board_dir(&self, board: &str) -> UrlResult<Url> {
        self.base.join(&format!("bbs/{}/", board))
    }

    /// The newest listing page, `{base}/bbs/{board}/index.html`
    pub fn board_index(&self, board: &str) -> UrlResult<Url> {
        self.board_dir(board)?.join("index.html")
    }

    /// Path sent as `from` in the age-gate form
    pub fn board_index_path(&self, board: &str) -> String {
        format!("/bbs/{}/index.html", board)
    }

    /// `{base}/bbs/{board}/index{n}.html`; page 1 is the oldest
    pub fn listing_page(&self, board: &str, n: u32) -> UrlResult<Url> {
        self.board_dir(board)?.join(&format!("index{}.html", n))
    }

    /// Age-gate consent endpoint
    pub fn consent_endpoint(&self) -> UrlResult<Url> {
        self.base.join("ask/over18")
    }

    /// Resolves a link found on a forum page
    pub fn resolve(&self, href: &str) -> UrlResult<Url> {
        self.base.join(href.trim())
    }

    /// Listing pages of a board, highest page number first
    pub fn descending_listing_pages(&self, board: &str, total: u32) -> UrlResult<Vec<Url>> {
        (1..=total)
            .rev()
            .map(|n| self.listing_page(board, n))
            .collect()
    }
}
