use url::Url;

/// Extracts the page number from a listing page link
///
/// Accepts absolute URLs and bare paths such as `/bbs/Stock/index3899.html`.
/// Returns `None` for the unnumbered `index.html` or anything unparsable.
///
/// # Examples
///
/// ```
/// use ptt_crawler::url::page_number;
///
/// assert_eq!(page_number("/bbs/Stock/index3899.html"), Some(3899));
/// assert_eq!(page_number("/bbs/Stock/index.html"), None);
/// ```
pub fn page_number(href: &str) -> Option<u32> {
    let start = href.rfind("index")? + "index".len();
    let rest = &href[start..];
    let end = rest.find(".html")?;
    rest[..end].parse().ok()
}

/// Derives a thread identifier from its URL
///
/// Strips the `{base}/bbs/{board}/` directory and the `.html` suffix, so
/// `https://www.ptt.cc/bbs/Stock/M.1700000000.A.1B2.html` becomes
/// `M.1700000000.A.1B2`. URLs outside the board directory keep their full
/// text minus the suffix.
pub fn article_id(url: &Url, board_dir: &Url) -> String {
    let url = url.as_str();
    let id = url.strip_prefix(board_dir.as_str()).unwrap_or(url);
    id.strip_suffix(".html").unwrap_or(id).to_string()
}
