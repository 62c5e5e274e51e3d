//! Mock forum pages and test configuration

use ptt_crawler::config::Config;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SIGNATURE: &str = "※ 發信站: 批踢踢實業坊(ptt.cc),";

/// Configuration pointed at `server` with millisecond delays
pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.site.base_url = server.uri();
    config.crawler.page_delay = 2;
    config.crawler.article_delay = 1;
    config.crawler.busy_delay = 1;
    config.crawler.max_busy_delay = 5;
    config.crawler.error_delay = 1;
    config.crawler.max_busy_retries = 3;
    config.crawler.board_pause = 1;
    config.crawler.request_timeout = 5;
    config
}

/// Board index whose previous-page button points at `previous`
///
/// `None` renders the button without a link, as on a single-page board.
pub fn index_html(board: &str, previous: Option<u32>) -> String {
    let previous_button = match previous {
        Some(n) => format!(
            r#"<a class="btn wide" href="/bbs/{}/index{}.html">&lsaquo; 上頁</a>"#,
            board, n
        ),
        None => r#"<a class="btn wide disabled">&lsaquo; 上頁</a>"#.to_string(),
    };

    format!(
        r#"<html><head><title>看板 {board} 文章列表 - 批踢踢實業坊</title></head><body>
<div class="btn-group btn-group-paging">
<a class="btn wide" href="/bbs/{board}/index1.html">最舊</a>
{previous_button}
<a class="btn wide disabled">下頁 &rsaquo;</a>
<a class="btn wide" href="/bbs/{board}/index.html">最新</a>
</div>
<div class="r-list-container"></div>
</body></html>"#
    )
}

/// Listing page linking to the given thread ids, plus one deleted entry
pub fn listing_html(board: &str, ids: &[&str]) -> String {
    let mut entries = String::new();
    for id in ids {
        entries.push_str(&format!(
            r#"<div class="r-ent"><div class="title"><a href="/bbs/{}/{}.html">[問卦] {}</a></div></div>"#,
            board, id, id
        ));
    }
    entries.push_str(r#"<div class="r-ent"><div class="title">(本文已被刪除) [someone]</div></div>"#);

    format!(
        r#"<html><head><title>看板 {} 文章列表</title></head><body><div class="r-list-container">{}</div></body></html>"#,
        board, entries
    )
}

/// Thread page with the full metadata block, a signature and `pushes`
pub fn thread_html(author: &str, title: &str, body: &str, pushes: &str) -> String {
    format!(
        r#"<html><head><title>{title} - 批踢踢實業坊</title></head><body>
<div id="main-content" class="bbs-screen bbs-content"><div class="article-metaline"><span class="article-meta-tag">作者</span><span class="article-meta-value">{author}</span></div><div class="article-metaline-right"><span class="article-meta-tag">看板</span><span class="article-meta-value">Test</span></div><div class="article-metaline"><span class="article-meta-tag">標題</span><span class="article-meta-value">{title}</span></div><div class="article-metaline"><span class="article-meta-tag">時間</span><span class="article-meta-value">Mon Jan  1 08:00:00 2024</span></div>{body}
--
{SIGNATURE} 來自: 1.2.3.4 (臺灣)
{pushes}</div></body></html>"#
    )
}

pub fn push_html(tag: &str, user: &str, content: &str, time: &str) -> String {
    format!(
        r#"<div class="push"><span class="hl push-tag">{tag}</span><span class="f3 hl push-userid">{user}</span><span class="f3 push-content">{content}</span><span class="push-ipdatetime">{time}
</span></div>"#
    )
}

pub fn busy_html() -> String {
    "<html><head><title>Service Temporarily Unavailable</title></head><body><h1>503 Service Temporarily Unavailable</h1></body></html>".to_string()
}

pub fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body)
}

pub fn busy() -> ResponseTemplate {
    ResponseTemplate::new(503)
        .insert_header("content-type", "text/html")
        .set_body_string(busy_html())
}

/// Serves `body` for GET `route`
pub async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

/// Serves a board of `pages` listing pages, each holding `threads`
///
/// Thread ids are `M.{page}{n}.A.{board}`; every thread carries one push.
pub async fn mount_board(server: &MockServer, board: &str, pages: u32, threads: usize) {
    let previous = if pages > 1 { Some(pages - 1) } else { None };
    mount_page(
        server,
        &format!("/bbs/{}/index.html", board),
        index_html(board, previous),
    )
    .await;

    for page in 1..=pages {
        let ids: Vec<String> = (0..threads)
            .map(|n| format!("M.{}{}.A.{}", page, n, board))
            .collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        mount_page(
            server,
            &format!("/bbs/{}/index{}.html", board, page),
            listing_html(board, &refs),
        )
        .await;

        for id in &ids {
            mount_page(
                server,
                &format!("/bbs/{}/{}.html", board, id),
                thread_html(
                    "alice (Alice)",
                    id,
                    "body",
                    &push_html("推 ", "bob", ": +1", " 01/01 08:10"),
                ),
            )
            .await;
        }
    }
}
