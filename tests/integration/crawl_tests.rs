use crate::common::*;
use ptt_crawler::output::{read_records, MemorySink};
use ptt_crawler::{BoardCrawler, CrawlError, JsonlSink};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_end_to_end_single_page_board() {
    let server = MockServer::start().await;
    let config = test_config(&server);

    mount_page(&server, "/bbs/Test/index.html", index_html("Test", None)).await;
    mount_page(
        &server,
        "/bbs/Test/index1.html",
        listing_html("Test", &["M.1.A.001", "M.2.A.002"]),
    )
    .await;
    mount_page(
        &server,
        "/bbs/Test/M.1.A.001.html",
        thread_html(
            "alice (Alice)",
            "[心得] 第一篇",
            "hello\nworld",
            &push_html("推 ", "bob", ": 好文", " 01/01 08:10"),
        ),
    )
    .await;
    // Deleted thread: the forum still answers, without the article markup
    Mock::given(method("GET"))
        .and(path("/bbs/Test/M.2.A.002.html"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html><body>404</body></html>"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let sink = JsonlSink::new(dir.path()).unwrap();
    let path = sink.board_path("Test");
    let mut crawler = BoardCrawler::new(&config, sink, CancellationToken::new()).unwrap();

    let report = crawler.crawl_board("Test").await.unwrap();
    drop(crawler);

    assert_eq!(report.pages_total, 1);
    assert_eq!(report.pages_completed, 1);
    assert_eq!(report.articles_written, 2);
    assert_eq!(report.comments_written, 1);
    assert!(report.is_complete());

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(text.contains(r#""comments":{"1":{"#));
    assert!(text.contains("好文"));
    assert!(!text.contains("發信站"));

    let records = read_records(&path).unwrap();
    assert_eq!(records[0].id, "M.1.A.001");
    assert_eq!(records[0].author, "alice (Alice)");
    assert_eq!(records[0].title, "[心得] 第一篇");
    assert_eq!(records[0].content, "hello  world  --  ");
    assert_eq!(records[0].comments[&1].content, " 好文");

    assert_eq!(records[1].id, "M.2.A.002");
    assert_eq!(records[1].author, "no author");
    assert_eq!(records[1].title, "no title");
    assert_eq!(records[1].date, "no date");
    assert_eq!(records[1].content, "main_content error");
    assert!(records[1].comments.is_empty());
}

#[tokio::test]
async fn test_pages_crawled_newest_first() {
    let server = MockServer::start().await;
    mount_board(&server, "Test", 3, 1).await;

    let mut crawler = BoardCrawler::new(
        &test_config(&server),
        MemorySink::new(),
        CancellationToken::new(),
    )
    .unwrap();
    let report = crawler.crawl_board("Test").await.unwrap();

    assert_eq!(report.pages_total, 3);
    assert_eq!(report.pages_completed, 3);

    let ids: Vec<&str> = crawler
        .sink()
        .records("Test")
        .iter()
        .map(|r| r.id.as_str())
        .collect();
    assert_eq!(ids, vec!["M.30.A.Test", "M.20.A.Test", "M.10.A.Test"]);
}

#[tokio::test]
async fn test_busy_page_is_requeued_then_crawled() {
    let server = MockServer::start().await;

    // Page 2 is busy twice before it answers
    Mock::given(method("GET"))
        .and(path("/bbs/Test/index2.html"))
        .respond_with(busy())
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_board(&server, "Test", 2, 2).await;

    let mut crawler = BoardCrawler::new(
        &test_config(&server),
        MemorySink::new(),
        CancellationToken::new(),
    )
    .unwrap();
    let report = crawler.crawl_board("Test").await.unwrap();

    assert_eq!(report.busy_responses, 2);
    assert_eq!(report.pages_completed, 2);
    assert!(report.unavailable_pages.is_empty());
    assert!(report.is_complete());

    // Page 1 went ahead while page 2 waited at the back of the queue
    let ids: Vec<&str> = crawler
        .sink()
        .records("Test")
        .iter()
        .map(|r| r.id.as_str())
        .collect();
    assert_eq!(
        ids,
        vec!["M.10.A.Test", "M.11.A.Test", "M.20.A.Test", "M.21.A.Test"]
    );
}

#[tokio::test]
async fn test_busy_retries_are_bounded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bbs/Test/index2.html"))
        .respond_with(busy())
        .mount(&server)
        .await;
    mount_board(&server, "Test", 2, 1).await;

    let config = test_config(&server);
    let mut crawler =
        BoardCrawler::new(&config, MemorySink::new(), CancellationToken::new()).unwrap();
    let report = crawler.crawl_board("Test").await.unwrap();

    assert_eq!(report.pages_completed, 1);
    assert_eq!(
        report.busy_responses,
        config.crawler.max_busy_retries + 1
    );
    assert_eq!(
        report.unavailable_pages,
        vec![format!("{}/bbs/Test/index2.html", server.uri())]
    );
    assert!(!report.is_complete());
    assert_eq!(crawler.sink().records("Test").len(), 1);
}

#[tokio::test]
async fn test_failed_page_is_skipped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bbs/Test/index2.html"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .expect(1)
        .mount(&server)
        .await;
    mount_board(&server, "Test", 2, 1).await;

    let mut crawler = BoardCrawler::new(
        &test_config(&server),
        MemorySink::new(),
        CancellationToken::new(),
    )
    .unwrap();
    let report = crawler.crawl_board("Test").await.unwrap();

    assert_eq!(report.pages_failed, 1);
    assert_eq!(report.pages_completed, 1);
    assert_eq!(report.busy_responses, 0);
    assert_eq!(crawler.sink().records("Test").len(), 1);
}

#[tokio::test]
async fn test_busy_index_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bbs/Test/index.html"))
        .respond_with(busy())
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_board(&server, "Test", 1, 1).await;

    let mut crawler = BoardCrawler::new(
        &test_config(&server),
        MemorySink::new(),
        CancellationToken::new(),
    )
    .unwrap();
    let report = crawler.crawl_board("Test").await.unwrap();

    assert_eq!(report.pages_completed, 1);
}

#[tokio::test]
async fn test_missing_navigation_is_page_count_error() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/bbs/Test/index.html",
        "<html><head><title>Test</title></head><body>nothing</body></html>".to_string(),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let sink = JsonlSink::new(dir.path()).unwrap();
    let path = sink.board_path("Test");
    let mut crawler =
        BoardCrawler::new(&test_config(&server), sink, CancellationToken::new()).unwrap();

    let result = crawler.crawl_board("Test").await;

    assert!(matches!(result, Err(CrawlError::PageCount { ref board }) if board == "Test"));
    assert!(!path.exists());
}

#[tokio::test]
async fn test_recrawl_replaces_output() {
    let server = MockServer::start().await;
    mount_board(&server, "Test", 2, 2).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server);

    for _ in 0..2 {
        let sink = JsonlSink::new(dir.path()).unwrap();
        let mut crawler = BoardCrawler::new(&config, sink, CancellationToken::new()).unwrap();
        crawler.crawl_board("Test").await.unwrap();
    }

    let records = read_records(&dir.path().join("Test.jsonl")).unwrap();
    assert_eq!(records.len(), 4);
}

#[tokio::test]
async fn test_age_gate_consent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bbs/Adult/index.html"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/ask/over18?from=%2Fbbs%2FAdult%2Findex.html"),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ask/over18"))
        .respond_with(html(
            r#"<html><head><title>批踢踢實業坊</title></head><body><form action="/ask/over18" method="post"><button name="yes" value="yes">我同意</button></form></body></html>"#.to_string(),
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ask/over18"))
        .and(body_string_contains("yes=yes"))
        .and(body_string_contains("from=%2Fbbs%2FAdult%2Findex.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;
    mount_board(&server, "Adult", 1, 1).await;

    let mut crawler = BoardCrawler::new(
        &test_config(&server),
        MemorySink::new(),
        CancellationToken::new(),
    )
    .unwrap();
    let report = crawler.crawl_board("Adult").await.unwrap();

    assert_eq!(report.pages_completed, 1);
    assert_eq!(crawler.sink().records("Adult").len(), 1);
}

#[tokio::test]
async fn test_cancel_stops_in_flight_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bbs/Test/index.html"))
        .respond_with(html(index_html("Test", None)).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let mut crawler =
        BoardCrawler::new(&test_config(&server), MemorySink::new(), cancel.clone()).unwrap();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let result = tokio::time::timeout(Duration::from_secs(5), crawler.crawl_board("Test"))
        .await
        .expect("crawl did not stop after cancellation");

    assert!(matches!(result, Err(CrawlError::Cancelled)));
    assert!(crawler.sink().is_empty());
}

#[tokio::test]
async fn test_concurrent_articles_keep_link_order() {
    let server = MockServer::start().await;
    mount_board(&server, "Test", 1, 5).await;

    let mut config = test_config(&server);
    config.crawler.max_concurrent_articles = 4;

    let mut crawler =
        BoardCrawler::new(&config, MemorySink::new(), CancellationToken::new()).unwrap();
    let report = crawler.crawl_board("Test").await.unwrap();

    assert_eq!(report.articles_written, 5);
    let ids: Vec<&str> = crawler
        .sink()
        .records("Test")
        .iter()
        .map(|r| r.id.as_str())
        .collect();
    assert_eq!(
        ids,
        vec![
            "M.10.A.Test",
            "M.11.A.Test",
            "M.12.A.Test",
            "M.13.A.Test",
            "M.14.A.Test"
        ]
    );
}

#[tokio::test]
async fn test_thread_titled_like_busy_page_is_written() {
    let server = MockServer::start().await;
    let config = test_config(&server);

    mount_page(&server, "/bbs/Test/index.html", index_html("Test", None)).await;
    mount_page(
        &server,
        "/bbs/Test/index1.html",
        listing_html("Test", &["M.1.A.001", "M.2.A.002"]),
    )
    .await;
    mount_page(
        &server,
        "/bbs/Test/M.1.A.001.html",
        thread_html(
            "alice (Alice)",
            "[新聞] AWS Service Temporarily Unavailable",
            "outage report",
            "",
        ),
    )
    .await;
    mount_page(
        &server,
        "/bbs/Test/M.2.A.002.html",
        thread_html("bob (Bob)", "[閒聊] 下一篇", "still here", ""),
    )
    .await;

    let mut crawler =
        BoardCrawler::new(&config, MemorySink::new(), CancellationToken::new()).unwrap();
    let report = crawler.crawl_board("Test").await.unwrap();

    assert_eq!(report.pages_completed, 1);
    assert_eq!(report.pages_failed, 0);
    assert_eq!(report.articles_failed, 0);
    assert_eq!(report.busy_responses, 0);
    assert!(report.is_complete());

    let records = crawler.sink().records("Test");
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["M.1.A.001", "M.2.A.002"]);
    assert_eq!(records[0].title, "[新聞] AWS Service Temporarily Unavailable");
    assert_eq!(records[0].author, "alice (Alice)");
}

#[tokio::test]
async fn test_page_interval_follows_completed_page() {
    let server = MockServer::start().await;

    // Slow threads, so the next listing page's slot has already passed
    // by the time the current page is done
    for page in 1..=2 {
        Mock::given(method("GET"))
            .and(path(format!("/bbs/Test/M.{}0.A.Test.html", page)))
            .respond_with(
                html(thread_html("alice (Alice)", "slow", "body", ""))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;
    }
    mount_board(&server, "Test", 2, 1).await;

    let mut config = test_config(&server);
    config.crawler.page_delay = 400;
    config.crawler.article_delay = 1;

    let mut crawler =
        BoardCrawler::new(&config, MemorySink::new(), CancellationToken::new()).unwrap();

    let started = std::time::Instant::now();
    let report = crawler.crawl_board("Test").await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(report.pages_completed, 2);
    assert_eq!(report.articles_written, 2);
    // index, page 2 after one interval, its thread, a full interval, page 1, its thread
    assert!(
        elapsed >= Duration::from_millis(1400),
        "crawl took only {:?}",
        elapsed
    );
}
