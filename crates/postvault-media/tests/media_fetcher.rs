//! Integration tests for `MediaFetcher`.
//!
//! Uses `wiremock` for the remote host and a `tempfile::TempDir` for the
//! destination so no real network or shared filesystem state is touched.
//! The fetcher is configured with the mock server's host as the media host
//! so the `name=orig` upgrade and the fallback chain apply to it.

use std::path::Path;

use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use postvault_media::{FetchJob, FetcherConfig, MediaFetcher};

fn test_fetcher(max_concurrent: usize) -> MediaFetcher {
    MediaFetcher::new(&FetcherConfig {
        timeout_secs: 5,
        user_agent: "postvault-test/0.1".to_string(),
        referer: "https://x.com/".to_string(),
        media_host: "127.0.0.1".to_string(),
        delay_ms: 0,
        max_concurrent,
    })
    .expect("failed to build test MediaFetcher")
}

fn read(path: &Path) -> Vec<u8> {
    std::fs::read(path).expect("downloaded file should exist")
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_downloads_canonical_url_with_browser_headers() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/media/abc"))
        .and(query_param("name", "orig"))
        .and(header("referer", "https://x.com/"))
        .and(header("user-agent", "postvault-test/0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"original-bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/media/abc?format=png&name=small", server.uri());
    let saved = test_fetcher(1)
        .fetch_indexed(&url, dir.path(), "1750", 0)
        .await
        .expect("expected a local path");

    assert_eq!(saved, dir.path().join("1750_0.png"));
    assert_eq!(read(&saved), b"original-bytes");
    assert!(
        !dir.path().join("1750_0.png.part").exists(),
        "partial file must be renamed away"
    );
}

#[tokio::test]
async fn fetch_named_uses_stem_without_index() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/profile_images/9/a_normal.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"avatar".to_vec()))
        .mount(&server)
        .await;

    let url = format!("{}/profile_images/9/a_normal.jpg", server.uri());
    let saved = test_fetcher(1)
        .fetch_named(&url, dir.path(), "icon_20240101_120000")
        .await
        .expect("expected a local path");

    assert_eq!(saved, dir.path().join("icon_20240101_120000.jpg"));
}

// ---------------------------------------------------------------------------
// Idempotency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_skips_network_when_file_already_present() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("42_0.jpg"), b"cached").unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fresh".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let url = format!("{}/media/abc.jpg", server.uri());
    let saved = test_fetcher(1)
        .fetch_indexed(&url, dir.path(), "42", 0)
        .await
        .expect("expected the cached path");

    assert_eq!(read(&saved), b"cached");
}

#[tokio::test]
async fn fetch_replaces_empty_existing_file() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("42_0.jpg"), b"").unwrap();

    Mock::given(method("GET"))
        .and(path("/media/abc.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fresh".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/media/abc.jpg", server.uri());
    let saved = test_fetcher(1)
        .fetch_indexed(&url, dir.path(), "42", 0)
        .await
        .expect("expected a local path");

    assert_eq!(read(&saved), b"fresh");
}

// ---------------------------------------------------------------------------
// Fallback chain
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_falls_back_to_original_url() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/media/abc"))
        .and(query_param("name", "orig"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/abc"))
        .and(query_param("name", "small"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"small".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/media/abc?format=jpg&name=small", server.uri());
    let saved = test_fetcher(1)
        .fetch_indexed(&url, dir.path(), "7", 1)
        .await
        .expect("expected fallback to succeed");

    assert_eq!(saved, dir.path().join("7_1.jpg"));
    assert_eq!(read(&saved), b"small");
}

#[tokio::test]
async fn fetch_falls_back_to_path_appended_format() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/media/abc"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/abc.webp"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"via-path".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/media/abc?format=webp&name=small", server.uri());
    let saved = test_fetcher(1)
        .fetch_indexed(&url, dir.path(), "7", 0)
        .await
        .expect("expected path fallback to succeed");

    assert_eq!(read(&saved), b"via-path");
}

#[tokio::test]
async fn fetch_returns_none_when_every_candidate_fails() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&server)
        .await;

    let url = format!("{}/media/abc?format=jpg&name=small", server.uri());
    let saved = test_fetcher(1).fetch_indexed(&url, dir.path(), "7", 0).await;

    assert!(saved.is_none());
    assert!(!dir.path().join("7_0.jpg").exists());
    assert!(!dir.path().join("7_0.jpg.part").exists());
}

#[tokio::test]
async fn fetch_never_retries_video() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/tweet_video/clip.mp4?format=mp4", server.uri());
    let saved = test_fetcher(1).fetch_indexed(&url, dir.path(), "7", 0).await;

    assert!(saved.is_none());
}

// ---------------------------------------------------------------------------
// Failure isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_returns_none_on_connection_error() {
    let dir = TempDir::new().unwrap();
    // Nothing listens on the discard port in the test environment.
    let saved = test_fetcher(1)
        .fetch_indexed("http://127.0.0.1:9/media/abc.jpg", dir.path(), "7", 0)
        .await;
    assert!(saved.is_none());
}

#[tokio::test]
async fn fetch_returns_none_for_empty_url() {
    let dir = TempDir::new().unwrap();
    assert!(test_fetcher(1).fetch_named("", dir.path(), "icon").await.is_none());
}

#[tokio::test]
async fn fetch_all_preserves_order_and_isolates_failures() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/media/ok1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"1".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/ok2.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"2".to_vec()))
        .mount(&server)
        .await;

    let jobs = vec![
        FetchJob {
            url: format!("{}/media/ok1.jpg", server.uri()),
            key: "p".to_string(),
            index: 0,
        },
        FetchJob {
            url: format!("{}/media/missing.jpg", server.uri()),
            key: "p".to_string(),
            index: 1,
        },
        FetchJob {
            url: format!("{}/media/ok2.png", server.uri()),
            key: "p".to_string(),
            index: 2,
        },
    ];

    let results = test_fetcher(3).fetch_all(jobs, dir.path()).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_deref(), Some(dir.path().join("p_0.jpg").as_path()));
    assert!(results[1].is_none());
    assert_eq!(results[2].as_deref(), Some(dir.path().join("p_2.png").as_path()));
}
