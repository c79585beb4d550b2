//! Integration tests for the scraper
//!
//! These tests use wiremock to create mock HTTP servers and drive a full
//! session: load, extract, discover auxiliary resources, queue and plugins.

use pagesift::crawler::JobOutput;
use pagesift::plugins::{ConfigStore, JsonFileStore};
use pagesift::{Document, ScrapeError, Scraper, ScraperConfig, SessionState};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> ScraperConfig {
    ScraperConfig {
        max_retries: 1,
        ..ScraperConfig::default()
    }
}

async fn mount_page(server: &MockServer, route: &str, content_type: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.into_bytes(), content_type))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_extract_before_load_fails() {
    let scraper = Scraper::new(test_config()).unwrap();

    assert!(matches!(scraper.links(), Err(ScrapeError::NoDocument)));
    assert!(matches!(scraper.images(), Err(ScrapeError::NoDocument)));
    assert!(matches!(scraper.content(), Err(ScrapeError::NoDocument)));
    assert!(matches!(scraper.sitemap().await, Err(ScrapeError::NoDocument)));
    assert!(matches!(scraper.rss_feeds().await, Err(ScrapeError::NoDocument)));
}

#[tokio::test]
async fn test_relative_link_resolved() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "text/html",
        r#"<html><body><a href="/about" rel="nofollow">About</a></body></html>"#.to_string(),
    )
    .await;

    let mut scraper = Scraper::new(test_config()).unwrap();
    scraper.go(&format!("{}/", server.uri())).await.unwrap();

    let links = scraper.links().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].href, format!("{}/about", server.uri()));
    assert_eq!(links[0].text, "About");
    assert_eq!(links[0].protocol, "http");
    assert!(links[0].is_nofollow);
    assert!(!links[0].is_ugc);
}

#[tokio::test]
async fn test_plain_link_has_no_rel_flags() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "text/html",
        r#"<html><body><a href="/about">About</a></body></html>"#.to_string(),
    )
    .await;

    let mut scraper = Scraper::new(test_config()).unwrap();
    scraper.go(&format!("{}/", server.uri())).await.unwrap();

    let links = scraper.links().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].href, format!("{}/about", server.uri()));
    assert_eq!(links[0].text, "About");
    assert!(!links[0].is_nofollow);
    assert!(!links[0].is_ugc);
    assert!(!links[0].is_sponsored);
}

#[tokio::test]
async fn test_meta_partitions() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "text/html",
        r#"<head>
            <meta charset="utf-8">
            <meta name="description" content="A page">
            <meta property="og:title" content="Hello">
            <meta name="twitter:card" content="summary">
        </head>"#
            .to_string(),
    )
    .await;

    let mut scraper = Scraper::new(test_config()).unwrap();
    scraper.go(&server.uri()).await.unwrap();

    let meta = scraper.meta().unwrap();
    assert_eq!(meta.og.get("og:title").map(String::as_str), Some("Hello"));
    assert_eq!(
        meta.standard.get("description").map(String::as_str),
        Some("A page")
    );
    assert_eq!(
        meta.twitter.get("twitter:card").map(String::as_str),
        Some("summary")
    );
    assert!(!meta.standard.contains_key("og:title"));
}

#[tokio::test]
async fn test_sitemap_discovered_through_robots() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", "text/html", "<title>Home</title>".to_string()).await;
    mount_page(
        &server,
        "/robots.txt",
        "text/plain",
        format!("User-agent: *\nDisallow:\nSitemap: {}/sitemap.xml\n", base),
    )
    .await;
    mount_page(
        &server,
        "/sitemap.xml",
        "application/xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <url><loc>{base}/a</loc><lastmod>2024-01-01</lastmod><priority>0.8</priority></url>
              <url><loc>{base}/b</loc><changefreq>weekly</changefreq></url>
            </urlset>"#
        ),
    )
    .await;

    let mut scraper = Scraper::new(test_config()).unwrap();
    scraper.go(&base).await.unwrap();

    assert_eq!(
        scraper.sitemap_url().await.unwrap(),
        Some(format!("{}/sitemap.xml", base))
    );

    let entries = scraper.sitemap().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].loc, format!("{}/a", base));
    assert_eq!(entries[0].lastmod.as_deref(), Some("2024-01-01"));
    assert_eq!(entries[0].priority, Some(0.8));
    assert_eq!(entries[1].changefreq.as_deref(), Some("weekly"));
}

#[tokio::test]
async fn test_broken_sitemap_degrades_to_empty() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", "text/html", "<title>Home</title>".to_string()).await;
    mount_page(
        &server,
        "/robots.txt",
        "text/plain",
        format!("Sitemap: {}/sitemap.xml", base),
    )
    .await;
    mount_page(&server, "/sitemap.xml", "application/xml", "<urlset><url>".to_string()).await;

    let mut scraper = Scraper::new(test_config()).unwrap();
    scraper.go(&base).await.unwrap();
    assert!(scraper.sitemap().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rss_feeds() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        "text/html",
        r#"<head>
            <link rel="alternate" type="application/rss+xml" href="/feed.xml">
            <link rel="alternate" type="application/rss+xml" href="/broken.xml">
        </head>"#
            .to_string(),
    )
    .await;
    mount_page(
        &server,
        "/feed.xml",
        "application/rss+xml",
        r#"<rss version="2.0"><channel>
            <title>News</title>
            <item>
              <title>First</title>
              <link>https://example.com/1</link>
              <description>One</description>
              <pubDate>Mon, 01 Jan 2024 10:00:00 +0000</pubDate>
            </item>
            <item><title>Second</title><link>https://example.com/2</link></item>
        </channel></rss>"#
            .to_string(),
    )
    .await;
    mount_page(&server, "/broken.xml", "application/rss+xml", "<rss>".to_string()).await;

    let mut scraper = Scraper::new(test_config()).unwrap();
    scraper.go(&base).await.unwrap();

    let feeds = scraper.rss_feeds().await.unwrap();
    assert_eq!(feeds.len(), 1);
    assert_eq!(feeds[0].url, format!("{}/feed.xml", base));
    assert_eq!(feeds[0].title, "News");
    assert_eq!(feeds[0].items.len(), 2);
    assert_eq!(feeds[0].items[0].title, "First");
    assert!(feeds[0].items[0].published.is_some());
    assert_eq!(feeds[0].items[1].pub_date, None);
}

#[tokio::test]
async fn test_api_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/search"))
        .and(body_json(serde_json::json!({"q": "rust"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"hits": 3})))
        .mount(&server)
        .await;
    mount_page(&server, "/api/text", "text/plain", "not json".to_string()).await;

    let scraper = Scraper::new(test_config()).unwrap();

    let mut params = serde_json::Map::new();
    params.insert("q".to_string(), serde_json::json!("rust"));
    let value = scraper
        .api_request(
            &format!("{}/api/search", server.uri()),
            &params,
            reqwest::Method::POST,
        )
        .await;
    assert_eq!(value, serde_json::json!({"hits": 3}));

    let fallback = scraper
        .api_request(
            &format!("{}/api/text", server.uri()),
            &serde_json::Map::new(),
            reqwest::Method::GET,
        )
        .await;
    assert_eq!(fallback, serde_json::json!({}));

    // API calls never load a document
    assert_eq!(scraper.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_queue_isolates_failures() {
    let server = MockServer::start().await;
    mount_page(&server, "/one", "text/html", "<title>One</title>".to_string()).await;
    mount_page(&server, "/two", "text/html", "<title>Two</title>".to_string()).await;

    let one = format!("{}/one", server.uri());
    let two = format!("{}/two", server.uri());
    let dead = "http://127.0.0.1:1/".to_string();

    let mut scraper = Scraper::new(test_config()).unwrap();
    scraper.queue_urls(
        [one.clone(), dead.clone(), two.clone()],
        Some(|doc: &Document| -> pagesift::Result<serde_json::Value> {
            Ok(serde_json::json!(doc.title()))
        }),
    );
    assert_eq!(scraper.queue_len(), 3);

    let results = scraper.process_queue().await;
    assert_eq!(scraper.queue_len(), 0);
    assert_eq!(results.len(), 3);
    assert_eq!(
        results[&one].as_ref().and_then(JobOutput::as_value),
        Some(&serde_json::json!("One"))
    );
    assert!(results[&dead].is_none());
    assert_eq!(
        results[&two].as_ref().and_then(JobOutput::as_value),
        Some(&serde_json::json!("Two"))
    );

    // The session keeps the last page that loaded
    assert_eq!(scraper.title().unwrap(), Some("Two".to_string()));
}

#[tokio::test]
async fn test_plugins_persist_across_sessions() {
    let dir = TempDir::new().unwrap();
    let plugins_file = dir.path().join("plugins.json");
    let config = ScraperConfig {
        plugins_file: Some(plugins_file.to_string_lossy().into_owned()),
        ..test_config()
    };

    {
        let mut scraper = Scraper::new(config.clone()).unwrap();
        scraper.enable_plugin("CachePlugin").unwrap();
        scraper.enable_plugin("NLPPlugin").unwrap();
        scraper.enable_plugin("NoSuchPlugin").unwrap();
        assert!(scraper.plugins().is_active("CachePlugin"));
        assert!(!scraper.plugins().is_active("NoSuchPlugin"));
    }

    let stored = JsonFileStore::new(&plugins_file).load().unwrap();
    assert!(stored.is_enabled("CachePlugin"));
    assert!(stored.is_enabled("NoSuchPlugin"));

    let mut scraper = Scraper::new(config).unwrap();
    assert!(scraper.plugins().is_active("CachePlugin"));
    assert!(scraper.plugins().is_active("NLPPlugin"));
    assert!(scraper.plugins().capabilities().cache.is_some());

    scraper.disable_plugin("CachePlugin").unwrap();
    assert!(scraper.plugins().capabilities().cache.is_none());
    assert!(!JsonFileStore::new(&plugins_file)
        .load()
        .unwrap()
        .is_enabled("CachePlugin"));
}

#[tokio::test]
async fn test_cache_plugin_avoids_refetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<title>Once</title>", "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let mut scraper = Scraper::new(test_config()).unwrap();
    scraper.enable_plugin("CachePlugin").unwrap();

    let url = format!("{}/", server.uri());
    scraper.go(&url).await.unwrap();
    scraper.go(&url).await.unwrap();
    assert_eq!(scraper.title().unwrap(), Some("Once".to_string()));
}

#[tokio::test]
async fn test_go_many_through_async_plugin() {
    let server = MockServer::start().await;
    for route in ["/a", "/b"] {
        mount_page(&server, route, "text/html", format!("<title>{}</title>", route)).await;
    }

    let store = Arc::new(pagesift::plugins::MemoryStore::new());
    let mut scraper = Scraper::with_plugin_store(test_config(), store).unwrap();
    assert!(matches!(
        scraper.go_many(&[server.uri()]).await,
        Err(ScrapeError::PluginUnavailable(_))
    ));

    scraper.enable_plugin("AsyncPlugin").unwrap();
    let urls = vec![
        format!("{}/a", server.uri()),
        "http://127.0.0.1:1/".to_string(),
        format!("{}/b", server.uri()),
    ];
    let results = scraper.go_many(&urls).await.unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].1.as_ref().unwrap().title(), Some("/a".to_string()));
    assert!(results[1].1.is_err());
    assert_eq!(results[2].1.as_ref().unwrap().title(), Some("/b".to_string()));

    // Concurrent loads leave the session untouched
    assert_eq!(scraper.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_entities_through_nlp_plugin() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "text/html",
        "<body><p>Rust compiler errors. Rust compiler errors again.</p></body>".to_string(),
    )
    .await;

    let mut scraper = Scraper::new(test_config()).unwrap();
    scraper.go(&server.uri()).await.unwrap();
    assert!(matches!(
        scraper.extract_entities(),
        Err(ScrapeError::PluginUnavailable(_))
    ));

    scraper.enable_plugin("NLPPlugin").unwrap();
    let entities = scraper.extract_entities().unwrap();
    assert!(entities.iter().any(|e| e.keyword == "rust compiler errors"));
}
