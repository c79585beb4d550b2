//! Robots.txt handling module
//!
//! This module fetches, parses and caches robots.txt files. It serves two callers:
//! sitemap discovery through `Sitemap:` directives, and the optional allow/disallow
//! check applied before page fetches.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::{find_sitemap_url, ParsedRobots};

use crate::crawler::Fetcher;
use crate::Result;
use url::Url;

/// Fetches and parses robots.txt for the origin of `page`
///
/// A 4xx response means the origin has no rules and everything is allowed. Server
/// errors are treated the same way, with a warning.
///
/// # Returns
///
/// * `Ok(ParsedRobots)` - Parsed rules (possibly allow-all)
/// * `Err(ScrapeError)` - The robots.txt request itself failed
pub async fn fetch_robots(fetcher: &Fetcher, page: &Url) -> Result<ParsedRobots> {
    let Some(robots_url) = crate::url::robots_url(page) else {
        return Ok(ParsedRobots::allow_all());
    };

    let response = fetcher.get(robots_url.as_str()).await?;

    match response.status_code {
        200..=299 => {
            tracing::debug!("Fetched robots.txt from {}", robots_url);
            Ok(ParsedRobots::from_content(&response.text()))
        }
        400..=499 => {
            tracing::debug!(
                "No robots.txt at {} (status {}), allowing all",
                robots_url,
                response.status_code
            );
            Ok(ParsedRobots::allow_all())
        }
        status => {
            tracing::warn!(
                "Unexpected status {} for {}, allowing all",
                status,
                robots_url
            );
            Ok(ParsedRobots::allow_all())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScraperConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_robots_rules() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
            )
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(&ScraperConfig::default()).unwrap();
        let page = Url::parse(&format!("{}/deep/page", server.uri())).unwrap();
        let robots = fetch_robots(&fetcher, &page).await.unwrap();

        let private = format!("{}/private/x", server.uri());
        assert!(!robots.is_allowed(&private, "TestBot"));
        assert!(robots.is_allowed(page.as_str(), "TestBot"));
    }

    #[tokio::test]
    async fn test_missing_robots_allows_all() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(&ScraperConfig::default()).unwrap();
        let page = Url::parse(&server.uri()).unwrap();
        let robots = fetch_robots(&fetcher, &page).await.unwrap();

        assert!(robots.is_allowed("/anything", "TestBot"));
    }
}
