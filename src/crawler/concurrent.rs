//! Bounded concurrent fetching
//!
//! Requests run through `buffer_unordered`, so at most `max_concurrent` are in
//! flight. All of them pass through the same rate window as the sequential session.

use crate::crawler::{FetchResult, Fetcher};
use crate::plugins::AsyncFetch;
use crate::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};

/// Default number of requests in flight
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

#[derive(Debug, Clone)]
pub struct ConcurrentFetcher {
    fetcher: Fetcher,
    max_concurrent: usize,
}

impl ConcurrentFetcher {
    /// Creates a concurrent fetcher; a limit of zero is treated as one
    pub fn new(fetcher: Fetcher, max_concurrent: usize) -> Self {
        Self {
            fetcher,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}

#[async_trait]
impl AsyncFetch for ConcurrentFetcher {
    async fn fetch_all(&self, urls: &[String]) -> Vec<(String, Result<FetchResult>)> {
        tracing::info!(
            "Fetching {} URLs with up to {} in flight",
            urls.len(),
            self.max_concurrent
        );

        let mut outcomes: Vec<(usize, String, Result<FetchResult>)> =
            stream::iter(urls.iter().cloned().enumerate())
                .map(|(index, url)| {
                    let fetcher = self.fetcher.clone();
                    async move {
                        let result = fetcher.get(&url).await;
                        if let Err(e) = &result {
                            tracing::warn!("Concurrent fetch failed for {}: {}", url, e);
                        }
                        (index, url, result)
                    }
                })
                .buffer_unordered(self.max_concurrent)
                .collect()
                .await;

        outcomes.sort_by_key(|(index, _, _)| *index);
        outcomes
            .into_iter()
            .map(|(_, url, result)| (url, result))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RateLimitConfig, ScraperConfig};
    use std::time::{Duration, Instant};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_results_in_input_order() {
        let server = MockServer::start().await;
        // Earlier URLs answer later, so completion order is the reverse of input order
        for (route, delay) in [("/first", 300), ("/second", 150), ("/third", 0)] {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string(route)
                        .set_delay(Duration::from_millis(delay)),
                )
                .mount(&server)
                .await;
        }

        let fetcher = Fetcher::new(&ScraperConfig::default()).unwrap();
        let concurrent = ConcurrentFetcher::new(fetcher, 4);
        let urls: Vec<String> = ["/first", "/second", "/third"]
            .iter()
            .map(|route| format!("{}{}", server.uri(), route))
            .collect();
        let results = concurrent.fetch_all(&urls).await;

        assert_eq!(results.len(), 3);
        for (i, route) in ["/first", "/second", "/third"].iter().enumerate() {
            assert_eq!(results[i].0, urls[i]);
            assert_eq!(results[i].1.as_ref().unwrap().text(), *route);
        }
    }

    #[tokio::test]
    async fn test_failures_are_per_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let config = ScraperConfig {
            max_retries: 1,
            ..ScraperConfig::default()
        };
        let concurrent = ConcurrentFetcher::new(Fetcher::new(&config).unwrap(), 2);
        let urls = vec![server.uri(), "http://127.0.0.1:1/".to_string()];
        let results = concurrent.fetch_all(&urls).await;

        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
    }

    #[tokio::test]
    async fn test_shares_rate_window() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let config = ScraperConfig {
            rate_limit: RateLimitConfig {
                requests: 2,
                window_ms: 100,
            },
            ..ScraperConfig::default()
        };
        let fetcher = Fetcher::new(&config).unwrap();
        let concurrent = ConcurrentFetcher::new(fetcher.clone(), 10);

        let urls: Vec<String> = (0..5).map(|i| format!("{}/{}", server.uri(), i)).collect();
        let start = Instant::now();
        let results = concurrent.fetch_all(&urls).await;

        assert!(results.iter().all(|(_, r)| r.is_ok()));
        // Five requests at two per window need at least two full windows
        assert!(start.elapsed() >= Duration::from_millis(200));
        assert!(fetcher.limiter().in_window().await <= 2);
    }
}
