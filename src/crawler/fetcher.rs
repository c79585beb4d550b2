//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for a session, including:
//! - Building HTTP clients with the configured user agent, timeout and redirect policy
//! - Admission through the shared rate limiter before every attempt
//! - Retry logic for transport failures
//! - Charset normalization of response bodies

use crate::config::ScraperConfig;
use crate::crawler::encoding::normalize_to_utf8;
use crate::crawler::RateLimiter;
use crate::ScrapeError;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect::Policy, Client, Method};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Request parameters: query pairs for GET, form fields otherwise
pub type Params = BTreeMap<String, String>;

/// Result of a successful transport exchange
///
/// Any HTTP status counts as success at this layer; interpreting it is the caller's
/// job.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// HTTP status code
    pub status_code: u16,

    /// Final URL after redirects
    pub final_url: Url,

    /// Content-Type header value
    pub content_type: Option<String>,

    /// Raw body bytes
    pub body: Vec<u8>,
}

impl FetchResult {
    /// Returns the body transcoded to UTF-8
    pub fn text(&self) -> String {
        normalize_to_utf8(&self.body, self.content_type.as_deref())
    }

    /// Returns true for 2xx responses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```
/// use pagesift::config::ScraperConfig;
/// use pagesift::crawler::build_http_client;
///
/// let client = build_http_client(&ScraperConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &ScraperConfig) -> Result<Client, reqwest::Error> {
    let redirect = if config.follow_redirects {
        Policy::limited(10)
    } else {
        Policy::none()
    };

    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
        .redirect(redirect)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Rate-limited HTTP fetcher with retry-on-transport-failure
///
/// Cloning is cheap: clones share the connection pool and the rate window.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    limiter: Arc<RateLimiter>,
    max_retries: u32,
}

impl Fetcher {
    /// Creates a fetcher from configuration with its own rate limiter
    pub fn new(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        Self::with_limiter(config, limiter)
    }

    /// Creates a fetcher that shares an existing rate limiter
    pub fn with_limiter(
        config: &ScraperConfig,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, ScrapeError> {
        let client = build_http_client(config).map_err(|source| ScrapeError::Network {
            url: String::new(),
            source,
        })?;

        Ok(Self {
            client,
            limiter,
            max_retries: config.max_retries.max(1),
        })
    }

    /// Replaces the HTTP client and retry budget from new configuration
    ///
    /// The rate limiter is left untouched, so the current window carries over.
    pub fn rebuild_client(&mut self, config: &ScraperConfig) -> Result<(), ScrapeError> {
        self.client = build_http_client(config).map_err(|source| ScrapeError::Network {
            url: String::new(),
            source,
        })?;
        self.max_retries = config.max_retries.max(1);
        Ok(())
    }

    /// Returns the shared rate limiter
    pub fn limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.limiter)
    }

    /// Returns the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetches a URL with GET
    pub async fn get(&self, url: &str) -> Result<FetchResult, ScrapeError> {
        self.request(Method::GET, url, &Params::new()).await
    }

    /// Issues a request, retrying transport failures
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Any HTTP status | Success, returned to caller |
    /// | Timeout / connect / body read failure | Retry immediately, up to `max_retries` attempts |
    /// | Redirect loop or limit exceeded | Immediate failure, never retried |
    /// | Malformed URL | Immediate failure, never retried |
    ///
    /// Every attempt passes through the rate limiter first.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        params: &Params,
    ) -> Result<FetchResult, ScrapeError> {
        let parsed = Url::parse(url)?;
        self.send_with_retry(url, || {
            let builder = self.client.request(method.clone(), parsed.clone());
            if method == Method::GET {
                builder.query(params)
            } else {
                builder.form(params)
            }
        })
        .await
    }

    /// Issues a request whose body is the JSON encoding of `params`
    ///
    /// An empty parameter map sends no body.
    pub async fn request_json(
        &self,
        method: Method,
        url: &str,
        params: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<FetchResult, ScrapeError> {
        let parsed = Url::parse(url)?;
        let body = if params.is_empty() {
            None
        } else {
            Some(serde_json::to_vec(params)?)
        };

        self.send_with_retry(url, || {
            let builder = self
                .client
                .request(method.clone(), parsed.clone())
                .header(CONTENT_TYPE, "application/json")
                .header(reqwest::header::ACCEPT, "application/json");
            match &body {
                Some(bytes) => builder.body(bytes.clone()),
                None => builder,
            }
        })
        .await
    }

    async fn send_with_retry<F>(&self, url: &str, build: F) -> Result<FetchResult, ScrapeError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            self.limiter.admit().await;

            match self.send_once(build()).await {
                Ok(result) => {
                    tracing::debug!(
                        "Fetched {} (status {}, attempt {})",
                        url,
                        result.status_code,
                        attempt
                    );
                    return Ok(result);
                }
                Err(source) => {
                    let kind = classify_transport_error(&source);
                    let error = ScrapeError::Network {
                        url: url.to_string(),
                        source,
                    };
                    if !error.is_retryable() || attempt >= self.max_retries {
                        tracing::warn!(
                            "Giving up on {} after {} attempts ({}): {}",
                            url,
                            attempt,
                            kind,
                            error
                        );
                        return Err(error);
                    }
                    tracing::debug!(
                        "Attempt {}/{} for {} failed ({}), retrying",
                        attempt,
                        self.max_retries,
                        url,
                        kind
                    );
                }
            }
        }
    }

    async fn send_once(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<FetchResult, reqwest::Error> {
        let response = builder.send().await?;
        let status_code = response.status().as_u16();
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        Ok(FetchResult {
            status_code,
            final_url,
            content_type,
            body,
        })
    }
}

/// Names the class of a transport failure for logging
fn classify_transport_error(error: &reqwest::Error) -> &'static str {
    if error.is_timeout() {
        "timeout"
    } else if error.is_connect() {
        "connection failed"
    } else if error.is_body() || error.is_decode() {
        "body read failed"
    } else if error.is_redirect() {
        "redirect error"
    } else {
        "transport error"
    }
}
