//! Scraper session - the orchestration layer
//!
//! A [`Scraper`] owns one loaded document at a time and coordinates:
//! - Rate-limited, retrying page loads (optionally through the cache capability)
//! - The session state machine (idle, fetching, ready)
//! - Extraction over the loaded document
//! - Auxiliary fetches: robots.txt, sitemaps, RSS feeds, JSON APIs
//! - The FIFO job queue and the optional plugin capabilities

use crate::config::{validate, ScraperConfig};
use crate::crawler::scheduler::{DocumentSource, QueueResults, Transform};
use crate::crawler::{Fetcher, Params, QueueScheduler};
use crate::extract::{
    ContentBundle, ContentExtractor, ImageExtractor, ImageRecord, LinkExtractor, LinkRecord,
    MetaBag, MetaExtractor, StructuredData, StructuredDataExtractor,
};
use crate::feeds::{parse_rss, parse_sitemap, RssFeed, SitemapEntry};
use crate::formats::parse_json;
use crate::plugins::{
    cache_key, ConfigStore, Entity, JsonFileStore, MemoryStore, PluginContext, PluginRegistry,
};
use crate::robots::{fetch_robots, find_sitemap_url, ParsedRobots, RobotsCache};
use crate::state::SessionState;
use crate::url::{origin_key, resolve_href, robots_url};
use crate::{Document, Result, ScrapeError};
use async_trait::async_trait;
use reqwest::Method;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Callback run after every successful page load
pub type DocumentListener = Box<dyn Fn(&Document)>;

/// A sequential scraping session
///
/// # Example
///
/// ```no_run
/// use pagesift::{Scraper, ScraperConfig};
///
/// #[tokio::main]
/// async fn main() -> pagesift::Result<()> {
///     let mut scraper = Scraper::new(ScraperConfig::default())?;
///     scraper.go("https://example.com").await?;
///     for link in scraper.links()? {
///         println!("{} -> {}", link.text, link.href);
///     }
///     Ok(())
/// }
/// ```
pub struct Scraper {
    config: ScraperConfig,
    fetcher: Fetcher,
    state: SessionState,
    document: Option<Document>,
    last_status: Option<u16>,
    queue: QueueScheduler,
    listeners: Vec<DocumentListener>,
    plugins: PluginRegistry,
    robots: RobotsCache,
}

impl Scraper {
    /// Creates a session from configuration
    ///
    /// Plugin state persists to `plugins-file` when configured, otherwise it lives in
    /// memory for the life of the session.
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let store: Arc<dyn ConfigStore> = match &config.plugins_file {
            Some(path) => Arc::new(JsonFileStore::new(path)),
            None => Arc::new(MemoryStore::new()),
        };
        Self::with_plugin_store(config, store)
    }

    /// Creates a session whose plugin state lives in the given store
    pub fn with_plugin_store(config: ScraperConfig, store: Arc<dyn ConfigStore>) -> Result<Self> {
        validate(&config)?;

        let fetcher = Fetcher::new(&config)?;
        let context = PluginContext {
            config: config.clone(),
            fetcher: fetcher.clone(),
        };
        let plugins = PluginRegistry::new(store, context)?;

        tracing::debug!(
            "Scraper ready (quota {} per {}ms, {} retries, plugins: {:?})",
            config.rate_limit.requests,
            config.rate_limit.window_ms,
            config.max_retries,
            plugins.active()
        );

        Ok(Self {
            config,
            fetcher,
            state: SessionState::Idle,
            document: None,
            last_status: None,
            queue: QueueScheduler::new(),
            listeners: Vec::new(),
            plugins,
            robots: RobotsCache::new(),
        })
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The loaded document, when the session is ready
    pub fn document(&self) -> Option<&Document> {
        if self.state.has_document() {
            self.document.as_ref()
        } else {
            None
        }
    }

    /// Registers a callback run after every successful `go`, in registration order
    pub fn on_document_ready<F>(&mut self, listener: F)
    where
        F: Fn(&Document) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Drops the loaded document and returns to idle
    pub fn reset(&mut self) {
        self.document = None;
        self.last_status = None;
        self.state = SessionState::Idle;
    }

    // ===== Runtime settings =====

    /// Changes the rolling-window rate limit
    ///
    /// Every fetch path of the session shares the limiter, the async-fetch capability
    /// included. Requests already admitted stay in the window and count against the new
    /// quota.
    pub fn set_rate_limit(&mut self, requests: usize, window: Duration) -> Result<()> {
        let mut config = self.config.clone();
        config.rate_limit.requests = requests;
        config.rate_limit.window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        validate(&config)?;

        self.fetcher.limiter().reconfigure(requests, window);
        self.config = config;
        Ok(())
    }

    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) -> Result<()> {
        let user_agent = user_agent.into();
        self.reconfigure_client(move |config| config.user_agent = user_agent)
    }

    /// Sets the per-request timeout in whole seconds
    pub fn set_timeout(&mut self, timeout_secs: u64) -> Result<()> {
        self.reconfigure_client(|config| config.timeout_secs = timeout_secs)
    }

    pub fn set_follow_redirects(&mut self, follow: bool) -> Result<()> {
        self.reconfigure_client(|config| config.follow_redirects = follow)
    }

    /// Applies a client setting, rebuilding the HTTP client and refreshing plugins
    ///
    /// The change is validated first; an invalid value leaves the session untouched.
    fn reconfigure_client<F>(&mut self, change: F) -> Result<()>
    where
        F: FnOnce(&mut ScraperConfig),
    {
        let mut config = self.config.clone();
        change(&mut config);
        validate(&config)?;

        self.fetcher.rebuild_client(&config)?;
        self.config = config;
        self.plugins.set_context(PluginContext {
            config: self.config.clone(),
            fetcher: self.fetcher.clone(),
        });
        Ok(())
    }

    fn transition(&mut self, next: SessionState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(ScrapeError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!("Session {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    // ===== Page loading =====

    /// Loads a page with GET and makes it the current document
    pub async fn go(&mut self, url: &str) -> Result<&Document> {
        self.go_with(url, Method::GET, &Params::new()).await
    }

    /// Loads a page with an arbitrary method and parameters
    ///
    /// On failure the previous document is dropped and the session returns to idle.
    pub async fn go_with(&mut self, url: &str, method: Method, params: &Params) -> Result<&Document> {
        self.transition(SessionState::Fetching)?;
        tracing::info!("Loading {} {}", method, url);

        let mut guard = LoadGuard {
            scraper: &mut *self,
            armed: true,
        };
        let outcome = guard.scraper.load_page(url, &method, params).await;
        guard.armed = false;
        drop(guard);

        match outcome {
            Ok((document, status)) => {
                self.last_status = status;
                self.transition(SessionState::Ready)?;

                let document = self.document.insert(document);
                for listener in &self.listeners {
                    listener(document);
                }
                Ok(&*document)
            }
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", url, e);
                self.document = None;
                self.last_status = None;
                self.transition(SessionState::Idle)?;
                Err(e)
            }
        }
    }

    async fn load_page(
        &mut self,
        url: &str,
        method: &Method,
        params: &Params,
    ) -> Result<(Document, Option<u16>)> {
        let parsed = Url::parse(url)?;

        if self.config.respect_robots_txt {
            self.check_robots(&parsed).await?;
        }

        let cache = self.plugins.capabilities().cache.clone();
        let key = cache_key(url, method.as_str(), params);

        if let Some(cache) = &cache {
            match cache.get(&key) {
                Ok(Some(body)) => {
                    tracing::debug!("Cache hit for {}", url);
                    return Ok((Document::parse(&body, parsed), None));
                }
                Ok(None) => tracing::debug!("Cache miss for {}", url),
                Err(e) => tracing::warn!("Cache error for {}, fetching directly: {}", url, e),
            }
        }

        let response = self.fetcher.request(method.clone(), url, params).await?;
        let body = response.text();

        if let Some(cache) = &cache {
            if let Err(e) = cache.put(&key, &body) {
                tracing::warn!("Failed to cache {}: {}", url, e);
            }
        }

        tracing::debug!(
            "Loaded {} ({} bytes, status {})",
            response.final_url,
            body.len(),
            response.status_code
        );
        Ok((
            Document::parse(&body, response.final_url),
            Some(response.status_code),
        ))
    }

    /// Refuses URLs disallowed for our user agent, using a per-origin cache
    async fn check_robots(&mut self, url: &Url) -> Result<()> {
        let Some(origin) = origin_key(url) else {
            return Ok(());
        };

        let user_agent = &self.config.user_agent;
        let allowed = match self.robots.get_fresh(&origin) {
            Some(cached) => cached.is_allowed(url.as_str(), user_agent),
            None => {
                let robots = match fetch_robots(&self.fetcher, url).await {
                    Ok(robots) => robots,
                    Err(e) => {
                        tracing::warn!("Could not fetch robots.txt for {}: {}", origin, e);
                        ParsedRobots::allow_all()
                    }
                };
                let allowed = robots.is_allowed(url.as_str(), user_agent);
                self.robots.insert(origin, robots);
                allowed
            }
        };

        if allowed {
            Ok(())
        } else {
            tracing::info!("Blocked by robots.txt: {}", url);
            Err(ScrapeError::RobotsDenied {
                url: url.to_string(),
            })
        }
    }

    /// Fetches a resource body without touching the session document
    pub async fn fetch_asset(&self, url: &str) -> Result<String> {
        let response = self.fetcher.get(url).await?;
        if !response.is_success() {
            tracing::debug!("Asset {} returned status {}", url, response.status_code);
        }
        Ok(response.text())
    }

    // ===== Page facts =====

    fn require_document(&self) -> Result<&Document> {
        self.document().ok_or(ScrapeError::NoDocument)
    }

    /// HTTP status of the last load; `None` when served from cache
    pub fn status_code(&self) -> Result<Option<u16>> {
        self.require_document()?;
        Ok(self.last_status)
    }

    /// True when the last load returned status 400 or above
    pub fn is_error_page(&self) -> Result<bool> {
        Ok(self.status_code()?.map_or(false, |status| status >= 400))
    }

    pub fn title(&self) -> Result<Option<String>> {
        Ok(self.require_document()?.title())
    }

    pub fn select_text(&self, selector: &str) -> Result<Vec<String>> {
        self.require_document()?.select_text(selector)
    }

    pub fn select_attr(&self, selector: &str, attr: &str) -> Result<Vec<String>> {
        self.require_document()?.select_attr(selector, attr)
    }

    /// Injects externally rendered markup into the loaded document's body
    pub fn merge_fragment(&mut self, fragment: &str) -> Result<()> {
        if !self.state.has_document() {
            return Err(ScrapeError::NoDocument);
        }
        self.document
            .as_mut()
            .ok_or(ScrapeError::NoDocument)?
            .merge_fragment(fragment);
        Ok(())
    }

    // ===== Extraction =====

    pub fn link_extractor(&self) -> Result<LinkExtractor<'_>> {
        Ok(LinkExtractor::new(self.require_document()?))
    }

    pub fn links(&self) -> Result<Vec<LinkRecord>> {
        Ok(self.link_extractor()?.extract())
    }

    pub fn image_extractor(&self) -> Result<ImageExtractor<'_>> {
        Ok(ImageExtractor::new(self.require_document()?))
    }

    pub fn images(&self) -> Result<Vec<ImageRecord>> {
        Ok(self.image_extractor()?.extract())
    }

    pub fn meta_extractor(&self) -> Result<MetaExtractor<'_>> {
        Ok(MetaExtractor::new(self.require_document()?))
    }

    pub fn meta(&self) -> Result<MetaBag> {
        Ok(self.meta_extractor()?.extract())
    }

    pub fn structured_data_extractor(&self) -> Result<StructuredDataExtractor<'_>> {
        Ok(StructuredDataExtractor::new(self.require_document()?))
    }

    pub fn structured_data(&self) -> Result<StructuredData> {
        Ok(self.structured_data_extractor()?.extract())
    }

    pub fn content_extractor(&self) -> Result<ContentExtractor<'_>> {
        Ok(ContentExtractor::new(self.require_document()?))
    }

    pub fn content(&self) -> Result<ContentBundle> {
        Ok(self.content_extractor()?.extract())
    }

    // ===== Auxiliary resources =====

    /// Reads the first `Sitemap:` directive from the origin's robots.txt
    ///
    /// Fetch failures are logged and reported as `None`.
    pub async fn sitemap_url(&self) -> Result<Option<String>> {
        let base = self.require_document()?.base_url().clone();
        let Some(robots) = robots_url(&base) else {
            return Ok(None);
        };

        match self.fetch_asset(robots.as_str()).await {
            Ok(body) => Ok(find_sitemap_url(&body)),
            Err(e) => {
                tracing::error!("Robots.txt fetch failed for {}: {}", robots, e);
                Ok(None)
            }
        }
    }

    /// Discovers, fetches and parses the site's sitemap
    ///
    /// Any failure after the precondition check yields an empty list.
    pub async fn sitemap(&self) -> Result<Vec<SitemapEntry>> {
        let Some(sitemap_url) = self.sitemap_url().await? else {
            tracing::debug!("No sitemap advertised");
            return Ok(Vec::new());
        };

        let parsed = match self.fetch_asset(&sitemap_url).await {
            Ok(body) => parse_sitemap(&body),
            Err(e) => Err(e),
        };

        match parsed {
            Ok(entries) => {
                tracing::info!("Sitemap {} lists {} URLs", sitemap_url, entries.len());
                Ok(entries)
            }
            Err(e) => {
                tracing::error!("Sitemap parsing error for {}: {}", sitemap_url, e);
                Ok(Vec::new())
            }
        }
    }

    /// Fetches every RSS feed the document links to
    ///
    /// A feed that fails to load or parse is logged and skipped.
    pub async fn rss_feeds(&self) -> Result<Vec<RssFeed>> {
        let document = self.require_document()?;
        let feed_urls: Vec<String> = document
            .select_attr(r#"link[type="application/rss+xml"]"#, "href")?
            .iter()
            .filter_map(|href| resolve_href(href, document.base_url()))
            .map(|resolved| resolved.href)
            .collect();

        let mut feeds = Vec::with_capacity(feed_urls.len());
        for url in feed_urls {
            let parsed = match self.fetch_asset(&url).await {
                Ok(body) => parse_rss(&body),
                Err(e) => Err(e),
            };
            match parsed {
                Ok(channel) => feeds.push(RssFeed::new(url, channel)),
                Err(e) => tracing::error!("RSS parsing error for {}: {}", url, e),
            }
        }

        Ok(feeds)
    }

    /// Calls a JSON API; any failure yields an empty JSON object
    ///
    /// Parameters are sent as the JSON request body. The session document is left
    /// untouched.
    pub async fn api_request(
        &self,
        endpoint: &str,
        params: &serde_json::Map<String, serde_json::Value>,
        method: Method,
    ) -> serde_json::Value {
        let response = match self.fetcher.request_json(method, endpoint, params).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("API request error for {}: {}", endpoint, e);
                return serde_json::Value::Object(serde_json::Map::new());
            }
        };

        parse_json(&response.text())
    }

    // ===== Queue =====

    /// Queues a page load with an optional transform
    pub fn enqueue(&mut self, url: impl Into<String>, transform: Option<Transform>) {
        self.queue.enqueue(url, transform);
    }

    /// Queues several URLs sharing one transform
    pub fn queue_urls<I, S, F>(&mut self, urls: I, transform: Option<F>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Document) -> Result<serde_json::Value> + 'static,
    {
        let shared = transform.map(Rc::new);
        for url in urls {
            let job_transform = shared.clone().map(|f| -> Transform {
                Box::new(move |document: &Document| f(document))
            });
            self.queue.enqueue(url, job_transform);
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Drains the queue, loading each page through this session
    ///
    /// The session document ends up as the last successfully loaded page.
    pub async fn process_queue(&mut self) -> QueueResults {
        let mut queue = std::mem::take(&mut self.queue);
        queue.process(self).await
    }

    // ===== Plugin capabilities =====

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn plugins_mut(&mut self) -> &mut PluginRegistry {
        &mut self.plugins
    }

    pub fn enable_plugin(&mut self, name: &str) -> Result<()> {
        self.plugins.enable(name)
    }

    pub fn disable_plugin(&mut self, name: &str) -> Result<()> {
        self.plugins.disable(name)
    }

    /// Fetches many pages concurrently through the async-fetch capability
    ///
    /// Results come back in input order and do not replace the session document.
    pub async fn go_many(&self, urls: &[String]) -> Result<Vec<(String, Result<Document>)>> {
        let fetcher = Arc::clone(self.plugins.capabilities().async_fetch()?);
        let outcomes = fetcher.fetch_all(urls).await;

        Ok(outcomes
            .into_iter()
            .map(|(url, result)| {
                let document =
                    result.map(|response| Document::parse(&response.text(), response.final_url));
                (url, document)
            })
            .collect())
    }

    /// Runs the entity-extraction capability over the loaded document
    pub fn extract_entities(&self) -> Result<Vec<Entity>> {
        let extractor = self.plugins.capabilities().entities()?;
        extractor.extract(self.require_document()?)
    }

    /// Fetches a non-HTML document and hands it to the document-parser capability
    pub async fn parse_document(&self, url: &str) -> Result<serde_json::Value> {
        let parser = Arc::clone(self.plugins.capabilities().document_parser()?);
        let response = self.fetcher.get(url).await?;
        parser.parse(url, response.content_type.as_deref(), &response.body)
    }
}

/// Returns the session to idle if a load is abandoned mid-flight
///
/// Dropping the `go` future while a request is outstanding would otherwise leave the
/// session stuck in `Fetching`.
struct LoadGuard<'a> {
    scraper: &'a mut Scraper,
    armed: bool,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("Page load abandoned before completion");
            self.scraper.document = None;
            self.scraper.last_status = None;
            self.scraper.state = SessionState::Idle;
        }
    }
}

#[async_trait(?Send)]
impl DocumentSource for Scraper {
    async fn load(&mut self, url: &str) -> Result<Document> {
        Ok(self.go(url).await?.clone())
    }
}

impl std::fmt::Debug for Scraper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scraper")
            .field("state", &self.state)
            .field("last_status", &self.last_status)
            .field("queued", &self.queue.len())
            .field("plugins", &self.plugins)
            .finish()
    }
}
