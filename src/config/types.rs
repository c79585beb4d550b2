use serde::Deserialize;

/// Default user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; Pagesift/1.0; +https://github.com/pagesift/pagesift)";

/// Main configuration structure for a scraping session
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ScraperConfig {
    /// User-Agent header value
    pub user_agent: String,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,

    /// Whether HTTP redirects are followed
    pub follow_redirects: bool,

    /// Number of attempts made for a request before a transport error is surfaced
    pub max_retries: u32,

    /// Shared rolling-window request quota
    pub rate_limit: RateLimitConfig,

    /// Maximum number of in-flight requests in concurrent mode
    pub max_concurrent: usize,

    /// Consult robots.txt before loading a page
    pub respect_robots_txt: bool,

    /// Path of the JSON file holding plugin enable/disable state
    pub plugins_file: Option<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            follow_redirects: true,
            max_retries: 3,
            rate_limit: RateLimitConfig::default(),
            max_concurrent: 10,
            respect_robots_txt: false,
            plugins_file: None,
        }
    }
}

/// Rolling-window rate limit settings
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RateLimitConfig {
    /// Requests admitted per window
    pub requests: usize,

    /// Window length (milliseconds)
    pub window_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests: 10,
            window_ms: 1000,
        }
    }
}
