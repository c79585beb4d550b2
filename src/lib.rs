//! Pagesift: a rate-limited page fetcher and structured-data extractor
//!
//! This crate fetches web pages under a rolling-window rate limit, parses them into a
//! queryable document, and extracts links, images, metadata, structured-data markup,
//! textual content, sitemaps and RSS feeds. Multi-page crawls run through a FIFO job
//! queue, and optional capabilities (caching, concurrent fetching, entity extraction,
//! document parsing) plug in through an explicit registry.

pub mod config;
pub mod crawler;
pub mod document;
pub mod extract;
pub mod feeds;
pub mod formats;
pub mod output;
pub mod plugins;
pub mod robots;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Pagesift operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error for {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    #[error("No document loaded; call go() before extracting")]
    NoDocument,

    #[error("Plugin capability not available: {0}")]
    PluginUnavailable(String),

    #[error("Invalid session transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::SessionState,
        to: state::SessionState,
    },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid extract type: {0}")]
    InvalidExtractType(String),

    #[error("URL disallowed by robots.txt: {url}")]
    RobotsDenied { url: String },

    #[error("Plugin store error: {0}")]
    PluginStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ScrapeError {
    /// Builds a parse error for the given context (e.g. "sitemap", "rss")
    pub fn parse(context: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Returns true for transport failures that the fetcher may retry
    ///
    /// Redirect-policy and request-building failures repeat identically, so they are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { source, .. } => !source.is_redirect() && !source.is_builder(),
            _ => false,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Pagesift operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::ScraperConfig;
pub use crawler::{QueueScheduler, RateLimiter, Scraper};
pub use document::Document;
pub use state::SessionState;
