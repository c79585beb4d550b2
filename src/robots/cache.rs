//! Robots.txt caching implementation
//!
//! Parsed robots.txt files are cached per origin and refetched after 24 hours.

use crate::robots::ParsedRobots;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Cached robots.txt data for an origin
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// The parsed robots.txt content
    pub content: ParsedRobots,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    /// Creates a new CachedRobots stamped with the current time
    pub fn new(content: ParsedRobots) -> Self {
        Self {
            content,
            fetched_at: Utc::now(),
        }
    }

    /// Checks if the cached robots.txt is older than 24 hours
    pub fn is_stale(&self) -> bool {
        self.age() > Duration::hours(24)
    }

    /// Returns the age of the cached robots.txt
    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }

    /// Checks if a URL is allowed according to the cached robots.txt
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        self.content.is_allowed(url, user_agent)
    }
}

/// Per-origin robots.txt cache keyed by `scheme://host[:port]`
#[derive(Debug, Clone, Default)]
pub struct RobotsCache {
    entries: HashMap<String, CachedRobots>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached entry for an origin unless it is stale
    pub fn get_fresh(&self, origin: &str) -> Option<&CachedRobots> {
        self.entries.get(origin).filter(|cached| !cached.is_stale())
    }

    pub fn insert(&mut self, origin: impl Into<String>, robots: ParsedRobots) {
        self.entries.insert(origin.into(), CachedRobots::new(robots));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cache_not_stale() {
        let cache = CachedRobots::new(ParsedRobots::allow_all());
        assert!(!cache.is_stale());
    }

    #[test]
    fn test_cache_is_stale() {
        let mut cache = CachedRobots::new(ParsedRobots::allow_all());
        cache.fetched_at = Utc::now() - Duration::hours(25);
        assert!(cache.is_stale());
    }

    #[test]
    fn test_cache_not_stale_at_23_hours() {
        let mut cache = CachedRobots::new(ParsedRobots::allow_all());
        cache.fetched_at = Utc::now() - Duration::hours(23);
        assert!(!cache.is_stale());
    }

    #[test]
    fn test_is_allowed_delegates_to_content() {
        let cache = CachedRobots::new(ParsedRobots::from_content("User-agent: *\nDisallow: /x"));
        assert!(cache.is_allowed("https://a.test/", "TestBot"));
        assert!(!cache.is_allowed("https://a.test/x", "TestBot"));
    }

    #[test]
    fn test_origin_cache_skips_stale() {
        let mut cache = RobotsCache::new();
        cache.insert("https://a.test", ParsedRobots::allow_all());
        assert!(cache.get_fresh("https://a.test").is_some());
        assert!(cache.get_fresh("https://b.test").is_none());

        if let Some(entry) = cache.entries.get_mut("https://a.test") {
            entry.fetched_at = Utc::now() - Duration::hours(30);
        }
        assert!(cache.get_fresh("https://a.test").is_none());
        assert!(cache.entries.contains_key("https://a.test"));
    }
}
