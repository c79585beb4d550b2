//! Robots.txt parser implementation
//!
//! Allow/disallow matching is delegated to the robotstxt crate; sitemap discovery
//! reads `Sitemap:` lines directly.

use once_cell::sync::Lazy;
use regex::Regex;
use robotstxt::DefaultMatcher;

// `Sitemap:` directive at the start of a line, any case
static SITEMAP_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^[ \t]*sitemap:[ \t]*(\S.*?)[ \t]*\r?$").expect("Invalid sitemap pattern"));

/// Returns the value of the first `Sitemap:` directive in a robots.txt body
///
/// # Example
///
/// ```
/// use pagesift::robots::find_sitemap_url;
///
/// let body = "User-agent: *\nSitemap: https://x.test/sitemap.xml\n";
/// assert_eq!(find_sitemap_url(body), Some("https://x.test/sitemap.xml".to_string()));
/// ```
pub fn find_sitemap_url(body: &str) -> Option<String> {
    SITEMAP_DIRECTIVE
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Parsed robots.txt data
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    /// Whether to allow all (true = allow all, false = parse content)
    allow_all: bool,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// Used when an origin serves no robots.txt.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Returns the raw robots.txt content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL (or path) to check
    /// * `user_agent` - The user agent string
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }
}
