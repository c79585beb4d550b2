use url::Url;

/// A reference resolved against a document base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHref {
    /// Absolute URL string
    pub href: String,

    /// URL scheme (e.g. "https", "mailto")
    pub scheme: String,
}

/// Resolves an href against a base URL
///
/// Absolute references are returned exactly as written (trimmed), so resolution is
/// idempotent. Relative references (path, query, fragment or scheme-relative) are
/// merged with the base per RFC 3986.
///
/// Returns None for empty hrefs and references that cannot be resolved.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use pagesift::url::resolve_href;
///
/// let base = Url::parse("https://example.com").unwrap();
/// let resolved = resolve_href("/about", &base).unwrap();
/// assert_eq!(resolved.href, "https://example.com/about");
/// assert_eq!(resolved.scheme, "https");
/// ```
pub fn resolve_href(href: &str, base: &Url) -> Option<ResolvedHref> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    // Already absolute: pass through unchanged
    if let Ok(absolute) = Url::parse(href) {
        return Some(ResolvedHref {
            href: href.to_string(),
            scheme: absolute.scheme().to_string(),
        });
    }

    match base.join(href) {
        Ok(joined) => Some(ResolvedHref {
            scheme: joined.scheme().to_string(),
            href: joined.into(),
        }),
        Err(e) => {
            tracing::debug!("Failed to resolve {} against {}: {}", href, base, e);
            None
        }
    }
}

/// Returns the robots.txt location for the origin of the given URL
pub fn robots_url(base: &Url) -> Option<Url> {
    base.join("/robots.txt").ok()
}

/// Returns a lowercase `scheme://host[:port]` key identifying the URL's origin
pub fn origin_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}
