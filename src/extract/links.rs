//! Anchor extraction with reference resolution and rel classification

use super::{matches_attributes, non_empty_attr, AttributeFilter};
use crate::document::{element_text, parse_selector};
use crate::url::resolve_href;
use crate::{Document, Result, ScrapeError};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

/// A hyperlink found in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRecord {
    /// Absolute URL (relative hrefs resolved against the document base)
    pub href: String,

    /// Trimmed anchor text
    pub text: String,

    /// URL scheme of the resolved href
    pub protocol: String,

    pub is_nofollow: bool,
    pub is_ugc: bool,
    pub is_sponsored: bool,

    /// Populated `rel`, `class` and `title` attributes only
    pub attributes: BTreeMap<String, String>,
}

/// Extracts `a[href]` elements as [`LinkRecord`]s
///
/// # Example
///
/// ```
/// use pagesift::Document;
/// use pagesift::extract::LinkExtractor;
/// use url::Url;
///
/// let doc = Document::parse(
///     r#"<a href="/about" rel="nofollow">About</a>"#,
///     Url::parse("https://example.com").unwrap(),
/// );
/// let links = LinkExtractor::new(&doc).extract();
/// assert_eq!(links[0].href, "https://example.com/about");
/// assert!(links[0].is_nofollow);
/// ```
#[derive(Debug, Clone)]
pub struct LinkExtractor<'a> {
    document: &'a Document,
    url_pattern: Option<Regex>,
    attributes: AttributeFilter,
}

impl<'a> LinkExtractor<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self {
            document,
            url_pattern: None,
            attributes: AttributeFilter::new(),
        }
    }

    /// Keeps only links whose resolved href matches the regular expression
    pub fn url_regex(mut self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| ScrapeError::InvalidFilter(format!("url regex '{}': {}", pattern, e)))?;
        self.url_pattern = Some(regex);
        Ok(self)
    }

    /// Keeps only links whose `name` attribute equals `value`
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Runs the extraction in document order
    pub fn extract(&self) -> Vec<LinkRecord> {
        let Ok(selector) = parse_selector("a[href]") else {
            return Vec::new();
        };

        let base = self.document.base_url();
        let mut links = Vec::new();

        for element in self.document.html().select(&selector) {
            let Some(href) = non_empty_attr(&element, "href") else {
                continue;
            };
            let Some(resolved) = resolve_href(href, base) else {
                continue;
            };

            if let Some(pattern) = &self.url_pattern {
                if !pattern.is_match(&resolved.href) {
                    continue;
                }
            }

            if !matches_attributes(&element, &self.attributes) {
                continue;
            }

            let rel = element
                .value()
                .attr("rel")
                .unwrap_or_default()
                .to_ascii_lowercase();

            let attributes = ["rel", "class", "title"]
                .into_iter()
                .filter_map(|name| {
                    non_empty_attr(&element, name).map(|v| (name.to_string(), v.to_string()))
                })
                .collect();

            links.push(LinkRecord {
                href: resolved.href,
                text: element_text(&element),
                protocol: resolved.scheme,
                is_nofollow: rel.contains("nofollow"),
                is_ugc: rel.contains("ugc"),
                is_sponsored: rel.contains("sponsored"),
                attributes,
            });
        }

        tracing::debug!("Extracted {} links from {}", links.len(), base);
        links
    }
}
