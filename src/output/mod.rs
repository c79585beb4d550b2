//! Output module for rendering extraction results
//!
//! This module handles:
//! - Parsing the comma-separated `--extract` list into [`ExtractKind`]s
//! - Running the requested extractions against a loaded session
//! - Rendering the result mapping as pretty-printed JSON

use crate::crawler::Scraper;
use crate::{Result, ScrapeError};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// One extraction the CLI can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractKind {
    Links,
    Images,
    Meta,
    Content,
    Sitemap,
    Rss,
}

impl ExtractKind {
    pub const ALL: [ExtractKind; 6] = [
        ExtractKind::Links,
        ExtractKind::Images,
        ExtractKind::Meta,
        ExtractKind::Content,
        ExtractKind::Sitemap,
        ExtractKind::Rss,
    ];

    /// Key used in the result mapping
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractKind::Links => "links",
            ExtractKind::Images => "images",
            ExtractKind::Meta => "meta",
            ExtractKind::Content => "content",
            ExtractKind::Sitemap => "sitemap",
            ExtractKind::Rss => "rss",
        }
    }
}

impl fmt::Display for ExtractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractKind {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self> {
        ExtractKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ScrapeError::InvalidExtractType(s.to_string()))
    }
}

/// Parses a comma-separated extract list such as `links,meta`
///
/// Blank segments are skipped and repeated kinds collapse to their first occurrence.
pub fn parse_extract_list(list: &str) -> Result<Vec<ExtractKind>> {
    let mut kinds = Vec::new();
    for segment in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let kind: ExtractKind = segment.parse()?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Runs each extraction against the session's loaded document
///
/// Fails with [`ScrapeError::NoDocument`] when nothing has been loaded. Sitemap and
/// RSS failures degrade to empty arrays inside the mapping.
pub async fn run_extractions(scraper: &Scraper, kinds: &[ExtractKind]) -> Result<Map<String, Value>> {
    let mut results = Map::new();

    for kind in kinds {
        let value = match kind {
            ExtractKind::Links => to_json(scraper.links()?)?,
            ExtractKind::Images => to_json(scraper.images()?)?,
            ExtractKind::Meta => to_json(scraper.meta()?)?,
            ExtractKind::Content => to_json(scraper.content()?)?,
            ExtractKind::Sitemap => to_json(scraper.sitemap().await?)?,
            ExtractKind::Rss => to_json(scraper.rss_feeds().await?)?,
        };
        tracing::debug!("Extracted {}", kind);
        results.insert(kind.as_str().to_string(), value);
    }

    Ok(results)
}

/// Renders a result mapping the way the CLI prints it
pub fn render_json(results: &Map<String, Value>) -> Result<String> {
    Ok(serde_json::to_string_pretty(results)?)
}
