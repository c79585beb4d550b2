//! Capability traits that plugins install into a session
//!
//! Every slot is optional. Callers check a slot before use and report
//! [`ScrapeError::PluginUnavailable`](crate::ScrapeError::PluginUnavailable) when it
//! is empty.

use crate::crawler::FetchResult;
use crate::{Document, Result, ScrapeError};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Fetches many URLs with bounded concurrency
#[async_trait]
pub trait AsyncFetch: Send + Sync {
    /// Fetches every URL, returning per-URL outcomes in input order
    async fn fetch_all(&self, urls: &[String]) -> Vec<(String, Result<FetchResult>)>;
}

/// Key/value store for fetched page bodies
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&self, key: &str, body: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// A keyword entity with its ranking score and share of the text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub keyword: String,
    pub score: f64,
    /// Occurrences per hundred words
    pub density: f64,
}

/// Pulls named entities or key phrases out of a document
pub trait EntityExtractor: Send + Sync {
    fn extract(&self, document: &Document) -> Result<Vec<Entity>>;
}

/// Turns non-HTML documents (PDF and similar) into structured data
pub trait DocumentParser: Send + Sync {
    fn parse(&self, url: &str, content_type: Option<&str>, body: &[u8])
        -> Result<serde_json::Value>;
}

/// The optional capability slots of a session
#[derive(Clone, Default)]
pub struct Capabilities {
    pub async_fetch: Option<Arc<dyn AsyncFetch>>,
    pub cache: Option<Arc<dyn CacheStore>>,
    pub entities: Option<Arc<dyn EntityExtractor>>,
    pub document_parser: Option<Arc<dyn DocumentParser>>,
}

impl Capabilities {
    pub fn async_fetch(&self) -> Result<&Arc<dyn AsyncFetch>> {
        self.async_fetch
            .as_ref()
            .ok_or_else(|| ScrapeError::PluginUnavailable("async fetch".to_string()))
    }

    pub fn entities(&self) -> Result<&Arc<dyn EntityExtractor>> {
        self.entities
            .as_ref()
            .ok_or_else(|| ScrapeError::PluginUnavailable("entity extraction".to_string()))
    }

    pub fn document_parser(&self) -> Result<&Arc<dyn DocumentParser>> {
        self.document_parser
            .as_ref()
            .ok_or_else(|| ScrapeError::PluginUnavailable("document parsing".to_string()))
    }

    /// Names of the slots currently filled
    pub fn installed(&self) -> Vec<&'static str> {
        [
            ("async_fetch", self.async_fetch.is_some()),
            ("cache", self.cache.is_some()),
            ("entities", self.entities.is_some()),
            ("document_parser", self.document_parser.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("installed", &self.installed())
            .finish()
    }
}
