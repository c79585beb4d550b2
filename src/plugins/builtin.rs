//! Plugins shipped with the crate

use super::{Capabilities, KeywordEntityExtractor, MemoryCache, Plugin, PluginContext};
use crate::crawler::ConcurrentFetcher;
use std::sync::Arc;
use std::time::Duration;

/// Caches page bodies in memory around `go`
#[derive(Debug, Clone)]
pub struct CachePlugin {
    pub ttl: Duration,
}

impl Default for CachePlugin {
    fn default() -> Self {
        Self {
            ttl: super::DEFAULT_CACHE_TTL,
        }
    }
}

impl Plugin for CachePlugin {
    fn name(&self) -> &str {
        "CachePlugin"
    }

    fn register(&self, capabilities: &mut Capabilities, _context: &PluginContext) {
        capabilities.cache = Some(Arc::new(MemoryCache::new(self.ttl)));
    }

    fn unregister(&self, capabilities: &mut Capabilities) {
        capabilities.cache = None;
    }
}

/// Enables bounded concurrent fetching through `go_many`
///
/// The concurrent fetcher shares the session rate window.
#[derive(Debug, Clone, Default)]
pub struct AsyncPlugin {
    /// Overrides the configured `max-concurrent` when set
    pub max_concurrent: Option<usize>,
}

impl Plugin for AsyncPlugin {
    fn name(&self) -> &str {
        "AsyncPlugin"
    }

    fn register(&self, capabilities: &mut Capabilities, context: &PluginContext) {
        let limit = self.max_concurrent.unwrap_or(context.config.max_concurrent);
        capabilities.async_fetch = Some(Arc::new(ConcurrentFetcher::new(
            context.fetcher.clone(),
            limit,
        )));
    }

    fn unregister(&self, capabilities: &mut Capabilities) {
        capabilities.async_fetch = None;
    }
}

/// Keyword entity extraction through `extract_entities`
#[derive(Debug, Clone, Default)]
pub struct NlpPlugin {
    pub extractor: KeywordEntityExtractor,
}

impl Plugin for NlpPlugin {
    fn name(&self) -> &str {
        "NLPPlugin"
    }

    fn register(&self, capabilities: &mut Capabilities, _context: &PluginContext) {
        capabilities.entities = Some(Arc::new(self.extractor.clone()));
    }

    fn unregister(&self, capabilities: &mut Capabilities) {
        capabilities.entities = None;
    }
}
