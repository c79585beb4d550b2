//! Optional capabilities and the plugin registry
//!
//! Plugins fill capability slots on a session: response caching around page loads,
//! bounded concurrent fetching, entity extraction and non-HTML document parsing.
//! Which plugins are enabled persists through a [`ConfigStore`].

mod builtin;
mod cache;
mod capabilities;
mod entities;
mod registry;
mod store;

pub use builtin::{AsyncPlugin, CachePlugin, NlpPlugin};
pub use cache::{cache_key, MemoryCache, DEFAULT_CACHE_TTL};
pub use capabilities::{
    AsyncFetch, Capabilities, CacheStore, DocumentParser, Entity, EntityExtractor,
};
pub use entities::KeywordEntityExtractor;
pub use registry::{PluginFactory, PluginRegistry};
pub use store::{ConfigStore, JsonFileStore, MemoryStore, PluginEntry, PluginSettings};

use crate::config::ScraperConfig;
use crate::crawler::Fetcher;

/// What a plugin sees of the session when it registers
#[derive(Debug, Clone)]
pub struct PluginContext {
    pub config: ScraperConfig,

    /// The session fetcher; clones share its rate window
    pub fetcher: Fetcher,
}

/// A named unit that installs capabilities into a session
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn register(&self, capabilities: &mut Capabilities, context: &PluginContext);

    fn unregister(&self, capabilities: &mut Capabilities);
}
