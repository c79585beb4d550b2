//! In-memory TTL cache and cache key derivation

use super::CacheStore;
use crate::crawler::Params;
use crate::{Result, ScrapeError};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default time-to-live for cached bodies
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Derives the cache key for a request: hex SHA-256 of url, method and the JSON
/// encoding of the parameters, concatenated
pub fn cache_key(url: &str, method: &str, params: &Params) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(method.as_bytes());
    hasher.update(serde_json::to_string(params).unwrap_or_default().as_bytes());
    hex::encode(hasher.finalize())
}

/// Process-local cache whose entries expire after a fixed TTL
#[derive(Debug)]
pub struct MemoryCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, (String, Instant)>>> {
        self.entries
            .lock()
            .map_err(|_| ScrapeError::PluginStore("cache lock poisoned".to_string()))
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some((body, stored_at)) if stored_at.elapsed() < self.ttl => Ok(Some(body.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, body: &str) -> Result<()> {
        self.lock()?
            .insert(key.to_string(), (body.to_string(), Instant::now()));
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }
}
