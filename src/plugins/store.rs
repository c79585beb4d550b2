//! Persistence for plugin enable/disable state
//!
//! The stored shape is `{"plugins": {"<Name>": {"enabled": bool}}}`.

use crate::{Result, ScrapeError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginEntry {
    pub enabled: bool,
}

/// Persisted plugin state, keyed by plugin name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSettings {
    #[serde(default)]
    pub plugins: BTreeMap<String, PluginEntry>,
}

impl PluginSettings {
    pub fn is_enabled(&self, name: &str) -> bool {
        self.plugins.get(name).map_or(false, |entry| entry.enabled)
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) {
        self.plugins
            .insert(name.to_string(), PluginEntry { enabled });
    }

    /// Names of enabled plugins in name order
    pub fn enabled(&self) -> impl Iterator<Item = &str> {
        self.plugins
            .iter()
            .filter(|(_, entry)| entry.enabled)
            .map(|(name, _)| name.as_str())
    }
}

/// Loads and saves [`PluginSettings`]
pub trait ConfigStore: Send + Sync {
    fn load(&self) -> Result<PluginSettings>;
    fn save(&self, settings: &PluginSettings) -> Result<()>;
}

/// Stores settings as pretty-printed JSON in a file
///
/// A missing file reads as empty settings.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for JsonFileStore {
    fn load(&self) -> Result<PluginSettings> {
        if !self.path.exists() {
            return Ok(PluginSettings::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|e| {
            ScrapeError::PluginStore(format!("{}: {}", self.path.display(), e))
        })
    }

    fn save(&self, settings: &PluginSettings) -> Result<()> {
        let content = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, content)?;
        tracing::debug!("Saved plugin settings to {}", self.path.display());
        Ok(())
    }
}

/// Keeps settings in memory; used by tests and embedded callers
#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: Mutex<PluginSettings>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: PluginSettings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }
}

impl ConfigStore for MemoryStore {
    fn load(&self) -> Result<PluginSettings> {
        self.settings
            .lock()
            .map(|settings| settings.clone())
            .map_err(|_| ScrapeError::PluginStore("settings lock poisoned".to_string()))
    }

    fn save(&self, settings: &PluginSettings) -> Result<()> {
        let mut guard = self
            .settings
            .lock()
            .map_err(|_| ScrapeError::PluginStore("settings lock poisoned".to_string()))?;
        *guard = settings.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_json_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("plugins.json"));

        assert_eq!(store.load().unwrap(), PluginSettings::default());

        let mut settings = PluginSettings::default();
        settings.set_enabled("CachePlugin", true);
        settings.set_enabled("NLPPlugin", false);
        store.save(&settings).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(
            raw,
            serde_json::json!({"plugins": {
                "CachePlugin": {"enabled": true},
                "NLPPlugin": {"enabled": false}
            }})
        );

        let loaded = store.load().unwrap();
        assert!(loaded.is_enabled("CachePlugin"));
        assert!(!loaded.is_enabled("NLPPlugin"));
        assert_eq!(loaded.enabled().collect::<Vec<_>>(), vec!["CachePlugin"]);
    }

    #[test]
    fn test_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plugins.json");
        std::fs::write(&path, "{not json").unwrap();

        let result = JsonFileStore::new(path).load();
        assert!(matches!(result, Err(ScrapeError::PluginStore(_))));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        let mut settings = store.load().unwrap();
        settings.set_enabled("AsyncPlugin", true);
        store.save(&settings).unwrap();
        assert!(store.load().unwrap().is_enabled("AsyncPlugin"));
    }
}
