//! Plugin registry: persisted enable/disable state plus live capability slots

use super::{
    AsyncPlugin, CachePlugin, Capabilities, ConfigStore, NlpPlugin, Plugin, PluginContext,
    PluginSettings,
};
use crate::Result;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Builds a plugin instance by name
pub type PluginFactory = Box<dyn Fn() -> Box<dyn Plugin> + Send + Sync>;

/// Tracks which plugins are enabled and the capabilities they installed
///
/// Enabling or disabling a plugin always persists the new state, even for names
/// with no known factory; such names simply register nothing.
pub struct PluginRegistry {
    store: Arc<dyn ConfigStore>,
    settings: PluginSettings,
    factories: BTreeMap<String, PluginFactory>,
    active: BTreeMap<String, Box<dyn Plugin>>,
    capabilities: Capabilities,
    context: PluginContext,
}

impl PluginRegistry {
    /// Creates a registry with the built-in factories and activates every plugin the
    /// store marks as enabled
    pub fn new(store: Arc<dyn ConfigStore>, context: PluginContext) -> Result<Self> {
        let settings = store.load()?;

        let mut registry = Self {
            store,
            settings,
            factories: BTreeMap::new(),
            active: BTreeMap::new(),
            capabilities: Capabilities::default(),
            context,
        };

        registry.register_factory("CachePlugin", || Box::new(CachePlugin::default()));
        registry.register_factory("AsyncPlugin", || Box::new(AsyncPlugin::default()));
        registry.register_factory("NLPPlugin", || Box::new(NlpPlugin::default()));

        let enabled: Vec<String> = registry.settings.enabled().map(str::to_string).collect();
        for name in enabled {
            registry.activate(&name);
        }

        Ok(registry)
    }

    /// Makes a plugin constructible by name
    pub fn register_factory<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Installs a plugin instance directly, without touching persisted state
    pub fn install(&mut self, plugin: Box<dyn Plugin>) {
        plugin.register(&mut self.capabilities, &self.context);
        tracing::info!("Installed plugin {}", plugin.name());
        self.active.insert(plugin.name().to_string(), plugin);
    }

    /// Enables a plugin by name and persists the change
    pub fn enable(&mut self, name: &str) -> Result<()> {
        self.settings.set_enabled(name, true);
        self.store.save(&self.settings)?;
        self.activate(name);
        Ok(())
    }

    /// Disables a plugin by name, removes its capabilities and persists the change
    pub fn disable(&mut self, name: &str) -> Result<()> {
        self.settings.set_enabled(name, false);
        self.store.save(&self.settings)?;

        if let Some(plugin) = self.active.remove(name) {
            plugin.unregister(&mut self.capabilities);
            tracing::info!("Disabled plugin {}", name);
        }
        Ok(())
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.settings.is_enabled(name)
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains_key(name)
    }

    /// Names of plugins whose capabilities are installed
    pub fn active(&self) -> Vec<&str> {
        self.active.keys().map(String::as_str).collect()
    }

    pub fn settings(&self) -> &PluginSettings {
        &self.settings
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Direct access to the slots, for installing ad-hoc collaborators
    pub fn capabilities_mut(&mut self) -> &mut Capabilities {
        &mut self.capabilities
    }

    /// Swaps the context handed to plugins and re-registers every active plugin with it
    ///
    /// Capabilities built from the old context (e.g. a concurrent fetcher with a stale
    /// client) are replaced; state those capabilities held is lost.
    pub fn set_context(&mut self, context: PluginContext) {
        self.context = context;
        for (name, plugin) in &self.active {
            plugin.unregister(&mut self.capabilities);
            plugin.register(&mut self.capabilities, &self.context);
            tracing::debug!("Re-registered plugin {} with new context", name);
        }
    }

    fn activate(&mut self, name: &str) {
        if self.active.contains_key(name) {
            return;
        }
        match self.factories.get(name) {
            Some(factory) => {
                let plugin = factory();
                plugin.register(&mut self.capabilities, &self.context);
                tracing::info!("Enabled plugin {}", name);
                self.active.insert(name.to_string(), plugin);
            }
            None => tracing::warn!("Unknown plugin {}, nothing registered", name),
        }
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("settings", &self.settings)
            .field("active", &self.active())
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScraperConfig;
    use crate::crawler::Fetcher;
    use crate::plugins::MemoryStore;

    fn context() -> PluginContext {
        let config = ScraperConfig::default();
        let fetcher = Fetcher::new(&config).unwrap();
        PluginContext { config, fetcher }
    }

    #[test]
    fn test_enable_and_disable_persist() {
        let store = Arc::new(MemoryStore::new());
        let mut registry = PluginRegistry::new(store.clone(), context()).unwrap();

        registry.enable("CachePlugin").unwrap();
        assert!(registry.is_active("CachePlugin"));
        assert!(registry.capabilities().cache.is_some());
        assert!(store.load().unwrap().is_enabled("CachePlugin"));

        registry.disable("CachePlugin").unwrap();
        assert!(!registry.is_active("CachePlugin"));
        assert!(registry.capabilities().cache.is_none());
        assert!(!store.load().unwrap().is_enabled("CachePlugin"));
    }

    #[test]
    fn test_enabled_plugins_load_at_startup() {
        let mut settings = PluginSettings::default();
        settings.set_enabled("NLPPlugin", true);
        settings.set_enabled("AsyncPlugin", false);
        let store = Arc::new(MemoryStore::with_settings(settings));

        let registry = PluginRegistry::new(store, context()).unwrap();
        assert_eq!(registry.active(), vec!["NLPPlugin"]);
        assert!(registry.capabilities().entities.is_some());
        assert!(registry.capabilities().async_fetch.is_none());
    }

    #[test]
    fn test_unknown_plugin_persists_but_registers_nothing() {
        let store = Arc::new(MemoryStore::new());
        let mut registry = PluginRegistry::new(store.clone(), context()).unwrap();

        registry.enable("HeadlessPlugin").unwrap();
        assert!(registry.is_enabled("HeadlessPlugin"));
        assert!(!registry.is_active("HeadlessPlugin"));
        assert!(registry.capabilities().installed().is_empty());
        assert!(store.load().unwrap().is_enabled("HeadlessPlugin"));
    }

    #[test]
    fn test_set_context_keeps_active_plugins() {
        let mut registry =
            PluginRegistry::new(Arc::new(MemoryStore::new()), context()).unwrap();
        registry.enable("AsyncPlugin").unwrap();
        registry.enable("NLPPlugin").unwrap();

        let config = ScraperConfig {
            user_agent: "Changed/1.0".to_string(),
            ..ScraperConfig::default()
        };
        let fetcher = Fetcher::new(&config).unwrap();
        registry.set_context(PluginContext { config, fetcher });

        assert_eq!(registry.active(), vec!["AsyncPlugin", "NLPPlugin"]);
        assert!(registry.capabilities().async_fetch.is_some());
        assert!(registry.capabilities().entities.is_some());
    }

    #[test]
    fn test_enable_twice_is_idempotent() {
        let mut registry =
            PluginRegistry::new(Arc::new(MemoryStore::new()), context()).unwrap();
        registry.enable("AsyncPlugin").unwrap();
        registry.enable("AsyncPlugin").unwrap();
        assert_eq!(registry.active(), vec!["AsyncPlugin"]);
    }
}
