//! Plugin-based provider registry
//!
//! The registry lets DNS provider adapters and local stores be registered at
//! runtime, so the daemon never hard-codes which implementations exist.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dnsmirror_core::registry::ProviderRegistry;
//! use dnsmirror_core::config::ProviderConfig;
//!
//! let registry = ProviderRegistry::with_builtin_stores();
//! dnsmirror_provider_cloudflare::register(&registry);
//!
//! let config = ProviderConfig::Cloudflare { api_token, account_id: None };
//! let provider = registry.create_provider(&config)?;
//! ```

use crate::config::{LocalStoreConfig, ProviderConfig};
use crate::error::{Error, Result};
use crate::state::{FileLocalStoreFactory, MemoryLocalStoreFactory};
use crate::traits::{DnsProvider, DnsProviderFactory, LocalStore, LocalStoreFactory};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Registry of provider and local store factories
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered DNS provider factories
    providers: RwLock<HashMap<String, Box<dyn DnsProviderFactory>>>,

    /// Registered local store factories
    local_stores: RwLock<HashMap<String, Arc<dyn LocalStoreFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the `memory` and `file` local stores registered
    pub fn with_builtin_stores() -> Self {
        let registry = Self::new();
        registry.register_local_store("memory", Box::new(MemoryLocalStoreFactory));
        registry.register_local_store("file", Box::new(FileLocalStoreFactory));
        registry
    }

    /// Register a DNS provider factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "cloudflare", "route53")
    /// - `factory`: Factory object for creating provider instances
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn DnsProviderFactory>) {
        write(&self.providers).insert(name.into(), factory);
    }

    /// Register a local store factory
    ///
    /// # Parameters
    ///
    /// - `name`: Store type name (e.g., "file", "memory")
    /// - `factory`: Factory object for creating store instances
    pub fn register_local_store(
        &self,
        name: impl Into<String>,
        factory: Box<dyn LocalStoreFactory>,
    ) {
        write(&self.local_stores).insert(name.into(), Arc::from(factory));
    }

    /// Create a DNS provider from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn DnsProvider>)`: Created provider instance
    /// - `Err(Error)`: If provider type is not registered or creation fails
    pub fn create_provider(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        let provider_type = config.type_name();
        let providers = read(&self.providers);

        let factory = providers
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// Create a local store from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn LocalStore>)`: Created store instance
    /// - `Err(Error)`: If store type is not registered or creation fails
    pub async fn create_local_store(
        &self,
        config: &LocalStoreConfig,
    ) -> Result<Box<dyn LocalStore>> {
        let store_type = config.type_name();

        let factory = read(&self.local_stores)
            .get(store_type)
            .cloned()
            .ok_or_else(|| Error::config(format!("Unknown local store type: {}", store_type)))?;

        // The lock guard is gone before awaiting
        let config_json = serde_json::to_value(config)?;
        factory.create(&config_json).await
    }

    /// List all registered provider types
    pub fn list_providers(&self) -> Vec<String> {
        read(&self.providers).keys().cloned().collect()
    }

    /// List all registered local store types
    pub fn list_local_stores(&self) -> Vec<String> {
        read(&self.local_stores).keys().cloned().collect()
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        read(&self.providers).contains_key(name)
    }

    /// Check if a local store type is registered
    pub fn has_local_store(&self, name: &str) -> bool {
        read(&self.local_stores).contains_key(name)
    }
}

// A panic while holding a registry lock cannot leave the map half-written,
// so poisoning is ignored.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
