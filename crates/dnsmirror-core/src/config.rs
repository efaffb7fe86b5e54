//! Configuration types for the DNS mirror
//!
//! This module defines all configuration structures used throughout the crate.

use crate::alert::AlertPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Main mirror configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Local store configuration
    #[serde(default)]
    pub local_store: LocalStoreConfig,

    /// Domains to mirror
    pub domains: Vec<DomainConfig>,

    /// Sync driver settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Which changes raise alerts
    #[serde(default)]
    pub alert: AlertPolicy,
}

impl MirrorConfig {
    /// Create a configuration for the given provider with defaults elsewhere
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            local_store: LocalStoreConfig::default(),
            domains: Vec::new(),
            sync: SyncConfig::default(),
            alert: AlertPolicy::default(),
        }
    }

    /// Add a domain to mirror
    pub fn with_domain(mut self, domain: DomainConfig) -> Self {
        self.domains.push(domain);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.domains.is_empty() {
            return Err(crate::Error::config("No domains configured"));
        }

        let mut seen = HashSet::new();
        for domain in &self.domains {
            if domain.name.trim().is_empty() {
                return Err(crate::Error::config("Domain name cannot be empty"));
            }
            if !seen.insert(domain.name.as_str()) {
                return Err(crate::Error::config(format!(
                    "Domain configured more than once: {}",
                    domain.name
                )));
            }
        }

        self.provider.validate()?;
        self.sync.validate()?;

        Ok(())
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Cloudflare provider
    Cloudflare {
        /// Cloudflare API token
        api_token: String,
        /// Account ID (optional)
        #[serde(default)]
        account_id: Option<String>,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Cloudflare { api_token, .. } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("Cloudflare API token cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Cloudflare { .. } => "cloudflare",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Local store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LocalStoreConfig {
    /// File-based local store
    File {
        /// Path to the store file
        path: String,
    },

    /// In-memory local store (not persistent)
    #[default]
    Memory,

    /// Custom local store
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl LocalStoreConfig {
    /// Get the store type name
    pub fn type_name(&self) -> &str {
        match self {
            LocalStoreConfig::File { .. } => "file",
            LocalStoreConfig::Memory => "memory",
            LocalStoreConfig::Custom { factory, .. } => factory,
        }
    }
}

/// A mirrored domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Domain (zone) name, e.g. "example.com"
    pub name: String,

    /// Provider zone identifier; looked up by name when absent
    #[serde(default)]
    pub zone_id: Option<String>,

    /// Whether this domain is synced
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl DomainConfig {
    /// Create a new enabled domain configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            zone_id: None,
            enabled: true,
        }
    }

    /// Set the provider zone identifier
    pub fn with_zone_id(mut self, zone_id: impl Into<String>) -> Self {
        self.zone_id = Some(zone_id.into());
        self
    }

    /// Enable or disable the domain
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

fn default_enabled() -> bool {
    true
}

/// Sync driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Seconds between sync passes
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Maximum number of retry attempts for a failed provider fetch
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Delay between retry attempts (in seconds)
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Capacity of the sync event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Reconcile and report without writing to the local store
    #[serde(default)]
    pub dry_run: bool,
}

impl SyncConfig {
    /// Validate the sync configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Sync interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            event_channel_capacity: default_event_channel_capacity(),
            dry_run: false,
        }
    }
}

fn default_interval_secs() -> u64 {
    300
}

fn default_max_retries() -> usize {
    3
}

fn default_retry_delay_secs() -> u64 {
    5
}

fn default_event_channel_capacity() -> usize {
    1000
}
