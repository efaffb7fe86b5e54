// # dnsmirrord - DNS Mirror Daemon
//
// Thin integration layer: all reconciliation and sync logic lives in
// dnsmirror-core. The daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Registering providers and local stores
// 4. Running the sync engine until SIGTERM/SIGINT
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### DNS Provider
// - `DNSMIRROR_PROVIDER_TYPE`: Provider type (cloudflare)
// - `DNSMIRROR_PROVIDER_API_TOKEN`: API token
// - `DNSMIRROR_PROVIDER_ACCOUNT_ID`: Account ID used to scope zone lookups (optional)
//
// ### Domains
// - `DNSMIRROR_DOMAINS`: Comma-separated list, each `name` or `name:zone_id`
//
// ### Local Store
// - `DNSMIRROR_STORE_TYPE`: Type of local store (file, memory)
// - `DNSMIRROR_STORE_PATH`: Path to store file (for file store)
//
// ### Sync
// - `DNSMIRROR_SYNC_INTERVAL_SECS`: Seconds between sync passes
// - `DNSMIRROR_MAX_RETRIES`: Maximum retry attempts per fetch (0 disables)
// - `DNSMIRROR_RETRY_DELAY_SECS`: Delay between retries
// - `DNSMIRROR_MODE`: `live` (default) or `dry-run`
// - `DNSMIRROR_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export DNSMIRROR_PROVIDER_TYPE=cloudflare
// export DNSMIRROR_PROVIDER_API_TOKEN=your_token
// export DNSMIRROR_DOMAINS=example.com,example.org:023e105f4ecef8ad9ca31a8372d0c353
// export DNSMIRROR_STORE_TYPE=file
// export DNSMIRROR_STORE_PATH=/var/lib/dnsmirror/records.json
//
// dnsmirrord
// ```

use anyhow::{Context, Result};
use dnsmirror_core::{
    DomainConfig, LocalStoreConfig, MirrorConfig, ProviderConfig, ProviderRegistry, SyncConfig,
    SyncEngine, SyncEvent,
};
use std::env;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum MirrorExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<MirrorExitCode> for ExitCode {
    fn from(code: MirrorExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    provider_type: String,
    provider_api_token: String,
    provider_account_id: Option<String>,
    domains: Vec<DomainConfig>,
    store_type: String,
    store_path: Option<String>,
    sync_interval_secs: Option<u64>,
    max_retries: Option<usize>,
    retry_delay_secs: Option<u64>,
    dry_run: bool,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mode = lookup("DNSMIRROR_MODE").unwrap_or_else(|| "live".to_string());
        let dry_run = match mode.to_lowercase().as_str() {
            "live" => false,
            "dry-run" => true,
            other => anyhow::bail!(
                "DNSMIRROR_MODE '{}' is not valid. Valid modes: live, dry-run",
                other
            ),
        };

        Ok(Self {
            provider_type: lookup("DNSMIRROR_PROVIDER_TYPE")
                .unwrap_or_else(|| "cloudflare".to_string()),
            provider_api_token: lookup("DNSMIRROR_PROVIDER_API_TOKEN")
                .context("DNSMIRROR_PROVIDER_API_TOKEN is not set")?,
            provider_account_id: lookup("DNSMIRROR_PROVIDER_ACCOUNT_ID")
                .filter(|s| !s.is_empty()),
            domains: parse_domains(&lookup("DNSMIRROR_DOMAINS").unwrap_or_default()),
            store_type: lookup("DNSMIRROR_STORE_TYPE").unwrap_or_else(|| "file".to_string()),
            store_path: lookup("DNSMIRROR_STORE_PATH"),
            sync_interval_secs: parse_number(&lookup, "DNSMIRROR_SYNC_INTERVAL_SECS")?,
            max_retries: parse_number(&lookup, "DNSMIRROR_MAX_RETRIES")?,
            retry_delay_secs: parse_number(&lookup, "DNSMIRROR_RETRY_DELAY_SECS")?,
            dry_run,
            log_level: lookup("DNSMIRROR_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Checks what the core cannot know about: environment-level formats,
    /// supported types and sane numeric ranges.
    fn validate(&self) -> Result<()> {
        if self.provider_api_token.is_empty() {
            anyhow::bail!(
                "DNSMIRROR_PROVIDER_API_TOKEN is required. \
                Set it via: export DNSMIRROR_PROVIDER_API_TOKEN=your_token"
            );
        }

        // Check for obvious placeholder tokens (common mistake)
        let token_lower = self.provider_api_token.to_lowercase();
        if token_lower.contains("your_token")
            || token_lower.contains("replace_me")
            || token_lower == "token"
        {
            anyhow::bail!(
                "DNSMIRROR_PROVIDER_API_TOKEN appears to be a placeholder. \
                Use an actual API token from your DNS provider."
            );
        }

        match self.provider_type.as_str() {
            "cloudflare" => {}
            _ => anyhow::bail!(
                "DNSMIRROR_PROVIDER_TYPE '{}' is not supported. \
                Supported providers: cloudflare",
                self.provider_type
            ),
        }

        match self.store_type.as_str() {
            "file" | "memory" => {}
            _ => anyhow::bail!(
                "DNSMIRROR_STORE_TYPE '{}' is not supported. \
                Supported types: file, memory",
                self.store_type
            ),
        }

        if self.domains.is_empty() {
            anyhow::bail!(
                "DNSMIRROR_DOMAINS must contain at least one domain. \
                Set it via: export DNSMIRROR_DOMAINS=example.com,example.org"
            );
        }

        for domain in &self.domains {
            validate_domain_name(&domain.name)?;
            if domain.zone_id.as_ref().is_some_and(|z| z.is_empty()) {
                anyhow::bail!("Zone ID for {} cannot be empty", domain.name);
            }
        }

        if self.store_type == "file" {
            match self.store_path.as_deref() {
                None | Some("") => anyhow::bail!(
                    "DNSMIRROR_STORE_PATH is required when DNSMIRROR_STORE_TYPE=file. \
                    Set it via: export DNSMIRROR_STORE_PATH=/var/lib/dnsmirror/records.json"
                ),
                Some(_) => {}
            }
        }

        if let Some(interval) = self.sync_interval_secs
            && !(10..=86_400).contains(&interval)
        {
            anyhow::bail!(
                "DNSMIRROR_SYNC_INTERVAL_SECS must be between 10 and 86400 seconds. Got: {}",
                interval
            );
        }

        if let Some(max_retries) = self.max_retries
            && max_retries > 10
        {
            anyhow::bail!(
                "DNSMIRROR_MAX_RETRIES must be between 0 and 10. Got: {}",
                max_retries
            );
        }

        if let Some(retry_delay) = self.retry_delay_secs
            && !(1..=300).contains(&retry_delay)
        {
            anyhow::bail!(
                "DNSMIRROR_RETRY_DELAY_SECS must be between 1 and 300 seconds. Got: {}",
                retry_delay
            );
        }

        parse_log_level(&self.log_level)?;

        Ok(())
    }

    /// Build the core configuration
    fn to_mirror_config(&self) -> MirrorConfig {
        let defaults = SyncConfig::default();

        let mut config = MirrorConfig::new(ProviderConfig::Cloudflare {
            api_token: self.provider_api_token.clone(),
            account_id: self.provider_account_id.clone(),
        });
        config.local_store = match self.store_type.as_str() {
            "memory" => LocalStoreConfig::Memory,
            _ => LocalStoreConfig::File {
                path: self.store_path.clone().unwrap_or_default(),
            },
        };
        config.domains = self.domains.clone();
        config.sync = SyncConfig {
            interval_secs: self.sync_interval_secs.unwrap_or(defaults.interval_secs),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            retry_delay_secs: self.retry_delay_secs.unwrap_or(defaults.retry_delay_secs),
            dry_run: self.dry_run,
            ..defaults
        };
        config
    }
}

/// Parse `name` or `name:zone_id` entries
fn parse_domains(raw: &str) -> Vec<DomainConfig> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((name, zone_id)) => DomainConfig::new(name.trim()).with_zone_id(zone_id.trim()),
            None => DomainConfig::new(entry),
        })
        .collect()
}

fn parse_number<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{} must be a number. Got '{}': {}", key, raw, e)),
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "DNSMIRROR_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks; catches common mistakes, not every invalid name.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        anyhow::bail!("Domain name cannot be empty");
    }

    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return MirrorExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return MirrorExitCode::ConfigError.into();
    }

    // Already validated
    let log_level = parse_log_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return MirrorExitCode::ConfigError.into();
    }

    info!("Starting dnsmirrord daemon");
    info!("Configuration loaded: {} domain(s)", config.domains.len());

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return MirrorExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => MirrorExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                if e.downcast_ref::<dnsmirror_core::Error>()
                    .is_some_and(|e| matches!(e, dnsmirror_core::Error::Config(_)))
                {
                    MirrorExitCode::ConfigError
                } else {
                    MirrorExitCode::RuntimeError
                }
            }
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let registry = ProviderRegistry::with_builtin_stores();

    #[cfg(feature = "cloudflare")]
    {
        info!("Registering Cloudflare provider");
        dnsmirror_provider_cloudflare::register(&registry);
    }

    let mirror_config = config.to_mirror_config();

    info!("Provider type: {}", mirror_config.provider.type_name());
    info!("Local store type: {}", mirror_config.local_store.type_name());
    for domain in &mirror_config.domains {
        info!("Mirroring domain: {}", domain.name);
    }
    if mirror_config.sync.dry_run {
        warn!("Running in DRY-RUN mode - the local store will not be modified");
    }

    let provider = registry.create_provider(&mirror_config.provider)?;
    let store = registry
        .create_local_store(&mirror_config.local_store)
        .await?;

    let (engine, event_rx) = SyncEngine::new(provider, store, mirror_config)?;
    let event_logger = tokio::spawn(log_events(event_rx));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let signal_waiter = tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => error!("Shutdown signal error: {}", e),
        }
        let _ = shutdown_tx.send(());
    });

    info!("Starting sync engine");
    let result = engine.run_with_shutdown(Some(shutdown_rx)).await;

    signal_waiter.abort();
    // The logger ends once the engine, and with it the event sender, is gone
    drop(engine);
    if tokio::time::timeout(Duration::from_secs(5), event_logger)
        .await
        .is_err()
    {
        warn!("Event logger did not drain within 5 seconds");
    }

    result?;
    info!("Shutting down daemon");
    Ok(())
}

/// Forward sync events to the log
async fn log_events(mut events: mpsc::Receiver<SyncEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            SyncEvent::AlertRaised { domain, entry } => {
                let fields: Vec<_> = entry.changed_fields.iter().map(|f| f.as_str()).collect();
                warn!(
                    "ALERT {}: {:?} {} {} ({}) [{}]",
                    domain,
                    entry.change_type,
                    entry.record_type,
                    entry.record_name,
                    entry.remote_id,
                    fields.join(", ")
                );
            }
            SyncEvent::SyncFailed {
                domain,
                error,
                retry_count,
            } => {
                error!(
                    "Sync of {} failed after {} retries: {}",
                    domain, retry_count, error
                );
            }
            SyncEvent::Stopped { reason } => info!("Sync engine stopped: {}", reason),
            other => tracing::debug!("{:?}", other),
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
