//! Sync driver
//!
//! The SyncEngine is responsible for:
//! - Fetching remote records via DnsProvider (with engine-owned retries)
//! - Taking a consistent local snapshot from LocalStore
//! - Reconciling the two into a change-set
//! - Applying the change-set to LocalStore
//! - Emitting change and alert events for monitoring
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐                          ┌─────────────┐
//! │ DnsProvider │── remote snapshot ──┐    │ LocalStore  │
//! └─────────────┘                     │    └─────────────┘
//!                                     ▼       │     ▲
//!                            ┌──────────────┐ │     │
//!                            │  SyncEngine  │◀┘     │ apply
//!                            └──────────────┘───────┘
//!                                     │
//!                          reconcile()│
//!                                     ▼
//!                            ┌──────────────┐
//!                            │  SyncEvent   │ ──▶ monitoring / alerting
//!                            └──────────────┘
//! ```
//!
//! ## Flow per domain
//!
//! 1. List remote records (retry on transient failure)
//! 2. Snapshot local records
//! 3. `reconcile(local, remote)`
//! 4. Apply the change-set (skipped in dry-run mode)
//! 5. Emit one event per change, plus alerts for notable ones

use crate::alert::AlertPolicy;
use crate::config::{DomainConfig, MirrorConfig, SyncConfig};
use crate::error::{Error, Result};
use crate::reconcile::{ChangeEntry, ChangeSet, ChangeSummary, reconcile};
use crate::record::CanonicalRecord;
use crate::traits::{DnsProvider, LocalStore};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, error, info, warn};

/// Events emitted by the SyncEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Engine started
    Started {
        domains_count: usize,
    },

    /// A record diverged between provider and local store
    ChangeDetected {
        domain: String,
        entry: ChangeEntry,
    },

    /// A change matched the alert policy
    AlertRaised {
        domain: String,
        entry: ChangeEntry,
    },

    /// A domain finished syncing
    DomainSynced {
        domain: String,
        summary: ChangeSummary,
    },

    /// A domain failed to sync
    SyncFailed {
        domain: String,
        error: String,
        retry_count: usize,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Result of syncing one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainReport {
    /// Domain name
    pub domain: String,
    /// Change counts, or the error that stopped the domain
    pub outcome: std::result::Result<ChangeSummary, String>,
}

/// Result of one pass over every enabled domain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// One entry per synced domain, in configuration order
    pub domains: Vec<DomainReport>,
}

impl SyncReport {
    /// Domains that failed
    pub fn failures(&self) -> impl Iterator<Item = &DomainReport> {
        self.domains.iter().filter(|report| report.outcome.is_err())
    }

    /// Whether every domain synced
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Change counts summed over all successful domains
    pub fn total(&self) -> ChangeSummary {
        self.domains
            .iter()
            .filter_map(|report| report.outcome.as_ref().ok())
            .fold(ChangeSummary::default(), |acc, summary| ChangeSummary {
                added: acc.added + summary.added,
                modified: acc.modified + summary.modified,
                deleted: acc.deleted + summary.deleted,
            })
    }
}

/// Sync driver
///
/// Periodically mirrors every configured domain from the provider into the
/// local store.
///
/// ## Lifecycle
///
/// 1. Create with [`SyncEngine::new()`]
/// 2. Start with [`SyncEngine::run()`], or drive passes manually with
///    [`SyncEngine::sync_all()`]
/// 3. Engine runs until shutdown signal received, then flushes the store
///
/// ## Threading
///
/// Domains are synced one after another on the calling task. Several
/// engines may run side by side; reconciliation shares no state.
pub struct SyncEngine {
    /// Provider adapter for remote snapshots
    provider: Box<dyn DnsProvider>,

    /// Local mirror
    store: Box<dyn LocalStore>,

    /// Domains to mirror
    domains: Vec<DomainConfig>,

    /// Interval, retry and dry-run settings
    settings: SyncConfig,

    /// Which changes raise alerts
    alert: AlertPolicy,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SyncEvent>,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields sync events
    pub fn new(
        provider: Box<dyn DnsProvider>,
        store: Box<dyn LocalStore>,
        config: MirrorConfig,
    ) -> Result<(Self, mpsc::Receiver<SyncEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.sync.event_channel_capacity);

        let engine = Self {
            provider,
            store,
            domains: config.domains,
            settings: config.sync,
            alert: config.alert,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run the engine until SIGINT
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error)`: The store could not be flushed
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the engine until the given signal fires
    ///
    /// Dropping the sender also stops the engine.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.emit_event(SyncEvent::Started {
            domains_count: self.enabled_domains().count(),
        });

        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for shutdown signal: {}", e);
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(self.settings.interval_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut ticks = IntervalStream::new(interval);

        loop {
            tokio::select! {
                Some(_) = ticks.next() => {
                    let report = self.sync_all().await;
                    let total = report.total();
                    info!(
                        "Sync pass done: {} added, {} modified, {} deleted, {} failed domain(s)",
                        total.added,
                        total.modified,
                        total.deleted,
                        report.failures().count()
                    );
                }

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    self.emit_event(SyncEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                    });
                    break;
                }
            }
        }

        self.store.flush().await?;
        info!("Local store flushed, sync engine stopped");

        Ok(())
    }

    /// Sync every enabled domain once
    ///
    /// A failing domain is logged and reported; the remaining domains are
    /// still synced.
    pub async fn sync_all(&self) -> SyncReport {
        let mut report = SyncReport::default();

        for domain in &self.domains {
            if !domain.enabled {
                debug!("Domain {} is disabled, skipping", domain.name);
                continue;
            }

            let outcome = match self.sync_domain(domain).await {
                Ok(changes) => Ok(changes.summary()),
                Err(e) => {
                    error!("Failed to sync domain {}: {}", domain.name, e);
                    Err(e.to_string())
                }
            };

            report.domains.push(DomainReport {
                domain: domain.name.clone(),
                outcome,
            });
        }

        report
    }

    /// Sync one domain and return the change-set that was applied
    ///
    /// Nothing is written to the store unless reconciliation succeeds.
    pub async fn sync_domain(&self, domain: &DomainConfig) -> Result<ChangeSet> {
        debug!(
            "Syncing {} from {}",
            domain.name,
            self.provider.provider_name()
        );

        let remote = self.fetch_remote(domain).await?;
        let local = self
            .store
            .snapshot(&domain.name)
            .await
            .inspect_err(|e| self.fail(domain, e, 0))?;

        let changes = reconcile(&local, &remote)
            .inspect_err(|e| self.fail(domain, e, 0))?;

        if changes.is_empty() {
            debug!("Domain {} is in sync ({} records)", domain.name, remote.len());
        } else if self.settings.dry_run {
            info!(
                "[DRY-RUN] Domain {}: {} change(s) not applied",
                domain.name,
                changes.len()
            );
        } else {
            self.store
                .apply(&domain.name, &changes)
                .await
                .inspect_err(|e| self.fail(domain, e, 0))?;
        }

        for entry in &changes {
            self.emit_event(SyncEvent::ChangeDetected {
                domain: domain.name.clone(),
                entry: entry.clone(),
            });
            if self.alert.is_notable(entry) {
                self.emit_event(SyncEvent::AlertRaised {
                    domain: domain.name.clone(),
                    entry: entry.clone(),
                });
            }
        }

        let summary = changes.summary();
        if summary.total() > 0 {
            info!(
                "Domain {}: {} added, {} modified, {} deleted",
                domain.name, summary.added, summary.modified, summary.deleted
            );
        }
        self.emit_event(SyncEvent::DomainSynced {
            domain: domain.name.clone(),
            summary,
        });

        Ok(changes)
    }

    /// Fetch the remote snapshot, retrying transient failures
    async fn fetch_remote(&self, domain: &DomainConfig) -> Result<Vec<CanonicalRecord>> {
        let mut attempt = 0;
        loop {
            match self.provider.list_records(domain).await {
                Ok(records) => return Ok(records),
                Err(e) if e.is_retryable() && attempt < self.settings.max_retries => {
                    warn!(
                        "Fetch attempt {} failed for {}: {}",
                        attempt, domain.name, e
                    );
                    attempt += 1;
                    tokio::time::sleep(std::time::Duration::from_secs(
                        self.settings.retry_delay_secs,
                    ))
                    .await;
                }
                Err(e) => {
                    self.fail(domain, &e, attempt);
                    return Err(e);
                }
            }
        }
    }

    fn enabled_domains(&self) -> impl Iterator<Item = &DomainConfig> {
        self.domains.iter().filter(|domain| domain.enabled)
    }

    fn fail(&self, domain: &DomainConfig, error: &Error, retry_count: usize) {
        self.emit_event(SyncEvent::SyncFailed {
            domain: domain.name.clone(),
            error: error.to_string(),
            retry_count,
        });
    }

    /// Emit a sync event without ever blocking the sync path
    fn emit_event(&self, event: SyncEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event (event_channel_capacity too small?)");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Event receiver dropped, discarding event");
            }
        }
    }
}
