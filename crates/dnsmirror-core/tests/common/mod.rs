//! Test doubles and common utilities for contract tests
//!
//! These doubles keep their state behind `Arc`s so a test can hand one copy
//! to the engine and keep another for assertions.

#![allow(dead_code)]

use dnsmirror_core::config::{DomainConfig, MirrorConfig, ProviderConfig, SyncConfig};
use dnsmirror_core::error::{Error, Result};
use dnsmirror_core::reconcile::ChangeSet;
use dnsmirror_core::record::{CanonicalRecord, LocalRecord};
use dnsmirror_core::state::MemoryLocalStore;
use dnsmirror_core::sync::SyncEvent;
use dnsmirror_core::traits::{DnsProvider, LocalStore};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// How a scripted provider failure looks
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    /// Provider unavailable; worth retrying
    Transient,
    /// Bad credentials; never retried
    Auth,
}

impl Failure {
    fn to_error(self) -> Error {
        match self {
            Failure::Transient => Error::provider("mock", "503 Service Unavailable"),
            Failure::Auth => Error::auth("invalid token"),
        }
    }
}

/// A scripted DnsProvider holding one zone per domain in memory
pub struct MockDnsProvider {
    /// Records served by list_records(), keyed by domain
    zones: Arc<Mutex<Vec<(String, Vec<CanonicalRecord>)>>>,
    /// Call counter for list_records()
    list_call_count: Arc<AtomicUsize>,
    /// Number of upcoming list_records() calls that fail
    failures_remaining: Arc<AtomicUsize>,
    /// Failure kind used for scripted failures
    failure: Arc<Mutex<Failure>>,
    /// Domains whose list_records() always fails
    broken_domains: Arc<Mutex<Vec<String>>>,
    /// Counter used to assign ids on create
    next_id: Arc<AtomicUsize>,
    /// Provider name
    pub name: &'static str,
}

impl MockDnsProvider {
    pub fn new(name: &'static str) -> Self {
        Self {
            zones: Arc::new(Mutex::new(Vec::new())),
            list_call_count: Arc::new(AtomicUsize::new(0)),
            failures_remaining: Arc::new(AtomicUsize::new(0)),
            failure: Arc::new(Mutex::new(Failure::Transient)),
            broken_domains: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicUsize::new(1)),
            name,
        }
    }

    /// Create a new MockDnsProvider that shares state with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            zones: Arc::clone(&other.zones),
            list_call_count: Arc::clone(&other.list_call_count),
            failures_remaining: Arc::clone(&other.failures_remaining),
            failure: Arc::clone(&other.failure),
            broken_domains: Arc::clone(&other.broken_domains),
            next_id: Arc::clone(&other.next_id),
            name: other.name,
        }
    }

    /// Replace the records served for a domain
    pub fn set_records(&self, domain: &str, records: Vec<CanonicalRecord>) {
        let mut zones = self.zones.lock().unwrap();
        match zones.iter_mut().find(|(name, _)| name == domain) {
            Some((_, existing)) => *existing = records,
            None => zones.push((domain.to_string(), records)),
        }
    }

    /// Records currently served for a domain
    pub fn records(&self, domain: &str) -> Vec<CanonicalRecord> {
        self.zones
            .lock()
            .unwrap()
            .iter()
            .find(|(name, _)| name == domain)
            .map(|(_, records)| records.clone())
            .unwrap_or_default()
    }

    /// Simulate an edit made directly on the provider
    pub fn edit(&self, domain: &str, remote_id: &str, edit: impl FnOnce(&mut CanonicalRecord)) {
        let mut records = self.records(domain);
        let record = records
            .iter_mut()
            .find(|r| r.remote_id == remote_id)
            .expect("record exists on provider");
        edit(record);
        self.set_records(domain, records);
    }

    /// Make the next `count` list_records() calls fail
    pub fn fail_next(&self, count: usize, failure: Failure) {
        *self.failure.lock().unwrap() = failure;
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Make every list_records() call for a domain fail
    pub fn break_domain(&self, domain: &str) {
        self.broken_domains.lock().unwrap().push(domain.to_string());
    }

    /// Get the number of times list_records() was called
    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_records(&self, domain: &DomainConfig) -> Result<Vec<CanonicalRecord>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);

        if self.broken_domains.lock().unwrap().contains(&domain.name) {
            return Err(Failure::Auth.to_error());
        }

        let scripted = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if scripted.is_ok() {
            return Err(self.failure.lock().unwrap().to_error());
        }

        Ok(self.records(&domain.name))
    }

    async fn create_record(
        &self,
        domain: &DomainConfig,
        record: &CanonicalRecord,
    ) -> Result<CanonicalRecord> {
        let mut created = record.clone();
        created.remote_id = format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let mut records = self.records(&domain.name);
        records.push(created.clone());
        self.set_records(&domain.name, records);
        Ok(created)
    }

    async fn update_record(
        &self,
        domain: &DomainConfig,
        record: &CanonicalRecord,
    ) -> Result<CanonicalRecord> {
        let mut records = self.records(&domain.name);
        let slot = records
            .iter_mut()
            .find(|r| r.remote_id == record.remote_id)
            .ok_or_else(|| Error::not_found(record.remote_id.clone()))?;
        *slot = record.clone();
        self.set_records(&domain.name, records);
        Ok(record.clone())
    }

    async fn delete_record(&self, domain: &DomainConfig, remote_id: &str) -> Result<()> {
        let mut records = self.records(&domain.name);
        records.retain(|r| r.remote_id != remote_id);
        self.set_records(&domain.name, records);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        self.name
    }
}

/// A LocalStore backed by MemoryLocalStore that tracks calls
pub struct MockLocalStore {
    inner: MemoryLocalStore,
    /// Call counter for apply()
    apply_call_count: Arc<AtomicUsize>,
    /// Call counter for flush()
    flush_call_count: Arc<AtomicUsize>,
    /// When set, snapshot() fails
    unreadable: Arc<AtomicBool>,
}

impl MockLocalStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryLocalStore::new(),
            apply_call_count: Arc::new(AtomicUsize::new(0)),
            flush_call_count: Arc::new(AtomicUsize::new(0)),
            unreadable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a new MockLocalStore that shares state with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            inner: other.inner.clone(),
            apply_call_count: Arc::clone(&other.apply_call_count),
            flush_call_count: Arc::clone(&other.flush_call_count),
            unreadable: Arc::clone(&other.unreadable),
        }
    }

    /// Make every following snapshot() fail
    pub fn make_unreadable(&self) {
        self.unreadable.store(true, Ordering::SeqCst);
    }

    /// Get the number of times apply() was called
    pub fn apply_call_count(&self) -> usize {
        self.apply_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times flush() was called
    pub fn flush_call_count(&self) -> usize {
        self.flush_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl LocalStore for MockLocalStore {
    async fn snapshot(&self, domain: &str) -> Result<Vec<LocalRecord>> {
        if self.unreadable.load(Ordering::SeqCst) {
            return Err(Error::local_store("store unreadable"));
        }
        self.inner.snapshot(domain).await
    }

    async fn apply(&self, domain: &str, changes: &ChangeSet) -> Result<()> {
        self.apply_call_count.fetch_add(1, Ordering::SeqCst);
        self.inner.apply(domain, changes).await
    }

    async fn list_domains(&self) -> Result<Vec<String>> {
        self.inner.list_domains().await
    }

    async fn flush(&self) -> Result<()> {
        self.flush_call_count.fetch_add(1, Ordering::SeqCst);
        self.inner.flush().await
    }
}

/// Helper to create a minimal MirrorConfig for testing
pub fn minimal_config(domains: &[&str]) -> MirrorConfig {
    let mut config = MirrorConfig::new(ProviderConfig::Cloudflare {
        api_token: "test-token".to_string(),
        account_id: None,
    });
    config.domains = domains.iter().map(|name| DomainConfig::new(*name)).collect();
    config.sync = SyncConfig {
        interval_secs: 3600, // Only the immediate first tick fires during a test
        max_retries: 3,
        retry_delay_secs: 0,
        event_channel_capacity: 100,
        dry_run: false,
    };
    config
}

/// Drain every event currently buffered in the channel
pub fn drain_events(rx: &mut mpsc::Receiver<SyncEvent>) -> Vec<SyncEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// A remote A record
pub fn a_record(remote_id: &str, name: &str, ip: &str) -> CanonicalRecord {
    CanonicalRecord::new(remote_id, "A", name, ip, 300)
}
