// # Memory Local Store
//
// In-memory implementation of LocalStore.
//
// ## Purpose
//
// Provides a simple, fast store that doesn't persist across restarts.
// Useful for testing and for monitoring-only deployments where the mirror
// is rebuilt from the provider on every start.
//
// ## Crash Behavior
//
// - All state is lost on restart/crash
// - The first sync after a restart reports every provider record as `added`

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::apply_changes;
use crate::Error;
use crate::reconcile::ChangeSet;
use crate::record::LocalRecord;
use crate::traits::local_store::{LocalStore, LocalStoreFactory};

/// In-memory local store implementation
///
/// Records are kept per domain in a HashMap protected by a RwLock.
///
/// # Example
///
/// ```rust,no_run
/// use dnsmirror_core::state::MemoryLocalStore;
/// use dnsmirror_core::traits::LocalStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryLocalStore::new();
///     let records = store.snapshot("example.com").await?;
///     assert!(records.is_empty());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryLocalStore {
    inner: Arc<RwLock<HashMap<String, Vec<LocalRecord>>>>,
}

impl MemoryLocalStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one domain's records
    pub fn with_records(domain: impl Into<String>, records: Vec<LocalRecord>) -> Self {
        let mut map = HashMap::new();
        map.insert(domain.into(), records);
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Total number of records across all domains
    pub async fn len(&self) -> usize {
        self.inner.read().await.values().map(Vec::len).sum()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Clear all records from the store
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

#[async_trait]
impl LocalStore for MemoryLocalStore {
    async fn snapshot(&self, domain: &str) -> Result<Vec<LocalRecord>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(domain).cloned().unwrap_or_default())
    }

    async fn apply(&self, domain: &str, changes: &ChangeSet) -> Result<(), Error> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut guard = self.inner.write().await;
        let current = guard.get(domain).map(Vec::as_slice).unwrap_or_default();
        let updated = apply_changes(current, changes)?;
        guard.insert(domain.to_string(), updated);
        Ok(())
    }

    async fn list_domains(&self) -> Result<Vec<String>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.keys().cloned().collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        // Nothing buffered
        Ok(())
    }
}

/// Factory for [`MemoryLocalStore`]
pub struct MemoryLocalStoreFactory;

#[async_trait]
impl LocalStoreFactory for MemoryLocalStoreFactory {
    async fn create(&self, _config: &serde_json::Value) -> Result<Box<dyn LocalStore>, Error> {
        Ok(Box::new(MemoryLocalStore::new()))
    }
}
