// # Local Store Trait
//
// Defines the interface for the persisted mirror of provider records.
//
// ## Purpose
//
// The local store holds the last synced copy of every record, per domain.
// It is the left-hand side of every reconciliation and the place change-sets
// are applied to.
//
// ## Implementations
//
// - Memory: `MemoryLocalStore`
// - File-based: `FileLocalStore` (JSON with atomic writes)
// - Future: SQLite, Postgres, etc.
//
// ## Usage
//
// ```rust,ignore
// use dnsmirror_core::{reconcile, LocalStore};
//
// let local = store.snapshot("example.com").await?;
// let changes = reconcile(&local, &remote)?;
// store.apply("example.com", &changes).await?;
// ```

use crate::reconcile::ChangeSet;
use crate::record::LocalRecord;
use async_trait::async_trait;

/// Trait for local store implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
///
/// # Trust Level: Trusted (Core Component)
///
/// ## Allowed Capabilities
/// - ✅ Perform I/O for persistent storage (files, databases, etc.)
/// - ✅ Implement locking/concurrency control for thread safety
/// - ✅ Cache state in memory (with explicit flush)
///
/// ## Forbidden Capabilities
/// - ❌ Call DNS providers (owned by `SyncEngine`)
/// - ❌ Decide what changed (owned by `reconcile`)
/// - ❌ Spawn background tasks without clear lifecycle
///
/// ## Implementation Guidelines
///
/// - **Consistent snapshots**: `snapshot()` must read a domain under a single
///   lock acquisition (or single query) so reconciliation never sees a torn
///   state
/// - **Atomic apply**: `apply()` either applies the whole change-set for the
///   domain or nothing
/// - **Explicit flush**: `flush()` must persist all pending changes
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Point-in-time copy of every record stored for a domain
    ///
    /// Unknown domains yield an empty snapshot.
    async fn snapshot(&self, domain: &str) -> Result<Vec<LocalRecord>, crate::Error>;

    /// Apply a change-set produced against this store's snapshot
    ///
    /// - `added` → insert under a new local identifier
    /// - `modified` → overwrite the row named by `local_record_id`
    /// - `deleted` → remove the row named by `local_record_id`
    async fn apply(&self, domain: &str, changes: &ChangeSet) -> Result<(), crate::Error>;

    /// List all domains with stored records
    async fn list_domains(&self) -> Result<Vec<String>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}

/// Helper trait for constructing local stores from configuration
#[async_trait]
pub trait LocalStoreFactory: Send + Sync {
    /// Create a LocalStore instance from configuration
    ///
    /// `config` is the serialized [`LocalStoreConfig`](crate::config::LocalStoreConfig).
    async fn create(&self, config: &serde_json::Value) -> Result<Box<dyn LocalStore>, crate::Error>;
}
