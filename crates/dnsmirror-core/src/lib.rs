// # dnsmirror-core
//
// Core library for mirroring provider DNS records into a local store.
//
// ## Architecture Overview
//
// - **reconcile**: Pure diff of a local snapshot against a remote snapshot,
//   producing a typed change-set (added / modified / deleted)
// - **DnsProvider**: Trait for provider adapters normalizing records into
//   the canonical model
// - **LocalStore**: Trait for the persisted mirror
// - **SyncEngine**: Fetch → reconcile → apply loop feeding monitoring events
// - **ProviderRegistry**: Plugin-based registry for providers and stores
//
// ## Design Principles
//
// 1. **Pure core**: Reconciliation has no I/O, no state, no side effects
// 2. **Separation of Concerns**: Providers fetch, stores persist, the engine decides
// 3. **Plugin-Based**: Providers are registered dynamically, no hard-coded if-else
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Fail fast**: Ambiguous input is rejected before anything is produced

pub mod alert;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod record;
pub mod registry;
pub mod state;
pub mod sync;
pub mod traits;

// Re-export core types for convenience
pub use alert::AlertPolicy;
pub use config::{DomainConfig, LocalStoreConfig, MirrorConfig, ProviderConfig, SyncConfig};
pub use error::{Error, Result, SnapshotSide};
pub use reconcile::{
    ChangeEntry, ChangeSet, ChangeSummary, ChangeType, changed_fields, reconcile, values_equal,
};
pub use record::{CanonicalRecord, Field, LocalRecord, LocalRecordId, RecordValues};
pub use registry::ProviderRegistry;
pub use state::{FileLocalStore, MemoryLocalStore, apply_changes};
pub use sync::{SyncEngine, SyncEvent, SyncReport};
pub use traits::{DnsProvider, LocalStore};
