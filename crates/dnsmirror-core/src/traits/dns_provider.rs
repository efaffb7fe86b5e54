// # DNS Provider Trait
//
// Defines the interface every provider adapter implements.
//
// ## Implementations
//
// - Cloudflare: `dnsmirror-provider-cloudflare` crate
// - Future: Route53, DigitalOcean, Hetzner, etc.
//
// ## Usage
//
// ```rust,ignore
// use dnsmirror_core::{DnsProvider, DomainConfig};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     // Fetch the provider's view of a zone, normalized into canonical records
//     let records = provider.list_records(&DomainConfig::new("example.com")).await?;
//
//     Ok(())
// }
// ```

use crate::config::DomainConfig;
use crate::record::CanonicalRecord;
use async_trait::async_trait;

/// Trait for DNS provider adapters
///
/// An adapter translates one provider's record format into
/// [`CanonicalRecord`] and exposes list/create/update/delete keyed by the
/// provider-assigned remote identifier.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse and normalize provider-specific responses
/// - ✅ Return success or failure (the sync driver handles retry)
///
/// ## Forbidden Capabilities
/// - ❌ Spawn tasks or threads
/// - ❌ Implement retry logic or backoff (owned by `SyncEngine`)
/// - ❌ Access the local store (owned by `SyncEngine`)
/// - ❌ Decide whether records diverged (owned by `reconcile`)
/// - ❌ Cache records beyond a single call
///
/// ## Normalization
///
/// Adapters must leave `priority` and `proxied` as `None` when the provider
/// does not report them. Reconciliation normalizes both sides identically;
/// inventing a default here would hide real differences.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every record of a domain
    ///
    /// The returned snapshot must carry unique, non-empty `remote_id`s.
    /// Pagination is the adapter's concern: one call returns the whole zone.
    async fn list_records(
        &self,
        domain: &DomainConfig,
    ) -> Result<Vec<CanonicalRecord>, crate::Error>;

    /// Create a record
    ///
    /// `record.remote_id` is ignored. Returns the record as stored by the
    /// provider, including its newly assigned `remote_id`.
    async fn create_record(
        &self,
        domain: &DomainConfig,
        record: &CanonicalRecord,
    ) -> Result<CanonicalRecord, crate::Error>;

    /// Overwrite the record identified by `record.remote_id`
    async fn update_record(
        &self,
        domain: &DomainConfig,
        record: &CanonicalRecord,
    ) -> Result<CanonicalRecord, crate::Error>;

    /// Delete the record with the given remote identifier
    async fn delete_record(&self, domain: &DomainConfig, remote_id: &str)
    -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    ///
    /// Credentials arrive through `config`; providers never read them from
    /// ambient state.
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
