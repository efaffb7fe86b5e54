// # Cloudflare DNS Provider
//
// Cloudflare API v4 adapter for dnsmirror. Lists, creates, updates and
// deletes the DNS records of a zone and normalizes them into the canonical
// record model.
//
// ## Responsibilities
//
// - Zone lookup (explicit zone ID or `GET /zones?name=...`)
// - Paged record listing; one `list_records` call returns the whole zone
// - Normalization of Cloudflare records into `CanonicalRecord`
// - Mapping of HTTP status codes onto `dnsmirror_core::Error` variants
//
// Retries, scheduling and state belong to the sync engine. The provider
// performs single-shot requests and never spawns tasks.
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?page=N&per_page=100`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`
// - Delete DNS Record: DELETE `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use dnsmirror_core::config::{DomainConfig, ProviderConfig};
use dnsmirror_core::record::CanonicalRecord;
use dnsmirror_core::traits::{DnsProvider, DnsProviderFactory};
use dnsmirror_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest page size the records endpoint accepts
const RECORDS_PER_PAGE: u32 = 100;

const PROVIDER_NAME: &str = "cloudflare";

/// Cloudflare DNS provider
///
/// Stateless apart from its HTTP client; every call resolves the zone and
/// talks to the API directly.
///
/// # Security
///
/// The Debug implementation does NOT expose the API token.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// Account ID used to scope zone lookups (optional)
    account_id: Option<String>,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// Response envelope shared by every v4 endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
}

/// A DNS record as Cloudflare returns it
#[derive(Debug, Deserialize)]
struct CloudflareRecord {
    id: String,
    #[serde(rename = "type")]
    record_type: String,
    name: String,
    content: String,
    ttl: u32,
    #[serde(default)]
    priority: Option<u16>,
    #[serde(default)]
    proxied: Option<bool>,
}

impl From<CloudflareRecord> for CanonicalRecord {
    fn from(record: CloudflareRecord) -> Self {
        CanonicalRecord {
            remote_id: record.id,
            record_type: record.record_type,
            name: record.name,
            content: record.content,
            ttl: record.ttl,
            priority: record.priority,
            proxied: record.proxied,
        }
    }
}

/// Request body for create and update
#[derive(Debug, Serialize)]
struct RecordPayload<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: &'a str,
    ttl: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    proxied: Option<bool>,
}

impl<'a> From<&'a CanonicalRecord> for RecordPayload<'a> {
    fn from(record: &'a CanonicalRecord) -> Self {
        Self {
            record_type: &record.record_type,
            name: &record.name,
            content: &record.content,
            ttl: record.ttl,
            priority: record.priority,
            proxied: record.proxied,
        }
    }
}

impl<T> Envelope<T> {
    fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return "no error details".to_string();
        }
        self.errors
            .iter()
            .map(|e| format!("{} ({})", e.message, e.code))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Map a non-success HTTP status onto the core error type
fn status_error(status: reqwest::StatusCode, body: &str, context: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "{}: invalid API token or insufficient permissions. Status: {}",
            context, status
        )),
        404 => Error::not_found(format!("{}: {}", context, body)),
        429 => Error::rate_limited(format!(
            "{}: rate limit exceeded. Status: {}",
            context, status
        )),
        500..=599 => Error::provider(
            PROVIDER_NAME,
            format!("{}: server error (transient): {} - {}", context, status, body),
        ),
        _ => Error::provider(
            PROVIDER_NAME,
            format!("{} failed: {} - {}", context, status, body),
        ),
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `account_id`: Optional account ID to scope zone lookups
    ///
    /// # Errors
    ///
    /// Fails when the token is empty or the HTTP client cannot be built.
    pub fn new(api_token: impl Into<String>, account_id: Option<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            account_id,
            client,
        })
    }

    /// Send a request and unwrap the v4 envelope
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<Envelope<T>> {
        let response = request
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::http(format!("{}: request failed: {}", context, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status, &body, context));
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            Error::provider(PROVIDER_NAME, format!("{}: failed to parse response: {}", context, e))
        })?;

        if !envelope.success {
            return Err(Error::provider(
                PROVIDER_NAME,
                format!("{} rejected: {}", context, envelope.error_summary()),
            ));
        }

        Ok(envelope)
    }

    /// Get the zone ID for a domain
    ///
    /// Uses the configured zone ID when present, otherwise looks the zone up
    /// by name.
    ///
    /// ```http
    /// GET /zones?name=example.com
    /// Authorization: Bearer <token>
    /// ```
    async fn zone_id(&self, domain: &DomainConfig) -> Result<String> {
        if let Some(zone_id) = &domain.zone_id {
            tracing::debug!("Using pre-configured zone ID for {}", domain.name);
            return Ok(zone_id.clone());
        }

        tracing::debug!("Looking up zone ID for domain: {}", domain.name);

        let mut query = vec![("name", domain.name.as_str())];
        if let Some(account_id) = &self.account_id {
            query.push(("account.id", account_id.as_str()));
        }

        let request = self
            .client
            .get(format!("{}/zones", CLOUDFLARE_API_BASE))
            .query(&query);
        let envelope: Envelope<Vec<Zone>> = self.send(request, "Zone lookup").await?;

        let zone = envelope
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("Zone not found: {}", domain.name)))?;

        tracing::debug!("Found zone ID for {}: {}", domain.name, zone.id);
        Ok(zone.id)
    }

    fn records_url(zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", CLOUDFLARE_API_BASE, zone_id)
    }

    fn record_url(zone_id: &str, record_id: &str) -> String {
        format!("{}/{}", Self::records_url(zone_id), record_id)
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// List every record of the zone
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?page=1&per_page=100
    /// ```
    async fn list_records(&self, domain: &DomainConfig) -> Result<Vec<CanonicalRecord>> {
        let zone_id = self.zone_id(domain).await?;
        let mut records = Vec::new();
        let mut page = 1u32;

        loop {
            let request = self
                .client
                .get(Self::records_url(&zone_id))
                .query(&[("page", page), ("per_page", RECORDS_PER_PAGE)]);
            let envelope: Envelope<Vec<CloudflareRecord>> =
                self.send(request, "Record listing").await?;

            let total_pages = envelope
                .result_info
                .as_ref()
                .map(|info| info.total_pages)
                .unwrap_or(1);
            let batch = envelope.result.unwrap_or_default();
            let batch_len = batch.len();
            records.extend(batch.into_iter().map(CanonicalRecord::from));

            if page >= total_pages || batch_len == 0 {
                break;
            }
            page += 1;
        }

        tracing::debug!(
            "Listed {} records for {} ({} page(s))",
            records.len(),
            domain.name,
            page
        );
        Ok(records)
    }

    /// Create a record
    ///
    /// ```http
    /// POST /zones/:zone_id/dns_records
    /// {"type": "A", "name": "www", "content": "192.0.2.1", "ttl": 300}
    /// ```
    async fn create_record(
        &self,
        domain: &DomainConfig,
        record: &CanonicalRecord,
    ) -> Result<CanonicalRecord> {
        let zone_id = self.zone_id(domain).await?;

        tracing::info!(
            "Creating Cloudflare DNS record: {} {} -> {}",
            record.record_type,
            record.name,
            record.content
        );

        let request = self
            .client
            .post(Self::records_url(&zone_id))
            .json(&RecordPayload::from(record));
        let envelope: Envelope<CloudflareRecord> = self.send(request, "Record creation").await?;

        envelope
            .result
            .map(CanonicalRecord::from)
            .ok_or_else(|| Error::provider(PROVIDER_NAME, "Record creation returned no record"))
    }

    /// Overwrite a record
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// ```
    async fn update_record(
        &self,
        domain: &DomainConfig,
        record: &CanonicalRecord,
    ) -> Result<CanonicalRecord> {
        if record.remote_id.is_empty() {
            return Err(Error::invalid_input("Cannot update a record without a remote id"));
        }
        let zone_id = self.zone_id(domain).await?;

        tracing::info!(
            "Updating Cloudflare DNS record {}: {} {} -> {}",
            record.remote_id,
            record.record_type,
            record.name,
            record.content
        );

        let request = self
            .client
            .put(Self::record_url(&zone_id, &record.remote_id))
            .json(&RecordPayload::from(record));
        let envelope: Envelope<CloudflareRecord> = self.send(request, "Record update").await?;

        envelope
            .result
            .map(CanonicalRecord::from)
            .ok_or_else(|| Error::provider(PROVIDER_NAME, "Record update returned no record"))
    }

    /// Delete a record
    ///
    /// ```http
    /// DELETE /zones/:zone_id/dns_records/:record_id
    /// ```
    async fn delete_record(&self, domain: &DomainConfig, remote_id: &str) -> Result<()> {
        if remote_id.is_empty() {
            return Err(Error::invalid_input("Cannot delete a record without a remote id"));
        }
        let zone_id = self.zone_id(domain).await?;

        tracing::info!("Deleting Cloudflare DNS record {} from {}", remote_id, domain.name);

        let request = self.client.delete(Self::record_url(&zone_id, remote_id));
        let _: Envelope<serde_json::Value> = self.send(request, "Record deletion").await?;
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating Cloudflare providers
pub struct CloudflareFactory;

impl DnsProviderFactory for CloudflareFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Cloudflare {
                api_token,
                account_id,
            } => {
                if api_token.is_empty() {
                    return Err(Error::config("Cloudflare API token is required"));
                }
                Ok(Box::new(CloudflareProvider::new(
                    api_token.clone(),
                    account_id.clone(),
                )?))
            }
            _ => Err(Error::config("Invalid config for Cloudflare provider")),
        }
    }
}

/// Register the Cloudflare provider with a registry
///
/// This function should be called during initialization to make the
/// Cloudflare provider available.
///
/// # Example
///
/// ```rust
/// use dnsmirror_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// dnsmirror_provider_cloudflare::register(&registry);
/// assert!(registry.has_provider("cloudflare"));
/// ```
pub fn register(registry: &dnsmirror_core::ProviderRegistry) {
    registry.register_provider(PROVIDER_NAME, Box::new(CloudflareFactory));
}
