//! Canonical DNS record model
//!
//! Every provider adapter normalizes its wire format into [`CanonicalRecord`],
//! and the local store keeps the last synced copy as a [`LocalRecord`].
//! Both sides are compared through [`RecordValues`], the normalized view of
//! the four mutable fields.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Internal identifier of a local store row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalRecordId(uuid::Uuid);

impl LocalRecordId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(id: uuid::Uuid) -> Self {
        Self(id)
    }

    /// The underlying UUID
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for LocalRecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LocalRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A DNS resource record as known to one side (local or remote)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Provider-assigned identifier, empty only before the first sync
    pub remote_id: String,
    /// Record type tag (A, AAAA, CNAME, MX, TXT, ...)
    pub record_type: String,
    /// Fully-qualified or relative hostname label
    pub name: String,
    /// Record value (IP literal, hostname, text blob, ...)
    pub content: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Priority for MX-like types; `None` means "not applicable"
    #[serde(default)]
    pub priority: Option<u16>,
    /// Provider-specific proxy flag; `None` is treated as `false`
    #[serde(default)]
    pub proxied: Option<bool>,
}

impl CanonicalRecord {
    /// Create a record without priority or proxy flag
    pub fn new(
        remote_id: impl Into<String>,
        record_type: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
        ttl: u32,
    ) -> Self {
        Self {
            remote_id: remote_id.into(),
            record_type: record_type.into(),
            name: name.into(),
            content: content.into(),
            ttl,
            priority: None,
            proxied: None,
        }
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: u16) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the proxy flag
    pub fn with_proxied(mut self, proxied: bool) -> Self {
        self.proxied = Some(proxied);
        self
    }

    /// Normalized view of the mutable fields
    pub fn values(&self) -> RecordValues {
        RecordValues::from(self)
    }
}

/// A record as persisted in the local store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalRecord {
    /// Internal row identifier
    pub id: LocalRecordId,
    /// The mirrored record
    #[serde(flatten)]
    pub record: CanonicalRecord,
    /// When this row last matched the provider
    pub last_synced: chrono::DateTime<chrono::Utc>,
}

impl LocalRecord {
    /// Store a record under a freshly generated local identifier
    pub fn new(record: CanonicalRecord) -> Self {
        Self::with_id(LocalRecordId::new(), record)
    }

    /// Store a record under a known local identifier
    pub fn with_id(id: LocalRecordId, record: CanonicalRecord) -> Self {
        Self {
            id,
            record,
            last_synced: chrono::Utc::now(),
        }
    }

    /// The provider identifier this row mirrors
    pub fn remote_id(&self) -> &str {
        &self.record.remote_id
    }

    /// Normalized view of the mutable fields
    pub fn values(&self) -> RecordValues {
        self.record.values()
    }
}

/// Normalized snapshot of the four mutable fields
///
/// Absent priority stays `None` and absent proxy flag becomes `false`.
/// Both reconciliation predicates compare through this type so the
/// normalization is applied identically on either side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordValues {
    /// Record value
    pub content: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Priority, serialized as `null` when not applicable
    pub priority: Option<u16>,
    /// Proxy flag
    pub proxied: bool,
}

impl From<&CanonicalRecord> for RecordValues {
    fn from(record: &CanonicalRecord) -> Self {
        Self {
            content: record.content.clone(),
            ttl: record.ttl,
            priority: record.priority,
            proxied: record.proxied.unwrap_or(false),
        }
    }
}

/// A mutable record field, in the fixed order used by change entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// Record value
    Content,
    /// Time-to-live
    Ttl,
    /// MX-style priority
    Priority,
    /// Proxy flag
    Proxied,
}

impl Field {
    /// All fields, in comparison order
    pub const ALL: [Field; 4] = [Field::Content, Field::Ttl, Field::Priority, Field::Proxied];

    /// Field name as it appears in serialized change entries
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Content => "content",
            Field::Ttl => "ttl",
            Field::Priority => "priority",
            Field::Proxied => "proxied",
        }
    }

    /// Whether this field differs between two normalized snapshots
    pub fn differs(&self, a: &RecordValues, b: &RecordValues) -> bool {
        match self {
            Field::Content => a.content != b.content,
            Field::Ttl => a.ttl != b.ttl,
            Field::Priority => a.priority != b.priority,
            Field::Proxied => a.proxied != b.proxied,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
