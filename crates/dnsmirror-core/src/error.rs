//! Error types for the DNS mirror
//!
//! This module defines all error types used throughout the crate.

use std::fmt;
use thiserror::Error;

/// Result type alias for mirror operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which input of a reconciliation call an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSide {
    /// Records from the local store
    Local,
    /// Records fetched from the provider
    Remote,
}

impl fmt::Display for SnapshotSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotSide::Local => f.write_str("local"),
            SnapshotSide::Remote => f.write_str("remote"),
        }
    }
}

/// Core error type for the DNS mirror
#[derive(Error, Debug)]
pub enum Error {
    /// A snapshot carried the same remote identifier more than once
    #[error("duplicate remote id '{remote_id}' in {side} snapshot")]
    DuplicateRemoteId {
        /// Snapshot that contains the duplicate
        side: SnapshotSide,
        /// The repeated identifier
        remote_id: String,
    },

    /// DNS provider-related errors
    #[error("DNS provider error: {0}")]
    DnsProvider(String),

    /// Local store-related errors
    #[error("Local store error: {0}")]
    LocalStore(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors (from provider APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Record or zone not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a duplicate remote id error
    pub fn duplicate_remote_id(side: SnapshotSide, remote_id: impl Into<String>) -> Self {
        Self::DuplicateRemoteId {
            side,
            remote_id: remote_id.into(),
        }
    }

    /// Create a DNS provider error
    pub fn dns_provider(msg: impl Into<String>) -> Self {
        Self::DnsProvider(msg.into())
    }

    /// Create a local store error
    pub fn local_store(msg: impl Into<String>) -> Self {
        Self::LocalStore(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether retrying the same call may succeed
    ///
    /// Invariant violations and bad configuration never heal on their own;
    /// everything that comes back from a provider call might.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Error::DuplicateRemoteId { .. }
                | Error::Config(_)
                | Error::InvalidInput(_)
                | Error::Authentication(_)
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
