//! Core traits for the DNS mirror
//!
//! This module defines the abstract interfaces around the reconciliation core.
//!
//! - [`DnsProvider`]: Normalize and manage records via provider APIs
//! - [`LocalStore`]: Persisted mirror of provider records

pub mod dns_provider;
pub mod local_store;

pub use dns_provider::{DnsProvider, DnsProviderFactory};
pub use local_store::{LocalStore, LocalStoreFactory};
