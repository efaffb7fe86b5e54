//! Alert policy
//!
//! Decides which change entries are worth notifying an operator about.
//! Delivery is somebody else's job; the sync driver only emits
//! [`SyncEvent::AlertRaised`](crate::sync::SyncEvent::AlertRaised) for
//! entries this policy marks as notable.

use crate::reconcile::{ChangeEntry, ChangeType};
use crate::record::Field;
use serde::{Deserialize, Serialize};

/// Which changes raise alerts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPolicy {
    /// Alert on records that appeared on the provider
    #[serde(default = "default_true")]
    pub on_added: bool,

    /// Alert on records that disappeared from the provider
    #[serde(default = "default_true")]
    pub on_deleted: bool,

    /// Alert on modifications touching any of these fields
    #[serde(default = "default_modified_fields")]
    pub modified_fields: Vec<Field>,
}

impl AlertPolicy {
    /// A policy that never alerts
    pub fn silent() -> Self {
        Self {
            on_added: false,
            on_deleted: false,
            modified_fields: Vec::new(),
        }
    }

    /// Whether the entry should be forwarded to alerting
    pub fn is_notable(&self, entry: &ChangeEntry) -> bool {
        match entry.change_type {
            ChangeType::Added => self.on_added,
            ChangeType::Deleted => self.on_deleted,
            ChangeType::Modified => self
                .modified_fields
                .iter()
                .any(|field| entry.touches(*field)),
        }
    }
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            on_added: true,
            on_deleted: true,
            modified_fields: default_modified_fields(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_modified_fields() -> Vec<Field> {
    Field::ALL.to_vec()
}
