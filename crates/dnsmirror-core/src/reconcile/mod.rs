//! Reconciliation engine
//!
//! Compares the last synced local snapshot of a domain against a freshly
//! fetched remote snapshot and produces a typed [`ChangeSet`].
//!
//! ## Classification
//!
//! ```text
//!   remote ∖ local   ──▶  added      (current_value only)
//!   remote ∩ local   ──▶  modified   (both values + changed_fields)
//!                    └─▶  (nothing)  when all four fields agree
//!   local ∖ remote   ──▶  deleted    (previous_value only)
//! ```
//!
//! Records are matched by `remote_id` alone. Equality looks only at
//! `content`, `ttl`, `priority` and `proxied`, after normalization.
//!
//! ## Ordering
//!
//! `added` and `modified` entries are emitted while walking the remote
//! snapshot, then `deleted` entries while walking the local snapshot.
//! Deletions therefore always trail everything else.
//!
//! ## Purity
//!
//! [`reconcile`] only borrows its inputs, holds no state between calls and
//! performs no I/O. It is safe to call concurrently from any number of sync
//! tasks on independent snapshots.

pub mod change;

pub use change::{ChangeEntry, ChangeSet, ChangeSummary, ChangeType};

use crate::error::{Error, Result, SnapshotSide};
use crate::record::{CanonicalRecord, Field, LocalRecord, RecordValues};
use std::collections::{HashMap, HashSet};

/// Compute the change-set that turns `local` into `remote`
///
/// # Errors
///
/// Returns [`Error::DuplicateRemoteId`] when either snapshot repeats a
/// remote identifier. The check runs before any entry is produced, so a
/// failed call never yields a partial change-set.
///
/// # Example
///
/// ```rust
/// use dnsmirror_core::record::{CanonicalRecord, LocalRecord};
/// use dnsmirror_core::reconcile::{reconcile, ChangeType};
///
/// let local = vec![LocalRecord::new(CanonicalRecord::new("r1", "A", "www", "1.1.1.1", 300))];
/// let remote = vec![CanonicalRecord::new("r1", "A", "www", "2.2.2.2", 300)];
///
/// let changes = reconcile(&local, &remote).unwrap();
/// assert_eq!(changes.len(), 1);
/// assert_eq!(changes.entries()[0].change_type, ChangeType::Modified);
/// ```
pub fn reconcile(local: &[LocalRecord], remote: &[CanonicalRecord]) -> Result<ChangeSet> {
    let local_index = index_local(local)?;
    let remote_ids = index_remote(remote)?;

    let mut entries = Vec::new();

    for remote_record in remote {
        match local_index.get(remote_record.remote_id.as_str()) {
            None => entries.push(ChangeEntry::added(remote_record)),
            Some(local_record) => {
                let fields = changed_fields(&local_record.record, remote_record);
                if !fields.is_empty() {
                    entries.push(ChangeEntry::modified(local_record, remote_record, fields));
                }
            }
        }
    }

    for local_record in local {
        if !remote_ids.contains(local_record.remote_id()) {
            entries.push(ChangeEntry::deleted(local_record));
        }
    }

    tracing::trace!(
        local = local.len(),
        remote = remote.len(),
        changes = entries.len(),
        "reconciled snapshots"
    );

    Ok(ChangeSet::from_entries(entries))
}

/// Whether the mutable fields of two records agree after normalization
pub fn values_equal(local: &CanonicalRecord, remote: &CanonicalRecord) -> bool {
    local.values() == remote.values()
}

/// The mutable fields that differ after normalization, in fixed order
///
/// Returns an empty list exactly when [`values_equal`] holds.
pub fn changed_fields(local: &CanonicalRecord, remote: &CanonicalRecord) -> Vec<Field> {
    diff_values(&local.values(), &remote.values())
}

fn diff_values(local: &RecordValues, remote: &RecordValues) -> Vec<Field> {
    Field::ALL
        .into_iter()
        .filter(|field| field.differs(local, remote))
        .collect()
}

fn index_local(local: &[LocalRecord]) -> Result<HashMap<&str, &LocalRecord>> {
    let mut index = HashMap::with_capacity(local.len());
    for record in local {
        if index.insert(record.remote_id(), record).is_some() {
            return Err(Error::duplicate_remote_id(SnapshotSide::Local, record.remote_id()));
        }
    }
    Ok(index)
}

fn index_remote(remote: &[CanonicalRecord]) -> Result<HashSet<&str>> {
    let mut ids = HashSet::with_capacity(remote.len());
    for record in remote {
        if !ids.insert(record.remote_id.as_str()) {
            return Err(Error::duplicate_remote_id(SnapshotSide::Remote, &record.remote_id));
        }
    }
    Ok(ids)
}
