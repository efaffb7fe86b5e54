// # Local Store Implementations
//
// This module provides implementations of the LocalStore trait for
// different persistence strategies, plus the apply semantics they share.

pub mod file;
pub mod memory;

pub use file::{FileLocalStore, FileLocalStoreFactory};
pub use memory::{MemoryLocalStore, MemoryLocalStoreFactory};

use crate::reconcile::{ChangeEntry, ChangeSet, ChangeType};
use crate::record::{CanonicalRecord, LocalRecord, RecordValues};
use crate::Error;

/// Apply a change-set to a snapshot, returning the new snapshot
///
/// Surviving rows keep their position; added rows are appended in
/// change-set order. Fails without touching anything when an entry refers
/// to a local row that is not in `snapshot` or lacks the value it needs.
///
/// Applying `reconcile(L, R)` to `L` yields a snapshot that reconciles
/// against `R` to an empty change-set.
pub fn apply_changes(
    snapshot: &[LocalRecord],
    changes: &ChangeSet,
) -> Result<Vec<LocalRecord>, Error> {
    let mut records = snapshot.to_vec();
    let now = chrono::Utc::now();

    for entry in changes {
        match entry.change_type {
            ChangeType::Added => {
                let record = canonical_from_entry(entry, current_value(entry)?);
                let mut local = LocalRecord::new(record);
                local.last_synced = now;
                records.push(local);
            }
            ChangeType::Modified => {
                let index = position_of(&records, entry)?;
                let row = &mut records[index];
                row.record = canonical_from_entry(entry, current_value(entry)?);
                row.last_synced = now;
            }
            ChangeType::Deleted => {
                let index = position_of(&records, entry)?;
                records.remove(index);
            }
        }
    }

    Ok(records)
}

fn current_value(entry: &ChangeEntry) -> Result<&RecordValues, Error> {
    entry.current_value.as_ref().ok_or_else(|| {
        Error::local_store(format!(
            "{:?} entry for {} has no current value",
            entry.change_type, entry.remote_id
        ))
    })
}

fn position_of(records: &[LocalRecord], entry: &ChangeEntry) -> Result<usize, Error> {
    let id = entry.local_record_id.ok_or_else(|| {
        Error::local_store(format!(
            "{:?} entry for {} has no local record id",
            entry.change_type, entry.remote_id
        ))
    })?;

    records
        .iter()
        .position(|record| record.id == id)
        .ok_or_else(|| Error::local_store(format!("local record {} not found", id)))
}

fn canonical_from_entry(entry: &ChangeEntry, values: &RecordValues) -> CanonicalRecord {
    CanonicalRecord {
        remote_id: entry.remote_id.clone(),
        record_type: entry.record_type.clone(),
        name: entry.record_name.clone(),
        content: values.content.clone(),
        ttl: values.ttl,
        priority: values.priority,
        proxied: Some(values.proxied),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::reconcile;

    #[test]
    fn applying_changes_converges_with_remote() {
        let keep = LocalRecord::new(CanonicalRecord::new("keep", "A", "www", "1.1.1.1", 300));
        let change = LocalRecord::new(CanonicalRecord::new("change", "A", "api", "1.1.1.2", 300));
        let drop = LocalRecord::new(CanonicalRecord::new("drop", "A", "old", "1.1.1.3", 300));
        let local = vec![keep.clone(), change.clone(), drop];

        let remote = vec![
            CanonicalRecord::new("keep", "A", "www", "1.1.1.1", 300),
            CanonicalRecord::new("change", "A", "api", "9.9.9.9", 120).with_proxied(true),
            CanonicalRecord::new("new", "MX", "@", "mx.example.com", 300).with_priority(10),
        ];

        let changes = reconcile(&local, &remote).unwrap();
        let applied = apply_changes(&local, &changes).unwrap();

        assert_eq!(applied.len(), 3);
        assert_eq!(applied[0].id, keep.id);
        assert_eq!(applied[1].id, change.id);
        assert_eq!(applied[1].record.content, "9.9.9.9");
        assert_eq!(applied[2].record.remote_id, "new");
        assert_eq!(applied[2].record.priority, Some(10));
        assert!(reconcile(&applied, &remote).unwrap().is_empty());
    }

    #[test]
    fn unknown_local_row_is_rejected() {
        let stale = LocalRecord::new(CanonicalRecord::new("gone", "A", "www", "1.1.1.1", 300));
        let changes = reconcile(std::slice::from_ref(&stale), &[]).unwrap();

        let err = apply_changes(&[], &changes).unwrap_err();
        assert!(matches!(err, Error::LocalStore(_)));
    }

    #[test]
    fn deserialized_entry_without_values_is_rejected() {
        let changes: ChangeSet = serde_json::from_value(serde_json::json!([{
            "changeType": "added",
            "remoteId": "r1",
            "recordType": "A",
            "recordName": "www"
        }]))
        .unwrap();

        let err = apply_changes(&[], &changes).unwrap_err();
        assert!(err.to_string().contains("no current value"));
    }
}
