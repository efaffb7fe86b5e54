//! Change entries and change-sets produced by reconciliation
//!
//! A [`ChangeSet`] is transient: one reconciliation call produces it and the
//! caller decides how to apply or persist it.

use crate::record::{CanonicalRecord, Field, LocalRecord, LocalRecordId, RecordValues};
use serde::{Deserialize, Serialize};

/// Kind of divergence between the local and remote snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// Present remotely, unknown locally
    Added,
    /// Present on both sides with differing values
    Modified,
    /// Known locally, gone remotely
    Deleted,
}

/// One detected divergence
///
/// [`ChangeEntry::added`], [`ChangeEntry::modified`] and
/// [`ChangeEntry::deleted`] fill the optional members each [`ChangeType`]
/// needs. Fields are public and entries deserialize from JSON, so consumers
/// such as [`apply_changes`](crate::state::apply_changes) still check that
/// the member they rely on is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEntry {
    /// Kind of change
    pub change_type: ChangeType,
    /// Provider identifier of the affected record
    pub remote_id: String,
    /// Record type tag
    pub record_type: String,
    /// Record name
    pub record_name: String,
    /// Local values before the change (modified, deleted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_value: Option<RecordValues>,
    /// Remote values after the change (added, modified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<RecordValues>,
    /// Fields that differ, in fixed order (modified only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed_fields: Vec<Field>,
    /// Local store row of the affected record (modified, deleted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_record_id: Option<LocalRecordId>,
}

impl ChangeEntry {
    /// A record that only exists remotely
    pub fn added(remote: &CanonicalRecord) -> Self {
        Self {
            change_type: ChangeType::Added,
            remote_id: remote.remote_id.clone(),
            record_type: remote.record_type.clone(),
            record_name: remote.name.clone(),
            previous_value: None,
            current_value: Some(remote.values()),
            changed_fields: Vec::new(),
            local_record_id: None,
        }
    }

    /// A record whose values diverged; identity is taken from the remote side
    pub fn modified(
        local: &LocalRecord,
        remote: &CanonicalRecord,
        changed_fields: Vec<Field>,
    ) -> Self {
        debug_assert!(!changed_fields.is_empty());
        Self {
            change_type: ChangeType::Modified,
            remote_id: remote.remote_id.clone(),
            record_type: remote.record_type.clone(),
            record_name: remote.name.clone(),
            previous_value: Some(local.values()),
            current_value: Some(remote.values()),
            changed_fields,
            local_record_id: Some(local.id),
        }
    }

    /// A record that only exists locally
    pub fn deleted(local: &LocalRecord) -> Self {
        Self {
            change_type: ChangeType::Deleted,
            remote_id: local.record.remote_id.clone(),
            record_type: local.record.record_type.clone(),
            record_name: local.record.name.clone(),
            previous_value: Some(local.values()),
            current_value: None,
            changed_fields: Vec::new(),
            local_record_id: Some(local.id),
        }
    }

    /// Whether the given field is among the changed ones
    pub fn touches(&self, field: Field) -> bool {
        self.changed_fields.contains(&field)
    }
}

/// Per-type entry counts of a change-set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    /// Number of `added` entries
    pub added: usize,
    /// Number of `modified` entries
    pub modified: usize,
    /// Number of `deleted` entries
    pub deleted: usize,
}

impl ChangeSummary {
    /// Total number of entries
    pub fn total(&self) -> usize {
        self.added + self.modified + self.deleted
    }
}

/// Ordered change-set of one reconciliation call
///
/// `added`/`modified` entries come first in remote order, followed by
/// `deleted` entries in local order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet {
    entries: Vec<ChangeEntry>,
}

impl ChangeSet {
    pub(crate) fn from_entries(entries: Vec<ChangeEntry>) -> Self {
        Self { entries }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether both snapshots agreed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in order
    pub fn iter(&self) -> std::slice::Iter<'_, ChangeEntry> {
        self.entries.iter()
    }

    /// Entries as a slice
    pub fn entries(&self) -> &[ChangeEntry] {
        &self.entries
    }

    /// Consume into the ordered entries
    pub fn into_entries(self) -> Vec<ChangeEntry> {
        self.entries
    }

    /// Entries of the given type, preserving order
    pub fn of_type(&self, change_type: ChangeType) -> impl Iterator<Item = &ChangeEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.change_type == change_type)
    }

    /// `added` entries
    pub fn added(&self) -> impl Iterator<Item = &ChangeEntry> {
        self.of_type(ChangeType::Added)
    }

    /// `modified` entries
    pub fn modified(&self) -> impl Iterator<Item = &ChangeEntry> {
        self.of_type(ChangeType::Modified)
    }

    /// `deleted` entries
    pub fn deleted(&self) -> impl Iterator<Item = &ChangeEntry> {
        self.of_type(ChangeType::Deleted)
    }

    /// Count entries per type
    pub fn summary(&self) -> ChangeSummary {
        self.entries
            .iter()
            .fold(ChangeSummary::default(), |mut summary, entry| {
                match entry.change_type {
                    ChangeType::Added => summary.added += 1,
                    ChangeType::Modified => summary.modified += 1,
                    ChangeType::Deleted => summary.deleted += 1,
                }
                summary
            })
    }
}

impl IntoIterator for ChangeSet {
    type Item = ChangeEntry;
    type IntoIter = std::vec::IntoIter<ChangeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a ChangeEntry;
    type IntoIter = std::slice::Iter<'a, ChangeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
