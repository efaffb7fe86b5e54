//! Property-based tests for reconciliation.
//!
//! These tests verify the properties every change-set must satisfy:
//! - Totality: each record lands in exactly one classification
//! - No-op: equal snapshots produce an empty change-set
//! - Idempotence: applying a change-set and reconciling again yields nothing
//! - Precision: changed fields are exactly the differing ones, in fixed order
//! - Ordering: deletions always trail additions and modifications

use dnsmirror_core::reconcile::{ChangeSet, ChangeType, reconcile};
use dnsmirror_core::record::{CanonicalRecord, Field, LocalRecord};
use dnsmirror_core::state::apply_changes;
use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

/// Mutable fields of one record: (content, ttl, priority, proxied)
type Values = (String, u32, Option<u16>, Option<bool>);

fn values_strategy() -> impl Strategy<Value = Values> {
    (
        prop::sample::select(vec!["192.0.2.1", "192.0.2.2", "mail.example.com"]),
        prop::sample::select(vec![1u32, 60, 300]),
        prop::option::of(prop::sample::select(vec![0u16, 10])),
        prop::option::of(any::<bool>()),
    )
        .prop_map(|(content, ttl, priority, proxied)| (content.to_string(), ttl, priority, proxied))
}

/// Per remote id: the local values (if stored) and the remote values (if served)
fn snapshot_pair_strategy()
-> impl Strategy<Value = BTreeMap<String, (Option<Values>, Option<Values>)>> {
    prop::collection::btree_map(
        "r[0-9a-f]{1,3}",
        (
            prop::option::of(values_strategy()),
            prop::option::of(values_strategy()),
        ),
        0..16,
    )
}

fn record(remote_id: &str, values: &Values) -> CanonicalRecord {
    let (content, ttl, priority, proxied) = values.clone();
    CanonicalRecord {
        remote_id: remote_id.to_string(),
        record_type: "A".to_string(),
        name: format!("{}.example.com", remote_id),
        content,
        ttl,
        priority,
        proxied,
    }
}

fn split(
    pairs: &BTreeMap<String, (Option<Values>, Option<Values>)>,
) -> (Vec<LocalRecord>, Vec<CanonicalRecord>) {
    let local = pairs
        .iter()
        .filter_map(|(id, (local, _))| local.as_ref().map(|v| LocalRecord::new(record(id, v))))
        .collect();
    let remote = pairs
        .iter()
        .filter_map(|(id, (_, remote))| remote.as_ref().map(|v| record(id, v)))
        .collect();
    (local, remote)
}

fn expected_fields(local: &Values, remote: &Values) -> Vec<Field> {
    let mut fields = Vec::new();
    if local.0 != remote.0 {
        fields.push(Field::Content);
    }
    if local.1 != remote.1 {
        fields.push(Field::Ttl);
    }
    if local.2 != remote.2 {
        fields.push(Field::Priority);
    }
    if local.3.unwrap_or(false) != remote.3.unwrap_or(false) {
        fields.push(Field::Proxied);
    }
    fields
}

fn ids_of(changes: &ChangeSet, change_type: ChangeType) -> HashSet<String> {
    changes.of_type(change_type).map(|e| e.remote_id.clone()).collect()
}

// =============================================================================
// RECONCILIATION PROPERTY TESTS
// =============================================================================

proptest! {
    /// Every record is classified exactly once, by which side holds it
    #[test]
    fn classification_is_total(pairs in snapshot_pair_strategy()) {
        let (local, remote) = split(&pairs);
        let changes = reconcile(&local, &remote).unwrap();

        let mut seen = HashSet::new();
        for entry in &changes {
            prop_assert!(
                seen.insert(entry.remote_id.clone()),
                "{} classified twice",
                entry.remote_id
            );
        }

        for (id, (l, r)) in &pairs {
            let expected = match (l, r) {
                (None, Some(_)) => Some(ChangeType::Added),
                (Some(_), None) => Some(ChangeType::Deleted),
                (Some(l), Some(r)) if !expected_fields(l, r).is_empty() => {
                    Some(ChangeType::Modified)
                }
                _ => None,
            };
            let actual = changes.iter().find(|e| &e.remote_id == id).map(|e| e.change_type);
            prop_assert_eq!(actual, expected);
        }
    }

    /// A local snapshot built from the remote one is already in sync
    #[test]
    fn equal_snapshots_are_a_no_op(pairs in snapshot_pair_strategy()) {
        let (_, remote) = split(&pairs);
        let local: Vec<_> = remote.iter().cloned().map(LocalRecord::new).collect();

        prop_assert!(reconcile(&local, &remote).unwrap().is_empty());
    }

    /// Applying the change-set converges the local snapshot onto the remote one
    #[test]
    fn applying_changes_converges(pairs in snapshot_pair_strategy()) {
        let (local, remote) = split(&pairs);
        let changes = reconcile(&local, &remote).unwrap();

        let applied = apply_changes(&local, &changes).unwrap();

        prop_assert_eq!(applied.len(), remote.len());
        prop_assert!(reconcile(&applied, &remote).unwrap().is_empty());
    }

    /// Kept rows keep their local identifier across an apply
    #[test]
    fn applying_changes_keeps_local_ids(pairs in snapshot_pair_strategy()) {
        let (local, remote) = split(&pairs);
        let changes = reconcile(&local, &remote).unwrap();
        let applied = apply_changes(&local, &changes).unwrap();

        let deleted = ids_of(&changes, ChangeType::Deleted);
        for row in local.iter().filter(|row| !deleted.contains(row.remote_id())) {
            let kept = applied.iter().find(|a| a.remote_id() == row.remote_id()).unwrap();
            prop_assert_eq!(kept.id, row.id);
        }
    }

    /// Changed fields are exactly the differing ones, in fixed order
    #[test]
    fn changed_fields_are_precise(pairs in snapshot_pair_strategy()) {
        let (local, remote) = split(&pairs);
        let changes = reconcile(&local, &remote).unwrap();

        for entry in changes.modified() {
            let (Some(l), Some(r)) = &pairs[&entry.remote_id] else {
                panic!("modified entry without both sides");
            };
            prop_assert!(!entry.changed_fields.is_empty());
            prop_assert_eq!(&entry.changed_fields, &expected_fields(l, r));
        }

        for entry in changes.iter().filter(|e| e.change_type != ChangeType::Modified) {
            prop_assert!(entry.changed_fields.is_empty());
        }
    }

    /// Deletions trail, and the rest follow remote iteration order
    #[test]
    fn deletions_always_trail(pairs in snapshot_pair_strategy()) {
        let (local, remote) = split(&pairs);
        let changes = reconcile(&local, &remote).unwrap();

        let first_deleted = changes
            .iter()
            .position(|e| e.change_type == ChangeType::Deleted)
            .unwrap_or(changes.len());
        prop_assert!(changes.entries()[first_deleted..]
            .iter()
            .all(|e| e.change_type == ChangeType::Deleted));

        let remote_order: Vec<_> = remote.iter().map(|r| r.remote_id.as_str()).collect();
        let positions: Vec<_> = changes.entries()[..first_deleted]
            .iter()
            .map(|e| remote_order.iter().position(|id| *id == e.remote_id).unwrap())
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    /// Identical inputs always give identical output
    #[test]
    fn reconcile_is_deterministic(pairs in snapshot_pair_strategy()) {
        let (local, remote) = split(&pairs);
        prop_assert_eq!(reconcile(&local, &remote).unwrap(), reconcile(&local, &remote).unwrap());
    }

    /// Any repeated remote identifier fails the whole call
    #[test]
    fn duplicates_always_fail(pairs in snapshot_pair_strategy(), on_local in any::<bool>()) {
        let (mut local, mut remote) = split(&pairs);
        let dup = record("dup", &("192.0.2.1".to_string(), 300, None, None));
        if on_local {
            local.push(LocalRecord::new(dup.clone()));
            local.push(LocalRecord::new(dup));
        } else {
            remote.push(dup.clone());
            remote.push(dup);
        }
        prop_assert!(reconcile(&local, &remote).is_err());
    }
}
