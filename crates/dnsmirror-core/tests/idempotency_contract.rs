//! Architectural Contract Test: Mirror State & Idempotency
//!
//! This test verifies that syncing converges the local store onto the
//! provider and then stays quiet.
//!
//! Constraints verified:
//! - The first sync mirrors every remote record
//! - A second sync with no provider edits changes nothing
//! - Provider edits show up as exactly one change each
//! - Dry-run reports changes without writing them
//! - Mirrored state survives a restart of a file-backed store
//!
//! If this test fails, the mirror either drifts or churns.

mod common;

use common::*;
use dnsmirror_core::SyncEngine;
use dnsmirror_core::reconcile::ChangeType;
use dnsmirror_core::record::Field;
use dnsmirror_core::state::FileLocalStore;
use dnsmirror_core::traits::LocalStore;

const DOMAIN: &str = "example.com";

fn seeded_provider() -> MockDnsProvider {
    let provider = MockDnsProvider::new("test");
    provider.set_records(
        DOMAIN,
        vec![
            a_record("r1", "www", "192.0.2.1"),
            a_record("r2", "api", "192.0.2.2").with_proxied(true),
        ],
    );
    provider
}

#[tokio::test]
async fn second_sync_without_provider_edits_is_empty() {
    let provider = seeded_provider();
    let store = MockLocalStore::new();

    let (engine, _event_rx) = SyncEngine::new(
        Box::new(MockDnsProvider::sharing_state_with(&provider)),
        Box::new(MockLocalStore::sharing_state_with(&store)),
        minimal_config(&[DOMAIN]),
    )
    .expect("engine construction succeeds");

    let domain = dnsmirror_core::DomainConfig::new(DOMAIN);

    let first = engine.sync_domain(&domain).await.expect("first sync succeeds");
    assert_eq!(first.summary().added, 2);
    assert_eq!(store.snapshot(DOMAIN).await.unwrap().len(), 2);

    let second = engine.sync_domain(&domain).await.expect("second sync succeeds");
    assert!(second.is_empty(), "No provider edits means no changes: {:?}", second);
    assert_eq!(
        store.apply_call_count(),
        1,
        "An empty change-set must not touch the store"
    );
}

#[tokio::test]
async fn provider_edits_become_single_changes() {
    let provider = seeded_provider();
    let store = MockLocalStore::new();

    let (engine, _event_rx) = SyncEngine::new(
        Box::new(MockDnsProvider::sharing_state_with(&provider)),
        Box::new(MockLocalStore::sharing_state_with(&store)),
        minimal_config(&[DOMAIN]),
    )
    .expect("engine construction succeeds");
    let domain = dnsmirror_core::DomainConfig::new(DOMAIN);

    engine.sync_domain(&domain).await.unwrap();
    let stored_r1 = store
        .snapshot(DOMAIN)
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.remote_id() == "r1")
        .unwrap();

    provider.edit(DOMAIN, "r1", |r| r.ttl = 60);
    provider.set_records(
        DOMAIN,
        provider
            .records(DOMAIN)
            .into_iter()
            .filter(|r| r.remote_id != "r2")
            .collect(),
    );

    let changes = engine.sync_domain(&domain).await.unwrap();
    let kinds: Vec<_> = changes.iter().map(|e| (e.change_type, e.remote_id.as_str())).collect();
    assert_eq!(
        kinds,
        vec![(ChangeType::Modified, "r1"), (ChangeType::Deleted, "r2")]
    );
    assert_eq!(changes.entries()[0].changed_fields, vec![Field::Ttl]);

    let local = store.snapshot(DOMAIN).await.unwrap();
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].id, stored_r1.id, "Modified rows keep their local id");
    assert_eq!(local[0].record.ttl, 60);

    assert!(engine.sync_domain(&domain).await.unwrap().is_empty());
}

#[tokio::test]
async fn dry_run_reports_but_does_not_apply() {
    let provider = seeded_provider();
    let store = MockLocalStore::new();

    let mut config = minimal_config(&[DOMAIN]);
    config.sync.dry_run = true;

    let (engine, _event_rx) = SyncEngine::new(
        Box::new(MockDnsProvider::sharing_state_with(&provider)),
        Box::new(MockLocalStore::sharing_state_with(&store)),
        config,
    )
    .expect("engine construction succeeds");
    let domain = dnsmirror_core::DomainConfig::new(DOMAIN);

    let first = engine.sync_domain(&domain).await.unwrap();
    let second = engine.sync_domain(&domain).await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second, "Nothing was applied, so the diff repeats");
    assert_eq!(store.apply_call_count(), 0);
    assert!(store.snapshot(DOMAIN).await.unwrap().is_empty());
}

#[tokio::test]
async fn disabled_domains_are_skipped() {
    let provider = seeded_provider();
    provider.set_records("disabled.example", vec![a_record("x1", "www", "192.0.2.9")]);
    let store = MockLocalStore::new();

    let mut config = minimal_config(&[DOMAIN]);
    config = config
        .with_domain(dnsmirror_core::DomainConfig::new("disabled.example").with_enabled(false));

    let (engine, _event_rx) = SyncEngine::new(
        Box::new(MockDnsProvider::sharing_state_with(&provider)),
        Box::new(MockLocalStore::sharing_state_with(&store)),
        config,
    )
    .expect("engine construction succeeds");

    let report = engine.sync_all().await;

    assert!(report.is_success());
    assert_eq!(report.domains.len(), 1);
    assert_eq!(report.domains[0].domain, DOMAIN);
    assert_eq!(provider.list_call_count(), 1);
    assert!(store.snapshot("disabled.example").await.unwrap().is_empty());
}

#[tokio::test]
async fn file_store_mirror_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");
    let provider = seeded_provider();
    let domain = dnsmirror_core::DomainConfig::new(DOMAIN);

    {
        let (engine, _event_rx) = SyncEngine::new(
            Box::new(MockDnsProvider::sharing_state_with(&provider)),
            Box::new(FileLocalStore::new(&path).await.unwrap()),
            minimal_config(&[DOMAIN]),
        )
        .expect("engine construction succeeds");
        assert_eq!(engine.sync_domain(&domain).await.unwrap().len(), 2);
    }

    let (engine, _event_rx) = SyncEngine::new(
        Box::new(MockDnsProvider::sharing_state_with(&provider)),
        Box::new(FileLocalStore::new(&path).await.unwrap()),
        minimal_config(&[DOMAIN]),
    )
    .expect("engine construction succeeds");

    assert!(
        engine.sync_domain(&domain).await.unwrap().is_empty(),
        "Restarted engine should find the mirror already in sync"
    );
}
