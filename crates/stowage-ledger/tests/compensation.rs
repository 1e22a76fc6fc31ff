//! Integration tests for ledger rollback behavior.

use std::sync::Arc;

use stowage_core::testing::RecordingStore;
use stowage_core::{Action, ObjectKey};
use stowage_ledger::{CompensationStatus, Compensator, Ledger};

fn key(raw: &str) -> ObjectKey {
    ObjectKey::parse(raw).expect("valid key")
}

#[tokio::test]
async fn rollback_issues_one_delete_per_upload_or_update() {
    let store = Arc::new(RecordingStore::new());
    for raw in ["docs/a.pdf", "docs/b.pdf", "docs/c.pdf"] {
        store.seed(&key(raw), b"x", None);
    }
    let compensator = Compensator::new(store.clone());

    let mut ledger = Ledger::new();
    ledger.record_if_active(Action::upload(key("docs/a.pdf")));
    ledger.record_if_active(Action::delete(key("docs/old.pdf")));
    ledger.record_if_active(Action::update(key("docs/b.pdf")));
    ledger.record_if_active(Action::upload(key("docs/c.pdf")));

    let report = compensator.compensate(ledger.drain_for_rollback()).await;

    let mut deleted: Vec<String> = store
        .deleted_keys()
        .into_iter()
        .map(String::from)
        .collect();
    deleted.sort();
    assert_eq!(deleted, vec!["docs/a.pdf", "docs/b.pdf", "docs/c.pdf"]);
    assert_eq!(report.delete_calls(), 3);
    assert!(report.is_clean());
    assert!(store.keys().is_empty());
}

#[tokio::test]
async fn commit_then_rollback_issues_no_deletes() {
    let store = Arc::new(RecordingStore::new());
    let compensator = Compensator::new(store.clone());

    let mut ledger = Ledger::new();
    ledger.record_if_active(Action::upload(key("users/42/avatar.png")));
    ledger.commit();

    let report = compensator.compensate(ledger.drain_for_rollback()).await;

    assert_eq!(store.delete_count(), 0);
    assert!(report.records().is_empty());
}

#[tokio::test]
async fn second_rollback_is_a_no_op() {
    let store = Arc::new(RecordingStore::new());
    store.seed(&key("users/42/avatar.png"), b"png", None);
    let compensator = Compensator::new(store.clone());

    let mut ledger = Ledger::new();
    ledger.record_if_active(Action::upload(key("users/42/avatar.png")));

    compensator.compensate(ledger.drain_for_rollback()).await;
    assert_eq!(store.delete_count(), 1);

    let second = compensator.compensate(ledger.drain_for_rollback()).await;
    assert_eq!(store.delete_count(), 1);
    assert!(second.records().is_empty());
}

#[tokio::test]
async fn repeated_key_is_deleted_once_per_record() {
    let store = Arc::new(RecordingStore::new());
    store.seed(&key("users/42/cv.pdf"), b"pdf", None);
    let compensator = Compensator::new(store.clone());

    let mut ledger = Ledger::new();
    ledger.record_if_active(Action::upload(key("users/42/cv.pdf")));
    ledger.record_if_active(Action::update(key("users/42/cv.pdf")));

    let report = compensator.compensate(ledger.drain_for_rollback()).await;

    assert_eq!(store.delete_count(), 2);
    assert!(report.is_clean());
    let statuses: Vec<CompensationStatus> =
        report.records().iter().map(|record| record.status).collect();
    assert!(statuses.contains(&CompensationStatus::Compensated));
    assert!(statuses.contains(&CompensationStatus::AlreadyAbsent));
}
