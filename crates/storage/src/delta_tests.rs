// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn store() -> (tempfile::TempDir, DeltaStore) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("drift.db")).unwrap();
    (dir, DeltaStore::new(db))
}

#[test]
fn missing_key_is_none() {
    let (_dir, store) = store();
    assert!(store.get(&RemoteKey::new("gdrive:/x")).unwrap().is_none());
}

#[test]
fn record_delta_increments() {
    let (_dir, store) = store();
    let key = RemoteKey::new("gdrive:/a");

    store.record_delta(&key, "gdrive", 1000).unwrap();
    store.record_delta(&key, "gdrive", 2000).unwrap();

    let state = store.get(&key).unwrap().unwrap();
    assert_eq!(state.delta_count, 2);
    assert_eq!(state.updated_at_ms, 2000);
    assert!(state.last_full_sync_ms.is_none());
}

#[test]
fn record_full_sync_resets_counter() {
    let (_dir, store) = store();
    let key = RemoteKey::new("local:/a");

    for i in 0..5 {
        store.record_delta(&key, "local", i).unwrap();
    }
    store.record_full_sync(&key, "local", 9000).unwrap();

    let state = store.get(&key).unwrap().unwrap();
    assert_eq!(state.delta_count, 0);
    assert_eq!(state.last_full_sync_ms, Some(9000));
}

#[test]
fn set_watching_preserves_counters() {
    let (_dir, store) = store();
    let key = RemoteKey::new("dropbox:/a");

    store.record_delta(&key, "dropbox", 100).unwrap();
    store.set_watching(&key, "dropbox", true, 200).unwrap();

    let state = store.get(&key).unwrap().unwrap();
    assert!(state.is_watching);
    assert_eq!(state.delta_count, 1);

    store.set_watching(&key, "dropbox", false, 300).unwrap();
    let state = store.get(&key).unwrap().unwrap();
    assert!(!state.is_watching);
    assert_eq!(state.delta_count, 1);
}

#[test]
fn all_lists_every_remote() {
    let (_dir, store) = store();
    store
        .record_delta(&RemoteKey::new("a:/x"), "a", 1)
        .unwrap();
    store
        .record_delta(&RemoteKey::new("b:/y"), "b", 2)
        .unwrap();
    assert_eq!(store.all().unwrap().len(), 2);
}
