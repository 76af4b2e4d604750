// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn store() -> (tempfile::TempDir, HistoryStore) {
    let dir = tempfile::tempdir().unwrap();
    let db = crate::db::Database::open(dir.path().join("drift.db")).unwrap();
    (dir, HistoryStore::new(db))
}

fn entry(task_id: u64, started_at_ms: u64, state: TaskState) -> HistoryEntry {
    HistoryEntry {
        task_id: TaskId(task_id),
        action: ActionKind::Push,
        source: "local:/a".to_string(),
        dest: "gdrive:/a".to_string(),
        state,
        error: None,
        files: 3,
        bytes: 300,
        started_at_ms,
        duration_ms: 1500,
    }
}

#[test]
fn append_and_read_back() {
    let (_dir, store) = store();
    let wrote = entry(1, 1000, TaskState::Completed);
    store.append(&wrote).unwrap();

    let read = store.recent(10).unwrap();
    assert_eq!(read, vec![wrote]);
}

#[test]
fn recent_is_newest_first_and_limited() {
    let (_dir, store) = store();
    for i in 0..5 {
        store
            .append(&entry(i, 1000 + i, TaskState::Completed))
            .unwrap();
    }

    let read = store.recent(3).unwrap();
    assert_eq!(read.len(), 3);
    assert_eq!(read[0].task_id, TaskId(4));
    assert_eq!(read[2].task_id, TaskId(2));
}

#[test]
fn failed_entry_keeps_error() {
    let (_dir, store) = store();
    let mut failed = entry(9, 5000, TaskState::Failed);
    failed.error = Some("remote timeout".to_string());
    store.append(&failed).unwrap();

    let read = store.recent(1).unwrap();
    assert_eq!(read[0].state, TaskState::Failed);
    assert_eq!(read[0].error.as_deref(), Some("remote timeout"));
}
