// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::db::Database;
use drift_core::test_support;

fn store() -> (tempfile::TempDir, BoardStore) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("drift.db")).unwrap();
    (dir, BoardStore::new(db))
}

#[test]
fn save_and_get_round_trip() {
    let (_dir, store) = store();
    let board = test_support::board(
        "b1",
        &["a", "b", "c"],
        &[("e1", "a", "b"), ("e2", "b", "c")],
    );

    store.save(&board, 1000).unwrap();
    let loaded = store.get(&board.id).unwrap().unwrap();

    assert_eq!(loaded.name, board.name);
    assert_eq!(loaded.nodes.len(), 3);
    assert_eq!(loaded.edges.len(), 2);
    let edge = loaded.edge(&EdgeId::new("e1")).unwrap();
    assert_eq!(edge.from_node, NodeId::new("a"));
    assert_eq!(edge.action, ActionKind::Push);
    assert_eq!(edge.profile.source, "/a");
}

#[test]
fn save_replaces_nodes_and_edges() {
    let (_dir, store) = store();
    let mut board = test_support::board("b1", &["a", "b"], &[("e1", "a", "b")]);
    store.save(&board, 1000).unwrap();

    board.edges.clear();
    board.nodes.pop();
    store.save(&board, 2000).unwrap();

    let loaded = store.get(&board.id).unwrap().unwrap();
    assert_eq!(loaded.nodes.len(), 1);
    assert!(loaded.edges.is_empty());
}

#[test]
fn delete_cascades() {
    let (_dir, store) = store();
    let board = test_support::board("b1", &["a", "b"], &[("e1", "a", "b")]);
    store.save(&board, 1000).unwrap();
    store.delete(&board.id).unwrap();

    assert!(store.get(&board.id).unwrap().is_none());
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn missing_board_is_none() {
    let (_dir, store) = store();
    assert!(store.get(&BoardId::new("nope")).unwrap().is_none());
}
