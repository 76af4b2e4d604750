// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashSet;

#[test]
fn short_truncates() {
    assert_eq!("abcdef".short(3), "abc");
    assert_eq!("ab".short(3), "ab");
    assert_eq!("".short(3), "");
}

#[test]
fn fresh_ids_are_unique() {
    let a = BoardId::fresh();
    let b = BoardId::fresh();
    assert_ne!(a, b);
    assert!(!a.is_empty());
}

#[test]
fn id_equality_with_str() {
    let id = EdgeId::new("edge-1");
    assert_eq!(id, "edge-1");
    assert_eq!(id.as_str(), "edge-1");
    assert_eq!(id.to_string(), "edge-1");
}

#[test]
fn id_serde_is_transparent() {
    let id = NodeId::new("n1");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"n1\"");
    let back: NodeId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn task_ids_are_monotonic() {
    let gen = TaskIdGen::new();
    let first = gen.next();
    let second = gen.next();
    assert!(second > first);
    assert_eq!(first.to_string(), "task-1");
}

#[test]
fn task_id_gen_is_unique_across_threads() {
    let gen = std::sync::Arc::new(TaskIdGen::new());
    let mut handles = Vec::new();
    for _ in 0..4 {
        let gen = std::sync::Arc::clone(&gen);
        handles.push(std::thread::spawn(move || {
            (0..100).map(|_| gen.next()).collect::<Vec<_>>()
        }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(seen.insert(id), "duplicate task id {id}");
        }
    }
    assert_eq!(seen.len(), 400);
}
