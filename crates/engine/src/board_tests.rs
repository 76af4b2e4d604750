// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::engine_fixture;
use drift_core::test_support::{board, edge, node};
use drift_core::{ActionKind, Profile};
use drift_fs::FsCall;
use std::time::Duration;

#[tokio::test]
async fn diamond_executes_in_two_waves() {
    let f = engine_fixture();
    let diamond = board(
        "b1",
        &["a", "b", "c", "d"],
        &[
            ("e1", "a", "b"),
            ("e2", "a", "c"),
            ("e3", "b", "d"),
            ("e4", "c", "d"),
        ],
    );

    f.engine.boards().execute_board(diamond).await.unwrap();
    let status = f.engine.boards().wait(&BoardId::new("b1")).await.unwrap();

    assert!(status.finished);
    assert!(status.succeeded());
    for entry in &status.edges {
        assert_eq!(entry.state, EdgeState::Completed, "{}", entry.edge_id);
    }

    // Wave 1 edges (both out of `a`) transfer before wave 2 edges
    let sync_sources: Vec<String> = f
        .fs
        .calls()
        .iter()
        .filter_map(|c| match c {
            FsCall::Sync { src, .. } => Some(src.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(sync_sources.len(), 4);
    assert_eq!(&sync_sources[..2], &["/a".to_string(), "/a".to_string()]);
}

#[tokio::test]
async fn failed_edge_skips_descendants_but_not_siblings() {
    let f = engine_fixture();
    let mut diamond = board(
        "b1",
        &["a", "b", "c", "d"],
        &[
            ("e1", "a", "b"),
            ("e2", "a", "c"),
            ("e3", "b", "d"),
            ("e4", "c", "d"),
        ],
    );
    // e2 fails validation deterministically: same endpoints
    diamond.edges[1].profile = Profile::between("/same", "/same");

    f.engine.boards().execute_board(diamond).await.unwrap();
    let status = f.engine.boards().wait(&BoardId::new("b1")).await.unwrap();

    let state_of = |id: &str| {
        status
            .edges
            .iter()
            .find(|e| e.edge_id == EdgeId::new(id))
            .map(|e| e.state)
            .unwrap()
    };
    assert_eq!(state_of("e1"), EdgeState::Completed);
    assert_eq!(state_of("e2"), EdgeState::Failed);
    assert_eq!(state_of("e3"), EdgeState::Completed);
    assert_eq!(state_of("e4"), EdgeState::Skipped);
    assert!(!status.succeeded());
}

#[tokio::test]
async fn two_cycle_is_rejected() {
    let f = engine_fixture();
    let cyclic = board(
        "b1",
        &["a", "b", "c"],
        &[("e1", "a", "b"), ("e2", "b", "c"), ("e3", "c", "b")],
    );

    let err = f.engine.boards().execute_board(cyclic).await.unwrap_err();
    match err {
        EngineError::Cycle { edges } => {
            assert!(edges.contains(&EdgeId::new("e2")));
            assert!(edges.contains(&EdgeId::new("e3")));
            assert!(!edges.contains(&EdgeId::new("e1")));
        }
        other => panic!("expected cycle error, got {other}"),
    }
}

#[tokio::test]
async fn missing_endpoint_is_rejected() {
    let f = engine_fixture();
    let mut broken = board("b1", &["a", "b"], &[("e1", "a", "b")]);
    broken.edges.push(edge("e2", "a", "ghost", ActionKind::Push));

    let err = f.engine.boards().execute_board(broken).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::EdgeEndpointMissing { node, .. } if node == NodeId::new("ghost")
    ));
}

#[tokio::test]
async fn parallel_edges_between_same_nodes_are_independent() {
    let f = engine_fixture();
    let mut b = board("b1", &["a", "b"], &[("e1", "a", "b")]);
    let mut second = edge("e2", "a", "b", ActionKind::Push);
    second.profile = Profile::between("/a", "/b2");
    b.edges.push(second);

    f.engine.boards().execute_board(b).await.unwrap();
    let status = f.engine.boards().wait(&BoardId::new("b1")).await.unwrap();
    assert!(status.succeeded());
    assert_eq!(status.edges.len(), 2);
}

#[tokio::test]
async fn stop_cancels_running_and_pending_edges() {
    let f = engine_fixture();
    f.fs.set_files("/a", &[("x.txt", 1)]);
    f.fs.set_op_delay(Duration::from_secs(30));
    let chain = board("b1", &["a", "b", "c"], &[("e1", "a", "b"), ("e2", "b", "c")]);

    f.engine.boards().execute_board(chain).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    f.engine.boards().stop(&BoardId::new("b1")).unwrap();

    let status = f.engine.boards().wait(&BoardId::new("b1")).await.unwrap();
    assert!(status.finished);
    for entry in &status.edges {
        assert_eq!(entry.state, EdgeState::Cancelled, "{}", entry.edge_id);
    }
}

#[tokio::test]
async fn caches_clear_before_each_executed_edge() {
    let f = engine_fixture();
    let chain = board("b1", &["a", "b", "c"], &[("e1", "a", "b"), ("e2", "b", "c")]);

    f.engine.boards().execute_board(chain).await.unwrap();
    f.engine.boards().wait(&BoardId::new("b1")).await.unwrap();

    assert_eq!(f.fs.cache_clears(), 2);
}

#[tokio::test]
async fn concurrent_execution_of_same_board_is_refused() {
    let f = engine_fixture();
    f.fs.set_op_delay(Duration::from_secs(30));
    f.fs.set_files("/a", &[("x.txt", 1)]);
    let b = board("b1", &["a", "b"], &[("e1", "a", "b")]);

    f.engine.boards().execute_board(b.clone()).await.unwrap();
    let err = f.engine.boards().execute_board(b).await.unwrap_err();
    assert!(matches!(err, EngineError::ExecutionActive(_)));

    f.engine.boards().stop(&BoardId::new("b1")).unwrap();
    f.engine.boards().wait(&BoardId::new("b1")).await.unwrap();
}

#[tokio::test]
async fn status_events_flow_to_the_sink() {
    let f = engine_fixture();
    let b = board("b1", &["a", "b"], &[("e1", "a", "b")]);

    f.engine.boards().execute_board(b).await.unwrap();
    f.engine.boards().wait(&BoardId::new("b1")).await.unwrap();

    let tags = f.sink.tags();
    assert!(tags.contains(&"board:execution_status"));
    // The final status event reports the completed edge
    let last_status = f
        .sink
        .events()
        .into_iter()
        .rev()
        .find_map(|e| match e {
            drift_core::UiEvent::BoardExecutionStatus { edges, .. } => Some(edges),
            _ => None,
        })
        .unwrap();
    assert_eq!(last_status[0].state, EdgeState::Completed);
}

#[tokio::test]
async fn stored_board_executes_by_id() {
    let f = engine_fixture();
    let b = board("b1", &["a", "b"], &[("e1", "a", "b")]);
    drift_storage::BoardStore::new(f.db.clone())
        .save(&b, 0)
        .unwrap();

    f.engine.boards().execute(&BoardId::new("b1")).await.unwrap();
    let status = f.engine.boards().wait(&BoardId::new("b1")).await.unwrap();
    assert!(status.succeeded());

    assert!(matches!(
        f.engine.boards().execute(&BoardId::new("nope")).await,
        Err(EngineError::BoardNotFound(_))
    ));
}

#[test]
fn node_builder_produces_locations() {
    let n = node("a", "gdrive", "/photos");
    assert_eq!(n.location(), "gdrive:/photos");
}
