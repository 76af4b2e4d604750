// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Board executor: topological execution of transfer DAGs
//!
//! Validates the DAG up front (Kahn's algorithm), then executes edges in
//! waves: all edges within a wave run concurrently through the task
//! engine; the next wave starts only when every edge of the current one
//! is terminal. A failed edge marks everything downstream `skipped`
//! without aborting the rest of the board.

use crate::engine::EventSink;
use crate::error::EngineError;
use crate::tasks::TaskEngine;
use drift_core::event::EdgeStatusEntry;
use drift_core::{Board, BoardId, Clock, EdgeId, EdgeState, NodeId, TaskId, TaskState, UiEvent};
use drift_fs::FsAdapter;
use drift_storage::BoardStore;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Snapshot of one board execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionStatus {
    pub board_id: BoardId,
    pub edges: Vec<EdgeStatusEntry>,
    pub finished: bool,
}

impl ExecutionStatus {
    /// A board only succeeds when every edge completed.
    pub fn succeeded(&self) -> bool {
        self.finished && self.edges.iter().all(|e| e.state == EdgeState::Completed)
    }
}

struct Execution {
    board_id: BoardId,
    /// Edge order as stored on the board, for stable status output
    order: Vec<EdgeId>,
    statuses: Mutex<HashMap<EdgeId, (EdgeState, Option<String>)>>,
    cancel: CancellationToken,
    done_rx: watch::Receiver<bool>,
}

impl Execution {
    fn snapshot(&self) -> ExecutionStatus {
        let statuses = self.statuses.lock();
        ExecutionStatus {
            board_id: self.board_id.clone(),
            edges: self
                .order
                .iter()
                .map(|id| {
                    let (state, error) = statuses
                        .get(id)
                        .cloned()
                        .unwrap_or((EdgeState::Pending, None));
                    EdgeStatusEntry {
                        edge_id: id.clone(),
                        state,
                        error,
                    }
                })
                .collect(),
            finished: *self.done_rx.borrow(),
        }
    }
}

/// Executes boards through the task engine.
pub struct BoardExecutor<F: FsAdapter, E: EventSink, C: Clock> {
    fs: F,
    events: E,
    tasks: Arc<TaskEngine<F, E, C>>,
    store: BoardStore,
    executions: Mutex<HashMap<BoardId, Arc<Execution>>>,
}

impl<F: FsAdapter, E: EventSink, C: Clock> BoardExecutor<F, E, C> {
    pub fn new(fs: F, events: E, tasks: Arc<TaskEngine<F, E, C>>, store: BoardStore) -> Self {
        Self {
            fs,
            events,
            tasks,
            store,
            executions: Mutex::new(HashMap::new()),
        }
    }

    /// Validate and begin executing a stored board.
    pub async fn execute(&self, board_id: &BoardId) -> Result<(), EngineError> {
        let board = self
            .store
            .get(board_id)?
            .ok_or_else(|| EngineError::BoardNotFound(board_id.clone()))?;
        self.execute_board(board).await
    }

    /// Validate and begin executing an in-memory board.
    pub async fn execute_board(&self, board: Board) -> Result<(), EngineError> {
        let waves = plan_waves(&board)?;

        let (done_tx, done_rx) = watch::channel(false);
        let execution = Arc::new(Execution {
            board_id: board.id.clone(),
            order: board.edges.iter().map(|e| e.id.clone()).collect(),
            statuses: Mutex::new(
                board
                    .edges
                    .iter()
                    .map(|e| (e.id.clone(), (EdgeState::Pending, None)))
                    .collect(),
            ),
            cancel: CancellationToken::new(),
            done_rx,
        });

        {
            let mut executions = self.executions.lock();
            if let Some(existing) = executions.get(&board.id) {
                if !*existing.done_rx.borrow() {
                    return Err(EngineError::ExecutionActive(board.id.clone()));
                }
            }
            executions.insert(board.id.clone(), Arc::clone(&execution));
        }

        tracing::info!(board_id = %board.id, edges = board.edges.len(), "board execution started");
        tokio::spawn(run_board(
            self.fs.clone(),
            self.events.clone(),
            Arc::clone(&self.tasks),
            board,
            waves,
            execution,
            done_tx,
        ));
        Ok(())
    }

    /// Cancel an in-flight execution: pending edges become `cancelled`,
    /// running edges are asked to stop.
    pub fn stop(&self, board_id: &BoardId) -> Result<(), EngineError> {
        let executions = self.executions.lock();
        let execution = executions
            .get(board_id)
            .ok_or_else(|| EngineError::BoardNotFound(board_id.clone()))?;
        execution.cancel.cancel();
        Ok(())
    }

    /// Current per-edge status, if the board has been executed.
    pub fn status(&self, board_id: &BoardId) -> Option<ExecutionStatus> {
        self.executions.lock().get(board_id).map(|e| e.snapshot())
    }

    /// Block until the execution finishes.
    pub async fn wait(&self, board_id: &BoardId) -> Result<ExecutionStatus, EngineError> {
        let execution = {
            let executions = self.executions.lock();
            executions
                .get(board_id)
                .cloned()
                .ok_or_else(|| EngineError::BoardNotFound(board_id.clone()))?
        };

        let mut done_rx = execution.done_rx.clone();
        while !*done_rx.borrow() {
            if done_rx.changed().await.is_err() {
                break;
            }
        }
        Ok(execution.snapshot())
    }
}

/// Validate endpoints and acyclicity; group edges into executable waves.
///
/// An edge's wave is the topological depth of its source node, so edges
/// within a wave are mutually independent.
fn plan_waves(board: &Board) -> Result<Vec<Vec<EdgeId>>, EngineError> {
    for edge in &board.edges {
        for node in [&edge.from_node, &edge.to_node] {
            if board.node(node).is_none() {
                return Err(EngineError::EdgeEndpointMissing {
                    edge: edge.id.clone(),
                    node: node.clone(),
                });
            }
        }
    }

    let mut indegree: HashMap<&NodeId, usize> =
        board.nodes.iter().map(|n| (&n.id, 0)).collect();
    let mut outgoing: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();
    for edge in &board.edges {
        *indegree.entry(&edge.to_node).or_default() += 1;
        outgoing.entry(&edge.from_node).or_default().push(&edge.to_node);
    }

    let mut queue: VecDeque<&NodeId> = indegree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(n, _)| *n)
        .collect();
    let mut depth: HashMap<&NodeId, usize> = queue.iter().map(|n| (*n, 0)).collect();
    let mut processed = HashSet::new();

    while let Some(node) = queue.pop_front() {
        processed.insert(node.clone());
        let node_depth = depth.get(node).copied().unwrap_or(0);
        for &target in outgoing.get(node).into_iter().flatten() {
            let entry = depth.entry(target).or_insert(0);
            *entry = (*entry).max(node_depth + 1);
            if let Some(d) = indegree.get_mut(target) {
                *d -= 1;
                if *d == 0 {
                    queue.push_back(target);
                }
            }
        }
    }

    if processed.len() < board.nodes.len() {
        // Everything still unprocessed sits on or behind a cycle
        let offending: Vec<EdgeId> = board
            .edges
            .iter()
            .filter(|e| !processed.contains(&e.from_node) && !processed.contains(&e.to_node))
            .map(|e| e.id.clone())
            .collect();
        return Err(EngineError::Cycle { edges: offending });
    }

    let mut waves: Vec<Vec<EdgeId>> = Vec::new();
    for edge in &board.edges {
        let wave = depth.get(&edge.from_node).copied().unwrap_or(0);
        if waves.len() <= wave {
            waves.resize_with(wave + 1, Vec::new);
        }
        waves[wave].push(edge.id.clone());
    }
    waves.retain(|w| !w.is_empty());
    Ok(waves)
}

async fn run_board<F: FsAdapter, E: EventSink, C: Clock>(
    fs: F,
    events: E,
    tasks: Arc<TaskEngine<F, E, C>>,
    board: Board,
    waves: Vec<Vec<EdgeId>>,
    execution: Arc<Execution>,
    done_tx: watch::Sender<bool>,
) {
    // Nodes downstream of a failed, cancelled, or skipped edge
    let mut tainted: HashSet<NodeId> = HashSet::new();

    for wave in waves {
        if execution.cancel.is_cancelled() {
            break;
        }

        let mut running: Vec<(EdgeId, NodeId, TaskId)> = Vec::new();
        for edge_id in wave {
            let Some(edge) = board.edge(&edge_id) else {
                continue;
            };

            if tainted.contains(&edge.from_node) {
                set_status(&execution, &edge_id, EdgeState::Skipped, None);
                tainted.insert(edge.to_node.clone());
                emit_status(&events, &execution);
                continue;
            }

            // Each edge starts from a clean observation of the world
            fs.clear_caches().await;

            // No per-edge channel consumer; sampled progress still
            // reaches the frontend as sync:progress alongside the
            // per-edge status events
            let (progress_tx, _progress_rx) = mpsc::channel(64);
            match tasks.start_task(edge.action, edge.profile.clone(), None, progress_tx) {
                Ok(task_id) => {
                    set_status(&execution, &edge_id, EdgeState::Running, None);
                    emit_status(&events, &execution);
                    running.push((edge_id, edge.to_node.clone(), task_id));
                }
                Err(e) => {
                    set_status(&execution, &edge_id, EdgeState::Failed, Some(e.to_string()));
                    tainted.insert(edge.to_node.clone());
                    emit_status(&events, &execution);
                }
            }
        }

        // Forward a stop request to every task of this wave
        let forwarder = {
            let cancel = execution.cancel.clone();
            let tasks = Arc::clone(&tasks);
            let ids: Vec<TaskId> = running.iter().map(|(_, _, t)| *t).collect();
            tokio::spawn(async move {
                cancel.cancelled().await;
                for id in ids {
                    let _ = tasks.stop_task(id);
                }
            })
        };

        for (edge_id, to_node, task_id) in running {
            let state = match tasks.wait_task(task_id).await {
                Ok((TaskState::Completed, _)) => EdgeState::Completed,
                Ok((TaskState::Cancelled, _)) => EdgeState::Cancelled,
                Ok((_, error)) => {
                    set_status(&execution, &edge_id, EdgeState::Failed, error);
                    tainted.insert(to_node);
                    emit_status(&events, &execution);
                    continue;
                }
                Err(e) => {
                    set_status(&execution, &edge_id, EdgeState::Failed, Some(e.to_string()));
                    tainted.insert(to_node);
                    emit_status(&events, &execution);
                    continue;
                }
            };
            if state != EdgeState::Completed {
                tainted.insert(to_node);
            }
            set_status(&execution, &edge_id, state, None);
            emit_status(&events, &execution);
        }

        forwarder.abort();
    }

    // Anything never reached is cancelled (stop request) or skipped
    {
        let mut statuses = execution.statuses.lock();
        for (_, entry) in statuses.iter_mut() {
            if !entry.0.is_terminal() {
                entry.0 = if execution.cancel.is_cancelled() {
                    EdgeState::Cancelled
                } else {
                    EdgeState::Skipped
                };
            }
        }
    }

    let _ = done_tx.send(true);
    emit_status(&events, &execution);
    tracing::info!(board_id = %execution.board_id, "board execution finished");
}

fn set_status(execution: &Execution, edge_id: &EdgeId, state: EdgeState, error: Option<String>) {
    execution
        .statuses
        .lock()
        .insert(edge_id.clone(), (state, error));
}

fn emit_status<E: EventSink>(events: &E, execution: &Execution) {
    let snapshot = execution.snapshot();
    events.emit(UiEvent::BoardExecutionStatus {
        board_id: snapshot.board_id,
        edges: snapshot.edges,
    });
}

#[cfg(test)]
#[path = "board_tests.rs"]
mod tests;
