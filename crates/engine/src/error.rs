// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use drift_core::{BoardId, EdgeId, NodeId, ProfileError, TaskId};
use drift_fs::{FilterError, FsError};
use drift_storage::StorageError;
use thiserror::Error;

/// Errors that can occur in the engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("filesystem error: {0}")]
    Fs(#[from] FsError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("invalid profile: {0}")]
    Profile(#[from] ProfileError),
    #[error("invalid filter: {0}")]
    Filter(#[from] FilterError),
    #[error("vault is locked")]
    VaultLocked,
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    #[error("board not found: {0}")]
    BoardNotFound(BoardId),
    #[error("board is already executing: {0}")]
    ExecutionActive(BoardId),
    #[error("edge {edge} references missing node {node}")]
    EdgeEndpointMissing { edge: EdgeId, node: NodeId },
    #[error("CYCLE: board contains a cycle through edges {}", format_edges(.edges))]
    Cycle { edges: Vec<EdgeId> },
}

fn format_edges(edges: &[EdgeId]) -> String {
    edges
        .iter()
        .map(|e| e.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl EngineError {
    /// Stable code for `error:occurred` events.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Fs(_) => "fs",
            EngineError::Storage(_) => "storage",
            EngineError::Profile(_) | EngineError::Filter(_) => "validation",
            EngineError::VaultLocked => "vault_locked",
            EngineError::TaskNotFound(_) | EngineError::BoardNotFound(_) => "not_found",
            EngineError::ExecutionActive(_) => "execution_active",
            EngineError::EdgeEndpointMissing { .. } => "validation",
            EngineError::Cycle { .. } => "cycle",
        }
    }
}
