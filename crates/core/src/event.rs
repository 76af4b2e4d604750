// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events published to the frontend
//!
//! Serializes with `{"type": "domain:action", ...fields}` format.

use crate::action::ActionKind;
use crate::board::EdgeState;
use crate::id::{BoardId, EdgeId, TaskId};
use crate::progress::ProgressSample;
use serde::{Deserialize, Serialize};

/// Per-edge status inside a `board:execution_status` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeStatusEntry {
    pub edge_id: EdgeId,
    pub state: EdgeState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Messages on the one-way channel to the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UiEvent {
    // -- auth --
    #[serde(rename = "auth:locked")]
    AuthLocked,

    #[serde(rename = "auth:unlocked")]
    AuthUnlocked,

    // -- sync --
    #[serde(rename = "sync:started")]
    SyncStarted {
        task_id: TaskId,
        action: ActionKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tab_id: Option<String>,
    },

    #[serde(rename = "sync:progress")]
    SyncProgress { sample: ProgressSample },

    #[serde(rename = "sync:completed")]
    SyncCompleted {
        task_id: TaskId,
        action: ActionKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tab_id: Option<String>,
    },

    #[serde(rename = "sync:failed")]
    SyncFailed {
        task_id: TaskId,
        action: ActionKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tab_id: Option<String>,
        error: String,
    },

    #[serde(rename = "sync:cancelled")]
    SyncCancelled {
        task_id: TaskId,
        action: ActionKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tab_id: Option<String>,
    },

    // -- board --
    #[serde(rename = "board:created")]
    BoardCreated { board_id: BoardId },

    #[serde(rename = "board:updated")]
    BoardUpdated { board_id: BoardId },

    #[serde(rename = "board:deleted")]
    BoardDeleted { board_id: BoardId },

    #[serde(rename = "board:execution_status")]
    BoardExecutionStatus {
        board_id: BoardId,
        edges: Vec<EdgeStatusEntry>,
    },

    // -- log --
    #[serde(rename = "log:message")]
    LogMessage { level: String, message: String },

    #[serde(rename = "log:sync_event")]
    LogSyncEvent { task_id: TaskId, message: String },

    // -- error --
    #[serde(rename = "error:occurred")]
    ErrorOccurred {
        code: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tab_id: Option<String>,
    },
}

impl UiEvent {
    /// The `domain:action` tag this event serializes under.
    pub fn tag(&self) -> &'static str {
        match self {
            UiEvent::AuthLocked => "auth:locked",
            UiEvent::AuthUnlocked => "auth:unlocked",
            UiEvent::SyncStarted { .. } => "sync:started",
            UiEvent::SyncProgress { .. } => "sync:progress",
            UiEvent::SyncCompleted { .. } => "sync:completed",
            UiEvent::SyncFailed { .. } => "sync:failed",
            UiEvent::SyncCancelled { .. } => "sync:cancelled",
            UiEvent::BoardCreated { .. } => "board:created",
            UiEvent::BoardUpdated { .. } => "board:updated",
            UiEvent::BoardDeleted { .. } => "board:deleted",
            UiEvent::BoardExecutionStatus { .. } => "board:execution_status",
            UiEvent::LogMessage { .. } => "log:message",
            UiEvent::LogSyncEvent { .. } => "log:sync_event",
            UiEvent::ErrorOccurred { .. } => "error:occurred",
        }
    }
}

/// Wrapper carrying the per-process sequence number and timestamp.
///
/// Sequence numbers are monotonic across all domains so the frontend can
/// detect gaps after a dropped message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub seq: u64,
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: UiEvent,
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
