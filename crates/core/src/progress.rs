// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress samples streamed to the frontend while a task runs

use crate::action::ActionKind;
use crate::id::TaskId;
use crate::task::TaskState;
use serde::{Deserialize, Serialize};

/// Per-file status inside a progress sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Checking,
    Transferring,
    Checked,
    Completed,
    Failed,
}

/// One in-flight or recently finished file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferItem {
    pub name: String,
    pub size: u64,
    pub bytes: u64,
    /// Whole-number percentage of this file, 0–100
    pub percent: u8,
    /// Bytes per second for this file
    pub speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_secs: Option<u64>,
    pub status: TransferStatus,
}

impl TransferItem {
    pub fn named(name: impl Into<String>, status: TransferStatus) -> Self {
        Self {
            name: name.into(),
            size: 0,
            bytes: 0,
            percent: 0,
            speed: 0.0,
            eta_secs: None,
            status,
        }
    }
}

/// Overall progress fraction as a percentage, 0–100.
///
/// Prefers byte progress, falls back to file counts, then to check counts
/// during a check-only phase. Returns 0 when nothing is known yet.
pub fn compute_progress(
    bytes: u64,
    total_bytes: u64,
    files: u64,
    total_files: u64,
    checks: u64,
    total_checks: u64,
) -> f64 {
    let ratio = if total_bytes > 0 {
        bytes as f64 / total_bytes as f64
    } else if total_files > 0 {
        files as f64 / total_files as f64
    } else if total_checks > 0 {
        checks as f64 / total_checks as f64
    } else {
        return 0.0;
    };
    (ratio * 100.0).clamp(0.0, 100.0)
}

/// Snapshot of one running task, emitted roughly every 500 ms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSample {
    pub task_id: TaskId,
    pub action: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<String>,
    pub at_ms: u64,
    pub status: TaskState,

    pub total_files: u64,
    pub total_bytes: u64,
    pub total_checks: u64,
    pub files: u64,
    pub bytes: u64,
    pub checks: u64,
    pub errors: u64,
    pub deletes: u64,
    pub renames: u64,

    /// Bytes per second across the whole task
    pub speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_secs: Option<u64>,
    pub elapsed_ms: u64,
    /// Percentage 0–100
    pub progress: f64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transfers: Vec<TransferItem>,
    /// Bounded tail of log lines captured since the previous sample
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub log_lines: Vec<String>,

    /// Set when a sync was satisfied entirely from delta state
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub delta_skipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl ProgressSample {
    /// Empty running sample for a task.
    pub fn empty(task_id: TaskId, action: ActionKind, tab_id: Option<String>, at_ms: u64) -> Self {
        Self {
            task_id,
            action,
            tab_id,
            at_ms,
            status: TaskState::Running,
            total_files: 0,
            total_bytes: 0,
            total_checks: 0,
            files: 0,
            bytes: 0,
            checks: 0,
            errors: 0,
            deletes: 0,
            renames: 0,
            speed: 0.0,
            eta_secs: None,
            elapsed_ms: 0,
            progress: 0.0,
            transfers: Vec::new(),
            log_lines: Vec::new(),
            delta_skipped: false,
            last_error: None,
        }
    }

    /// Synthetic completed sample for a delta-skipped sync.
    pub fn delta_skip(
        task_id: TaskId,
        action: ActionKind,
        tab_id: Option<String>,
        at_ms: u64,
    ) -> Self {
        let mut sample = Self::empty(task_id, action, tab_id, at_ms);
        sample.status = TaskState::Completed;
        sample.progress = 100.0;
        sample.delta_skipped = true;
        sample
    }

    /// Re-derive the user-visible error and check counters from the
    /// composed transfer list, so displayed counts always equal the items
    /// displayed.
    pub fn recount(&mut self) {
        self.errors = self
            .transfers
            .iter()
            .filter(|t| t.status == TransferStatus::Failed)
            .count() as u64;
        self.checks = self
            .transfers
            .iter()
            .filter(|t| matches!(t.status, TransferStatus::Checked | TransferStatus::Checking))
            .count() as u64;
    }

    /// Recompute the progress percentage from the current counters.
    pub fn reprogress(&mut self) {
        self.progress = compute_progress(
            self.bytes,
            self.total_bytes,
            self.files,
            self.total_files,
            self.checks,
            self.total_checks,
        );
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
