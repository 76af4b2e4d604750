// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transfer action kinds

use serde::{Deserialize, Serialize};

/// What a task does with its source and destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// One-way sync with source and destination swapped
    Pull,
    /// One-way sync: destination mirrors source
    Push,
    /// Bi-directional reconciliation
    Bi,
    /// Bi-directional reconciliation discarding prior state
    BiResync,
    Copy,
    Move,
    Check,
    /// All comparisons, no mutations
    DryRun,
}

impl ActionKind {
    /// Whether this action can mutate either endpoint.
    pub fn is_mutating(self) -> bool {
        !matches!(self, ActionKind::Check | ActionKind::DryRun)
    }

    /// Whether this action reconciles in both directions.
    pub fn is_bidirectional(self) -> bool {
        matches!(self, ActionKind::Bi | ActionKind::BiResync)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Pull => "pull",
            ActionKind::Push => "push",
            ActionKind::Bi => "bi",
            ActionKind::BiResync => "bi_resync",
            ActionKind::Copy => "copy",
            ActionKind::Move => "move",
            ActionKind::Check => "check",
            ActionKind::DryRun => "dry_run",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
