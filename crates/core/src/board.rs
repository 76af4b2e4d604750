// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Boards: DAGs of transfers

use crate::action::ActionKind;
use crate::id::{BoardId, EdgeId, NodeId};
use crate::profile::Profile;
use serde::{Deserialize, Serialize};

/// A node in a board: one storage endpoint plus layout hints.
///
/// The layout fields (`x`, `y`, `label`) exist for the canvas and are
/// ignored by the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardNode {
    pub id: NodeId,
    pub remote_name: String,
    pub path: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl BoardNode {
    /// Full location string for this node (`<remote>:<path>` or bare path).
    pub fn location(&self) -> String {
        if self.remote_name.is_empty() || self.remote_name == "local" {
            self.path.clone()
        } else {
            format!("{}:{}", self.remote_name, self.path)
        }
    }
}

/// A directed transfer between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardEdge {
    pub id: EdgeId,
    pub from_node: NodeId,
    pub to_node: NodeId,
    pub action: ActionKind,
    pub profile: Profile,
}

/// Execution state of one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    /// An upstream edge failed, so this edge never ran
    Skipped,
}

impl EdgeState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, EdgeState::Pending | EdgeState::Running)
    }
}

/// A board: nodes plus directed edges forming a transfer DAG.
///
/// Acyclicity is enforced at execute time, not at rest; parallel edges
/// between the same pair of nodes are allowed and independent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<BoardNode>,
    #[serde(default)]
    pub edges: Vec<BoardEdge>,
}

impl Board {
    pub fn node(&self, id: &NodeId) -> Option<&BoardNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&BoardEdge> {
        self.edges.iter().find(|e| &e.id == id)
    }
}

#[cfg(test)]
#[path = "board_tests.rs"]
mod tests;
