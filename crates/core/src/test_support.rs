// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test builders shared by other crates' tests

use crate::board::{Board, BoardEdge, BoardNode};
use crate::id::{BoardId, EdgeId, NodeId};
use crate::profile::Profile;
use crate::ActionKind;

/// Build a board node with default layout hints.
pub fn node(id: &str, remote: &str, path: &str) -> BoardNode {
    BoardNode {
        id: NodeId::new(id),
        remote_name: remote.to_string(),
        path: path.to_string(),
        x: 0.0,
        y: 0.0,
        label: None,
    }
}

/// Build an edge whose profile spans the two node ids as local paths.
pub fn edge(id: &str, from: &str, to: &str, action: ActionKind) -> BoardEdge {
    BoardEdge {
        id: EdgeId::new(id),
        from_node: NodeId::new(from),
        to_node: NodeId::new(to),
        action,
        profile: Profile::between(format!("/{from}"), format!("/{to}")),
    }
}

/// Build a board from node ids and `(edge_id, from, to)` triples.
pub fn board(id: &str, node_ids: &[&str], edges: &[(&str, &str, &str)]) -> Board {
    Board {
        id: BoardId::new(id),
        name: id.to_string(),
        nodes: node_ids.iter().map(|n| node(n, "", n)).collect(),
        edges: edges
            .iter()
            .map(|(e, from, to)| edge(e, from, to, ActionKind::Push))
            .collect(),
    }
}
