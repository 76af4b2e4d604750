// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stored boards with their nodes and edges

use crate::db::Database;
use crate::error::StorageError;
use drift_core::{ActionKind, Board, BoardEdge, BoardId, BoardNode, EdgeId, NodeId};
use rusqlite::{params, OptionalExtension};

/// CRUD over `boards`, `board_nodes`, and `board_edges`.
#[derive(Clone)]
pub struct BoardStore {
    db: Database,
}

impl BoardStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Upsert a board with its full node and edge sets.
    pub fn save(&self, board: &Board, now_ms: u64) -> Result<(), StorageError> {
        // Serialize edge profiles up front so the closure below is all-SQL
        let edges: Vec<(&BoardEdge, String)> = board
            .edges
            .iter()
            .map(|e| serde_json::to_string(&e.profile).map(|json| (e, json)))
            .collect::<Result<_, _>>()?;

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO boards (id, name, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     updated_at = excluded.updated_at",
                params![board.id.as_str(), board.name, now_ms as i64],
            )?;

            // Replace node and edge sets wholesale
            conn.execute(
                "DELETE FROM board_nodes WHERE board_id = ?1",
                params![board.id.as_str()],
            )?;
            conn.execute(
                "DELETE FROM board_edges WHERE board_id = ?1",
                params![board.id.as_str()],
            )?;

            for node in &board.nodes {
                conn.execute(
                    "INSERT INTO board_nodes (id, board_id, remote_name, path, x, y, label)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        node.id.as_str(),
                        board.id.as_str(),
                        node.remote_name,
                        node.path,
                        node.x,
                        node.y,
                        node.label,
                    ],
                )?;
            }

            for (edge, profile_json) in &edges {
                conn.execute(
                    "INSERT INTO board_edges (id, board_id, from_node, to_node, action, profile)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        edge.id.as_str(),
                        board.id.as_str(),
                        edge.from_node.as_str(),
                        edge.to_node.as_str(),
                        edge.action.as_str(),
                        profile_json,
                    ],
                )?;
            }

            Ok(())
        })
    }

    pub fn get(&self, id: &BoardId) -> Result<Option<Board>, StorageError> {
        struct EdgeRow {
            id: String,
            from_node: String,
            to_node: String,
            action: String,
            profile: String,
        }

        let found = self.db.with_conn(|conn| {
            let name: Option<String> = conn
                .query_row(
                    "SELECT name FROM boards WHERE id = ?1",
                    params![id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(name) = name else {
                return Ok(None);
            };

            let mut stmt = conn.prepare(
                "SELECT id, remote_name, path, x, y, label FROM board_nodes WHERE board_id = ?1",
            )?;
            let nodes = stmt
                .query_map(params![id.as_str()], |row| {
                    Ok(BoardNode {
                        id: NodeId::new(row.get::<_, String>(0)?),
                        remote_name: row.get(1)?,
                        path: row.get(2)?,
                        x: row.get(3)?,
                        y: row.get(4)?,
                        label: row.get(5)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let mut stmt = conn.prepare(
                "SELECT id, from_node, to_node, action, profile FROM board_edges WHERE board_id = ?1",
            )?;
            let edges = stmt
                .query_map(params![id.as_str()], |row| {
                    Ok(EdgeRow {
                        id: row.get(0)?,
                        from_node: row.get(1)?,
                        to_node: row.get(2)?,
                        action: row.get(3)?,
                        profile: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Some((name, nodes, edges)))
        })?;

        let Some((name, nodes, edge_rows)) = found else {
            return Ok(None);
        };

        let mut edges = Vec::with_capacity(edge_rows.len());
        for row in edge_rows {
            let action: ActionKind =
                serde_json::from_value(serde_json::Value::String(row.action.clone()))?;
            edges.push(BoardEdge {
                id: EdgeId::new(row.id),
                from_node: NodeId::new(row.from_node),
                to_node: NodeId::new(row.to_node),
                action,
                profile: serde_json::from_str(&row.profile)?,
            });
        }

        Ok(Some(Board {
            id: id.clone(),
            name,
            nodes,
            edges,
        }))
    }

    pub fn delete(&self, id: &BoardId) -> Result<(), StorageError> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM boards WHERE id = ?1", params![id.as_str()])?;
            Ok(())
        })
    }

    pub fn list(&self) -> Result<Vec<(BoardId, String)>, StorageError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM boards ORDER BY name")?;
            let rows = stmt.query_map([], |row| {
                Ok((BoardId::new(row.get::<_, String>(0)?), row.get(1)?))
            })?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }
}

#[cfg(test)]
#[path = "boards_tests.rs"]
mod tests;
