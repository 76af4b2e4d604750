// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task outcome history

use crate::db::Database;
use crate::error::StorageError;
use drift_core::{ActionKind, TaskId, TaskState};
use rusqlite::params;

/// One finished task as recorded for the history view.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub task_id: TaskId,
    pub action: ActionKind,
    pub source: String,
    pub dest: String,
    pub state: TaskState,
    pub error: Option<String>,
    pub files: u64,
    pub bytes: u64,
    pub started_at_ms: u64,
    pub duration_ms: u64,
}

/// Append-mostly access to the `history` table.
#[derive(Clone)]
pub struct HistoryStore {
    db: Database,
}

impl HistoryStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn append(&self, entry: &HistoryEntry) -> Result<(), StorageError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO history
                     (task_id, action, source, dest, state, error, files, bytes, started_at, duration_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    entry.task_id.0 as i64,
                    entry.action.as_str(),
                    entry.source,
                    entry.dest,
                    entry.state.as_str(),
                    entry.error,
                    entry.files as i64,
                    entry.bytes as i64,
                    entry.started_at_ms as i64,
                    entry.duration_ms as i64,
                ],
            )?;
            Ok(())
        })
    }

    /// Most recent entries, newest first.
    pub fn recent(&self, limit: u32) -> Result<Vec<HistoryEntry>, StorageError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT task_id, action, source, dest, state, error, files, bytes, started_at, duration_ms
                 FROM history ORDER BY started_at DESC, id DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                let action: String = row.get(1)?;
                let state: String = row.get(4)?;
                Ok((
                    row.get::<_, i64>(0)?,
                    action,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    state,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, i64>(7)?,
                    row.get::<_, i64>(8)?,
                    row.get::<_, i64>(9)?,
                ))
            })?;

            let mut entries = Vec::new();
            for row in rows {
                let (task_id, action, source, dest, state, error, files, bytes, started, dur) =
                    row?;
                let action = serde_json::from_value(serde_json::Value::String(action))
                    .map_err(StorageError::Json)?;
                let state = serde_json::from_value(serde_json::Value::String(state))
                    .map_err(StorageError::Json)?;
                entries.push(HistoryEntry {
                    task_id: TaskId(task_id as u64),
                    action,
                    source,
                    dest,
                    state,
                    error,
                    files: files as u64,
                    bytes: bytes as u64,
                    started_at_ms: started as u64,
                    duration_ms: dur as u64,
                });
            }
            Ok(entries)
        })
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
