// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-remote delta bookkeeping

use crate::db::Database;
use crate::error::StorageError;
use drift_core::{DeltaState, RemoteKey};
use rusqlite::{params, OptionalExtension, Row};

/// Access to the `delta_state` table.
#[derive(Clone)]
pub struct DeltaStore {
    db: Database,
}

fn row_to_state(row: &Row<'_>) -> Result<DeltaState, rusqlite::Error> {
    Ok(DeltaState {
        remote_key: RemoteKey::new(row.get::<_, String>(0)?),
        provider: row.get(1)?,
        is_watching: row.get::<_, i64>(2)? != 0,
        last_full_sync_ms: row.get::<_, Option<i64>>(3)?.map(|v| v as u64),
        delta_count: row.get::<_, i64>(4)? as u32,
        updated_at_ms: row.get::<_, i64>(5)? as u64,
    })
}

const COLUMNS: &str = "remote_key, provider, is_watching, last_full_sync, delta_count, updated_at";

impl DeltaStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn get(&self, key: &RemoteKey) -> Result<Option<DeltaState>, StorageError> {
        self.db.with_conn(|conn| {
            let state = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM delta_state WHERE remote_key = ?1"),
                    params![key.as_str()],
                    row_to_state,
                )
                .optional()?;
            Ok(state)
        })
    }

    pub fn all(&self) -> Result<Vec<DeltaState>, StorageError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM delta_state"))?;
            let rows = stmt.query_map([], row_to_state)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    /// Record whether a watcher is running for the remote.
    pub fn set_watching(
        &self,
        key: &RemoteKey,
        provider: &str,
        watching: bool,
        now_ms: u64,
    ) -> Result<(), StorageError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO delta_state (remote_key, provider, is_watching, delta_count, updated_at)
                 VALUES (?1, ?2, ?3, 0, ?4)
                 ON CONFLICT(remote_key) DO UPDATE SET
                     provider = excluded.provider,
                     is_watching = excluded.is_watching,
                     updated_at = excluded.updated_at",
                params![key.as_str(), provider, watching as i64, now_ms as i64],
            )?;
            Ok(())
        })
    }

    /// A delta-scoped (or skipped) sync committed: bump the consecutive
    /// counter.
    pub fn record_delta(
        &self,
        key: &RemoteKey,
        provider: &str,
        now_ms: u64,
    ) -> Result<(), StorageError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO delta_state (remote_key, provider, is_watching, delta_count, updated_at)
                 VALUES (?1, ?2, 0, 1, ?3)
                 ON CONFLICT(remote_key) DO UPDATE SET
                     delta_count = delta_state.delta_count + 1,
                     updated_at = excluded.updated_at",
                params![key.as_str(), provider, now_ms as i64],
            )?;
            Ok(())
        })
    }

    /// A full sync committed: reset the counter and timestamp a new
    /// baseline.
    pub fn record_full_sync(
        &self,
        key: &RemoteKey,
        provider: &str,
        now_ms: u64,
    ) -> Result<(), StorageError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO delta_state (remote_key, provider, is_watching, last_full_sync, delta_count, updated_at)
                 VALUES (?1, ?2, 0, ?3, 0, ?3)
                 ON CONFLICT(remote_key) DO UPDATE SET
                     last_full_sync = excluded.last_full_sync,
                     delta_count = 0,
                     updated_at = excluded.updated_at",
                params![key.as_str(), provider, now_ms as i64],
            )?;
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "delta_tests.rs"]
mod tests;
