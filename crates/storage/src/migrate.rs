// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema migrations, sequenced by `PRAGMA user_version`

use crate::error::StorageError;
use rusqlite::Connection;

/// Migration batches, applied in order. Index N brings the schema to
/// user_version N+1. Never edit a shipped batch; append a new one.
const MIGRATIONS: &[&str] = &[
    // v1: initial schema
    "
    CREATE TABLE delta_state (
        remote_key     TEXT PRIMARY KEY,
        provider       TEXT NOT NULL,
        is_watching    INTEGER NOT NULL DEFAULT 0,
        last_full_sync INTEGER,
        delta_count    INTEGER NOT NULL DEFAULT 0,
        updated_at     INTEGER NOT NULL
    );

    CREATE TABLE profiles (
        id         TEXT PRIMARY KEY,
        name       TEXT NOT NULL,
        data       TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    );

    CREATE TABLE boards (
        id         TEXT PRIMARY KEY,
        name       TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    );

    CREATE TABLE board_nodes (
        id          TEXT PRIMARY KEY,
        board_id    TEXT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
        remote_name TEXT NOT NULL,
        path        TEXT NOT NULL,
        x           REAL NOT NULL DEFAULT 0,
        y           REAL NOT NULL DEFAULT 0,
        label       TEXT
    );

    CREATE TABLE board_edges (
        id        TEXT PRIMARY KEY,
        board_id  TEXT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
        from_node TEXT NOT NULL,
        to_node   TEXT NOT NULL,
        action    TEXT NOT NULL,
        profile   TEXT NOT NULL
    );

    CREATE TABLE flows (
        id         TEXT PRIMARY KEY,
        name       TEXT NOT NULL,
        data       TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    );

    CREATE TABLE schedules (
        id         TEXT PRIMARY KEY,
        flow_id    TEXT,
        cron       TEXT NOT NULL,
        enabled    INTEGER NOT NULL DEFAULT 1,
        data       TEXT,
        updated_at INTEGER NOT NULL
    );

    CREATE TABLE history (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        task_id    INTEGER NOT NULL,
        action     TEXT NOT NULL,
        source     TEXT NOT NULL,
        dest       TEXT NOT NULL,
        state      TEXT NOT NULL,
        error      TEXT,
        files      INTEGER NOT NULL DEFAULT 0,
        bytes      INTEGER NOT NULL DEFAULT 0,
        started_at INTEGER NOT NULL,
        duration_ms INTEGER NOT NULL DEFAULT 0
    );
    CREATE INDEX history_started_at ON history(started_at);
    ",
];

/// Apply any migrations the database has not seen yet.
pub fn apply(conn: &Connection) -> Result<(), StorageError> {
    let version: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    for (index, batch) in MIGRATIONS.iter().enumerate().skip(version as usize) {
        let target = index as u32 + 1;
        conn.execute_batch(batch)?;
        conn.pragma_update(None, "user_version", target)?;
        tracing::info!(version = target, "applied schema migration");
    }

    Ok(())
}

#[cfg(test)]
#[path = "migrate_tests.rs"]
mod tests;
