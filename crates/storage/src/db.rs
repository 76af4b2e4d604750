// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared database handle
//!
//! One writer at a time: every access goes through the mutex. The handle
//! can be closed while the process keeps running (vault lock, password
//! change); callers then observe `StorageError::Closed`.

use crate::error::StorageError;
use crate::migrate;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared handle to the configuration database.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Mutex<Option<Connection>>>,
    path: PathBuf,
}

impl Database {
    /// Create a handle without opening a connection (vault-locked startup).
    pub fn closed(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
            path: path.into(),
        }
    }

    /// Create a handle and open it immediately.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let db = Self::closed(path);
        db.reopen()?;
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.inner.lock().is_some()
    }

    /// Open (or re-open) the connection, applying migrations.
    pub fn reopen(&self) -> Result<(), StorageError> {
        let mut guard = self.inner.lock();
        if guard.is_some() {
            return Ok(());
        }
        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrate::apply(&conn)?;
        tracing::debug!(path = %self.path.display(), "database opened");
        *guard = Some(conn);
        Ok(())
    }

    /// Checkpoint the WAL and drop the connection.
    ///
    /// After this the on-disk file is self-contained, so the vault can
    /// encrypt it and remove the `-wal`/`-shm` sidecars. Idempotent.
    pub fn close(&self) -> Result<(), StorageError> {
        let mut guard = self.inner.lock();
        if let Some(conn) = guard.take() {
            // Fold the WAL back into the main file so it is self-contained
            conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
            drop(conn);
            tracing::debug!(path = %self.path.display(), "database closed");
        }
        Ok(())
    }

    /// Run a closure against the open connection.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let guard = self.inner.lock();
        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(StorageError::Closed),
        }
    }
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
