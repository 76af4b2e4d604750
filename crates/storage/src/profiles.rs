// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stored transfer profiles

use crate::db::Database;
use crate::error::StorageError;
use drift_core::{Profile, ProfileId};
use rusqlite::{params, OptionalExtension};

/// CRUD over the `profiles` table. Profile bodies are stored as JSON.
#[derive(Clone)]
pub struct ProfileStore {
    db: Database,
}

impl ProfileStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn save(
        &self,
        id: &ProfileId,
        name: &str,
        profile: &Profile,
        now_ms: u64,
    ) -> Result<(), StorageError> {
        let data = serde_json::to_string(profile)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO profiles (id, name, data, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     data = excluded.data,
                     updated_at = excluded.updated_at",
                params![id.as_str(), name, data, now_ms as i64],
            )?;
            Ok(())
        })
    }

    pub fn get(&self, id: &ProfileId) -> Result<Option<Profile>, StorageError> {
        let data: Option<String> = self.db.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT data FROM profiles WHERE id = ?1",
                    params![id.as_str()],
                    |row| row.get(0),
                )
                .optional()?)
        })?;
        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn list(&self) -> Result<Vec<(ProfileId, String)>, StorageError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM profiles ORDER BY name")?;
            let rows = stmt.query_map([], |row| {
                Ok((ProfileId::new(row.get::<_, String>(0)?), row.get(1)?))
            })?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    pub fn delete(&self, id: &ProfileId) -> Result<(), StorageError> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM profiles WHERE id = ?1", params![id.as_str()])?;
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "profiles_tests.rs"]
mod tests;
