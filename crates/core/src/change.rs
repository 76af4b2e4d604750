// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change-notification records and remote key canonicalisation

use serde::{Deserialize, Serialize};

/// Canonical identifier for a remote endpoint.
///
/// A location with a `<remote>:` prefix is its own key; a bare local path
/// is rewritten to `local:<path>` so local endpoints share the keyspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteKey(pub String);

impl RemoteKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Canonicalise a location string into a remote key.
    pub fn canonical(location: &str) -> Self {
        match split_remote(location) {
            Some(_) => Self(location.to_string()),
            None => Self(format!("local:{location}")),
        }
    }

    /// Provider tag for this key: the remote name, or `local`.
    pub fn provider(&self) -> &str {
        match split_remote(&self.0) {
            Some((name, _)) if name != "local" => name,
            _ => "local",
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RemoteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Split `<remote>:<path>` into its parts.
///
/// Returns `None` for bare paths. A remote name is a non-empty run of
/// word characters (plus `-`, `.`, space) before the first `:`; anything
/// containing a path separator before the colon is a bare path.
pub fn split_remote(location: &str) -> Option<(&str, &str)> {
    let colon = location.find(':')?;
    let name = &location[..colon];
    if name.is_empty() || name.contains('/') || name.contains('\\') {
        return None;
    }
    Some((name, &location[colon + 1..]))
}

/// What kind of entry a change refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Object,
    Directory,
}

/// What happened to the entry.
///
/// The notification API cannot distinguish create from modify, so both
/// surface as `Modified`. `Deleted` is a forward-compatibility hook and
/// is never produced by current watchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Modified,
    Deleted,
}

/// One change detected by a watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub entry: EntryKind,
    pub kind: ChangeKind,
    pub detected_at_ms: u64,
}

impl FileChange {
    pub fn modified(path: impl Into<String>, entry: EntryKind, detected_at_ms: u64) -> Self {
        Self {
            path: path.into(),
            entry,
            kind: ChangeKind::Modified,
            detected_at_ms,
        }
    }
}

/// Persisted per-remote delta bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaState {
    pub remote_key: RemoteKey,
    pub provider: String,
    pub is_watching: bool,
    /// Epoch ms of the last full sync that established a baseline
    pub last_full_sync_ms: Option<u64>,
    /// Consecutive delta-scoped (or skipped) syncs since the last full sync
    pub delta_count: u32,
    pub updated_at_ms: u64,
}

impl DeltaState {
    pub fn new(remote_key: RemoteKey, provider: impl Into<String>) -> Self {
        Self {
            remote_key,
            provider: provider.into(),
            is_watching: false,
            last_full_sync_ms: None,
            delta_count: 0,
            updated_at_ms: 0,
        }
    }
}

#[cfg(test)]
#[path = "change_tests.rs"]
mod tests;
