// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delta sync engine: change watchers and the skip/scope/full policy
//!
//! One watcher per remote key buffers change notifications. At each sync
//! request the buffered sets decide whether to skip the sync, scope it to
//! the changed paths, or force a full resync.

use crate::error::EngineError;
use drift_core::change::{EntryKind, FileChange};
use drift_core::{Clock, RemoteKey};
use drift_fs::{ChangeCallback, Filter, FilterRule, FsAdapter, Remote};
use drift_storage::DeltaStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A source holding this many changes (or more) falls back to a full sync.
pub(crate) const MAX_SCOPED_CHANGES: usize = 5_000;
/// The Nth consecutive delta-handled sync forces a full sync instead.
pub(crate) const MAX_CONSECUTIVE_DELTAS: u32 = 50;
/// Elapsed time since the last full sync that forces a new baseline.
pub(crate) const FULL_SYNC_INTERVAL_MS: u64 = 24 * 60 * 60 * 1000;
/// Poll interval handed to backend change-notification loops.
pub(crate) const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// How a sync request should be executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPlan {
    /// Both sides quiet: skip entirely, commit a delta on both
    Skip,
    /// Narrow the filter to these drained source changes
    Scoped(Vec<FileChange>),
    Full,
}

struct Watcher {
    provider: String,
    running: bool,
    buffer: Arc<Mutex<Vec<FileChange>>>,
    cancel: CancellationToken,
    _poll_tx: mpsc::Sender<Duration>,
}

/// Per-remote change watchers plus the delta policy.
pub struct DeltaEngine<F: FsAdapter, C: Clock> {
    fs: F,
    clock: C,
    store: DeltaStore,
    watchers: Mutex<HashMap<RemoteKey, Watcher>>,
}

impl<F: FsAdapter, C: Clock> DeltaEngine<F, C> {
    pub fn new(fs: F, clock: C, store: DeltaStore) -> Self {
        Self {
            fs,
            clock,
            store,
            watchers: Mutex::new(HashMap::new()),
        }
    }

    /// Start a watcher for the remote if it supports change notification
    /// and none is running yet. Returns whether a watcher is running.
    pub async fn ensure_watcher(&self, remote: &Remote) -> Result<bool, EngineError> {
        let now = self.clock.epoch_ms();

        if !remote.features.change_notify {
            self.store
                .set_watching(&remote.key, "none", false, now)
                .ok();
            return Ok(false);
        }

        {
            let watchers = self.watchers.lock();
            if watchers.get(&remote.key).is_some_and(|w| w.running) {
                return Ok(true);
            }
        }

        let buffer: Arc<Mutex<Vec<FileChange>>> = Arc::new(Mutex::new(Vec::new()));
        let cancel = CancellationToken::new();
        let (poll_tx, poll_rx) = mpsc::channel(1);

        let callback: ChangeCallback = {
            let buffer = Arc::clone(&buffer);
            let clock = self.clock.clone();
            Arc::new(move |path: String, entry: EntryKind| {
                // Buffer mutation is serialised by this mutex
                buffer
                    .lock()
                    .push(FileChange::modified(path, entry, clock.epoch_ms()));
            })
        };

        self.fs
            .change_notify(remote, callback, poll_rx, cancel.clone())
            .await?;

        // Send the interval outside the watcher map lock: the backend may
        // block on this channel
        let _ = poll_tx.send(DEFAULT_POLL_INTERVAL).await;

        let watcher = Watcher {
            provider: remote.provider.clone(),
            running: true,
            buffer,
            cancel,
            _poll_tx: poll_tx,
        };
        self.watchers.lock().insert(remote.key.clone(), watcher);
        self.store
            .set_watching(&remote.key, &remote.provider, true, now)?;
        tracing::info!(remote = %remote.key, provider = %remote.provider, "watcher started");
        Ok(true)
    }

    /// Whether a watcher is currently running for the key.
    pub fn is_watching(&self, key: &RemoteKey) -> bool {
        self.watchers.lock().get(key).is_some_and(|w| w.running)
    }

    /// Buffered change count for the key.
    pub fn pending_changes(&self, key: &RemoteKey) -> usize {
        self.watchers
            .lock()
            .get(key)
            .map(|w| w.buffer.lock().len())
            .unwrap_or(0)
    }

    /// Return and clear the buffered changes atomically.
    pub fn drain_changes(&self, key: &RemoteKey) -> Vec<FileChange> {
        let watchers = self.watchers.lock();
        match watchers.get(key) {
            Some(w) => std::mem::take(&mut *w.buffer.lock()),
            None => Vec::new(),
        }
    }

    /// Put drained changes back, ahead of anything collected since, so a
    /// failed scoped sync loses nothing.
    pub fn restore_changes(&self, key: &RemoteKey, changes: Vec<FileChange>) {
        let watchers = self.watchers.lock();
        if let Some(w) = watchers.get(key) {
            let mut buffer = w.buffer.lock();
            let newer = std::mem::take(&mut *buffer);
            *buffer = changes;
            buffer.extend(newer);
        }
    }

    /// `true` only when both sides' watchers run quiet within the caps.
    pub fn should_skip_sync(
        &self,
        src_key: &RemoteKey,
        dst_key: &RemoteKey,
    ) -> Result<bool, EngineError> {
        let both_quiet = {
            let watchers = self.watchers.lock();
            [src_key, dst_key].into_iter().all(|key| {
                watchers
                    .get(key)
                    .is_some_and(|w| w.running && w.buffer.lock().is_empty())
            })
        };
        Ok(both_quiet && self.caps_allow_delta(src_key)? && self.caps_allow_delta(dst_key)?)
    }

    /// Evaluate the skip / scoped / full policy for a sync request.
    pub fn plan_sync(&self, src: &Remote, dst: &Remote) -> Result<SyncPlan, EngineError> {
        if self.should_skip_sync(&src.key, &dst.key)? {
            return Ok(SyncPlan::Skip);
        }

        let caps_ok = self.caps_allow_delta(&src.key)? && self.caps_allow_delta(&dst.key)?;
        if caps_ok && self.is_watching(&src.key) {
            let pending = self.pending_changes(&src.key);
            if pending > 0 && pending < MAX_SCOPED_CHANGES {
                let changes = self.drain_changes(&src.key);
                tracing::info!(
                    remote = %src.key,
                    changes = changes.len(),
                    "scoping sync to watcher changes"
                );
                return Ok(SyncPlan::Scoped(changes));
            }
        }

        Ok(SyncPlan::Full)
    }

    /// Commit a delta-handled sync on both sides.
    pub fn commit_delta(&self, src_key: &RemoteKey, dst_key: &RemoteKey) -> Result<(), EngineError> {
        let now = self.clock.epoch_ms();
        for key in [src_key, dst_key] {
            let provider = self.provider_for(key);
            self.store.record_delta(key, &provider, now)?;
        }
        Ok(())
    }

    /// Commit a full sync on both sides and make sure watchers run.
    ///
    /// Changes buffered before the full sync are covered by the new
    /// baseline, so both buffers are discarded.
    pub async fn commit_full_sync(&self, src: &Remote, dst: &Remote) -> Result<(), EngineError> {
        let now = self.clock.epoch_ms();
        for remote in [src, dst] {
            self.drain_changes(&remote.key);
            self.store
                .record_full_sync(&remote.key, &remote.provider, now)?;
            self.ensure_watcher(remote).await?;
        }
        Ok(())
    }

    /// Stop every watcher and persist `is_watching = false`. Idempotent;
    /// safe during shutdown while tasks are still terminating.
    pub fn stop_all(&self) {
        let drained: Vec<(RemoteKey, Watcher)> = {
            let mut watchers = self.watchers.lock();
            watchers.drain().collect()
        };

        let now = self.clock.epoch_ms();
        for (key, watcher) in drained {
            watcher.cancel.cancel();
            // Poll channel closes when the watcher (and its sender) drops
            if let Err(e) = self.store.set_watching(&key, &watcher.provider, false, now) {
                tracing::warn!(remote = %key, error = %e, "failed to persist watcher stop");
            }
            tracing::info!(remote = %key, "watcher stopped");
        }
    }

    fn provider_for(&self, key: &RemoteKey) -> String {
        self.watchers
            .lock()
            .get(key)
            .map(|w| w.provider.clone())
            .unwrap_or_else(|| key.provider().to_string())
    }

    /// Within the consecutive-delta and elapsed-time caps, with a
    /// baseline established.
    fn caps_allow_delta(&self, key: &RemoteKey) -> Result<bool, EngineError> {
        let Some(state) = self.store.get(key)? else {
            return Ok(false);
        };
        if state.delta_count + 1 >= MAX_CONSECUTIVE_DELTAS {
            return Ok(false);
        }
        let Some(last_full) = state.last_full_sync_ms else {
            return Ok(false);
        };
        Ok(self.clock.epoch_ms().saturating_sub(last_full) <= FULL_SYNC_INTERVAL_MS)
    }
}

/// Build the include filter covering every changed path: directories get
/// a recursive include, files an exact one, with a catch-all exclude
/// last.
pub(crate) fn scoped_filter(changes: &[FileChange]) -> Result<Filter, EngineError> {
    let mut rules = Vec::with_capacity(changes.len() + 1);
    let mut seen = std::collections::HashSet::new();
    for change in changes {
        let path = change.path.trim_matches('/');
        if path.is_empty() || !seen.insert((path.to_string(), change.entry)) {
            continue;
        }
        match change.entry {
            EntryKind::Directory => rules.push(FilterRule::include(format!("/{path}/**"))),
            EntryKind::Object => rules.push(FilterRule::include(format!("/{path}"))),
        }
    }
    rules.push(FilterRule::exclude("**"));
    Ok(Filter::compile(&rules, false)?)
}

#[cfg(test)]
#[path = "delta_tests.rs"]
mod tests;
