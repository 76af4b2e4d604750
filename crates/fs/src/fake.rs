// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake filesystem adapter for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::adapter::{
    ChangeCallback, FsAdapter, FsError, Remote, RemoteFeatures, RemoteParams, SyncOptions,
};
use crate::context::TransferContext;
use async_trait::async_trait;
use drift_core::change::EntryKind;
use drift_core::RemoteKey;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Recorded call to FakeFs
#[derive(Debug, Clone)]
pub enum FsCall {
    Resolve {
        location: String,
    },
    Sync {
        src: String,
        dst: String,
        oneway: bool,
        resync: bool,
        transferred: Vec<String>,
    },
    Copy {
        src: String,
        dst: String,
        transferred: Vec<String>,
    },
    Move {
        src: String,
        dst: String,
    },
    Check {
        src: String,
        dst: String,
    },
    ChangeNotify {
        key: RemoteKey,
    },
    CreateRemote {
        name: String,
    },
    DeleteRemote {
        name: String,
    },
    ClearCaches,
}

struct FakeInner {
    /// Scripted file trees keyed by location string
    files: HashMap<String, BTreeMap<String, u64>>,
    /// Providers whose remotes report change-notify capability
    notify_providers: HashSet<String>,
    /// Remotes created through the config API (crypt wrappers)
    config_remotes: BTreeMap<String, RemoteParams>,
    /// Live change-notify callbacks by remote key
    watchers: HashMap<RemoteKey, ChangeCallback>,
    /// Poll intervals received by watcher loops
    poll_intervals: Vec<Duration>,
    calls: Vec<FsCall>,
    sync_errors: VecDeque<FsError>,
    resolve_errors: VecDeque<FsError>,
    op_delay: Option<Duration>,
    cache_clears: u32,
}

/// Fake filesystem adapter for testing
///
/// Scripts remotes and file trees, records all calls, and lets tests
/// inject failures and change notifications.
#[derive(Clone)]
pub struct FakeFs {
    inner: Arc<Mutex<FakeInner>>,
}

impl Default for FakeFs {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeFs {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeInner {
                files: HashMap::new(),
                notify_providers: HashSet::new(),
                config_remotes: BTreeMap::new(),
                watchers: HashMap::new(),
                poll_intervals: Vec::new(),
                calls: Vec::new(),
                sync_errors: VecDeque::new(),
                resolve_errors: VecDeque::new(),
                op_delay: None,
                cache_clears: 0,
            })),
        }
    }

    /// Seed the file tree behind a location.
    pub fn set_files(&self, location: &str, entries: &[(&str, u64)]) {
        let tree = entries
            .iter()
            .map(|(p, s)| (p.to_string(), *s))
            .collect::<BTreeMap<_, _>>();
        self.inner.lock().files.insert(location.to_string(), tree);
    }

    /// File paths currently behind a location.
    pub fn files_at(&self, location: &str) -> Vec<String> {
        self.inner
            .lock()
            .files
            .get(location)
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Mark a provider as supporting change notifications.
    pub fn enable_change_notify(&self, provider: &str) {
        self.inner
            .lock()
            .notify_providers
            .insert(provider.to_string());
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<FsCall> {
        self.inner.lock().calls.clone()
    }

    /// Queue an error for the next transfer operation.
    pub fn push_sync_error(&self, error: FsError) {
        self.inner.lock().sync_errors.push_back(error);
    }

    /// Queue an error for the next resolve.
    pub fn push_resolve_error(&self, error: FsError) {
        self.inner.lock().resolve_errors.push_back(error);
    }

    /// Delay every transfer operation (for cancellation/sampler tests).
    pub fn set_op_delay(&self, delay: Duration) {
        self.inner.lock().op_delay = Some(delay);
    }

    /// Deliver a change notification through a live watcher callback.
    ///
    /// Returns false when no watcher is registered for the key.
    pub fn emit_change(&self, key: &RemoteKey, path: &str, entry: EntryKind) -> bool {
        let callback = self.inner.lock().watchers.get(key).cloned();
        match callback {
            Some(cb) => {
                cb(path.to_string(), entry);
                true
            }
            None => false,
        }
    }

    /// Whether a change-notify loop is live for the key.
    pub fn watcher_active(&self, key: &RemoteKey) -> bool {
        self.inner.lock().watchers.contains_key(key)
    }

    /// Poll intervals received by watcher loops so far.
    pub fn poll_intervals(&self) -> Vec<Duration> {
        self.inner.lock().poll_intervals.clone()
    }

    pub fn cache_clears(&self) -> u32 {
        self.inner.lock().cache_clears
    }

    /// Names of remotes created through the config API.
    pub fn remote_names(&self) -> Vec<String> {
        self.inner.lock().config_remotes.keys().cloned().collect()
    }

    /// Register a pre-existing config remote (e.g. a leftover crypt
    /// wrapper for orphan-sweep tests).
    pub fn add_config_remote(&self, name: &str) {
        self.inner
            .lock()
            .config_remotes
            .insert(name.to_string(), RemoteParams::new());
    }

    async fn wait_op(&self, ctx: &TransferContext) -> Result<(), FsError> {
        let delay = self.inner.lock().op_delay;
        if let Some(delay) = delay {
            tokio::select! {
                _ = ctx.cancel.cancelled() => return Err(FsError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
        if ctx.is_cancelled() {
            return Err(FsError::Cancelled);
        }
        Ok(())
    }

    fn take_sync_error(&self, ctx: &TransferContext) -> Option<FsError> {
        let error = self.inner.lock().sync_errors.pop_front();
        if let Some(e) = &error {
            ctx.stats.add_error(&e.to_string());
        }
        error
    }

    /// Copy src entries passing the filter into dst; returns transferred paths.
    fn transfer(
        &self,
        ctx: &TransferContext,
        src: &Remote,
        dst: &Remote,
        delete_extraneous: bool,
    ) -> Vec<String> {
        let mut inner = self.inner.lock();
        let entries: Vec<(String, u64)> = inner
            .files
            .get(&src.location)
            .map(|t| t.iter().map(|(p, s)| (p.clone(), *s)).collect())
            .unwrap_or_default();

        let passing: Vec<(String, u64)> = entries
            .into_iter()
            .filter(|(p, _)| ctx.filter.allows(p))
            .collect();

        let total_bytes: u64 = passing.iter().map(|(_, s)| s).sum();
        ctx.stats.add_totals(passing.len() as u64, total_bytes, 0);

        let mut transferred = Vec::new();
        for (path, size) in &passing {
            ctx.stats.start_transfer(path, *size);
            ctx.stats.advance(path, *size);
            ctx.stats.end_transfer(path, None);
            ctx.log.push(format!(
                "2026/01/15 10:30:00 INFO  : {path}: Copied (new)"
            ));
            if !ctx.dry_run {
                inner
                    .files
                    .entry(dst.location.clone())
                    .or_default()
                    .insert(path.clone(), *size);
            }
            transferred.push(path.clone());
        }

        if delete_extraneous && !ctx.dry_run {
            let keep: HashSet<&String> = passing.iter().map(|(p, _)| p).collect();
            if let Some(dst_tree) = inner.files.get_mut(&dst.location) {
                let before = dst_tree.len();
                dst_tree.retain(|p, _| keep.contains(p));
                for _ in 0..(before - dst_tree.len()) {
                    ctx.stats.add_delete();
                }
            }
        }

        transferred
    }
}

#[async_trait]
impl FsAdapter for FakeFs {
    async fn resolve(&self, location: &str) -> Result<Remote, FsError> {
        let mut inner = self.inner.lock();
        inner.calls.push(FsCall::Resolve {
            location: location.to_string(),
        });
        if let Some(error) = inner.resolve_errors.pop_front() {
            return Err(error);
        }

        let key = RemoteKey::canonical(location);
        let provider = key.provider().to_string();
        let change_notify = inner.notify_providers.contains(&provider);
        Ok(Remote {
            location: location.to_string(),
            key,
            provider,
            features: RemoteFeatures { change_notify },
        })
    }

    async fn sync(
        &self,
        ctx: &TransferContext,
        src: &Remote,
        dst: &Remote,
        opts: &SyncOptions,
    ) -> Result<(), FsError> {
        self.wait_op(ctx).await?;
        if let Some(error) = self.take_sync_error(ctx) {
            return Err(error);
        }

        let transferred = self.transfer(ctx, src, dst, opts.oneway);
        self.inner.lock().calls.push(FsCall::Sync {
            src: src.location.clone(),
            dst: dst.location.clone(),
            oneway: opts.oneway,
            resync: opts.resync,
            transferred,
        });
        Ok(())
    }

    async fn copy(
        &self,
        ctx: &TransferContext,
        src: &Remote,
        dst: &Remote,
    ) -> Result<(), FsError> {
        self.wait_op(ctx).await?;
        if let Some(error) = self.take_sync_error(ctx) {
            return Err(error);
        }

        let transferred = self.transfer(ctx, src, dst, false);
        self.inner.lock().calls.push(FsCall::Copy {
            src: src.location.clone(),
            dst: dst.location.clone(),
            transferred,
        });
        Ok(())
    }

    async fn move_to(
        &self,
        ctx: &TransferContext,
        src: &Remote,
        dst: &Remote,
    ) -> Result<(), FsError> {
        self.wait_op(ctx).await?;
        if let Some(error) = self.take_sync_error(ctx) {
            return Err(error);
        }

        self.transfer(ctx, src, dst, false);
        let mut inner = self.inner.lock();
        if !ctx.dry_run {
            inner.files.remove(&src.location);
        }
        inner.calls.push(FsCall::Move {
            src: src.location.clone(),
            dst: dst.location.clone(),
        });
        Ok(())
    }

    async fn check(
        &self,
        ctx: &TransferContext,
        src: &Remote,
        dst: &Remote,
    ) -> Result<(), FsError> {
        self.wait_op(ctx).await?;
        if let Some(error) = self.take_sync_error(ctx) {
            return Err(error);
        }

        let entries: Vec<String> = {
            let inner = self.inner.lock();
            inner
                .files
                .get(&src.location)
                .map(|t| t.keys().cloned().collect())
                .unwrap_or_default()
        };
        ctx.stats.add_totals(0, 0, entries.len() as u64);
        for path in &entries {
            ctx.stats.start_check(path);
            ctx.stats.end_check(path);
        }
        self.inner.lock().calls.push(FsCall::Check {
            src: src.location.clone(),
            dst: dst.location.clone(),
        });
        Ok(())
    }

    async fn change_notify(
        &self,
        remote: &Remote,
        callback: ChangeCallback,
        mut poll_rx: mpsc::Receiver<Duration>,
        cancel: CancellationToken,
    ) -> Result<(), FsError> {
        if !remote.features.change_notify {
            return Err(FsError::Unsupported(format!(
                "{} does not support change notifications",
                remote.provider
            )));
        }

        let key = remote.key.clone();
        {
            let mut inner = self.inner.lock();
            inner.calls.push(FsCall::ChangeNotify { key: key.clone() });
            inner.watchers.insert(key.clone(), callback);
        }

        // Own the poll channel and callback registration until cancelled,
        // the way a backend notification goroutine would.
        let shared = Arc::clone(&self.inner);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    interval = poll_rx.recv() => match interval {
                        Some(interval) => shared.lock().poll_intervals.push(interval),
                        None => break,
                    },
                }
            }
            shared.lock().watchers.remove(&key);
        });

        Ok(())
    }

    async fn create_remote(&self, name: &str, params: RemoteParams) -> Result<(), FsError> {
        let mut inner = self.inner.lock();
        inner.calls.push(FsCall::CreateRemote {
            name: name.to_string(),
        });
        inner.config_remotes.insert(name.to_string(), params);
        Ok(())
    }

    async fn delete_remote(&self, name: &str) -> Result<(), FsError> {
        let mut inner = self.inner.lock();
        inner.calls.push(FsCall::DeleteRemote {
            name: name.to_string(),
        });
        inner.config_remotes.remove(name);
        Ok(())
    }

    async fn list_remotes(&self) -> Result<Vec<String>, FsError> {
        Ok(self.remote_names())
    }

    fn obscure(&self, password: &str) -> String {
        format!("obscured:{password}")
    }

    async fn clear_caches(&self) {
        let mut inner = self.inner.lock();
        inner.cache_clears += 1;
        inner.calls.push(FsCall::ClearCaches);
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
