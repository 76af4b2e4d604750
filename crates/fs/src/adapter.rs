// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The filesystem adapter trait

use crate::context::TransferContext;
use async_trait::async_trait;
use drift_core::change::EntryKind;
use drift_core::profile::{ConflictLoser, ConflictResolve, DeleteTiming};
use drift_core::RemoteKey;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Errors surfaced by filesystem backends
#[derive(Debug, Error)]
pub enum FsError {
    /// Malformed location, unknown remote, bad parameters. Never retried.
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// Transient I/O or backend protocol failure, eligible for retry
    #[error("transfer error: {0}")]
    Transient(String),
    #[error("operation not supported: {0}")]
    Unsupported(String),
    /// The operation observed cooperative cancellation
    #[error("operation cancelled")]
    Cancelled,
}

impl FsError {
    /// Whether the retry policy may re-attempt after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FsError::Transient(_))
    }
}

/// Optional capabilities of a resolved remote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoteFeatures {
    /// Backend can push change notifications
    pub change_notify: bool,
}

/// A name-resolved endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    /// The original location string (`<remote>:<subpath>` or local path)
    pub location: String,
    pub key: RemoteKey,
    /// Provider tag (`gdrive`, `local`, ... or `none` when unresolved)
    pub provider: String,
    pub features: RemoteFeatures,
}

impl Remote {
    pub fn new(location: impl Into<String>, provider: impl Into<String>) -> Self {
        let location = location.into();
        Self {
            key: RemoteKey::canonical(&location),
            location,
            provider: provider.into(),
            features: RemoteFeatures::default(),
        }
    }

    pub fn with_change_notify(mut self) -> Self {
        self.features.change_notify = true;
        self
    }
}

/// Options for one sync call.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOptions {
    /// One-way: destination mirrors source
    pub oneway: bool,
    pub delete_timing: DeleteTiming,
    /// Bi-sync: discard prior state and re-establish the baseline
    pub resync: bool,
    pub conflict_resolve: ConflictResolve,
    pub conflict_loser: ConflictLoser,
    pub conflict_suffix: Option<String>,
    /// Max minutes a peer may hold the reconciliation lock (bi-sync)
    pub max_lock_mins: u32,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            oneway: true,
            delete_timing: DeleteTiming::default(),
            resync: false,
            conflict_resolve: ConflictResolve::default(),
            conflict_loser: ConflictLoser::default(),
            conflict_suffix: None,
            max_lock_mins: 0,
        }
    }
}

/// Parameters for creating a config-backed remote (e.g. a crypt wrapper).
pub type RemoteParams = BTreeMap<String, String>;

/// Callback invoked by a backend's change-notification loop.
///
/// The backend cannot distinguish create from modify, so every invocation
/// is treated as a modification of `path`.
pub type ChangeCallback = Arc<dyn Fn(String, EntryKind) + Send + Sync>;

/// The pluggable filesystem abstraction.
///
/// One implementation wraps the real backend library; [`crate::NoopFs`]
/// is the inert default and `FakeFs` (test-support) scripts behaviors for
/// tests.
#[async_trait]
pub trait FsAdapter: Clone + Send + Sync + 'static {
    /// Resolve a location string to a remote, reporting its features.
    async fn resolve(&self, location: &str) -> Result<Remote, FsError>;

    /// One-way or bi-directional sync of `src` into `dst`.
    async fn sync(
        &self,
        ctx: &TransferContext,
        src: &Remote,
        dst: &Remote,
        opts: &SyncOptions,
    ) -> Result<(), FsError>;

    /// Copy without deleting extraneous destination entries.
    async fn copy(&self, ctx: &TransferContext, src: &Remote, dst: &Remote)
        -> Result<(), FsError>;

    /// Copy then remove the source entries.
    async fn move_to(
        &self,
        ctx: &TransferContext,
        src: &Remote,
        dst: &Remote,
    ) -> Result<(), FsError>;

    /// Compare without mutating either side.
    async fn check(&self, ctx: &TransferContext, src: &Remote, dst: &Remote)
        -> Result<(), FsError>;

    /// Start the backend's change-notification loop for `remote`.
    ///
    /// Returns once the loop is started. The loop invokes `callback` for
    /// every detected change, re-reads its poll interval from `poll_rx`,
    /// and exits when `cancel` fires. Callers must have checked
    /// `features.change_notify` first.
    async fn change_notify(
        &self,
        remote: &Remote,
        callback: ChangeCallback,
        poll_rx: mpsc::Receiver<Duration>,
        cancel: CancellationToken,
    ) -> Result<(), FsError>;

    /// Create a named remote in the backend configuration.
    async fn create_remote(&self, name: &str, params: RemoteParams) -> Result<(), FsError>;

    /// Delete a named remote from the backend configuration. Idempotent.
    async fn delete_remote(&self, name: &str) -> Result<(), FsError>;

    /// Names of all configured remotes.
    async fn list_remotes(&self) -> Result<Vec<String>, FsError>;

    /// Reversibly obscure a password for backend configuration storage.
    fn obscure(&self, password: &str) -> String;

    /// Drop filesystem and accounting caches so the next operation starts
    /// from a clean observation of the world.
    async fn clear_caches(&self);
}
