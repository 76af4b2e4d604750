// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inert filesystem adapter used when no backend is wired

use crate::adapter::{
    ChangeCallback, FsAdapter, FsError, Remote, RemoteParams, SyncOptions,
};
use crate::context::TransferContext;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Adapter that resolves nothing and performs nothing.
///
/// Every operation fails with [`FsError::Unsupported`]; the daemon wires
/// this in until a real backend adapter is configured.
#[derive(Clone, Default)]
pub struct NoopFs;

impl NoopFs {
    pub fn new() -> Self {
        Self
    }

    fn unsupported<T>(op: &str) -> Result<T, FsError> {
        Err(FsError::Unsupported(format!("no backend configured ({op})")))
    }
}

#[async_trait]
impl FsAdapter for NoopFs {
    async fn resolve(&self, _location: &str) -> Result<Remote, FsError> {
        Self::unsupported("resolve")
    }

    async fn sync(
        &self,
        _ctx: &TransferContext,
        _src: &Remote,
        _dst: &Remote,
        _opts: &SyncOptions,
    ) -> Result<(), FsError> {
        Self::unsupported("sync")
    }

    async fn copy(
        &self,
        _ctx: &TransferContext,
        _src: &Remote,
        _dst: &Remote,
    ) -> Result<(), FsError> {
        Self::unsupported("copy")
    }

    async fn move_to(
        &self,
        _ctx: &TransferContext,
        _src: &Remote,
        _dst: &Remote,
    ) -> Result<(), FsError> {
        Self::unsupported("move")
    }

    async fn check(
        &self,
        _ctx: &TransferContext,
        _src: &Remote,
        _dst: &Remote,
    ) -> Result<(), FsError> {
        Self::unsupported("check")
    }

    async fn change_notify(
        &self,
        _remote: &Remote,
        _callback: ChangeCallback,
        _poll_rx: mpsc::Receiver<Duration>,
        _cancel: CancellationToken,
    ) -> Result<(), FsError> {
        Self::unsupported("change_notify")
    }

    async fn create_remote(&self, _name: &str, _params: RemoteParams) -> Result<(), FsError> {
        Self::unsupported("create_remote")
    }

    async fn delete_remote(&self, _name: &str) -> Result<(), FsError> {
        Self::unsupported("delete_remote")
    }

    async fn list_remotes(&self) -> Result<Vec<String>, FsError> {
        Ok(Vec::new())
    }

    fn obscure(&self, password: &str) -> String {
        password.to_string()
    }

    async fn clear_caches(&self) {}
}
