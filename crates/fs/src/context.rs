// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-task transfer configuration

use crate::filter::Filter;
use crate::stats::{LogSink, StatsGroup};
use drift_core::Profile;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Isolated configuration for one task.
///
/// Derived from the ambient configuration plus a [`Profile`]; nothing in
/// here outlives the task or mutates global state.
#[derive(Clone)]
pub struct TransferContext {
    /// Concurrent file transfers (0 = backend default)
    pub transfers: u32,
    /// Concurrent checkers, 2× transfers when parallel is set
    pub checkers: u32,
    /// Bytes per second, 0 = unlimited
    pub bandwidth: u64,
    pub retries: u32,
    pub low_level_retries: u32,
    pub retries_sleep_secs: u32,
    pub connect_timeout_secs: u32,
    pub io_timeout_secs: u32,
    /// Transactions per second, 0 = unlimited
    pub tps_limit: u32,
    /// Per-transfer buffer in bytes, 0 = backend default
    pub buffer_size: u64,
    pub multi_thread_streams: u32,
    pub order_by: Option<String>,
    pub immutable: bool,
    /// 0 = unlimited
    pub max_delete: u64,
    pub max_delete_size: u64,
    pub max_transfer: u64,
    pub suffix: Option<String>,
    pub suffix_keep_extension: bool,
    pub dry_run: bool,

    pub filter: Arc<Filter>,
    pub stats: StatsGroup,
    pub log: LogSink,
    pub cancel: CancellationToken,
}

impl TransferContext {
    /// Derive a context from a profile with fresh stats, log sink, and
    /// cancellation scope.
    ///
    /// Size-typed fields fall back to 0 (= unlimited / backend default)
    /// when absent; callers validate the profile first so a parse failure
    /// here cannot happen for stored profiles.
    pub fn for_profile(profile: &Profile, filter: Filter, cancel: CancellationToken) -> Self {
        let parse = |s: &Option<String>| {
            s.as_deref()
                .and_then(|v| drift_core::parse_size(v).ok())
                .unwrap_or(0)
        };

        Self {
            transfers: profile.parallel,
            checkers: if profile.parallel > 0 {
                profile.parallel * 2
            } else {
                0
            },
            bandwidth: profile.bandwidth as u64 * (1 << 20),
            retries: profile.retries,
            low_level_retries: profile.low_level_retries,
            retries_sleep_secs: profile.retries_sleep_secs,
            connect_timeout_secs: profile.connect_timeout_secs,
            io_timeout_secs: profile.io_timeout_secs,
            tps_limit: profile.tps_limit,
            buffer_size: parse(&profile.buffer_size),
            multi_thread_streams: profile.multi_thread_streams,
            order_by: profile.order_by.clone(),
            immutable: profile.immutable,
            max_delete: profile.max_delete.unwrap_or(0),
            max_delete_size: parse(&profile.max_delete_size),
            max_transfer: parse(&profile.max_transfer),
            suffix: profile.suffix.clone(),
            suffix_keep_extension: profile.suffix_keep_extension,
            dry_run: profile.dry_run,
            filter: Arc::new(filter),
            stats: StatsGroup::new(),
            log: LogSink::new(),
            cancel,
        }
    }

    /// Replace the filter, keeping everything else (delta scoping).
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Arc::new(filter);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
