// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-task transfer accounting
//!
//! Backends record into a [`StatsGroup`]; the engine's sampler reads typed
//! [`StatsSnapshot`]s. Each task owns its own group so concurrent tasks
//! never sum into the same counters.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

/// How many finished transfers the completed ring retains.
const COMPLETED_RING: usize = 100;

/// A file currently being transferred.
#[derive(Debug, Clone, PartialEq)]
pub struct InFlight {
    pub name: String,
    pub size: u64,
    pub bytes: u64,
    /// Bytes per second for this file
    pub speed: f64,
}

/// A transfer that reached a terminal state.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedTransfer {
    pub name: String,
    pub size: u64,
    pub error: Option<String>,
}

/// Typed accounting snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSnapshot {
    pub total_transfers: u64,
    pub total_bytes: u64,
    pub transfers: u64,
    pub bytes: u64,
    pub errors: u64,
    pub checks: u64,
    pub total_checks: u64,
    pub deletes: u64,
    pub renames: u64,
    /// Bytes per second across the task
    pub speed: f64,
    pub eta_secs: Option<u64>,
    pub elapsed_ms: u64,
    pub transferring: Vec<InFlight>,
    pub checking: Vec<String>,
    pub completed: Vec<CompletedTransfer>,
    pub last_error: Option<String>,
}

struct StatsInner {
    started_at: Instant,
    total_transfers: u64,
    total_bytes: u64,
    transfers: u64,
    bytes: u64,
    errors: u64,
    checks: u64,
    total_checks: u64,
    deletes: u64,
    renames: u64,
    transferring: Vec<InFlight>,
    checking: Vec<String>,
    completed: VecDeque<CompletedTransfer>,
    last_error: Option<String>,
}

/// Shared accounting for one task.
#[derive(Clone)]
pub struct StatsGroup {
    inner: Arc<Mutex<StatsInner>>,
}

impl Default for StatsGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsGroup {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StatsInner {
                started_at: Instant::now(),
                total_transfers: 0,
                total_bytes: 0,
                transfers: 0,
                bytes: 0,
                errors: 0,
                checks: 0,
                total_checks: 0,
                deletes: 0,
                renames: 0,
                transferring: Vec::new(),
                checking: Vec::new(),
                completed: VecDeque::new(),
                last_error: None,
            })),
        }
    }

    /// Register discovered work (listing phase).
    pub fn add_totals(&self, files: u64, bytes: u64, checks: u64) {
        let mut inner = self.inner.lock();
        inner.total_transfers += files;
        inner.total_bytes += bytes;
        inner.total_checks += checks;
    }

    /// A file entered the transferring list.
    pub fn start_transfer(&self, name: &str, size: u64) {
        let mut inner = self.inner.lock();
        inner.transferring.push(InFlight {
            name: name.to_string(),
            size,
            bytes: 0,
            speed: 0.0,
        });
    }

    /// Byte progress on an in-flight file.
    pub fn advance(&self, name: &str, bytes: u64) {
        let mut inner = self.inner.lock();
        inner.bytes += bytes;
        if let Some(entry) = inner.transferring.iter_mut().find(|t| t.name == name) {
            entry.bytes += bytes;
        }
    }

    /// A file finished transferring, successfully or not.
    pub fn end_transfer(&self, name: &str, error: Option<String>) {
        let mut inner = self.inner.lock();
        let size = inner
            .transferring
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.size)
            .unwrap_or_default();
        inner.transferring.retain(|t| t.name != name);
        match &error {
            Some(e) => {
                inner.errors += 1;
                inner.last_error = Some(e.clone());
            }
            None => inner.transfers += 1,
        }
        if inner.completed.len() == COMPLETED_RING {
            inner.completed.pop_front();
        }
        inner.completed.push_back(CompletedTransfer {
            name: name.to_string(),
            size,
            error,
        });
    }

    pub fn start_check(&self, name: &str) {
        self.inner.lock().checking.push(name.to_string());
    }

    pub fn end_check(&self, name: &str) {
        let mut inner = self.inner.lock();
        inner.checking.retain(|c| c != name);
        inner.checks += 1;
    }

    pub fn add_delete(&self) {
        self.inner.lock().deletes += 1;
    }

    pub fn add_rename(&self) {
        self.inner.lock().renames += 1;
    }

    /// Record an operation-level error not tied to one file.
    pub fn add_error(&self, message: &str) {
        let mut inner = self.inner.lock();
        inner.errors += 1;
        inner.last_error = Some(message.to_string());
    }

    /// Zero the error counter at the start of a retry attempt, so a
    /// successful retry reports a clean run. The last error message is
    /// kept for diagnostics.
    pub fn reset_errors(&self) {
        self.inner.lock().errors = 0;
    }

    /// Error counter as of now.
    pub fn errors(&self) -> u64 {
        self.inner.lock().errors
    }

    /// Compose the typed snapshot.
    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = self.inner.lock();
        let elapsed = inner.started_at.elapsed();
        let elapsed_secs = elapsed.as_secs_f64();
        let speed = if elapsed_secs > 0.0 {
            inner.bytes as f64 / elapsed_secs
        } else {
            0.0
        };
        let eta_secs = if speed > 0.0 && inner.total_bytes > inner.bytes {
            Some(((inner.total_bytes - inner.bytes) as f64 / speed) as u64)
        } else {
            None
        };

        StatsSnapshot {
            total_transfers: inner.total_transfers,
            total_bytes: inner.total_bytes,
            transfers: inner.transfers,
            bytes: inner.bytes,
            errors: inner.errors,
            checks: inner.checks,
            total_checks: inner.total_checks,
            deletes: inner.deletes,
            renames: inner.renames,
            speed,
            eta_secs,
            elapsed_ms: elapsed.as_millis() as u64,
            transferring: inner.transferring.clone(),
            checking: inner.checking.clone(),
            completed: inner.completed.iter().cloned().collect(),
            last_error: inner.last_error.clone(),
        }
    }
}

/// Shared sink for backend log lines while a task runs.
///
/// The sink is installed into the transfer context; the backend pushes,
/// the sampler drains. After `close()` further pushes are dropped, which
/// is the teardown barrier between the backend and the sampler.
#[derive(Clone, Default)]
pub struct LogSink {
    inner: Arc<Mutex<LogSinkInner>>,
}

#[derive(Default)]
struct LogSinkInner {
    lines: Vec<String>,
    closed: bool,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line. Dropped once the sink is closed.
    pub fn push(&self, line: impl Into<String>) {
        let mut inner = self.inner.lock();
        if !inner.closed {
            inner.lines.push(line.into());
        }
    }

    /// Take everything accumulated since the last drain.
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut self.inner.lock().lines)
    }

    /// Stop accepting pushes. Idempotent; already-buffered lines remain
    /// until drained.
    pub fn close(&self) {
        self.inner.lock().closed = true;
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
