// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress sampling loop
//!
//! One sampler per task composes a [`ProgressSample`] every 500 ms from
//! the task's accounting snapshot and captured log lines. Every sample is
//! published to the frontend as `sync:progress` and mirrored into the
//! caller's per-task channel. Teardown runs a fixed phase sequence: close
//! the log sink, signal the loop, join it, emit the final sample. The
//! progress channel is owned by the caller and never closed here.

use crate::engine::EventSink;
use crate::logcap;
use drift_core::{
    ActionKind, Clock, ProgressSample, TaskId, TaskState, TransferItem, TransferStatus, UiEvent,
};
use drift_fs::{LogSink, TransferContext};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

pub(crate) const SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

/// Identity fields stamped on every sample.
#[derive(Clone)]
pub(crate) struct SampleMeta {
    pub task_id: TaskId,
    pub action: ActionKind,
    pub tab_id: Option<String>,
}

/// Teardown phases of the sampling pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Running,
    /// Log sink closed, residual lines still buffered
    Draining,
    /// Stop signalled, waiting for the loop to exit
    Joining,
    /// Final sample being emitted
    Final,
    Closed,
}

struct FinalOutcome {
    state: TaskState,
    error: Option<String>,
}

/// Handle owned by the task worker.
pub(crate) struct Sampler {
    phase: Arc<Mutex<Phase>>,
    log: LogSink,
    stop_tx: Option<oneshot::Sender<FinalOutcome>>,
    join: Option<JoinHandle<()>>,
}

impl Sampler {
    /// Start sampling `ctx` into `events` and `tx`.
    pub(crate) fn spawn<E: EventSink, C: Clock>(
        ctx: TransferContext,
        meta: SampleMeta,
        clock: C,
        events: E,
        tx: mpsc::Sender<ProgressSample>,
    ) -> Self {
        let phase = Arc::new(Mutex::new(Phase::Running));
        let log = ctx.log.clone();
        let (stop_tx, stop_rx) = oneshot::channel();

        let loop_phase = Arc::clone(&phase);
        let join = tokio::spawn(sample_loop(ctx, meta, clock, events, tx, stop_rx, loop_phase));

        Self {
            phase,
            log,
            stop_tx: Some(stop_tx),
            join: Some(join),
        }
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> Phase {
        *self.phase.lock()
    }

    /// Tear down in strict order and emit the final sample.
    pub(crate) async fn finish(mut self, state: TaskState, error: Option<String>) {
        *self.phase.lock() = Phase::Draining;
        self.log.close();

        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(FinalOutcome { state, error });
        }
        *self.phase.lock() = Phase::Joining;

        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
        *self.phase.lock() = Phase::Closed;
    }
}

async fn sample_loop<E: EventSink, C: Clock>(
    ctx: TransferContext,
    meta: SampleMeta,
    clock: C,
    events: E,
    tx: mpsc::Sender<ProgressSample>,
    mut stop_rx: oneshot::Receiver<FinalOutcome>,
    phase: Arc<Mutex<Phase>>,
) {
    let mut interval = tokio::time::interval(SAMPLE_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut prev_checking: HashSet<String> = HashSet::new();

    loop {
        tokio::select! {
            outcome = &mut stop_rx => {
                let (state, error) = match outcome {
                    Ok(FinalOutcome { state, error }) => (state, error),
                    // Worker dropped without finish(); treat as failure
                    Err(_) => (TaskState::Failed, None),
                };
                *phase.lock() = Phase::Final;
                let (sample, _) = compose(&ctx, &meta, &clock, &prev_checking, state, error);
                events.emit(UiEvent::SyncProgress {
                    sample: sample.clone(),
                });
                // Never blocks; on overflow the final sample is dropped
                let _ = tx.try_send(sample);
                break;
            }
            _ = interval.tick() => {
                let (sample, checking) =
                    compose(&ctx, &meta, &clock, &prev_checking, TaskState::Running, None);
                prev_checking = checking;
                events.emit(UiEvent::SyncProgress {
                    sample: sample.clone(),
                });
                let _ = tx.try_send(sample);
            }
        }
    }
}

/// Compose one sample from the task-scoped accounting snapshot.
fn compose<C: Clock>(
    ctx: &TransferContext,
    meta: &SampleMeta,
    clock: &C,
    prev_checking: &HashSet<String>,
    status: TaskState,
    error: Option<String>,
) -> (ProgressSample, HashSet<String>) {
    let snap = ctx.stats.snapshot();

    let mut sample = ProgressSample::empty(
        meta.task_id,
        meta.action,
        meta.tab_id.clone(),
        clock.epoch_ms(),
    );
    sample.status = status;
    sample.total_files = snap.total_transfers;
    sample.total_bytes = snap.total_bytes;
    sample.total_checks = snap.total_checks;
    sample.files = snap.transfers;
    sample.bytes = snap.bytes;
    sample.checks = snap.checks;
    sample.deletes = snap.deletes;
    sample.renames = snap.renames;
    sample.speed = snap.speed;
    sample.eta_secs = snap.eta_secs;
    sample.elapsed_ms = snap.elapsed_ms;
    sample.last_error = error.or(snap.last_error);

    // Compose the visible transfer list: in-flight, checking, completed
    let mut transfers = Vec::new();
    for t in &snap.transferring {
        let percent = if t.size > 0 {
            ((t.bytes * 100) / t.size).min(100) as u8
        } else {
            0
        };
        transfers.push(TransferItem {
            name: t.name.clone(),
            size: t.size,
            bytes: t.bytes,
            percent,
            speed: t.speed,
            eta_secs: None,
            status: TransferStatus::Transferring,
        });
    }
    let checking: HashSet<String> = snap.checking.iter().cloned().collect();
    for name in &snap.checking {
        transfers.push(TransferItem::named(name.clone(), TransferStatus::Checking));
    }
    // Checks that finished since the previous sample stay visible once
    for name in prev_checking.difference(&checking) {
        transfers.push(TransferItem {
            name: name.clone(),
            size: 0,
            bytes: 0,
            percent: 100,
            speed: 0.0,
            eta_secs: None,
            status: TransferStatus::Checked,
        });
    }
    for done in &snap.completed {
        transfers.push(TransferItem {
            name: done.name.clone(),
            size: done.size,
            bytes: done.size,
            percent: 100,
            speed: 0.0,
            eta_secs: None,
            status: match &done.error {
                Some(_) => TransferStatus::Failed,
                None => TransferStatus::Completed,
            },
        });
    }
    sample.transfers = transfers;

    // Displayed counts always equal the items displayed
    sample.recount();
    sample.reprogress();

    sample.log_lines = logcap::process_batch(ctx.log.drain());

    (sample, checking)
}

#[cfg(test)]
#[path = "sampler_tests.rs"]
mod tests;
