// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task engine: per-operation execution with isolated configuration
//!
//! One detached worker per task. Each task gets its own transfer context
//! (stats group, filter, log sink, cancellation scope), a sampler
//! streaming progress over the caller's bounded channel, retry handling,
//! and delta-engine consultation for one-way syncs.

use crate::delta::{scoped_filter, DeltaEngine, SyncPlan};
use crate::engine::{EventSink, UnlockGate};
use crate::error::EngineError;
use crate::retry;
use crate::sampler::{SampleMeta, Sampler};
use crate::wrap;
use drift_core::{
    ActionKind, Clock, Profile, ProgressSample, TaskId, TaskIdGen, TaskInfo, TaskState, UiEvent,
};
use drift_fs::{Filter, FsAdapter, FsError, Remote, SyncOptions, TransferContext};
use drift_storage::{HistoryEntry, HistoryStore};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

type TaskTerminal = (TaskState, Option<String>);

struct TaskHandle {
    action: ActionKind,
    tab_id: Option<String>,
    started_at_ms: u64,
    cancel: CancellationToken,
    state_rx: watch::Receiver<TaskTerminal>,
}

/// Runs transfers as detached workers with cooperative cancellation.
pub struct TaskEngine<F: FsAdapter, E: EventSink, C: Clock> {
    fs: F,
    events: E,
    clock: C,
    delta: Arc<DeltaEngine<F, C>>,
    history: HistoryStore,
    gate: Arc<dyn UnlockGate>,
    ids: TaskIdGen,
    active: Mutex<HashMap<TaskId, TaskHandle>>,
}

struct TaskOutcome {
    state: TaskState,
    error: Option<String>,
    files: u64,
    bytes: u64,
}

impl<F: FsAdapter, E: EventSink, C: Clock> TaskEngine<F, E, C> {
    pub fn new(
        fs: F,
        events: E,
        clock: C,
        delta: Arc<DeltaEngine<F, C>>,
        history: HistoryStore,
        gate: Arc<dyn UnlockGate>,
    ) -> Self {
        Self {
            fs,
            events,
            clock,
            delta,
            history,
            gate,
            ids: TaskIdGen::new(),
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Start a task on a detached worker and return its id immediately.
    ///
    /// Progress samples stream over `progress_tx`; on overflow samples
    /// are dropped, and the channel is never closed by the engine.
    pub fn start_task(
        self: &Arc<Self>,
        action: ActionKind,
        profile: Profile,
        tab_id: Option<String>,
        progress_tx: mpsc::Sender<ProgressSample>,
    ) -> Result<TaskId, EngineError> {
        if !self.gate.is_unlocked() {
            return Err(EngineError::VaultLocked);
        }
        profile.validate()?;

        let id = self.ids.next();
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel((TaskState::Running, None));

        let handle = TaskHandle {
            action,
            tab_id: tab_id.clone(),
            started_at_ms: self.clock.epoch_ms(),
            cancel: cancel.clone(),
            state_rx,
        };
        self.active.lock().insert(id, handle);

        self.events.emit(UiEvent::SyncStarted {
            task_id: id,
            action,
            tab_id: tab_id.clone(),
        });
        tracing::info!(task_id = %id, action = %action, "task started");

        let engine = Arc::clone(self);
        tokio::spawn(run_task(
            engine,
            id,
            action,
            profile,
            tab_id,
            progress_tx,
            cancel,
            state_tx,
        ));

        Ok(id)
    }

    /// Request cooperative cancellation.
    pub fn stop_task(&self, id: TaskId) -> Result<(), EngineError> {
        let active = self.active.lock();
        let handle = active.get(&id).ok_or(EngineError::TaskNotFound(id))?;
        handle.cancel.cancel();
        tracing::info!(task_id = %id, "task stop requested");
        Ok(())
    }

    /// Ask every non-terminal task to cancel.
    pub fn stop_all(&self) {
        for handle in self.active.lock().values() {
            if !handle.state_rx.borrow().0.is_terminal() {
                handle.cancel.cancel();
            }
        }
    }

    /// Block until the task reaches a terminal state.
    pub async fn wait_task(&self, id: TaskId) -> Result<TaskTerminal, EngineError> {
        let mut rx = {
            let active = self.active.lock();
            let handle = active.get(&id).ok_or(EngineError::TaskNotFound(id))?;
            handle.state_rx.clone()
        };

        loop {
            let current = rx.borrow().clone();
            if current.0.is_terminal() {
                return Ok(current);
            }
            if rx.changed().await.is_err() {
                // Worker gone; report whatever it last published
                return Ok(rx.borrow().clone());
            }
        }
    }

    /// Snapshot of every task still held in the active set.
    pub fn active_tasks(&self) -> Vec<TaskInfo> {
        let active = self.active.lock();
        let mut tasks: Vec<TaskInfo> = active
            .iter()
            .map(|(id, handle)| {
                let (state, last_error) = handle.state_rx.borrow().clone();
                TaskInfo {
                    id: *id,
                    action: handle.action,
                    tab_id: handle.tab_id.clone(),
                    started_at_ms: handle.started_at_ms,
                    state,
                    last_error,
                }
            })
            .collect();
        tasks.sort_by_key(|t| t.id);
        tasks
    }

    /// Drop a terminal task from the active set, releasing its memory.
    pub fn remove_task(&self, id: TaskId) -> Result<(), EngineError> {
        let mut active = self.active.lock();
        let handle = active.get(&id).ok_or(EngineError::TaskNotFound(id))?;
        if !handle.state_rx.borrow().0.is_terminal() {
            return Err(EngineError::TaskNotFound(id));
        }
        active.remove(&id);
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_task<F: FsAdapter, E: EventSink, C: Clock>(
    engine: Arc<TaskEngine<F, E, C>>,
    id: TaskId,
    action: ActionKind,
    mut profile: Profile,
    tab_id: Option<String>,
    progress_tx: mpsc::Sender<ProgressSample>,
    cancel: CancellationToken,
    state_tx: watch::Sender<TaskTerminal>,
) {
    let started_at_ms = engine.clock.epoch_ms();
    let source = profile.source.clone();
    let dest = profile.dest.clone();

    let outcome = match execute_task(
        &engine,
        id,
        action,
        &mut profile,
        tab_id.clone(),
        &progress_tx,
        &cancel,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            // Failed before the sampler could run: still emit one final
            // sample so the stream terminates visibly
            let state = if cancel.is_cancelled() {
                TaskState::Cancelled
            } else {
                TaskState::Failed
            };
            let mut sample =
                ProgressSample::empty(id, action, tab_id.clone(), engine.clock.epoch_ms());
            sample.status = state;
            sample.last_error = Some(e.to_string());
            engine.events.emit(UiEvent::SyncProgress {
                sample: sample.clone(),
            });
            let _ = progress_tx.try_send(sample);

            TaskOutcome {
                state,
                error: Some(e.to_string()),
                files: 0,
                bytes: 0,
            }
        }
    };

    let _ = state_tx.send((outcome.state, outcome.error.clone()));

    match outcome.state {
        TaskState::Completed => {
            tracing::info!(task_id = %id, "task completed");
            engine.events.emit(UiEvent::SyncCompleted {
                task_id: id,
                action,
                tab_id,
            });
        }
        TaskState::Cancelled => {
            tracing::info!(task_id = %id, "task cancelled");
            engine.events.emit(UiEvent::SyncCancelled {
                task_id: id,
                action,
                tab_id,
            });
        }
        _ => {
            let error = outcome.error.clone().unwrap_or_default();
            tracing::error!(task_id = %id, error = %error, "task failed");
            engine.events.emit(UiEvent::SyncFailed {
                task_id: id,
                action,
                tab_id: tab_id.clone(),
                error: error.clone(),
            });
            engine.events.emit(UiEvent::LogSyncEvent {
                task_id: id,
                message: format!("{action} {source} -> {dest} failed: {error}"),
            });
            engine.events.emit(UiEvent::ErrorOccurred {
                code: "task_failed".to_string(),
                message: error,
                details: None,
                tab_id,
            });
        }
    }

    let entry = HistoryEntry {
        task_id: id,
        action,
        source,
        dest,
        state: outcome.state,
        error: outcome.error,
        files: outcome.files,
        bytes: outcome.bytes,
        started_at_ms,
        duration_ms: engine.clock.epoch_ms().saturating_sub(started_at_ms),
    };
    if let Err(e) = engine.history.append(&entry) {
        tracing::warn!(task_id = %id, error = %e, "failed to record task history");
    }
}

async fn execute_task<F: FsAdapter, E: EventSink, C: Clock>(
    engine: &Arc<TaskEngine<F, E, C>>,
    id: TaskId,
    action: ActionKind,
    profile: &mut Profile,
    tab_id: Option<String>,
    progress_tx: &mpsc::Sender<ProgressSample>,
    cancel: &CancellationToken,
) -> Result<TaskOutcome, EngineError> {
    if action == ActionKind::Pull {
        std::mem::swap(&mut profile.source, &mut profile.dest);
    }
    if action == ActionKind::DryRun {
        profile.dry_run = true;
    }

    let base_filter = Filter::from_profile(profile)?;
    let guard = wrap::wrap_endpoints(&engine.fs, profile).await?;

    let result = run_transfer(
        engine,
        id,
        action,
        profile,
        base_filter,
        tab_id,
        progress_tx,
        cancel,
    )
    .await;

    // Ephemeral crypt remotes go away on every exit path
    guard.cleanup().await;
    result
}

#[allow(clippy::too_many_arguments)]
async fn run_transfer<F: FsAdapter, E: EventSink, C: Clock>(
    engine: &Arc<TaskEngine<F, E, C>>,
    id: TaskId,
    action: ActionKind,
    profile: &Profile,
    base_filter: Filter,
    tab_id: Option<String>,
    progress_tx: &mpsc::Sender<ProgressSample>,
    cancel: &CancellationToken,
) -> Result<TaskOutcome, EngineError> {
    let src = engine.fs.resolve(&profile.source).await?;
    let dst = engine.fs.resolve(&profile.dest).await?;

    let mut ctx = TransferContext::for_profile(profile, base_filter, cancel.child_token());

    // Delta consultation applies to one-way syncs that can mutate
    let delta_managed =
        matches!(action, ActionKind::Pull | ActionKind::Push) && !profile.dry_run;
    let mut scoped_changes = None;

    if delta_managed {
        match engine.delta.plan_sync(&src, &dst)? {
            SyncPlan::Skip => {
                let sample =
                    ProgressSample::delta_skip(id, action, tab_id, engine.clock.epoch_ms());
                engine.events.emit(UiEvent::SyncProgress {
                    sample: sample.clone(),
                });
                let _ = progress_tx.try_send(sample);
                engine.delta.commit_delta(&src.key, &dst.key)?;
                tracing::info!(task_id = %id, "sync skipped via delta state");
                return Ok(TaskOutcome {
                    state: TaskState::Completed,
                    error: None,
                    files: 0,
                    bytes: 0,
                });
            }
            SyncPlan::Scoped(changes) => {
                ctx = ctx.with_filter(scoped_filter(&changes)?);
                scoped_changes = Some(changes);
            }
            SyncPlan::Full => {}
        }
    }

    let meta = SampleMeta {
        task_id: id,
        action,
        tab_id,
    };
    let sampler = Sampler::spawn(
        ctx.clone(),
        meta,
        engine.clock.clone(),
        engine.events.clone(),
        progress_tx.clone(),
    );

    let opts = sync_options(action, profile);
    let op_result = retry::run_with_retry(
        profile.retries,
        profile.retries_sleep_secs,
        &ctx.cancel,
        || {
            // Each attempt starts with a clean error count, so a
            // successful retry reports success
            ctx.stats.reset_errors();
            dispatch(
                engine.fs.clone(),
                action,
                ctx.clone(),
                src.clone(),
                dst.clone(),
                opts.clone(),
            )
        },
    )
    .await;

    let errors = ctx.stats.errors();
    let (state, error) = match op_result {
        Ok(()) if errors == 0 => (TaskState::Completed, None),
        Ok(()) => (TaskState::Failed, ctx.stats.snapshot().last_error),
        Err(FsError::Cancelled) => (TaskState::Cancelled, None),
        Err(_) if ctx.cancel.is_cancelled() => (TaskState::Cancelled, None),
        Err(e) => (TaskState::Failed, Some(e.to_string())),
    };

    sampler.finish(state, error.clone()).await;

    if delta_managed {
        match (scoped_changes, state) {
            (Some(_), TaskState::Completed) => {
                if let Err(e) = engine.delta.commit_delta(&src.key, &dst.key) {
                    tracing::warn!(task_id = %id, error = %e, "failed to commit delta");
                }
            }
            (Some(changes), _) => {
                // The drained changes must survive the next attempt
                engine.delta.restore_changes(&src.key, changes);
            }
            (None, TaskState::Completed) => {
                if let Err(e) = engine.delta.commit_full_sync(&src, &dst).await {
                    tracing::warn!(task_id = %id, error = %e, "failed to commit full sync");
                }
            }
            (None, _) => {}
        }
    }

    let snap = ctx.stats.snapshot();
    Ok(TaskOutcome {
        state,
        error,
        files: snap.transfers,
        bytes: snap.bytes,
    })
}

fn sync_options(action: ActionKind, profile: &Profile) -> SyncOptions {
    SyncOptions {
        oneway: !action.is_bidirectional(),
        delete_timing: profile.delete_timing,
        resync: action == ActionKind::BiResync,
        conflict_resolve: profile.conflict_resolve,
        conflict_loser: profile.conflict_loser,
        conflict_suffix: profile.conflict_suffix.clone(),
        max_lock_mins: profile.max_lock_mins,
    }
}

async fn dispatch<F: FsAdapter>(
    fs: F,
    action: ActionKind,
    ctx: TransferContext,
    src: Remote,
    dst: Remote,
    opts: SyncOptions,
) -> Result<(), FsError> {
    match action {
        ActionKind::Pull | ActionKind::Push | ActionKind::Bi | ActionKind::BiResync => {
            fs.sync(&ctx, &src, &dst, &opts).await
        }
        // Dry-run walks the sync path; the context suppresses mutations
        ActionKind::DryRun => fs.sync(&ctx, &src, &dst, &opts).await,
        ActionKind::Copy => fs.copy(&ctx, &src, &dst).await,
        ActionKind::Move => fs.move_to(&ctx, &src, &dst).await,
        ActionKind::Check => fs.check(&ctx, &src, &dst).await,
    }
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
